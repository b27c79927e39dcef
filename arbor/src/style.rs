//! Inline CSS declarations for the `style` attribute.

use crate::Value;
use compact_str::{CompactString, ToCompactString};
use indexmap::IndexMap;
use std::fmt;

/// Declaration name to value, keyed in dash-case.
///
/// `fontSize`, `font_size` and `font-size` all address the same entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleMap {
    declarations: IndexMap<CompactString, CompactString>,
}

/// Normalize a declaration name to dash-case.
pub fn dasherize(name: &str) -> CompactString {
    let chars: Vec<char> = name.trim().chars().collect();
    let mut out = CompactString::with_capacity(name.len() + 2);

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' {
            if !out.ends_with('-') {
                out.push('-');
            }
        } else if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(char::is_lowercase),
                _ => false,
            };
            if boundary && !out.ends_with('-') {
                out.push('-');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }

    out
}

impl StyleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `name: value; other: value;` declaration string. Empty or
    /// malformed declarations are skipped.
    pub fn parse(input: &str) -> Self {
        let mut style = Self::new();
        style.merge_str(input);
        style
    }

    /// Build a style map from attribute input: a declaration string or a map
    /// of declarations.
    pub fn from_value(value: &Value) -> Self {
        let mut style = Self::new();
        match value {
            Value::Null | Value::Bool(false) => {}
            Value::Map(map) => {
                for (name, value) in map {
                    style.set(name, value.to_compact_string());
                }
            }
            other => style.merge_str(&other.to_string()),
        }
        style
    }

    fn merge_str(&mut self, input: &str) {
        for declaration in input.split(';') {
            if let Some((name, value)) = declaration.split_once(':') {
                let (name, value) = (name.trim(), value.trim());
                if !name.is_empty() {
                    self.set(name, value);
                }
            }
        }
    }

    pub fn set(&mut self, name: &str, value: impl Into<CompactString>) -> &mut Self {
        self.declarations.insert(dasherize(name), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.declarations
            .get(dasherize(name).as_str())
            .map(CompactString::as_str)
    }

    pub fn remove(&mut self, name: &str) -> Option<CompactString> {
        self.declarations.shift_remove(dasherize(name).as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.declarations.contains_key(dasherize(name).as_str())
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.declarations
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl fmt::Display for StyleMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{name}: {value};")?;
        }
        Ok(())
    }
}

impl From<&str> for StyleMap {
    fn from(input: &str) -> Self {
        Self::parse(input)
    }
}
