//! Tag attributes with `class` and `style` backed by structured values.

use crate::error::{BuildError, Result};
use crate::serialize::{escape_html, unescape_html};
use crate::{ClassList, StyleMap, Value};
use compact_str::{CompactString, ToCompactString};
use indexmap::IndexMap;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

const CLASS: &str = "class";
const STYLE: &str = "style";

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Text(CompactString),
    Class(ClassList),
    Style(StyleMap),
}

impl AttributeValue {
    /// Empty class lists and style maps are not rendered.
    pub fn is_empty(&self) -> bool {
        match self {
            AttributeValue::Text(_) => false,
            AttributeValue::Class(list) => list.is_empty(),
            AttributeValue::Style(style) => style.is_empty(),
        }
    }

    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            AttributeValue::Text(text) => Cow::Borrowed(text.as_str()),
            other => Cow::Owned(other.to_string()),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Text(text) => f.write_str(text),
            AttributeValue::Class(list) => write!(f, "{list}"),
            AttributeValue::Style(style) => write!(f, "{style}"),
        }
    }
}

/// Insertion-ordered attribute map.
///
/// Names are normalized to strings, so `set(1, ..)` and `set("1", ..)` address
/// the same attribute. Equality ignores insertion order.
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    entries: IndexMap<CompactString, AttributeValue>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute.
    ///
    /// - `true` stores the attribute name as its value (`checked="checked"`)
    /// - `false` and `Null` remove the attribute
    /// - `class` is always stored as a [`ClassList`], `style` as a [`StyleMap`]
    pub fn set(&mut self, name: impl fmt::Display, value: impl Into<Value>) -> &mut Self {
        let name = name.to_compact_string();
        let value = value.into();

        let stored = match (name.as_str(), value) {
            (_, Value::Null | Value::Bool(false)) => None,
            (CLASS, value) => Some(AttributeValue::Class(ClassList::from_value(&value)))
                .filter(|v| !v.is_empty()),
            (STYLE, value) => Some(AttributeValue::Style(StyleMap::from_value(&value)))
                .filter(|v| !v.is_empty()),
            (_, Value::Bool(true)) => Some(AttributeValue::Text(name.clone())),
            (_, value) => Some(AttributeValue::Text(value.to_compact_string())),
        };

        match stored {
            Some(value) => {
                self.entries.insert(name, value);
            }
            None => {
                self.entries.shift_remove(name.as_str());
            }
        }
        self
    }

    /// Set every pair in `attributes`, in order.
    pub fn update<K, V, I>(&mut self, attributes: I) -> &mut Self
    where
        K: fmt::Display,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (name, value) in attributes {
            self.set(name, value);
        }
        self
    }

    /// The string value of an attribute. Empty class lists and style maps
    /// read as absent.
    pub fn get(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get_value(name).map(AttributeValue::as_text)
    }

    pub fn get_value(&self, name: &str) -> Option<&AttributeValue> {
        self.entries.get(name).filter(|value| !value.is_empty())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get_value(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        self.entries.shift_remove(name)
    }

    pub fn class_list(&self) -> Option<&ClassList> {
        match self.entries.get(CLASS) {
            Some(AttributeValue::Class(list)) => Some(list),
            _ => None,
        }
    }

    pub fn style(&self) -> Option<&StyleMap> {
        match self.entries.get(STYLE) {
            Some(AttributeValue::Style(style)) => Some(style),
            _ => None,
        }
    }

    /// Add whitespace separated classes, creating the `class` attribute if
    /// needed.
    pub fn add_class(&mut self, classes: &str) -> &mut Self {
        match self.entries.get_mut(CLASS) {
            Some(AttributeValue::Class(list)) => {
                list.add(classes);
            }
            _ => {
                let list = ClassList::from(classes);
                if !list.is_empty() {
                    self.entries
                        .insert(CompactString::const_new(CLASS), AttributeValue::Class(list));
                }
            }
        }
        self
    }

    /// Remove whitespace separated classes; the `class` attribute goes away
    /// once it is empty.
    pub fn remove_class(&mut self, classes: &str) -> &mut Self {
        let now_empty = match self.entries.get_mut(CLASS) {
            Some(AttributeValue::Class(list)) => list.remove(classes).is_empty(),
            _ => false,
        };
        if now_empty {
            self.entries.shift_remove(CLASS);
        }
        self
    }

    pub fn set_style(&mut self, name: &str, value: impl Into<CompactString>) -> &mut Self {
        match self.entries.get_mut(STYLE) {
            Some(AttributeValue::Style(style)) => {
                style.set(name, value);
            }
            _ => {
                let mut style = StyleMap::new();
                style.set(name, value);
                self.entries
                    .insert(CompactString::const_new(STYLE), AttributeValue::Style(style));
            }
        }
        self
    }

    /// Number of attributes that would be rendered.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Renderable attributes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.entries
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(name, value)| (name.as_str(), value))
    }
}

impl PartialEq for Attributes {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(name, value)| other.get_value(name) == Some(value))
    }
}

impl Eq for Attributes {}

/// Renders `name="value"` pairs separated by single spaces, names and values escaped.
impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(
                f,
                "{}=\"{}\"",
                escape_html(name),
                escape_html(&value.as_text())
            )?;
        }
        Ok(())
    }
}

/// Parses the rendered form back. Bare names are read as boolean flags.
impl FromStr for Attributes {
    type Err = BuildError;

    fn from_str(input: &str) -> Result<Self> {
        let mut attributes = Attributes::new();
        let bytes = input.as_bytes();
        let mut pos = 0;

        while pos < bytes.len() {
            if bytes[pos].is_ascii_whitespace() {
                pos += 1;
                continue;
            }

            let start = pos;
            while pos < bytes.len() && bytes[pos] != b'=' && !bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            if pos == start {
                return Err(BuildError::MalformedAttributes { offset: start });
            }
            let name = unescape_html(&input[start..pos]);

            if pos < bytes.len() && bytes[pos] == b'=' {
                pos += 1;
                let quote = match bytes.get(pos) {
                    Some(&q @ (b'"' | b'\'')) => q,
                    _ => return Err(BuildError::MalformedAttributes { offset: pos }),
                };
                pos += 1;
                let value_start = pos;
                while pos < bytes.len() && bytes[pos] != quote {
                    pos += 1;
                }
                if pos == bytes.len() {
                    return Err(BuildError::MalformedAttributes { offset: value_start });
                }
                let value = unescape_html(&input[value_start..pos]);
                pos += 1;
                attributes.set(&*name, &*value);
            } else {
                attributes.set(&*name, true);
            }
        }

        Ok(attributes)
    }
}
