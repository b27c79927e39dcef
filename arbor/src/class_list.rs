//! Ordered set of CSS class tokens.

use crate::Value;
use compact_str::CompactString;
use indexmap::IndexSet;
use std::fmt;

/// The value of a `class` attribute.
///
/// Adding or removing a string splits it on whitespace, so `add("a b")` adds
/// two tokens. Tokens keep their insertion order for rendering, but equality
/// is set equality.
#[derive(Debug, Clone, Default)]
pub struct ClassList {
    classes: IndexSet<CompactString>,
}

impl ClassList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a class list from any attribute input: a whitespace separated
    /// string, a list of such strings, or nothing.
    pub fn from_value(value: &Value) -> Self {
        let mut list = Self::new();
        list.add_value(value);
        list
    }

    fn add_value(&mut self, value: &Value) {
        match value {
            Value::Null | Value::Bool(false) => {}
            Value::List(items) => {
                for item in items {
                    self.add_value(item);
                }
            }
            Value::Str(s) => {
                self.add(s);
            }
            other => {
                self.add(&other.to_string());
            }
        }
    }

    /// Add every whitespace separated token in `classes`.
    pub fn add(&mut self, classes: &str) -> &mut Self {
        for class in classes.split_whitespace() {
            self.classes.insert(CompactString::from(class));
        }
        self
    }

    /// Remove every whitespace separated token in `classes`.
    pub fn remove(&mut self, classes: &str) -> &mut Self {
        for class in classes.split_whitespace() {
            self.classes.shift_remove(class);
        }
        self
    }

    pub fn contains(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    /// True when every whitespace separated token in `classes` is present.
    pub fn contains_all(&self, classes: &str) -> bool {
        classes.split_whitespace().all(|class| self.contains(class))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(CompactString::as_str)
    }

    pub fn clear(&mut self) {
        self.classes.clear();
    }
}

impl PartialEq for ClassList {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|class| other.contains(class))
    }
}

impl Eq for ClassList {}

impl fmt::Display for ClassList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, class) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(class)?;
        }
        Ok(())
    }
}

impl From<&str> for ClassList {
    fn from(classes: &str) -> Self {
        let mut list = Self::new();
        list.add(classes);
        list
    }
}

impl<S: AsRef<str>> FromIterator<S> for ClassList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = Self::new();
        for classes in iter {
            list.add(classes.as_ref());
        }
        list
    }
}
