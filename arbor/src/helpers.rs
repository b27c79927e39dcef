//! Delegation of unresolved names to an external helper object.

use crate::error::{BuildError, Result};
use crate::{Context, Value};
use compact_str::CompactString;
use indexmap::IndexMap;
use std::fmt;

/// Named operations reachable from builder closures through
/// [`Context::helper`].
pub trait Helpers {
    /// Whether `name` is one of ours.
    fn responds_to(&self, name: &str) -> bool;

    /// Run `name`. Only called when [`Helpers::responds_to`] said yes.
    fn call(&self, ctx: &mut Context, name: &str, args: &[Value]) -> Result<Value>;
}

type HelperFn = Box<dyn Fn(&mut Context, &[Value]) -> Result<Value>>;

/// Closure-backed [`Helpers`].
#[derive(Default)]
pub struct HelperTable {
    helpers: IndexMap<CompactString, HelperFn>,
}

impl HelperTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F>(mut self, name: &str, helper: F) -> Self
    where
        F: Fn(&mut Context, &[Value]) -> Result<Value> + 'static,
    {
        self.insert(name, helper);
        self
    }

    pub fn insert<F>(&mut self, name: &str, helper: F)
    where
        F: Fn(&mut Context, &[Value]) -> Result<Value> + 'static,
    {
        self.helpers
            .insert(CompactString::from(name), Box::new(helper));
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.helpers.keys().map(CompactString::as_str)
    }

    pub fn len(&self) -> usize {
        self.helpers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.helpers.is_empty()
    }
}

impl Helpers for HelperTable {
    fn responds_to(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }

    fn call(&self, ctx: &mut Context, name: &str, args: &[Value]) -> Result<Value> {
        let helper = self.helpers.get(name).ok_or_else(|| BuildError::MissingHelper {
            name: name.to_string(),
        })?;
        helper(ctx, args)
    }
}

impl fmt::Debug for HelperTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}
