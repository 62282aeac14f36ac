//! Explicit argument overrides for fresh construction.

use crate::binding::Value;
use fnv::FnvHashMap;
use std::fmt;
use std::sync::Arc;

/// Named values that take the place of specific constructor or factory
/// arguments during a single construction.
///
/// Any argument not named here is resolved through the engine instead.
/// Parameters only apply to the construction they are passed to: they are
/// not stored anywhere.
#[derive(Clone, Default)]
pub struct Parameters {
    values: FnvHashMap<String, Value>,
}

impl Parameters {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value and returns the parameter set, for chaining.
    pub fn with<T: Send + Sync + 'static>(mut self, name: impl Into<String>, value: T) -> Self {
        self.insert(name, value);
        self
    }

    /// Adds a value for the named argument, overwriting a previous one.
    pub fn insert<T: Send + Sync + 'static>(&mut self, name: impl Into<String>, value: T) {
        self.values.insert(name.into(), Arc::new(value));
    }

    /// Adds an already type-erased value for the named argument.
    pub fn insert_value(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Returns the value for the named argument, if one was supplied.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns true if a value was supplied for the named argument.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns the number of supplied arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no arguments were supplied.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameters")
            .field("names", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

///////////////////////////////////////////////////////////////////////////////
// Tests
///////////////////////////////////////////////////////////////////////////////
