//! What an identifier resolves to.

use crate::error::DynError;
use crate::parameters::Parameters;
use crate::registry::Resolver;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

///////////////////////////////////////////////////////////////////////////////
// Value Types
///////////////////////////////////////////////////////////////////////////////

/// A resolved value.
///
/// Values are type-erased and shared. Two resolutions return "the same
/// instance" when their values are pointer-equal, see [`Arc::ptr_eq`].
pub type Value = Arc<dyn Any + Send + Sync>;

/// A callable that produces a value on every invocation.
///
/// The [`Resolver`] gives the factory access back into the engine, so it can
/// pull its own dependencies. The [`Parameters`] are the explicit argument
/// overrides of the construction that invoked the factory.
pub type Factory =
    Arc<dyn Fn(&mut Resolver<'_>, &Parameters) -> Result<Value, DynError> + Send + Sync>;

type Constructor = Arc<dyn Fn(Vec<Value>) -> Result<Value, DynError> + Send + Sync>;

///////////////////////////////////////////////////////////////////////////////
// Class Definitions
///////////////////////////////////////////////////////////////////////////////

/// A class descriptor: named constructor dependencies plus a constructor.
///
/// Dependencies are identifiers. During construction each one is taken from
/// the call's [`Parameters`] when named there, and resolved through the
/// engine otherwise. The constructor receives the values in declaration
/// order.
#[derive(Clone)]
pub struct ClassDefinition {
    dependencies: Vec<String>,
    constructor: Constructor,
}

impl ClassDefinition {
    /// Creates a class definition from its dependencies and constructor.
    pub fn new<I, S, F>(dependencies: I, constructor: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(Vec<Value>) -> Result<Value, DynError> + Send + Sync + 'static,
    {
        Self {
            dependencies: dependencies.into_iter().map(Into::into).collect(),
            constructor: Arc::new(constructor),
        }
    }

    /// The named constructor dependencies, in positional order.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Invokes the constructor with the resolved arguments.
    pub(crate) fn construct(&self, arguments: Vec<Value>) -> Result<Value, DynError> {
        (*self.constructor)(arguments)
    }
}

impl fmt::Debug for ClassDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDefinition")
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

///////////////////////////////////////////////////////////////////////////////
// Implementations
///////////////////////////////////////////////////////////////////////////////

/// How an identifier produces its value.
#[derive(Clone)]
pub enum Implementation {
    /// A literal value, returned as-is on every resolution.
    Value(Value),
    /// A factory, invoked once per construction.
    Factory(Factory),
    /// A class definition with constructor injection.
    Class(ClassDefinition),
    /// Another identifier that is resolved in place of this one.
    Reference(String),
}

impl Implementation {
    /// Wraps a literal value.
    pub fn value<T: Send + Sync + 'static>(value: T) -> Self {
        Implementation::Value(Arc::new(value))
    }

    /// Wraps an already type-erased value.
    pub fn from_value(value: Value) -> Self {
        Implementation::Value(value)
    }

    /// Wraps a factory.
    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn(&mut Resolver<'_>, &Parameters) -> Result<Value, DynError> + Send + Sync + 'static,
    {
        Implementation::Factory(Arc::new(factory))
    }

    /// Wraps a class definition.
    pub fn class(definition: ClassDefinition) -> Self {
        Implementation::Class(definition)
    }

    /// Refers to another identifier.
    pub fn reference(target: impl Into<String>) -> Self {
        Implementation::Reference(target.into())
    }
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Implementation::Value(_) => f.write_str("Implementation::Value"),
            Implementation::Factory(_) => f.write_str("Implementation::Factory"),
            Implementation::Class(class) => {
                write!(f, "Implementation::Class({:?})", class.dependencies())
            }
            Implementation::Reference(target) => {
                write!(f, "Implementation::Reference({:?})", target)
            }
        }
    }
}

///////////////////////////////////////////////////////////////////////////////
// Tests
///////////////////////////////////////////////////////////////////////////////
