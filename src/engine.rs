//! The resolution engine contract.

use crate::binding::{Implementation, Value};
use crate::error::ContainerError;
use crate::parameters::Parameters;

/// A resolution engine: the collaborator that turns definitions into values.
///
/// The [`Container`] delegates every operation to an engine and only layers
/// singleton bookkeeping on top. Engines are synchronous and in-memory: a
/// method either returns or fails, it never suspends.
///
/// [`Container`]: crate::Container
pub trait IEngine {
    /// Registers or overwrites the definition for an identifier.
    ///
    /// `None` records a self-referential definition: the engine decides what
    /// that means. The [`RegistryEngine`] treats it like
    /// `Implementation::Reference(id)`.
    ///
    /// [`RegistryEngine`]: crate::RegistryEngine
    fn set(&self, id: &str, implementation: Option<Implementation>);

    /// Returns whether a definition exists, without resolving anything.
    fn has(&self, id: &str) -> bool;

    /// Shared resolution.
    ///
    /// The first call constructs the value and caches it; every later call
    /// returns the cached instance. Overwriting the definition with
    /// [`IEngine::set`] drops the cached instance.
    fn get(&self, id: &str) -> Result<Value, ContainerError>;

    /// Fresh construction.
    ///
    /// Constructs a new value on every call, neither reading nor populating
    /// the shared-instance cache. Arguments named in `parameters` are used
    /// directly, everything else is resolved through the engine.
    fn make(&self, id: &str, parameters: &Parameters) -> Result<Value, ContainerError>;

    /// Invokes an engine-specific extension method.
    ///
    /// Arguments and return value pass through verbatim. Engines without the
    /// named method fail with [`ContainerError::UnknownMethod`], which is
    /// also the default.
    fn call(&self, method: &str, _arguments: &[Value]) -> Result<Value, ContainerError> {
        Err(ContainerError::UnknownMethod(method.to_string()))
    }
}
