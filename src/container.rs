//! The container contract on top of a resolution engine.

use crate::binding::{Implementation, Value};
use crate::engine::IEngine;
use crate::error::ContainerError;
use crate::parameters::Parameters;
use crate::registry::RegistryEngine;
use fnv::FnvHashSet;
use log::{trace, warn};
use std::fmt;
use std::sync::{PoisonError, RwLock};

///////////////////////////////////////////////////////////////////////////////
// Container
///////////////////////////////////////////////////////////////////////////////

/// A container for named services.
///
/// Wraps a resolution engine with a uniform registration and resolution
/// contract and layers singleton semantics on top: identifiers flagged
/// through [`Container::singleton`] resolve to one shared instance, even
/// through [`Container::make`].
///
/// Everything else delegates: construction, dependency injection and the
/// shared-instance cache belong to the engine, the open extension surface
/// ([`Container::invoke`]) forwards verbatim, and the engine itself stays
/// reachable through [`Container::engine`].
pub struct Container<E: IEngine = RegistryEngine> {
    /// The engine performing actual construction.
    engine: E,
    /// Identifiers whose resolutions share a single instance.
    singletons: RwLock<FnvHashSet<String>>,
}

impl Container<RegistryEngine> {
    /// Creates a container backed by a fresh [`RegistryEngine`].
    pub fn new() -> Self {
        Self::with_engine(RegistryEngine::new())
    }

    /// Creates a container with reserved capacity for the given number of
    /// bindings.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_engine(RegistryEngine::with_capacity(capacity))
    }
}

impl Default for Container<RegistryEngine> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: IEngine> Container<E> {
    /// Wraps an existing engine.
    pub fn with_engine(engine: E) -> Self {
        Self {
            engine,
            singletons: RwLock::new(FnvHashSet::default()),
        }
    }

    /// Returns the wrapped engine, for engine-specific configuration.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    ///////////////////////////////////////////////////////////////////////////
    // Binding
    ///////////////////////////////////////////////////////////////////////////

    /// Registers or overwrites the binding for an identifier.
    ///
    /// Passing `None` leaves interpretation to the engine, which treats the
    /// identifier as a reference to itself.
    pub fn bind(&self, id: &str, implementation: impl Into<Option<Implementation>>) {
        self.engine.set(id, implementation.into());
    }

    /// Registers a binding whose resolutions all share one instance.
    ///
    /// Like [`Container::bind`], but future [`Container::get`] and
    /// [`Container::make`] calls for this identifier reuse a single cached
    /// instance. Marking an identifier a second time overwrites the previous
    /// binding and logs a warning.
    pub fn singleton(&self, id: &str, implementation: impl Into<Option<Implementation>>) {
        let first = self
            .singletons
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string());
        if !first {
            warn!("singleton `{}` bound again, overwriting the previous binding", id);
        }
        self.engine.set(id, implementation.into());
    }

    /// Returns whether a binding exists, without resolving anything.
    pub fn has(&self, id: &str) -> bool {
        self.engine.has(id)
    }

    /// Returns whether an identifier is flagged as a singleton.
    pub fn is_singleton(&self, id: &str) -> bool {
        self.singletons
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }

    ///////////////////////////////////////////////////////////////////////////
    // Resolution
    ///////////////////////////////////////////////////////////////////////////

    /// Resolves an identifier through the engine's shared path.
    ///
    /// Fails with [`ContainerError::NotFound`] when nothing is bound to the
    /// identifier and with [`ContainerError::Resolution`] when the engine
    /// cannot construct the value.
    pub fn get(&self, id: &str) -> Result<Value, ContainerError> {
        trace!("get `{}`", id);
        self.engine.get(id)
    }

    /// Constructs a fresh instance, with explicit argument overrides.
    ///
    /// Arguments named in `parameters` are used directly; every other
    /// dependency is resolved through the engine as usual.
    ///
    /// Identifiers flagged as singletons degrade to [`Container::get`]: the
    /// shared instance is returned and nothing new is constructed.
    pub fn make(&self, id: &str, parameters: Parameters) -> Result<Value, ContainerError> {
        if id.trim().is_empty() {
            return Err(ContainerError::InvalidArgument(id.to_string()));
        }
        if self.is_singleton(id) {
            trace!("make `{}` degrades to get: flagged as singleton", id);
            return self.engine.get(id);
        }
        trace!("make `{}`", id);
        self.engine.make(id, &parameters)
    }

    ///////////////////////////////////////////////////////////////////////////
    // Extension Surface
    ///////////////////////////////////////////////////////////////////////////

    /// Forwards an engine-specific method, arguments and result verbatim.
    ///
    /// This keeps every engine capability reachable through the container
    /// without enumerating it here, see [`IEngine::call`].
    pub fn invoke(&self, method: &str, arguments: &[Value]) -> Result<Value, ContainerError> {
        self.engine.call(method, arguments)
    }
}

impl<E: IEngine + fmt::Debug> fmt::Debug for Container<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("engine", &self.engine)
            .field(
                "singletons",
                &self
                    .singletons
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .len(),
            )
            .finish()
    }
}

///////////////////////////////////////////////////////////////////////////////
// Tests
///////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn bind_then_has() {
        let container = Container::new();
        assert!(!container.has("logger"));

        container.bind("logger", Implementation::value(1u32));
        assert!(container.has("logger"));
        assert!(!container.is_singleton("logger"));
    }

    #[test]
    fn singleton_sets_the_flag() {
        let container = Container::new();
        container.singleton("logger", Implementation::value(1u32));

        assert!(container.has("logger"));
        assert!(container.is_singleton("logger"));
    }

    #[test]
    fn get_unbound_is_not_found() {
        let container = Container::new();
        let err = container.get("missing").unwrap_err();
        assert!(matches!(err, ContainerError::NotFound(id) if id == "missing"));
    }

    #[test]
    fn make_rejects_empty_identifiers() {
        let container = Container::new();

        let err = container.make("", Parameters::new()).unwrap_err();
        assert!(matches!(err, ContainerError::InvalidArgument(id) if id.is_empty()));

        let err = container.make("   ", Parameters::new()).unwrap_err();
        assert!(matches!(err, ContainerError::InvalidArgument(_)));
    }

    #[test]
    fn rebinding_overwrites() {
        let container = Container::new();
        container.bind("port", Implementation::value(80u32));
        container.bind("port", Implementation::value(8080u32));

        let value = container.get("port").unwrap();
        assert_eq!(*value.downcast_ref::<u32>().unwrap(), 8080);
    }

    #[test]
    fn invoke_forwards_to_the_engine() {
        let container = Container::new();
        container
            .engine()
            .register_extension("answer", |_| Ok(Arc::new(42u32) as Value));

        let value = container.invoke("answer", &[]).unwrap();
        assert_eq!(*value.downcast_ref::<u32>().unwrap(), 42);

        let err = container.invoke("question", &[]).unwrap_err();
        assert!(matches!(err, ContainerError::UnknownMethod(method) if method == "question"));
    }
}
