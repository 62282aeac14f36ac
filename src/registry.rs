//! The reference resolution engine.

use crate::binding::{Implementation, Value};
use crate::engine::IEngine;
use crate::error::{ContainerError, DynError};
use crate::parameters::Parameters;
use fnv::FnvHashMap;
use log::trace;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// An engine-specific extension method, reachable through [`IEngine::call`].
pub type Extension = Arc<dyn Fn(&[Value]) -> Result<Value, DynError> + Send + Sync>;

///////////////////////////////////////////////////////////////////////////////
// Registry Engine
///////////////////////////////////////////////////////////////////////////////

/// The resolution engine backing [`Container`] by default.
///
/// Keeps a table of definitions and a cache of shared instances.
/// Construction walks the dependency graph of class definitions and
/// references and reports cycles as resolution failures. First-time
/// construction is serialized, so concurrent shared resolution of one
/// identifier constructs at most once.
///
/// [`Container`]: crate::Container
#[derive(Default)]
pub struct RegistryEngine {
    /// The registered definitions.
    definitions: RwLock<FnvHashMap<String, Implementation>>,
    /// Shared instances, one per identifier resolved through `get`.
    instances: RwLock<FnvHashMap<String, Value>>,
    /// Named extension methods.
    extensions: RwLock<FnvHashMap<String, Extension>>,
    /// Serializes construction.
    build: Mutex<()>,
}

impl RegistryEngine {
    /// Creates a new, empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine with reserved capacity for the given number of
    /// definitions.
    pub fn with_capacity(capacity: usize) -> Self {
        RegistryEngine {
            definitions: RwLock::new(FnvHashMap::with_capacity_and_hasher(
                capacity,
                Default::default(),
            )),
            instances: RwLock::new(FnvHashMap::with_capacity_and_hasher(
                capacity,
                Default::default(),
            )),
            extensions: RwLock::new(FnvHashMap::default()),
            build: Mutex::new(()),
        }
    }

    /// Registers a named extension method.
    ///
    /// A method registered under an existing name overwrites it.
    pub fn register_extension<F>(&self, method: impl Into<String>, extension: F)
    where
        F: Fn(&[Value]) -> Result<Value, DynError> + Send + Sync + 'static,
    {
        self.extensions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(method.into(), Arc::new(extension));
    }

    ///////////////////////////////////////////////////////////////////////////
    // Meta Data Getters
    ///////////////////////////////////////////////////////////////////////////

    /// Returns the number of registered definitions.
    pub fn num_definitions(&self) -> usize {
        self.definitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns the number of shared instances currently cached.
    pub fn num_instances(&self) -> usize {
        self.instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    ///////////////////////////////////////////////////////////////////////////
    // Resolution
    ///////////////////////////////////////////////////////////////////////////

    fn cached(&self, id: &str) -> Option<Value> {
        self.instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn definition(&self, id: &str) -> Option<Implementation> {
        self.definitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Resolves an identifier.
    ///
    /// `shared` selects the cache-backed path; fresh construction skips the
    /// cache in both directions. `stack` holds the identifiers currently
    /// being constructed, for cycle detection.
    fn resolve(
        &self,
        id: &str,
        parameters: &Parameters,
        shared: bool,
        stack: &mut Vec<String>,
    ) -> Result<Value, ContainerError> {
        if shared {
            if let Some(instance) = self.cached(id) {
                return Ok(instance);
            }
        }

        if stack.iter().any(|pending| pending == id) {
            return Err(ContainerError::resolution(
                id,
                format!("circular dependency: {} -> {}", stack.join(" -> "), id),
            ));
        }

        let definition = self
            .definition(id)
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;

        trace!(
            "constructing `{}` ({})",
            id,
            if shared { "shared" } else { "fresh" }
        );

        let depth = stack.len();
        stack.push(id.to_string());
        let constructed = self.construct(id, definition, parameters, shared, stack);
        stack.truncate(depth);
        let instance = constructed?;

        if shared {
            self.instances
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(id.to_string(), instance.clone());
        }

        Ok(instance)
    }

    fn construct(
        &self,
        id: &str,
        definition: Implementation,
        parameters: &Parameters,
        shared: bool,
        stack: &mut Vec<String>,
    ) -> Result<Value, ContainerError> {
        match definition {
            Implementation::Value(value) => Ok(value),

            Implementation::Factory(factory) => {
                let mut resolver = Resolver {
                    engine: self,
                    stack,
                };
                (*factory)(&mut resolver, parameters)
                    .map_err(|source| ContainerError::resolution(id, source))
            }

            Implementation::Class(class) => {
                let empty = Parameters::new();
                let mut arguments = Vec::with_capacity(class.dependencies().len());
                for dependency in class.dependencies() {
                    let argument = match parameters.get(dependency) {
                        Some(explicit) => explicit.clone(),
                        None => self.resolve(dependency, &empty, true, stack)?,
                    };
                    arguments.push(argument);
                }
                class
                    .construct(arguments)
                    .map_err(|source| ContainerError::resolution(id, source))
            }

            Implementation::Reference(target) => self.resolve(&target, parameters, shared, stack),
        }
    }
}

impl IEngine for RegistryEngine {
    fn set(&self, id: &str, implementation: Option<Implementation>) {
        let implementation =
            implementation.unwrap_or_else(|| Implementation::Reference(id.to_string()));
        self.definitions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string(), implementation);
        // An overwritten definition must not keep serving the old instance.
        self.instances
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
    }

    fn has(&self, id: &str) -> bool {
        self.definitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    fn get(&self, id: &str) -> Result<Value, ContainerError> {
        if let Some(instance) = self.cached(id) {
            return Ok(instance);
        }
        let _build = self.build.lock().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have finished constructing while we waited.
        if let Some(instance) = self.cached(id) {
            return Ok(instance);
        }
        self.resolve(id, &Parameters::new(), true, &mut Vec::new())
    }

    fn make(&self, id: &str, parameters: &Parameters) -> Result<Value, ContainerError> {
        let _build = self.build.lock().unwrap_or_else(PoisonError::into_inner);
        self.resolve(id, parameters, false, &mut Vec::new())
    }

    fn call(&self, method: &str, arguments: &[Value]) -> Result<Value, ContainerError> {
        let extension = self
            .extensions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(method)
            .cloned();
        match extension {
            Some(extension) => (*extension)(arguments)
                .map_err(|source| ContainerError::resolution(method, source)),
            None => Err(ContainerError::UnknownMethod(method.to_string())),
        }
    }
}

impl fmt::Debug for RegistryEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEngine")
            .field("definitions", &self.num_definitions())
            .field("instances", &self.num_instances())
            .finish()
    }
}

///////////////////////////////////////////////////////////////////////////////
// Resolver
///////////////////////////////////////////////////////////////////////////////

/// Hands a factory access back into the engine while it is constructing.
///
/// The resolver carries the in-progress construction stack, so dependency
/// cycles that run through factories are detected like any other cycle.
pub struct Resolver<'a> {
    engine: &'a RegistryEngine,
    stack: &'a mut Vec<String>,
}

impl Resolver<'_> {
    /// Shared resolution, like [`IEngine::get`].
    pub fn get(&mut self, id: &str) -> Result<Value, ContainerError> {
        self.engine.resolve(id, &Parameters::new(), true, self.stack)
    }

    /// Fresh construction, like [`IEngine::make`].
    pub fn make(&mut self, id: &str, parameters: &Parameters) -> Result<Value, ContainerError> {
        self.engine.resolve(id, parameters, false, self.stack)
    }
}

///////////////////////////////////////////////////////////////////////////////
// Tests
///////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::ClassDefinition;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn number(n: u32) -> Value {
        Arc::new(n)
    }

    #[test]
    fn get_value_definition() {
        let engine = RegistryEngine::new();
        engine.set("port", Some(Implementation::value(8080u32)));

        let value = engine.get("port").unwrap();
        assert_eq!(*value.downcast_ref::<u32>().unwrap(), 8080);
    }

    #[test]
    fn get_unknown_is_not_found() {
        let engine = RegistryEngine::new();
        let err = engine.get("missing").unwrap_err();
        assert!(matches!(err, ContainerError::NotFound(id) if id == "missing"));
    }

    #[test]
    fn get_caches_make_does_not() {
        let constructions = Arc::new(AtomicUsize::new(0));
        let counter = constructions.clone();

        let engine = RegistryEngine::new();
        engine.set(
            "service",
            Some(Implementation::factory(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(number(1))
            })),
        );

        let first = engine.get("service").unwrap();
        let second = engine.get("service").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(constructions.load(Ordering::SeqCst), 1);
        assert_eq!(engine.num_instances(), 1);

        let third = engine.make("service", &Parameters::new()).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(constructions.load(Ordering::SeqCst), 2);
        // Fresh construction must not replace the shared instance.
        assert!(Arc::ptr_eq(&first, &engine.get("service").unwrap()));
    }

    #[test]
    fn set_drops_the_cached_instance() {
        let engine = RegistryEngine::new();
        engine.set("port", Some(Implementation::value(80u32)));

        let old = engine.get("port").unwrap();
        assert_eq!(engine.num_instances(), 1);

        engine.set("port", Some(Implementation::value(8080u32)));
        let new = engine.get("port").unwrap();

        assert!(!Arc::ptr_eq(&old, &new));
        assert_eq!(*new.downcast_ref::<u32>().unwrap(), 8080);
    }

    #[test]
    fn class_dependencies_resolve_through_the_engine() {
        let engine = RegistryEngine::new();
        engine.set("base", Some(Implementation::value(40u32)));
        engine.set(
            "sum",
            Some(Implementation::class(ClassDefinition::new(
                ["base", "extra"],
                |arguments| {
                    let base = *arguments[0].downcast_ref::<u32>().ok_or("base must be a u32")?;
                    let extra = *arguments[1].downcast_ref::<u32>().ok_or("extra must be a u32")?;
                    Ok(Arc::new(base + extra) as Value)
                },
            ))),
        );

        let params = Parameters::new().with("extra", 2u32);
        let value = engine.make("sum", &params).unwrap();
        assert_eq!(*value.downcast_ref::<u32>().unwrap(), 42);
    }

    #[test]
    fn missing_class_dependency_is_not_found() {
        let engine = RegistryEngine::new();
        engine.set(
            "service",
            Some(Implementation::class(ClassDefinition::new(
                ["missing"],
                |arguments| Ok(arguments[0].clone()),
            ))),
        );

        let err = engine.make("service", &Parameters::new()).unwrap_err();
        assert!(matches!(err, ContainerError::NotFound(id) if id == "missing"));
    }

    #[test]
    fn factory_error_becomes_resolution_error() {
        let engine = RegistryEngine::new();
        engine.set(
            "db",
            Some(Implementation::factory(|_, _| Err("connection refused".into()))),
        );

        let err = engine.get("db").unwrap_err();
        match err {
            ContainerError::Resolution { id, source } => {
                assert_eq!(id, "db");
                assert_eq!(source.to_string(), "connection refused");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        // The failed construction must not be cached.
        assert_eq!(engine.num_instances(), 0);
    }

    #[test]
    fn factories_resolve_through_the_resolver() {
        let engine = RegistryEngine::new();
        engine.set("prefix", Some(Implementation::value("db-")));
        engine.set(
            "name",
            Some(Implementation::factory(|resolver, _| {
                let prefix = resolver.get("prefix")?;
                let prefix = prefix.downcast_ref::<&str>().ok_or("prefix must be a str")?;
                Ok(Arc::new(format!("{}primary", prefix)) as Value)
            })),
        );

        let value = engine.get("name").unwrap();
        assert_eq!(value.downcast_ref::<String>().unwrap(), "db-primary");
    }

    #[test]
    fn reference_resolves_its_target() {
        let engine = RegistryEngine::new();
        engine.set("db", Some(Implementation::value(1u32)));
        engine.set("database", Some(Implementation::reference("db")));

        let value = engine.get("database").unwrap();
        assert_eq!(*value.downcast_ref::<u32>().unwrap(), 1);
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let engine = RegistryEngine::new();
        engine.set("db", None);

        let err = engine.get("db").unwrap_err();
        match err {
            ContainerError::Resolution { id, source } => {
                assert_eq!(id, "db");
                assert!(source.to_string().contains("circular dependency"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn class_cycle_reports_the_chain() {
        let engine = RegistryEngine::new();
        engine.set(
            "a",
            Some(Implementation::class(ClassDefinition::new(
                ["b"],
                |arguments| Ok(arguments[0].clone()),
            ))),
        );
        engine.set(
            "b",
            Some(Implementation::class(ClassDefinition::new(
                ["a"],
                |arguments| Ok(arguments[0].clone()),
            ))),
        );

        let err = engine.get("a").unwrap_err();
        match err {
            ContainerError::Resolution { source, .. } => {
                assert!(source.to_string().contains("a -> b -> a"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn extensions_are_callable() {
        let engine = RegistryEngine::new();
        engine.register_extension("sum", |arguments| {
            let mut total = 0u32;
            for argument in arguments {
                total += argument.downcast_ref::<u32>().ok_or("arguments must be u32")?;
            }
            Ok(Arc::new(total) as Value)
        });

        let args: Vec<Value> = vec![Arc::new(40u32), Arc::new(2u32)];
        let value = engine.call("sum", &args).unwrap();
        assert_eq!(*value.downcast_ref::<u32>().unwrap(), 42);

        let err = engine.call("missing", &[]).unwrap_err();
        assert!(matches!(err, ContainerError::UnknownMethod(method) if method == "missing"));
    }
}
