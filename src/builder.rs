//! Create a container with the builder pattern.

use crate::binding::{ClassDefinition, Implementation, Value};
use crate::container::Container;
use crate::error::DynError;
use crate::parameters::Parameters;
use crate::registry::{RegistryEngine, Resolver};
use fnv::FnvHashSet;

/// Create a container with the builder pattern.
///
/// Collects bindings and singleton flags up front and registers them all
/// when [`ContainerBuilder::build`] is called. Registration order is kept,
/// so a later binding for the same identifier overwrites an earlier one,
/// exactly like imperative [`Container::bind`] calls.
#[derive(Debug, Default)]
pub struct ContainerBuilder {
    bindings: Vec<(String, Option<Implementation>)>,
    singletons: FnvHashSet<String>,
}

impl ContainerBuilder {
    /// Creates a new ContainerBuilder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a literal value.
    pub fn with_value<T: Send + Sync + 'static>(self, id: impl Into<String>, value: T) -> Self {
        self.with_implementation(id, Implementation::value(value))
    }

    /// Registers a factory.
    pub fn with_factory<F>(self, id: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&mut Resolver<'_>, &Parameters) -> Result<Value, DynError> + Send + Sync + 'static,
    {
        self.with_implementation(id, Implementation::factory(factory))
    }

    /// Registers a class definition.
    pub fn with_class(self, id: impl Into<String>, definition: ClassDefinition) -> Self {
        self.with_implementation(id, Implementation::class(definition))
    }

    /// Registers a reference to another identifier.
    pub fn with_reference(self, id: impl Into<String>, target: impl Into<String>) -> Self {
        self.with_implementation(id, Implementation::reference(target))
    }

    /// Registers any implementation for an identifier.
    pub fn with_implementation(
        mut self,
        id: impl Into<String>,
        implementation: impl Into<Option<Implementation>>,
    ) -> Self {
        self.bindings.push((id.into(), implementation.into()));
        self
    }

    /// Registers a binding and flags it as a singleton.
    pub fn with_singleton(
        mut self,
        id: impl Into<String>,
        implementation: impl Into<Option<Implementation>>,
    ) -> Self {
        let id = id.into();
        self.singletons.insert(id.clone());
        self.bindings.push((id, implementation.into()));
        self
    }

    /// Builds the container.
    pub fn build(self) -> Container<RegistryEngine> {
        let ContainerBuilder {
            bindings,
            singletons,
        } = self;

        let container = Container::with_capacity(bindings.len());
        for (id, implementation) in bindings {
            if singletons.contains(&id) {
                container.singleton(&id, implementation);
            } else {
                container.bind(&id, implementation);
            }
        }
        container
    }
}

///////////////////////////////////////////////////////////////////////////////
// Tests
///////////////////////////////////////////////////////////////////////////////
