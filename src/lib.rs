//! Named service bindings with singleton and factory resolution.
//!
//! # Features
//!
//! * Bind identifiers to literal values, factories, class definitions or
//!   references to other identifiers
//! * Singleton bookkeeping: flagged identifiers resolve to one shared
//!   instance, even through fresh construction
//! * Explicit argument overrides per construction, with every other
//!   dependency injected from the container
//! * Cycle detection across class dependencies, references and factories
//! * An open extension surface that forwards engine-specific methods
//!   verbatim
//!
//! # Creating a Container
//!
//! To create a container without any configuration, use
//! [`Container::new()`]. Bindings are registered with [`Container::bind`]
//! and resolved with [`Container::get`].
//!
//! ```rust
//! use bindery::{Container, Implementation};
//!
//! let container = Container::new();
//! container.bind("greeting", Implementation::value("hello"));
//!
//! let greeting = container.get("greeting").unwrap();
//! assert_eq!(*greeting.downcast_ref::<&str>().unwrap(), "hello");
//! ```
//!
//! To register bindings declaratively, use the [`ContainerBuilder`].
//!
//! # Singletons and fresh instances
//!
//! [`Container::singleton`] flags an identifier so that every resolution
//! shares one instance. [`Container::make`] constructs fresh instances, but
//! degrades to [`Container::get`] for flagged identifiers: the cached
//! instance wins over fresh construction.
//!
//! ```rust
//! use bindery::{Container, Implementation, Parameters, Value};
//! use std::sync::Arc;
//!
//! let container = Container::new();
//! container.singleton(
//!     "config",
//!     Implementation::factory(|_, _| {
//!         let config: Value = Arc::new(String::from("prod"));
//!         Ok(config)
//!     }),
//! );
//!
//! let first = container.get("config").unwrap();
//! let second = container.make("config", Parameters::new()).unwrap();
//! assert!(Arc::ptr_eq(&first, &second));
//! ```
//!
//! # Class definitions and parameters
//!
//! A [`ClassDefinition`] names its constructor dependencies. During
//! construction each one is taken from the call's [`Parameters`] when named
//! there and resolved through the container otherwise, so callers can pin
//! individual arguments without rebinding anything.
//!
//! # Engines
//!
//! Actual construction is the job of a resolution engine, see [`IEngine`].
//! [`RegistryEngine`] is the engine used by [`Container::new()`]; containers
//! can wrap any other engine through [`Container::with_engine`].

mod binding;
mod builder;
mod container;
mod engine;
mod error;
mod parameters;
mod registry;


pub use crate::binding::{ClassDefinition, Factory, Implementation, Value};
pub use crate::builder::ContainerBuilder;
pub use crate::container::Container;
pub use crate::engine::IEngine;
pub use crate::error::{ContainerError, DynError};
pub use crate::parameters::Parameters;
pub use crate::registry::{Extension, RegistryEngine, Resolver};
