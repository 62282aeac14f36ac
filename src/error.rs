//! Errors reported by binding and resolution operations.

use std::error::Error as StdError;
use thiserror::Error;

/// A type-erased error produced by factories, class constructors and engine
/// extensions.
pub type DynError = Box<dyn StdError + Send + Sync>;

/// The error type for all container and engine operations.
///
/// Every variant names the identifier (or method) it failed on. A failed
/// operation does not invalidate the container: further calls behave as if
/// the failing one never happened.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// The identifier is empty or malformed.
    #[error("invalid identifier {0:?}")]
    InvalidArgument(String),

    /// No binding is registered for the identifier.
    #[error("no binding registered for `{0}`")]
    NotFound(String),

    /// The engine failed to construct a value for the identifier.
    #[error("failed to resolve `{id}`")]
    Resolution {
        /// The identifier that failed to resolve.
        id: String,
        /// The underlying construction failure.
        #[source]
        source: DynError,
    },

    /// The engine does not provide the requested extension method.
    #[error("unknown engine method `{0}`")]
    UnknownMethod(String),
}

impl ContainerError {
    /// Creates a resolution error for the given identifier.
    pub fn resolution(id: impl Into<String>, source: impl Into<DynError>) -> Self {
        ContainerError::Resolution {
            id: id.into(),
            source: source.into(),
        }
    }
}

///////////////////////////////////////////////////////////////////////////////
// Tests
///////////////////////////////////////////////////////////////////////////////
