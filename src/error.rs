//! Errors that can occur while publishing, acquiring, or invoking through a
//! capability table.
//!
//! All of these stem from build or deployment mismatches between producer and
//! consumer, not transient conditions; none is retriable.

use thiserror::Error;

pub type ExchangeResult<T> = Result<T, ExchangeError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExchangeError {
    #[error("module not found: {module}")]
    ModuleNotFound { module: String },

    #[error("module {module} does not publish attribute {attribute}")]
    AttributeMissing { module: String, attribute: String },

    #[error("attribute {attribute} on module {module} is a {actual}, expected a {expected}")]
    TypeMismatch {
        module: String,
        attribute: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("module {module} publishes {actual} capabilities, expected {expected}")]
    TableShapeMismatch {
        module: String,
        expected: usize,
        actual: usize,
    },

    #[error("module {module} does not publish capability {capability}")]
    CapabilityMissing { module: String, capability: String },

    #[error("capability {capability} does not match expectation: {detail}")]
    SignatureMismatch { capability: String, detail: String },

    #[error("capability index {index} out of bounds for table of {len} entries")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("{function} expects {expected} arguments, got {actual}")]
    ArityMismatch {
        function: String,
        expected: String,
        actual: usize,
    },

    #[error("{operation}: expected {expected}, got {actual}")]
    TypeError {
        expected: String,
        actual: String,
        operation: String,
    },

    #[error("capability {capability} is already registered")]
    DuplicateCapability { capability: String },

    #[error("no capability table acquired")]
    NotAcquired,

    #[error("internal error: {0}")]
    InternalError(String),
}
