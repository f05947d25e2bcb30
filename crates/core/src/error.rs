//! Error types for the collation data library.

use thiserror::Error;

/// Main error type for building and reading collation data.
///
/// The type is `Clone` so that a builder can keep the first failure and hand
/// out copies of it from every later call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollationError {
    /// A growable store could not be extended
    #[error("Allocation failure: {0}")]
    Allocation(String),

    /// Invalid input, such as an empty CE sequence
    #[error("Illegal argument: {0}")]
    IllegalArgument(String),

    /// An index does not fit into the CE32 index field
    #[error("Index overflow: {what} exceeds maximum of {max:#x}")]
    IndexOverflow { what: &'static str, max: u32 },

    /// Primary weight arithmetic left the 32-bit weight space
    #[error("Primary weight overflow: {primary:#010x} + {offset:#x} exceeds 32 bits")]
    PrimaryOverflow { primary: u32, offset: u64 },

    /// Operation not allowed in the current builder state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The data exists but has a shape the operation does not support
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Output buffer too small; `required` is the size to retry with
    #[error("Buffer too small: need {required} units, have {capacity}")]
    BufferOverflow { required: usize, capacity: usize },

    /// Error loading serialized data
    #[error("Load error: {0}")]
    Load(String),

    /// Error saving serialized data
    #[error("Save error: {0}")]
    Save(String),
}

impl From<std::collections::TryReserveError> for CollationError {
    fn from(err: std::collections::TryReserveError) -> Self {
        CollationError::Allocation(err.to_string())
    }
}

/// Result type alias for collation data operations.
pub type Result<T> = std::result::Result<T, CollationError>;
