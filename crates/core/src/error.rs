use thiserror::Error;

/// Error kinds shared across the alert pipeline that don't belong to any one
/// crate's own error enum -- the common taxonomy at the boundary between
/// crates.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A required field was missing or an `action_type` was not recognized.
    #[error("invalid input: {0}")]
    InputInvalid(String),

    /// The referenced alert or case does not exist.
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    /// Configuration was malformed or incomplete.
    #[error("configuration error: {0}")]
    Configuration(String),
}
