use thiserror::Error;

/// Errors surfaced by a `CaseStore` implementation.
#[derive(Debug, Error)]
pub enum StateError {
    /// The referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A transient storage error that the task runtime should retry. The
    /// in-memory backend never produces this variant itself; it exists for
    /// backends with a real I/O boundary (a Postgres pool, a network call)
    /// to surface through.
    #[error("transient storage error: {0}")]
    Transient(String),
}
