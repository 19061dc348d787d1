use thiserror::Error;

/// Outcome of a single task handler invocation.
///
/// `Transient` covers storage hiccups and correlation races, and is retried
/// by the dispatcher (bounded by `QueueConfig::max_retries`); `Fatal` covers
/// invalid input or a missing entity and is logged without retry.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("transient: {0}")]
    Transient(String),

    #[error("fatal: {0}")]
    Fatal(String),
}
