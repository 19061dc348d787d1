use thiserror::Error;

/// Errors surfaced by [`crate::ActionExecutor::run_action`].
///
/// Only `Storage` can reach the caller: invalid input (missing param,
/// unknown `action_type`) and handler failures are captured *inside* the
/// terminal `Action` row, not propagated as an `Err` here.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("case not found: {0}")]
    CaseNotFound(String),

    #[error(transparent)]
    Storage(#[from] soar_state::StateError),
}
