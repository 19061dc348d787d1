use thiserror::Error;

/// Errors surfaced by [`crate::Orchestrator::process_alert`].
///
/// An alert that no longer exists or is already `processed` is handled
/// in-band (logged, metric recorded, `Ok(())` returned) rather than surfaced
/// here -- both are a no-op, not a failure.
#[derive(Debug, Error)]
pub enum PlaybookError {
    #[error(transparent)]
    Storage(#[from] soar_state::StateError),
}
