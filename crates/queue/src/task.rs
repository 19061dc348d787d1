use std::time::Duration;

use serde_json::Value as Json;

use soar_core::{AlertId, CaseId, ActionType};

/// Default per-task timeouts: 30s for `process_alert`, 15s for `run_action`.
const PROCESS_ALERT_TIMEOUT: Duration = Duration::from_secs(30);
const RUN_ACTION_TIMEOUT: Duration = Duration::from_secs(15);

/// The two logical work units the pipeline dispatches.
#[derive(Debug, Clone)]
pub enum Task {
    ProcessAlert { alert_id: AlertId },
    RunAction { case_id: CaseId, action_type: ActionType, params: Json },
}

impl Task {
    /// Short name used in logs and the `queue_tasks_total` metric.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Task::ProcessAlert { .. } => "process_alert",
            Task::RunAction { .. } => "run_action",
        }
    }

    /// The cancellation deadline a dispatched task must respect.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        match self {
            Task::ProcessAlert { .. } => PROCESS_ALERT_TIMEOUT,
            Task::RunAction { .. } => RUN_ACTION_TIMEOUT,
        }
    }
}
