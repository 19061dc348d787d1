//! Wires the generic [`soar_queue::TaskHandler`] seam to the two concrete
//! pipeline stages: `process_alert` runs the playbook orchestrator,
//! `run_action` runs the action executor. Keeping this mapping outside
//! `soar-queue` is what lets the queue crate stay free of a dependency on
//! either `soar-playbook` or `soar-action`.

use std::sync::Arc;

use async_trait::async_trait;

use soar_action::{ActionError, ActionExecutor};
use soar_playbook::Orchestrator;
use soar_queue::{Task, TaskError, TaskHandler};

pub struct PipelineHandler {
    orchestrator: Arc<Orchestrator>,
    action_executor: Arc<ActionExecutor>,
}

impl PipelineHandler {
    #[must_use]
    pub fn new(orchestrator: Arc<Orchestrator>, action_executor: Arc<ActionExecutor>) -> Self {
        Self { orchestrator, action_executor }
    }
}

#[async_trait]
impl TaskHandler for PipelineHandler {
    async fn handle(&self, task: Task) -> Result<(), TaskError> {
        match task {
            Task::ProcessAlert { alert_id } => self
                .orchestrator
                .process_alert(alert_id)
                .await
                .map_err(|e| TaskError::Transient(e.to_string())),

            Task::RunAction { case_id, action_type, params } => self
                .action_executor
                .run_action(case_id, action_type, params)
                .await
                .map(|_outcome| ())
                .map_err(|e| match e {
                    // A missing case is not worth retrying; a storage hiccup is.
                    ActionError::CaseNotFound(msg) => TaskError::Fatal(msg),
                    ActionError::Storage(e) => TaskError::Transient(e.to_string()),
                }),
        }
    }
}
