//! In-process async task queue adapter.
//!
//! Models at-least-once delivery without requiring an external broker: a
//! bounded worker pool (a [`tokio::sync::Semaphore`] permit per in-flight
//! task) pulls from an unbounded `tokio::mpsc` channel, enforces the
//! per-task-kind timeout from [`Task::timeout`], and requeues on a transient
//! failure up to `QueueConfig::max_retries` times.
//!
//! The queue itself holds no pipeline state -- it only knows how to dispatch
//! a [`Task`] to whatever [`TaskHandler`] the caller supplies. `soar-server`
//! wires a handler that delegates `ProcessAlert` to `soar-playbook` and
//! `RunAction` to `soar-action`.

mod error;
mod task;

pub use error::TaskError;
pub use task::Task;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as Json;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Semaphore;
use tracing::{error, instrument, warn};

use soar_core::{ActionType, AlertId, CaseId};

/// Handles one dispatched [`Task`]. Implementations must not panic; a panic
/// inside a handler aborts only that task's `tokio::spawn`'d future, not the
/// dispatcher.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, task: Task) -> Result<(), TaskError>;
}

/// Tuning knobs for the worker pool.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Maximum number of tasks executing concurrently.
    pub workers: usize,
    /// Maximum number of redelivery attempts after a transient failure or timeout.
    pub max_retries: u32,
    /// Delay before a requeued task is redelivered.
    pub retry_backoff: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            max_retries: 3,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

struct Envelope {
    task: Task,
    attempt: u32,
}

/// The task queue handle held by the process that enqueues work (the
/// webhook ingestor and the admin action-trigger endpoint, via `soar-server`).
pub struct TaskQueue {
    tx: UnboundedSender<Envelope>,
}

impl TaskQueue {
    /// Spawn the dispatch loop and return a handle for enqueuing work.
    ///
    /// The returned `Arc<TaskQueue>` can be cloned cheaply; the dispatch loop
    /// runs for the lifetime of the process (or until every sender, including
    /// the one retained internally for retries, is dropped).
    #[must_use]
    pub fn spawn(handler: Arc<dyn TaskHandler>, config: QueueConfig) -> Arc<Self> {
        Self::spawn_cyclic(config, |_queue| handler)
    }

    /// Spawn the dispatch loop, handing the not-yet-running queue handle to
    /// `build_handler` so it can build a [`TaskHandler`] that itself needs to
    /// enqueue work back onto this queue (`soar-playbook`'s orchestrator
    /// enqueues `run_action` tasks, so `soar-server`'s wiring needs the queue
    /// handle before the handler it dispatches into can be constructed).
    #[must_use]
    pub fn spawn_cyclic<F>(config: QueueConfig, build_handler: F) -> Arc<Self>
    where
        F: FnOnce(Arc<Self>) -> Arc<dyn TaskHandler>,
    {
        let (tx, rx) = mpsc::unbounded_channel::<Envelope>();
        let queue = Arc::new(Self { tx: tx.clone() });
        let handler = build_handler(Arc::clone(&queue));
        tokio::spawn(dispatch_loop(rx, tx, handler, config));
        queue
    }

    /// Enqueue a `process_alert(alert_id)` task.
    pub fn enqueue_process_alert(&self, alert_id: AlertId) {
        self.send(Task::ProcessAlert { alert_id });
    }

    /// Enqueue a `run_action(case_id, action_type, params)` task.
    pub fn enqueue_run_action(&self, case_id: CaseId, action_type: ActionType, params: Json) {
        self.send(Task::RunAction { case_id, action_type, params });
    }

    fn send(&self, task: Task) {
        let name = task.name();
        if self.tx.send(Envelope { task, attempt: 0 }).is_err() {
            error!(task = name, "task queue dispatcher has shut down, dropping enqueue");
        }
    }
}

async fn dispatch_loop(
    mut rx: UnboundedReceiver<Envelope>,
    tx: UnboundedSender<Envelope>,
    handler: Arc<dyn TaskHandler>,
    config: QueueConfig,
) {
    let semaphore = Arc::new(Semaphore::new(config.workers.max(1)));

    while let Some(envelope) = rx.recv().await {
        let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
            break;
        };
        let handler = Arc::clone(&handler);
        let tx = tx.clone();
        let max_retries = config.max_retries;
        let retry_backoff = config.retry_backoff;

        tokio::spawn(async move {
            let _permit = permit;
            run_one(envelope, &handler, &tx, max_retries, retry_backoff).await;
        });
    }
}

#[instrument(skip(envelope, handler, tx), fields(task = envelope.task.name(), attempt = envelope.attempt))]
async fn run_one(
    envelope: Envelope,
    handler: &Arc<dyn TaskHandler>,
    tx: &UnboundedSender<Envelope>,
    max_retries: u32,
    retry_backoff: Duration,
) {
    let name = envelope.task.name();
    let timeout = envelope.task.timeout();
    let attempt = envelope.attempt;
    let task = envelope.task.clone();

    let outcome = tokio::time::timeout(timeout, handler.handle(task)).await;

    match outcome {
        Ok(Ok(())) => {
            metrics::counter!("queue_tasks_total", "task" => name, "outcome" => "ok").increment(1);
        }
        Ok(Err(TaskError::Fatal(msg))) => {
            metrics::counter!("queue_tasks_total", "task" => name, "outcome" => "fatal").increment(1);
            error!(task = name, error = %msg, "fatal task error, not retrying");
        }
        Ok(Err(TaskError::Transient(msg))) => {
            metrics::counter!("queue_tasks_total", "task" => name, "outcome" => "transient").increment(1);
            warn!(task = name, attempt, error = %msg, "transient task error");
            requeue(tx, envelope.task, attempt, max_retries, retry_backoff).await;
        }
        Err(_elapsed) => {
            metrics::counter!("queue_tasks_total", "task" => name, "outcome" => "timeout").increment(1);
            warn!(task = name, attempt, ?timeout, "task exceeded its deadline");
            requeue(tx, envelope.task, attempt, max_retries, retry_backoff).await;
        }
    }
}

async fn requeue(
    tx: &UnboundedSender<Envelope>,
    task: Task,
    attempt: u32,
    max_retries: u32,
    retry_backoff: Duration,
) {
    if attempt >= max_retries {
        error!(task = task.name(), attempt, "task exhausted retries, dropping");
        return;
    }
    tokio::time::sleep(retry_backoff).await;
    let _ = tx.send(Envelope { task, attempt: attempt + 1 });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct CountingHandler {
        calls: AtomicUsize,
        fail_until: usize,
    }

    #[async_trait]
    impl TaskHandler for CountingHandler {
        async fn handle(&self, _task: Task) -> Result<(), TaskError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.fail_until {
                Err(TaskError::Transient("not yet".to_string()))
            } else {
                Ok(())
            }
        }
    }

    struct RecordingHandler {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TaskHandler for RecordingHandler {
        async fn handle(&self, task: Task) -> Result<(), TaskError> {
            self.seen.lock().unwrap().push(task.name().to_string());
            if let Task::RunAction { action_type, .. } = task
                && action_type == ActionType::Notify
            {
                return Err(TaskError::Fatal("unsupported in test".to_string()));
            }
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried_until_success() {
        let handler = Arc::new(CountingHandler { calls: AtomicUsize::new(0), fail_until: 2 });
        let queue = TaskQueue::spawn(
            handler.clone(),
            QueueConfig { workers: 1, max_retries: 5, retry_backoff: Duration::from_millis(10) },
        );

        queue.enqueue_process_alert(AlertId::new());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(handler.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_stop_redelivery() {
        let handler = Arc::new(CountingHandler { calls: AtomicUsize::new(0), fail_until: 100 });
        let queue = TaskQueue::spawn(
            handler.clone(),
            QueueConfig { workers: 1, max_retries: 2, retry_backoff: Duration::from_millis(5) },
        );

        queue.enqueue_process_alert(AlertId::new());

        tokio::time::sleep(Duration::from_millis(100)).await;
        // initial attempt + 2 retries = 3 calls, then no more.
        assert_eq!(handler.calls.load(Ordering::SeqCst), 3);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(handler.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_errors_are_not_retried() {
        let handler = Arc::new(RecordingHandler { seen: Mutex::new(Vec::new()) });
        let queue = TaskQueue::spawn(
            Arc::clone(&handler) as Arc<dyn TaskHandler>,
            QueueConfig::default(),
        );

        queue.enqueue_run_action(CaseId::new(), ActionType::Notify, serde_json::json!({}));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(handler.seen.lock().unwrap().len(), 1);
    }
}
