use super::task_completion::commit;
use super::{ProcessingFailure, WorkerContext};
use crate::core::TaskResult;
use crate::event::WorkerEvent;
use tokio::sync::broadcast;
use tracing::warn;

/// Stores a failed result for `task_id`, replacing any previous one
///
/// The task moves to FAILED unless it was cancelled or deleted meanwhile.
///
/// # Arguments
/// * `context` - Worker dependencies
/// * `events` - Event channel of the worker
/// * `task_id` - The claimed task
/// * `failure` - What went wrong; its message becomes the stored error
pub(super) fn record_failure(
    context: &WorkerContext,
    events: &broadcast::Sender<WorkerEvent>,
    task_id: &str,
    failure: ProcessingFailure,
) {
    warn!("Task {} failed: {}", task_id, failure);
    let result = TaskResult::failure(task_id, failure.to_string());
    commit(context, events, &result);
}
