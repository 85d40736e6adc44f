use super::{ChartResult, WorkerContext};
use crate::core::{Task, TaskResult, TaskStatus};
use crate::db::{Commit, TaskRepository, TemplateRepository};
use crate::errors::Error;
use crate::event::WorkerEvent;
use crate::templates;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Materializes a successful analysis and commits it
///
/// When the task is bound to a template the rendered text is stored with
/// the result. A template that cannot be rendered only produces a warning.
pub(super) fn complete_task(
    context: &WorkerContext,
    events: &broadcast::Sender<WorkerEvent>,
    task: &Task,
    chart: ChartResult,
) {
    let mut result = TaskResult::success(&task.id, chart.analysis, chart.code);

    if let Some(template_id) = task.template_id.as_deref() {
        match render_bound_template(context, task, template_id, &result) {
            Ok(rendered) => result = result.with_rendered_template(rendered),
            Err(e) => warn!(
                "Skipping template {} for task {}: {}",
                template_id, task.id, e
            ),
        }
    }

    commit(context, events, &result);
}

fn render_bound_template(
    context: &WorkerContext,
    task: &Task,
    template_id: &str,
    result: &TaskResult,
) -> Result<String, Error> {
    let template = {
        let mut conn = context.database.get_conn()?;
        TemplateRepository::new(&mut conn).get_visible(&task.user_id, template_id)?
    };
    Ok(templates::render(&template, task, Some(result))?.content)
}

/// Writes `result` in one immediate transaction and reports what happened
pub(super) fn commit(
    context: &WorkerContext,
    events: &broadcast::Sender<WorkerEvent>,
    result: &TaskResult,
) {
    let task_id = result.task_id.clone();
    let committed = context
        .database
        .get_conn()
        .and_then(|mut conn| TaskRepository::new(&mut conn).commit_outcome(result));

    let event = match committed {
        Ok(Commit::Committed(TaskStatus::Completed)) => {
            info!("Task {} completed", task_id);
            WorkerEvent::Completed(task_id)
        }
        Ok(Commit::Committed(status)) => {
            info!("Task {} stored as {}", task_id, status);
            WorkerEvent::Failed(task_id, result.error_message.clone().unwrap_or_default())
        }
        Ok(Commit::Discarded(status)) => {
            info!(
                "Dropping outcome of task {}: it is now {}",
                task_id, status
            );
            WorkerEvent::Discarded(task_id, status)
        }
        Err(e) if result.is_success => {
            error!("Failed to store result of task {}: {}", task_id, e);
            let fallback =
                TaskResult::failure(&task_id, format!("Failed to store result: {}", e));
            commit(context, events, &fallback);
            return;
        }
        Err(e) => {
            error!(
                "Failed to store failure of task {}, it stays PROCESSING: {}",
                task_id, e
            );
            return;
        }
    };
    let _ = events.send(event);
}
