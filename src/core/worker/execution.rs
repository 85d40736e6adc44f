use super::{failed_outcome, task_completion, ChartResult, ProcessingOutcome, WorkerContext};
use crate::codegen::build_accessible_code;
use crate::core::{Task, TaskPayload};
use crate::db::{Claim, TaskRepository};
use crate::errors::Error;
use crate::event::{SkipReason, WorkerEvent};
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Runs one dequeued payload from claim to commit
///
/// # Arguments
/// * `context` - Worker dependencies
/// * `payload` - The dequeued queue entry
/// * `events` - Channel receiving the lifecycle events of this payload
pub(super) async fn process_payload(
    context: WorkerContext,
    payload: TaskPayload,
    events: broadcast::Sender<WorkerEvent>,
) {
    let task = match claim(&context, &payload.task_id) {
        Ok(Claim::Claimed(task)) => task,
        Ok(Claim::Skipped(reason)) => {
            debug!("Skipping task {}: {:?}", payload.task_id, reason);
            let _ = events.send(WorkerEvent::Skipped(payload.task_id, reason));
            return;
        }
        Err(e) => {
            error!(
                "Failed to claim task {}, it stays QUEUED: {}",
                payload.task_id, e
            );
            let reason = SkipReason::ClaimFailed(e.to_string());
            let _ = events.send(WorkerEvent::Skipped(payload.task_id, reason));
            return;
        }
    };

    info!("Processing task {} ({})", task.id, task.name);
    let _ = events.send(WorkerEvent::Started(task.id.clone()));

    match analyze(&context, &task, &payload).await {
        ProcessingOutcome::Success(chart) => {
            task_completion::complete_task(&context, &events, &task, chart)
        }
        ProcessingOutcome::Failure(failure) => {
            failed_outcome::record_failure(&context, &events, &task.id, failure)
        }
    }
}

fn claim(context: &WorkerContext, task_id: &str) -> Result<Claim, Error> {
    let mut conn = context.database.get_conn()?;
    TaskRepository::new(&mut conn).claim_for_processing(task_id)
}

/// Invokes the analyzer, then the code generator on its output
///
/// An analysis that outlives `slow_task_warning` is reported once and then
/// awaited to completion.
async fn analyze(context: &WorkerContext, task: &Task, payload: &TaskPayload) -> ProcessingOutcome {
    let started = Instant::now();
    let analysis = context.analyzer.analyze(&payload.image_path);
    tokio::pin!(analysis);

    let analysis = match tokio::time::timeout(context.slow_task_warning, &mut analysis).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                "Analysis of task {} is still running after {}",
                task.id,
                humantime::format_duration(context.slow_task_warning)
            );
            analysis.await
        }
    };

    match analysis {
        Ok(analysis) => {
            debug!(
                "Analysis of task {} produced {} points in {:?}",
                task.id,
                analysis.data_points.len(),
                started.elapsed()
            );
            let code = build_accessible_code(
                &payload.public_image_url,
                &analysis.summary,
                &analysis.data_points,
            );
            ProcessingOutcome::Success(ChartResult { analysis, code })
        }
        Err(e) => ProcessingOutcome::Failure(e.into()),
    }
}
