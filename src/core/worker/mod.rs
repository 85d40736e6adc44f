/// Module for running one payload through analysis and code generation
mod execution;
/// Module for recording failed processing outcomes
mod failed_outcome;
/// Module for committing successful outcomes
mod task_completion;

use crate::analysis::{AnalysisError, ChartAnalysis, ChartAnalyzer};
use crate::codegen::CodeBundle;
use crate::core::TaskPayload;
use crate::db::Database;
use crate::event::WorkerEvent;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::{broadcast, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Capacity of the event channel; slow subscribers lag rather than block
const EVENT_CAPACITY: usize = 256;

/// Default threshold after which a running analysis is reported as slow
pub const DEFAULT_SLOW_TASK_WARNING: Duration = Duration::from_secs(30);

/// Dependencies injected into the consumer loop
#[derive(Clone)]
pub struct WorkerContext {
    pub database: Database,
    pub analyzer: Arc<dyn ChartAnalyzer>,
    /// An analysis running longer than this is logged, never aborted
    pub slow_task_warning: Duration,
}

impl WorkerContext {
    pub fn new(database: Database, analyzer: Arc<dyn ChartAnalyzer>) -> Self {
        Self {
            database,
            analyzer,
            slow_task_warning: DEFAULT_SLOW_TASK_WARNING,
        }
    }

    pub fn with_slow_task_warning(mut self, threshold: Duration) -> Self {
        self.slow_task_warning = threshold;
        self
    }
}

/// Analysis output together with the code generated from it
#[derive(Debug, Clone)]
pub struct ChartResult {
    pub analysis: ChartAnalysis,
    pub code: CodeBundle,
}

/// Why processing a claimed task did not produce a result
#[derive(Debug, thiserror::Error)]
pub enum ProcessingFailure {
    #[error("{0}")]
    Analysis(#[from] AnalysisError),
    /// Anything unexpected, including a panic inside the task
    #[error("Unknown processing error: {0}")]
    Unknown(String),
}

/// Result of processing one claimed task
#[derive(Debug)]
pub enum ProcessingOutcome {
    Success(ChartResult),
    Failure(ProcessingFailure),
}

/// Single background consumer of the chart task queue
///
/// The worker owns both ends of its channel, so `enqueue` cannot fail while
/// the worker is alive. Payloads are processed strictly one at a time in
/// submission order.
pub struct ChartWorker {
    queue_tx: UnboundedSender<TaskPayload>,
    queue_rx: Arc<AsyncMutex<UnboundedReceiver<TaskPayload>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    events: broadcast::Sender<WorkerEvent>,
}

impl ChartWorker {
    pub fn new() -> Self {
        let (queue_tx, queue_rx) = unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            queue_tx,
            queue_rx: Arc::new(AsyncMutex::new(queue_rx)),
            handle: Mutex::new(None),
            events,
        }
    }

    /// Spawns the consumer loop unless one is already running
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Returns
    /// * `true` if a consumer was spawned, `false` if one was already alive
    pub fn start(&self, context: WorkerContext) -> bool {
        let mut handle = match self.handle.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if handle.as_ref().is_some_and(|h| !h.is_finished()) {
            return false;
        }

        info!("Starting chart worker with analyzer {}", context.analyzer.name());
        let queue_rx = Arc::clone(&self.queue_rx);
        let events = self.events.clone();
        *handle = Some(tokio::spawn(run_loop(queue_rx, context, events)));
        true
    }

    /// Appends a payload to the queue without blocking
    pub fn enqueue(&self, payload: TaskPayload) {
        let task_id = payload.task_id.clone();
        match self.queue_tx.send(payload) {
            Ok(()) => info!("Task {} enqueued", task_id),
            Err(e) => error!("Failed to enqueue task {}: {}", task_id, e),
        }
    }

    /// Subscribes to lifecycle events of processed payloads
    pub fn subscribe(&self) -> broadcast::Receiver<WorkerEvent> {
        self.events.subscribe()
    }
}

impl Default for ChartWorker {
    fn default() -> Self {
        Self::new()
    }
}

/// Consumer loop; each payload runs in its own tokio task so a panic is
/// contained and mapped to a failed outcome
async fn run_loop(
    queue_rx: Arc<AsyncMutex<UnboundedReceiver<TaskPayload>>>,
    context: WorkerContext,
    events: broadcast::Sender<WorkerEvent>,
) {
    let mut queue_rx = queue_rx.lock().await;
    while let Some(payload) = queue_rx.recv().await {
        let task_id = payload.task_id.clone();
        let job = tokio::spawn(execution::process_payload(
            context.clone(),
            payload,
            events.clone(),
        ));

        if let Err(e) = job.await {
            let reason = panic_message(e);
            error!("Processing of task {} aborted: {}", task_id, reason);
            failed_outcome::record_failure(
                &context,
                &events,
                &task_id,
                ProcessingFailure::Unknown(reason),
            );
        }
    }
    info!("Chart worker queue closed");
}

fn panic_message(err: tokio::task::JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "task panicked".to_string()
    }
}
