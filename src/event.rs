use crate::core::TaskStatus;

/// Why the worker dropped a payload without touching its task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No task row with that id
    Missing,
    /// The task was soft-deleted
    Deleted,
    /// The task was not QUEUED at claim time (usually cancelled)
    NotQueued(TaskStatus),
    /// The claim itself failed; the task is left QUEUED and is not retried
    ClaimFailed(String),
}

/// Lifecycle notifications published by the worker
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    /// A task was claimed and its analysis is starting
    Started(String),

    /// A payload was dequeued but its task was not claimable
    Skipped(String, SkipReason),

    /// The task was committed as COMPLETED
    Completed(String),

    /// The task was committed as FAILED with the given message
    Failed(String, String),

    /// Processing finished but the task changed underneath (cancelled or
    /// deleted), so the outcome was discarded
    Discarded(String, TaskStatus),
}

impl WorkerEvent {
    pub fn task_id(&self) -> &str {
        match self {
            WorkerEvent::Started(id)
            | WorkerEvent::Skipped(id, _)
            | WorkerEvent::Completed(id)
            | WorkerEvent::Failed(id, _)
            | WorkerEvent::Discarded(id, _) => id,
        }
    }

    /// Whether this is the last event emitted for its payload
    pub fn is_final(&self) -> bool {
        !matches!(self, WorkerEvent::Started(_))
    }
}
