use crate::errors::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a chart task
///
/// The numeric codes are what gets persisted and what the API exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum TaskStatus {
    /// Waiting in the worker queue
    Queued = 0,
    /// Claimed by the worker, analysis in flight
    Processing = 1,
    /// Result materialized successfully
    Completed = 2,
    /// Result materialized with an error message
    Failed = 3,
    /// Cancelled by the owner before a result was committed
    Cancelled = 4,
}

impl TaskStatus {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }

    /// Only queued or in-flight tasks may be cancelled
    pub fn is_cancellable(self) -> bool {
        matches!(self, TaskStatus::Queued | TaskStatus::Processing)
    }

    /// Returns whether moving from `self` to `next` is a legal transition
    ///
    /// Creation-time states (QUEUED for uploads, COMPLETED for metadata
    /// tasks) are not transitions and are not covered here.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Queued, Processing)
                | (Queued, Cancelled)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Processing, Cancelled)
        )
    }
}

impl TryFrom<i32> for TaskStatus {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TaskStatus::Queued),
            1 => Ok(TaskStatus::Processing),
            2 => Ok(TaskStatus::Completed),
            3 => Ok(TaskStatus::Failed),
            4 => Ok(TaskStatus::Cancelled),
            other => Err(Error::validation(format!("unknown task status {}", other))),
        }
    }
}

impl From<TaskStatus> for i32 {
    fn from(status: TaskStatus) -> Self {
        status.code()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskStatus::Queued => "Queued",
            TaskStatus::Processing => "Processing",
            TaskStatus::Completed => "Completed",
            TaskStatus::Failed => "Failed",
            TaskStatus::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    /// Accepts either the numeric code or the state name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<i32>() {
            return TaskStatus::try_from(code);
        }
        match s.to_ascii_lowercase().as_str() {
            "queued" => Ok(TaskStatus::Queued),
            "processing" => Ok(TaskStatus::Processing),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            "cancelled" => Ok(TaskStatus::Cancelled),
            _ => Err(Error::validation(format!("invalid status filter '{}'", s))),
        }
    }
}

/// How a task was created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum TaskKind {
    /// An uploaded chart image that goes through the worker
    Upload = 0,
    /// Caller-supplied summary and data, completed on creation
    Metadata = 1,
}

impl TaskKind {
    /// Persisted integer code
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for TaskKind {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TaskKind::Upload),
            1 => Ok(TaskKind::Metadata),
            other => Err(Error::validation(format!("unknown task kind {}", other))),
        }
    }
}

impl From<TaskKind> for i32 {
    fn from(kind: TaskKind) -> Self {
        kind.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_transitions_follow_the_lifecycle() {
        assert!(TaskStatus::Queued.can_transition_to(TaskStatus::Processing));
        assert!(TaskStatus::Processing.can_transition_to(TaskStatus::Completed));
        assert!(TaskStatus::Processing.can_transition_to(TaskStatus::Failed));
        assert!(!TaskStatus::Queued.can_transition_to(TaskStatus::Completed));
        assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::Processing));
        assert!(!TaskStatus::Failed.can_transition_to(TaskStatus::Completed));
    }

    #[test]
    fn terminal_states_cannot_be_cancelled() {
        for status in [
            TaskStatus::Completed,
            TaskStatus::Failed,
            TaskStatus::Cancelled,
        ] {
            assert!(status.is_terminal());
            assert!(!status.is_cancellable());
            assert!(!status.can_transition_to(TaskStatus::Cancelled));
        }
        assert!(TaskStatus::Queued.is_cancellable());
        assert!(TaskStatus::Processing.is_cancellable());
    }

    #[test]
    fn status_codes_are_stable() {
        for code in 0..=4 {
            let status = TaskStatus::try_from(code).unwrap();
            assert_eq!(status.code(), code);
        }
        assert!(TaskStatus::try_from(9).is_err());
        assert_eq!("2".parse::<TaskStatus>().unwrap(), TaskStatus::Completed);
        assert_eq!(
            "cancelled".parse::<TaskStatus>().unwrap(),
            TaskStatus::Cancelled
        );
        assert!("paused".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn kind_codes_round_trip() {
        assert_eq!(TaskKind::Upload.code(), 0);
        assert_eq!(TaskKind::Metadata.code(), 1);
        assert_eq!(TaskKind::try_from(1).unwrap(), TaskKind::Metadata);
        assert!(TaskKind::try_from(2).is_err());
    }

    #[test]
    fn status_serializes_as_its_code() {
        let json = serde_json::to_string(&TaskStatus::Failed).unwrap();
        assert_eq!(json, "3");
        let back: TaskStatus = serde_json::from_str("1").unwrap();
        assert_eq!(back, TaskStatus::Processing);
    }
}
