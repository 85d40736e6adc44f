use super::task_result::TaskResult;
use super::task_state::{TaskKind, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A chart processing request and its lifecycle state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier
    pub id: String,
    /// Display name chosen by the owner
    pub name: String,
    pub kind: TaskKind,
    pub status: TaskStatus,
    /// Owning user, as established by the auth layer
    pub user_id: String,
    /// Template rendered into the result once processing completes
    pub template_id: Option<String>,
    pub group_id: Option<String>,
    /// Public URL of the uploaded chart image
    pub image_url: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Deleted tasks are invisible to every operation
    pub fn is_visible(&self) -> bool {
        !self.is_deleted
    }
}

/// A task together with its materialized result, as returned to owners
#[derive(Debug, Clone, Serialize)]
pub struct TaskDetails {
    #[serde(flatten)]
    pub task: Task,
    pub result: Option<TaskResult>,
}

/// Message handed from the producer to the worker
///
/// Lives for exactly one queue entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPayload {
    pub task_id: String,
    /// Absolute path of the stored chart image
    pub image_path: PathBuf,
    /// URL embedded in the generated code
    pub public_image_url: String,
}

impl TaskPayload {
    pub fn new(
        task_id: impl Into<String>,
        image_path: impl Into<PathBuf>,
        public_image_url: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            image_path: image_path.into(),
            public_image_url: public_image_url.into(),
        }
    }
}

/// Fields needed to create a task record
#[derive(Debug, Clone)]
pub struct NewTask {
    pub name: String,
    pub kind: TaskKind,
    pub status: TaskStatus,
    pub user_id: String,
    pub template_id: Option<String>,
    pub group_id: Option<String>,
    pub image_url: Option<String>,
}

/// Partial update applied by the owner
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub name: Option<String>,
    /// `Some(None)` unbinds the template
    pub template_id: Option<Option<String>>,
    /// `Some(None)` moves the task out of its group
    pub group_id: Option<Option<String>>,
}

/// Filters accepted by task listings
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Matches the task name or the result summary
    pub keyword: Option<String>,
    pub task_name: Option<String>,
    pub status: Option<TaskStatus>,
    pub group_id: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub updated_from: Option<DateTime<Utc>>,
    pub updated_to: Option<DateTime<Utc>>,
}

/// One page of a listing
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub pages: i64,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: i64, per_page: i64, total: i64) -> Self {
        let pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };
        Self {
            items,
            page,
            pages,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up() {
        let page: Page<u8> = Page::new(vec![], 1, 12, 25);
        assert_eq!(page.pages, 3);
        let empty: Page<u8> = Page::new(vec![], 1, 12, 0);
        assert_eq!(empty.pages, 0);
    }
}
