use crate::core::{NewTask, Page, Task, TaskChanges, TaskFilter, TaskResult, TaskStatus};
use crate::db::models::{TaskResultRow, TaskRow};
use crate::errors::Error;
use crate::event::SkipReason;
use crate::schema::{task_results, tasks};
use crate::utils::{format_timestamp, now_timestamp, parse_timestamp};
use diesel::prelude::*;
use diesel::sqlite::{Sqlite, SqliteConnection};
use std::collections::HashMap;
use uuid::Uuid;

/// Outcome of an attempt to move a task from QUEUED to PROCESSING
#[derive(Debug, Clone, PartialEq)]
pub enum Claim {
    /// The task is now PROCESSING and belongs to the caller
    Claimed(Task),
    /// The task was left untouched
    Skipped(SkipReason),
}

/// Outcome of writing a processing result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// Result stored and task moved to the given terminal status
    Committed(TaskStatus),
    /// The task left PROCESSING (or was deleted) meanwhile; nothing was written
    Discarded(TaskStatus),
}

#[derive(AsChangeset)]
#[diesel(table_name = tasks)]
struct TaskChangeset<'c> {
    name: Option<&'c str>,
    template_id: Option<Option<&'c str>>,
    group_id: Option<Option<&'c str>>,
    updated_at: String,
}

/// Repository for managing task records in the SQLite database
pub struct TaskRepository<'a> {
    /// Database connection
    pub conn: &'a mut SqliteConnection,
}

impl<'a> TaskRepository<'a> {
    /// Creates a new TaskRepository instance
    ///
    /// # Arguments
    ///
    /// * `conn` - Mutable reference to SQLite database connection
    pub fn new(conn: &'a mut SqliteConnection) -> Self {
        TaskRepository { conn }
    }

    /// Inserts a new task record with a fresh UUID
    ///
    /// # Arguments
    ///
    /// * `new_task` - Fields of the task to create
    ///
    /// # Returns
    ///
    /// The stored task
    ///
    /// # Errors
    ///
    /// Returns an Error if database operations fail
    pub fn insert_task(&mut self, new_task: NewTask) -> Result<Task, Error> {
        let now = now_timestamp();
        let row = TaskRow {
            id: Uuid::new_v4().to_string(),
            name: new_task.name,
            kind: new_task.kind.code(),
            status: new_task.status.code(),
            user_id: new_task.user_id,
            template_id: new_task.template_id,
            group_id: new_task.group_id,
            image_url: new_task.image_url,
            is_deleted: false,
            created_at: now.clone(),
            updated_at: now,
        };

        diesel::insert_into(tasks::table)
            .values(&row)
            .execute(self.conn)?;

        Task::try_from(row)
    }

    /// Inserts a task together with its result in one transaction
    ///
    /// Used for tasks that are created already materialized.
    ///
    /// # Arguments
    ///
    /// * `new_task` - Fields of the task to create
    /// * `build_result` - Builds the result once the task id is known
    ///
    /// # Returns
    ///
    /// The stored task and its result
    ///
    /// # Errors
    ///
    /// Returns an Error if database operations fail; nothing is written then
    pub fn insert_task_with_result<F>(
        &mut self,
        new_task: NewTask,
        build_result: F,
    ) -> Result<(Task, TaskResult), Error>
    where
        F: FnOnce(&Task) -> Result<TaskResult, Error>,
    {
        self.conn.immediate_transaction(|conn| {
            let mut repo = TaskRepository::new(conn);
            let task = repo.insert_task(new_task)?;
            let result = build_result(&task)?;
            repo.upsert_result(&result)?;
            Ok((task, result))
        })
    }

    /// Loads a task by id regardless of owner or deletion
    ///
    /// # Errors
    ///
    /// Returns an Error if database operations fail or the row is corrupt
    pub fn find_task(&mut self, task_id: &str) -> Result<Option<Task>, Error> {
        self.load_row(task_id)?.map(Task::try_from).transpose()
    }

    /// Retrieves a task visible to `user_id`
    ///
    /// # Arguments
    ///
    /// * `user_id` - The caller
    /// * `task_id` - The task to look up
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when the task is missing, deleted or owned by
    /// someone else
    pub fn get_task(&mut self, user_id: &str, task_id: &str) -> Result<Task, Error> {
        let row = tasks::table
            .filter(tasks::id.eq(task_id))
            .filter(tasks::user_id.eq(user_id))
            .filter(tasks::is_deleted.eq(false))
            .select(TaskRow::as_select())
            .first(self.conn)
            .optional()?
            .ok_or_else(|| Error::not_found("Task", task_id))?;

        Task::try_from(row)
    }

    /// Atomically moves a QUEUED task to PROCESSING
    ///
    /// Missing, deleted and non-QUEUED tasks are skipped without any write.
    ///
    /// # Arguments
    ///
    /// * `task_id` - The task named by the dequeued payload
    ///
    /// # Returns
    ///
    /// Whether the task was claimed, and why not if it was skipped
    ///
    /// # Errors
    ///
    /// Returns an Error if database operations fail
    pub fn claim_for_processing(&mut self, task_id: &str) -> Result<Claim, Error> {
        self.conn.immediate_transaction(|conn| {
            let mut repo = TaskRepository::new(conn);
            let Some(row) = repo.load_row(task_id)? else {
                return Ok(Claim::Skipped(SkipReason::Missing));
            };
            if row.is_deleted {
                return Ok(Claim::Skipped(SkipReason::Deleted));
            }
            let mut task = Task::try_from(row)?;
            if task.status != TaskStatus::Queued {
                return Ok(Claim::Skipped(SkipReason::NotQueued(task.status)));
            }

            let now = now_timestamp();
            repo.set_status(task_id, TaskStatus::Processing, &now)?;
            task.status = TaskStatus::Processing;
            task.updated_at = parse_timestamp(&now)?;
            Ok(Claim::Claimed(task))
        })
    }

    /// Writes a processing result and the matching terminal status
    ///
    /// The task is re-read inside the transaction: if it is no longer
    /// PROCESSING or has been deleted the result is dropped.
    ///
    /// # Arguments
    ///
    /// * `result` - Materialized result; its success flag selects COMPLETED or FAILED
    ///
    /// # Returns
    ///
    /// Whether the result was committed or discarded
    ///
    /// # Errors
    ///
    /// Returns an Error if database operations fail or the task row is gone
    pub fn commit_outcome(&mut self, result: &TaskResult) -> Result<Commit, Error> {
        let next = if result.is_success {
            TaskStatus::Completed
        } else {
            TaskStatus::Failed
        };

        self.conn.immediate_transaction(|conn| {
            let mut repo = TaskRepository::new(conn);
            let row = repo
                .load_row(&result.task_id)?
                .ok_or_else(|| Error::not_found("Task", &result.task_id))?;
            let current = TaskStatus::try_from(row.status)?;
            if row.is_deleted || !current.can_transition_to(next) {
                return Ok(Commit::Discarded(current));
            }

            repo.upsert_result(result)?;
            repo.set_status(&result.task_id, next, &now_timestamp())?;
            Ok(Commit::Committed(next))
        })
    }

    /// Cancels a QUEUED or PROCESSING task
    ///
    /// # Arguments
    ///
    /// * `user_id` - The caller
    /// * `task_id` - The task to cancel
    ///
    /// # Returns
    ///
    /// The cancelled task
    ///
    /// # Errors
    ///
    /// * `Error::NotFound` if the task is not visible to the caller
    /// * `Error::Validation` if the task is already terminal; nothing changes
    pub fn cancel_task(&mut self, user_id: &str, task_id: &str) -> Result<Task, Error> {
        self.conn.immediate_transaction(|conn| {
            let mut repo = TaskRepository::new(conn);
            let mut task = repo.get_task(user_id, task_id)?;
            if !task.status.is_cancellable() {
                return Err(Error::validation(format!(
                    "Task in status {} cannot be cancelled",
                    task.status
                )));
            }

            let now = now_timestamp();
            repo.set_status(task_id, TaskStatus::Cancelled, &now)?;
            task.status = TaskStatus::Cancelled;
            task.updated_at = parse_timestamp(&now)?;
            Ok(task)
        })
    }

    /// Soft-deletes a task; the row and its result persist
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the task is not visible to the caller
    pub fn soft_delete_task(&mut self, user_id: &str, task_id: &str) -> Result<(), Error> {
        let updated = diesel::update(
            tasks::table
                .filter(tasks::id.eq(task_id))
                .filter(tasks::user_id.eq(user_id))
                .filter(tasks::is_deleted.eq(false)),
        )
        .set((
            tasks::is_deleted.eq(true),
            tasks::updated_at.eq(now_timestamp()),
        ))
        .execute(self.conn)?;

        if updated == 0 {
            return Err(Error::not_found("Task", task_id));
        }
        Ok(())
    }

    /// Applies owner edits (name, template binding, group)
    ///
    /// Status is never touched here.
    ///
    /// # Errors
    ///
    /// * `Error::NotFound` if the task is not visible to the caller
    /// * `Error::Validation` if the new name is blank
    pub fn update_task(
        &mut self,
        user_id: &str,
        task_id: &str,
        changes: &TaskChanges,
    ) -> Result<Task, Error> {
        if changes
            .name
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            return Err(Error::validation("Task name cannot be empty"));
        }

        self.conn.immediate_transaction(|conn| {
            let mut repo = TaskRepository::new(conn);
            repo.get_task(user_id, task_id)?;

            let changeset = TaskChangeset {
                name: changes.name.as_deref().map(str::trim),
                template_id: changes.template_id.as_ref().map(|t| t.as_deref()),
                group_id: changes.group_id.as_ref().map(|g| g.as_deref()),
                updated_at: now_timestamp(),
            };
            diesel::update(tasks::table.find(task_id))
                .set(&changeset)
                .execute(repo.conn)?;

            repo.get_task(user_id, task_id)
        })
    }

    /// Lists the caller's visible tasks, newest first
    ///
    /// # Arguments
    ///
    /// * `user_id` - The caller
    /// * `filter` - Optional keyword, name, status, group and date filters
    /// * `page` - 1-based page number
    /// * `per_page` - Page size
    ///
    /// # Errors
    ///
    /// Returns an Error if database operations fail
    pub fn list_tasks(
        &mut self,
        user_id: &str,
        filter: &TaskFilter,
        page: i64,
        per_page: i64,
    ) -> Result<Page<Task>, Error> {
        let total: i64 = filtered_tasks(user_id, filter)
            .count()
            .get_result(self.conn)?;

        let rows = filtered_tasks(user_id, filter)
            .order((tasks::created_at.desc(), tasks::id.desc()))
            .offset((page - 1).max(0) * per_page)
            .limit(per_page)
            .select(TaskRow::as_select())
            .load(self.conn)?;

        let items = rows
            .into_iter()
            .map(Task::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, page, per_page, total))
    }

    /// Inserts or replaces the single result row of a task
    ///
    /// The row id and creation time survive a replacement.
    ///
    /// # Errors
    ///
    /// Returns an Error if serialization or database operations fail
    pub fn upsert_result(&mut self, result: &TaskResult) -> Result<(), Error> {
        let now = now_timestamp();
        let existing: Option<(String, String)> = task_results::table
            .filter(task_results::task_id.eq(&result.task_id))
            .select((task_results::id, task_results::created_at))
            .first(self.conn)
            .optional()?;

        match existing {
            Some((row_id, created_at)) => {
                let mut row = TaskResultRow::from_result(result, row_id, &now)?;
                row.created_at = created_at;
                diesel::update(task_results::table.find(&row.id))
                    .set(&row)
                    .execute(self.conn)?;
            }
            None => {
                let row = TaskResultRow::from_result(result, Uuid::new_v4().to_string(), &now)?;
                diesel::insert_into(task_results::table)
                    .values(&row)
                    .execute(self.conn)?;
            }
        }
        Ok(())
    }

    /// Gets the materialized result of a task, if any
    ///
    /// # Errors
    ///
    /// Returns an Error if database operations fail or the stored row
    /// violates the success/error invariant
    pub fn get_result(&mut self, task_id: &str) -> Result<Option<TaskResult>, Error> {
        task_results::table
            .filter(task_results::task_id.eq(task_id))
            .select(TaskResultRow::as_select())
            .first(self.conn)
            .optional()?
            .map(TaskResult::try_from)
            .transpose()
    }

    /// Gets the results of several tasks keyed by task id
    pub fn get_results_for(
        &mut self,
        task_ids: &[String],
    ) -> Result<HashMap<String, TaskResult>, Error> {
        if task_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = task_results::table
            .filter(task_results::task_id.eq_any(task_ids))
            .select(TaskResultRow::as_select())
            .load(self.conn)?;

        rows.into_iter()
            .map(|row| {
                let result = TaskResult::try_from(row)?;
                Ok((result.task_id.clone(), result))
            })
            .collect()
    }

    fn load_row(&mut self, task_id: &str) -> Result<Option<TaskRow>, Error> {
        Ok(tasks::table
            .find(task_id)
            .select(TaskRow::as_select())
            .first(self.conn)
            .optional()?)
    }

    fn set_status(&mut self, task_id: &str, status: TaskStatus, now: &str) -> Result<(), Error> {
        diesel::update(tasks::table.find(task_id))
            .set((tasks::status.eq(status.code()), tasks::updated_at.eq(now)))
            .execute(self.conn)?;
        Ok(())
    }
}

/// Base listing query shared by the count and the page
fn filtered_tasks<'q>(user_id: &'q str, filter: &'q TaskFilter) -> tasks::BoxedQuery<'q, Sqlite> {
    let mut query = tasks::table
        .filter(tasks::user_id.eq(user_id))
        .filter(tasks::is_deleted.eq(false))
        .into_boxed();

    if let Some(keyword) = filter.keyword.as_deref().filter(|k| !k.trim().is_empty()) {
        let pattern = format!("%{}%", keyword.trim());
        let summary_matches = task_results::table
            .filter(task_results::summary.like(pattern.clone()))
            .select(task_results::task_id);
        query = query.filter(
            tasks::name
                .like(pattern)
                .or(tasks::id.eq_any(summary_matches)),
        );
    }
    if let Some(name) = filter.task_name.as_deref().filter(|n| !n.trim().is_empty()) {
        query = query.filter(tasks::name.like(format!("%{}%", name.trim())));
    }
    if let Some(status) = filter.status {
        query = query.filter(tasks::status.eq(status.code()));
    }
    if let Some(group_id) = filter.group_id.as_deref() {
        query = query.filter(tasks::group_id.eq(group_id));
    }
    if let Some(from) = filter.created_from {
        query = query.filter(tasks::created_at.ge(format_timestamp(from)));
    }
    if let Some(to) = filter.created_to {
        query = query.filter(tasks::created_at.le(format_timestamp(to)));
    }
    if let Some(from) = filter.updated_from {
        query = query.filter(tasks::updated_at.ge(format_timestamp(from)));
    }
    if let Some(to) = filter.updated_to {
        query = query.filter(tasks::updated_at.le(format_timestamp(to)));
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{DataPoint, TableRow};
    use crate::core::TaskKind;
    use crate::db::Database;

    fn new_task(user: &str, name: &str) -> NewTask {
        NewTask {
            name: name.to_string(),
            kind: TaskKind::Upload,
            status: TaskStatus::Queued,
            user_id: user.to_string(),
            template_id: None,
            group_id: None,
            image_url: Some("http://localhost:5000/uploads/a.png".to_string()),
        }
    }

    fn metadata_result(task: &Task, summary: &str) -> TaskResult {
        TaskResult::from_metadata(
            &task.id,
            summary.to_string(),
            vec![DataPoint {
                id: 1,
                label: "Q1".into(),
                value: 10.0,
                ..Default::default()
            }],
            vec![TableRow {
                label: "Q1".into(),
                value: 10.0,
            }],
        )
    }

    #[test]
    fn claim_moves_queued_to_processing_once() {
        let db = Database::in_memory().unwrap();
        let mut conn = db.get_conn().unwrap();
        let mut repo = TaskRepository::new(&mut conn);
        let task = repo.insert_task(new_task("u1", "chart")).unwrap();

        match repo.claim_for_processing(&task.id).unwrap() {
            Claim::Claimed(claimed) => assert_eq!(claimed.status, TaskStatus::Processing),
            other => panic!("unexpected claim {:?}", other),
        }
        assert_eq!(
            repo.claim_for_processing(&task.id).unwrap(),
            Claim::Skipped(SkipReason::NotQueued(TaskStatus::Processing))
        );
        assert_eq!(
            repo.claim_for_processing("nope").unwrap(),
            Claim::Skipped(SkipReason::Missing)
        );
    }

    #[test]
    fn deleted_tasks_are_skipped_and_invisible() {
        let db = Database::in_memory().unwrap();
        let mut conn = db.get_conn().unwrap();
        let mut repo = TaskRepository::new(&mut conn);
        let task = repo.insert_task(new_task("u1", "chart")).unwrap();
        repo.soft_delete_task("u1", &task.id).unwrap();

        assert_eq!(
            repo.claim_for_processing(&task.id).unwrap(),
            Claim::Skipped(SkipReason::Deleted)
        );
        assert!(matches!(
            repo.get_task("u1", &task.id),
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            repo.cancel_task("u1", &task.id),
            Err(Error::NotFound { .. })
        ));
        assert!(repo.find_task(&task.id).unwrap().unwrap().is_deleted);
    }

    #[test]
    fn commit_after_cancel_is_discarded() {
        let db = Database::in_memory().unwrap();
        let mut conn = db.get_conn().unwrap();
        let mut repo = TaskRepository::new(&mut conn);
        let task = repo.insert_task(new_task("u1", "chart")).unwrap();
        repo.claim_for_processing(&task.id).unwrap();
        repo.cancel_task("u1", &task.id).unwrap();

        let outcome = repo
            .commit_outcome(&TaskResult::failure(&task.id, "boom"))
            .unwrap();
        assert_eq!(outcome, Commit::Discarded(TaskStatus::Cancelled));
        assert!(repo.get_result(&task.id).unwrap().is_none());
    }

    #[test]
    fn failure_overwrites_previous_result() {
        let db = Database::in_memory().unwrap();
        let mut conn = db.get_conn().unwrap();
        let mut repo = TaskRepository::new(&mut conn);
        let task = repo.insert_task(new_task("u1", "chart")).unwrap();
        repo.upsert_result(&metadata_result(&task, "stale")).unwrap();
        repo.claim_for_processing(&task.id).unwrap();

        let outcome = repo
            .commit_outcome(&TaskResult::failure(&task.id, "decode failed"))
            .unwrap();
        assert_eq!(outcome, Commit::Committed(TaskStatus::Failed));

        let result = repo.get_result(&task.id).unwrap().unwrap();
        assert!(!result.is_success);
        assert!(result.summary.is_empty());
        assert_eq!(result.error_message.as_deref(), Some("decode failed"));
        assert_eq!(
            repo.get_task("u1", &task.id).unwrap().status,
            TaskStatus::Failed
        );
    }

    #[test]
    fn cancel_rejects_terminal_tasks() {
        let db = Database::in_memory().unwrap();
        let mut conn = db.get_conn().unwrap();
        let mut repo = TaskRepository::new(&mut conn);
        let mut completed = new_task("u1", "done");
        completed.kind = TaskKind::Metadata;
        completed.status = TaskStatus::Completed;
        let (task, _) = repo
            .insert_task_with_result(completed, |task| Ok(metadata_result(task, "ok")))
            .unwrap();

        assert!(matches!(
            repo.cancel_task("u1", &task.id),
            Err(Error::Validation(_))
        ));
        assert_eq!(
            repo.get_task("u1", &task.id).unwrap().status,
            TaskStatus::Completed
        );
    }

    #[test]
    fn listing_filters_by_owner_keyword_and_status() {
        let db = Database::in_memory().unwrap();
        let mut conn = db.get_conn().unwrap();
        let mut repo = TaskRepository::new(&mut conn);
        repo.insert_task(new_task("u1", "revenue")).unwrap();
        repo.insert_task(new_task("u2", "revenue")).unwrap();
        let mut metadata = new_task("u1", "other");
        metadata.kind = TaskKind::Metadata;
        metadata.status = TaskStatus::Completed;
        repo.insert_task_with_result(metadata, |task| {
            Ok(metadata_result(task, "Revenue grows each quarter"))
        })
        .unwrap();

        let filter = TaskFilter {
            keyword: Some("revenue".into()),
            ..Default::default()
        };
        let page = repo.list_tasks("u1", &filter, 1, 12).unwrap();
        assert_eq!(page.total, 2);

        let filter = TaskFilter {
            status: Some(TaskStatus::Queued),
            ..Default::default()
        };
        let page = repo.list_tasks("u1", &filter, 1, 12).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "revenue");
    }

    #[test]
    fn listing_pages_newest_first() {
        let db = Database::in_memory().unwrap();
        let mut conn = db.get_conn().unwrap();
        let mut repo = TaskRepository::new(&mut conn);
        for i in 0..5 {
            repo.insert_task(new_task("u1", &format!("chart {}", i)))
                .unwrap();
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        let first = repo.list_tasks("u1", &TaskFilter::default(), 1, 2).unwrap();
        assert_eq!(first.total, 5);
        assert_eq!(first.pages, 3);
        assert_eq!(first.items[0].name, "chart 4");

        let last = repo.list_tasks("u1", &TaskFilter::default(), 3, 2).unwrap();
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].name, "chart 0");
    }

    #[test]
    fn update_rebinds_and_unbinds() {
        let db = Database::in_memory().unwrap();
        let mut conn = db.get_conn().unwrap();
        let mut repo = TaskRepository::new(&mut conn);
        let task = repo.insert_task(new_task("u1", "chart")).unwrap();

        let renamed = repo
            .update_task(
                "u1",
                &task.id,
                &TaskChanges {
                    name: Some("  renamed ".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(renamed.name, "renamed");
        assert_eq!(renamed.status, TaskStatus::Queued);

        assert!(matches!(
            repo.update_task(
                "u1",
                &task.id,
                &TaskChanges {
                    name: Some(" ".into()),
                    ..Default::default()
                }
            ),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            repo.update_task("u2", &task.id, &TaskChanges::default()),
            Err(Error::NotFound { .. })
        ));
    }
}
