use super::utils::{build_bundle, content_type_for, is_plain_file_name, upload_file_name};
use super::TaskManager;
use crate::analysis::{DataPoint, TableRow};
use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::core::{
    NewTask, Page, Task, TaskChanges, TaskDetails, TaskFilter, TaskKind, TaskPayload,
    TaskResult, TaskStatus,
};
use crate::db::{GroupRepository, TaskRepository, TemplateRepository};
use crate::errors::Error;
use crate::templates::{self, RenderedTemplate};
use crate::utils::join_url;
use diesel::sqlite::SqliteConnection;
use serde::Deserialize;
use tracing::{info, warn};

/// An uploaded chart image and the task fields sent with it
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub name: String,
    /// Client-side file name; only its extension is kept
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub template_id: Option<String>,
    pub group_id: Option<String>,
}

/// A task whose result is supplied directly instead of analysed
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataRequest {
    #[serde(default, alias = "title")]
    pub name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub data_points: Vec<DataPoint>,
    #[serde(default)]
    pub table_data: Vec<TableRow>,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
}

/// Owner edits of a task; `null` unbinds the template or group
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTask {
    #[serde(default, alias = "title")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "crate::utils::present")]
    pub template_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::utils::present")]
    pub group_id: Option<Option<String>>,
}

impl From<UpdateTask> for TaskChanges {
    fn from(update: UpdateTask) -> Self {
        TaskChanges {
            name: update.name,
            template_id: update.template_id,
            group_id: update.group_id,
        }
    }
}

impl TaskManager {
    /// Stores an uploaded image, creates a QUEUED task and enqueues it
    ///
    /// # Arguments
    /// * `user_id` - Owner of the new task
    /// * `request` - Image bytes and task fields
    ///
    /// # Errors
    /// * `Error::Validation` for a blank name or an empty file
    /// * `Error::NotFound` if the template or group is not visible to the caller
    pub async fn create_upload_task(
        &self,
        user_id: &str,
        request: UploadRequest,
    ) -> Result<Task, Error> {
        let name = required_name(&request.name)?;
        if request.file_name.trim().is_empty() || request.bytes.is_empty() {
            return Err(Error::validation("Please select a valid image file"));
        }
        {
            let mut conn = self.database.get_conn()?;
            check_bindings(
                &mut conn,
                user_id,
                request.template_id.as_deref(),
                request.group_id.as_deref(),
            )?;
        }

        let stored_name = upload_file_name(&request.file_name);
        let public_url = join_url(&self.public_base_url, &format!("uploads/{}", stored_name))?;

        tokio::fs::create_dir_all(&self.upload_folder).await?;
        let target = self.upload_folder.join(&stored_name);
        tokio::fs::write(&target, &request.bytes).await?;
        let image_path = tokio::fs::canonicalize(&target).await?;

        let inserted = self.database.get_conn().and_then(|mut conn| {
            TaskRepository::new(&mut conn).insert_task(NewTask {
                name,
                kind: TaskKind::Upload,
                status: TaskStatus::Queued,
                user_id: user_id.to_string(),
                template_id: request.template_id,
                group_id: request.group_id,
                image_url: Some(public_url.clone()),
            })
        });
        let task = match inserted {
            Ok(task) => task,
            Err(e) => {
                if let Err(remove_err) = tokio::fs::remove_file(&image_path).await {
                    warn!("Failed to remove orphan upload {}: {}", stored_name, remove_err);
                }
                return Err(e);
            }
        };

        info!("Created upload task {} for user {}", task.id, user_id);
        self.worker
            .enqueue(TaskPayload::new(&task.id, image_path, public_url));
        Ok(task)
    }

    /// Creates a COMPLETED task from caller-supplied metadata
    ///
    /// The task never enters the queue.
    ///
    /// # Errors
    /// * `Error::Validation` for a blank name or summary
    /// * `Error::NotFound` if the template or group is not visible to the caller
    pub fn create_metadata_task(
        &self,
        user_id: &str,
        request: MetadataRequest,
    ) -> Result<TaskDetails, Error> {
        let name = required_name(&request.name)?;
        let summary = request.summary.trim().to_string();
        if summary.is_empty() {
            return Err(Error::validation("Summary cannot be empty"));
        }

        let mut conn = self.database.get_conn()?;
        check_bindings(
            &mut conn,
            user_id,
            request.template_id.as_deref(),
            request.group_id.as_deref(),
        )?;

        let new_task = NewTask {
            name,
            kind: TaskKind::Metadata,
            status: TaskStatus::Completed,
            user_id: user_id.to_string(),
            template_id: request.template_id,
            group_id: request.group_id,
            image_url: None,
        };
        let (data_points, table_data) = (request.data_points, request.table_data);
        let (task, result) =
            TaskRepository::new(&mut conn).insert_task_with_result(new_task, |task| {
                Ok(TaskResult::from_metadata(
                    &task.id,
                    summary,
                    data_points,
                    table_data,
                ))
            })?;

        info!("Created metadata task {} for user {}", task.id, user_id);
        Ok(TaskDetails {
            task,
            result: Some(result),
        })
    }

    /// Retrieves one of the caller's tasks with its result
    pub fn get_task(&self, user_id: &str, task_id: &str) -> Result<TaskDetails, Error> {
        let mut conn = self.database.get_conn()?;
        let mut repo = TaskRepository::new(&mut conn);
        let task = repo.get_task(user_id, task_id)?;
        let result = repo.get_result(&task.id)?;
        Ok(TaskDetails { task, result })
    }

    /// Lists the caller's tasks, newest first
    ///
    /// `page` defaults to 1 and `per_page` to 12, capped at 50.
    pub fn list_tasks(
        &self,
        user_id: &str,
        filter: &TaskFilter,
        page: Option<i64>,
        per_page: Option<i64>,
    ) -> Result<Page<TaskDetails>, Error> {
        let page = page.unwrap_or(1).max(1);
        let per_page = per_page.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

        let mut conn = self.database.get_conn()?;
        let mut repo = TaskRepository::new(&mut conn);
        let listed = repo.list_tasks(user_id, filter, page, per_page)?;
        let ids: Vec<String> = listed.items.iter().map(|t| t.id.clone()).collect();
        let mut results = repo.get_results_for(&ids)?;

        let items = listed
            .items
            .into_iter()
            .map(|task| {
                let result = results.remove(&task.id);
                TaskDetails { task, result }
            })
            .collect();
        Ok(Page::new(items, listed.page, per_page, listed.total))
    }

    /// Renames a task or rebinds its template or group
    pub fn update_task(
        &self,
        user_id: &str,
        task_id: &str,
        changes: TaskChanges,
    ) -> Result<TaskDetails, Error> {
        let mut conn = self.database.get_conn()?;
        check_bindings(
            &mut conn,
            user_id,
            changes.template_id.as_ref().and_then(|t| t.as_deref()),
            changes.group_id.as_ref().and_then(|g| g.as_deref()),
        )?;

        let mut repo = TaskRepository::new(&mut conn);
        let task = repo.update_task(user_id, task_id, &changes)?;
        let result = repo.get_result(&task.id)?;
        Ok(TaskDetails { task, result })
    }

    /// Cancels a QUEUED or PROCESSING task
    ///
    /// An in-flight analysis keeps running; its outcome is dropped at commit.
    pub fn cancel_task(&self, user_id: &str, task_id: &str) -> Result<Task, Error> {
        let mut conn = self.database.get_conn()?;
        let task = TaskRepository::new(&mut conn).cancel_task(user_id, task_id)?;
        info!("Task {} cancelled", task.id);
        Ok(task)
    }

    /// Soft-deletes a task
    pub fn delete_task(&self, user_id: &str, task_id: &str) -> Result<(), Error> {
        let mut conn = self.database.get_conn()?;
        TaskRepository::new(&mut conn).soft_delete_task(user_id, task_id)?;
        info!("Task {} deleted", task_id);
        Ok(())
    }

    /// Renders one of the caller's visible templates against a task
    ///
    /// # Errors
    /// * `Error::NotFound` if the task or template is not visible
    /// * `Error::NotReady` if the task has no result yet
    /// * `Error::GenerationFailed` if the task failed
    pub fn render_template(
        &self,
        user_id: &str,
        task_id: &str,
        template_id: &str,
    ) -> Result<RenderedTemplate, Error> {
        let mut conn = self.database.get_conn()?;
        let mut repo = TaskRepository::new(&mut conn);
        let task = repo.get_task(user_id, task_id)?;
        let result = repo.get_result(&task.id)?;
        let template = TemplateRepository::new(&mut conn).get_visible(user_id, template_id)?;

        templates::render(&template, &task, result.as_ref())
    }

    /// Builds the zip bundle of a successful task
    ///
    /// # Returns
    /// The suggested file name and the archive bytes
    pub fn download_bundle(&self, user_id: &str, task_id: &str) -> Result<(String, Vec<u8>), Error> {
        let details = self.get_task(user_id, task_id)?;
        let result = match details.result {
            Some(result) if result.is_success => result,
            Some(result) => {
                return Err(Error::GenerationFailed(
                    result.error_message.unwrap_or_default(),
                ))
            }
            None => return Err(Error::NotReady),
        };

        let bytes = build_bundle(&result)?;
        Ok((format!("task-{}-bundle.zip", details.task.id), bytes))
    }

    /// Reads an uploaded image back
    ///
    /// # Returns
    /// The file bytes and their content type
    pub async fn read_upload(&self, file_name: &str) -> Result<(Vec<u8>, &'static str), Error> {
        if !is_plain_file_name(file_name) {
            return Err(Error::not_found("Upload", file_name));
        }
        match tokio::fs::read(self.upload_folder.join(file_name)).await {
            Ok(bytes) => Ok((bytes, content_type_for(file_name))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::not_found("Upload", file_name))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn required_name(name: &str) -> Result<String, Error> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Task name cannot be empty"));
    }
    Ok(name.to_string())
}

/// Checks that a template and group the caller wants to bind are visible
///
/// An unusable reference surfaces as `Error::NotFound`, like any other
/// reference the caller cannot see.
fn check_bindings(
    conn: &mut SqliteConnection,
    user_id: &str,
    template_id: Option<&str>,
    group_id: Option<&str>,
) -> Result<(), Error> {
    if let Some(template_id) = template_id {
        TemplateRepository::new(conn).get_visible(user_id, template_id)?;
    }
    if let Some(group_id) = group_id {
        GroupRepository::new(conn).get_group(user_id, group_id)?;
    }
    Ok(())
}
