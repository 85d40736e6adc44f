use crate::codegen::CodeLanguage;
use crate::core::{Group, Task, TaskKind, TaskResult, TaskStatus};
use crate::errors::Error;
use crate::schema::{chart_groups, task_results, tasks, templates};
use crate::templates::CodeTemplate;
use crate::utils::parse_timestamp;
use diesel::{AsChangeset, Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};

/// Represents a task in the database
#[derive(
    Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, AsChangeset, Insertable,
)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TaskRow {
    pub id: String,
    pub name: String,
    /// `TaskKind` code
    pub kind: i32,
    /// `TaskStatus` code
    pub status: i32,
    pub user_id: String,
    pub template_id: Option<String>,
    pub group_id: Option<String>,
    pub image_url: Option<String>,
    pub is_deleted: bool,
    /// RFC 3339 creation timestamp
    pub created_at: String,
    /// RFC 3339 timestamp of the last write
    pub updated_at: String,
}

impl TryFrom<TaskRow> for Task {
    type Error = Error;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Task {
            kind: TaskKind::try_from(row.kind).map_err(corrupt)?,
            status: TaskStatus::try_from(row.status).map_err(corrupt)?,
            created_at: parse_timestamp(&row.created_at).map_err(corrupt)?,
            updated_at: parse_timestamp(&row.updated_at).map_err(corrupt)?,
            id: row.id,
            name: row.name,
            user_id: row.user_id,
            template_id: row.template_id,
            group_id: row.group_id,
            image_url: row.image_url,
            is_deleted: row.is_deleted,
        })
    }
}

/// Represents the materialized result of a task in the database
///
/// Collections are stored as JSON text.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, AsChangeset, Insertable)]
#[diesel(table_name = task_results)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct TaskResultRow {
    pub id: String,
    pub task_id: String,
    pub is_success: bool,
    pub summary: String,
    pub description: String,
    pub data_points: String,
    pub table_data: String,
    pub generated_code: Option<String>,
    pub integration_doc: Option<String>,
    pub rendered_template: Option<String>,
    pub error_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TaskResultRow {
    /// Serializes a result for storage under row id `id`
    pub fn from_result(result: &TaskResult, id: String, now: &str) -> Result<Self, Error> {
        let generated_code = if result.generated_code.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&result.generated_code)?)
        };
        let integration_doc = if result.integration_doc.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&result.integration_doc)?)
        };

        Ok(TaskResultRow {
            id,
            task_id: result.task_id.clone(),
            is_success: result.is_success,
            summary: result.summary.clone(),
            description: result.description.clone(),
            data_points: serde_json::to_string(&result.data_points)?,
            table_data: serde_json::to_string(&result.table_data)?,
            generated_code,
            integration_doc,
            rendered_template: result.rendered_template.clone(),
            error_message: result.error_message.clone(),
            created_at: now.to_string(),
            updated_at: now.to_string(),
        })
    }
}

impl TryFrom<TaskResultRow> for TaskResult {
    type Error = Error;

    fn try_from(row: TaskResultRow) -> Result<Self, Self::Error> {
        let result = TaskResult {
            data_points: serde_json::from_str(&row.data_points)?,
            table_data: serde_json::from_str(&row.table_data)?,
            generated_code: match row.generated_code {
                Some(json) => serde_json::from_str(&json)?,
                None => Default::default(),
            },
            integration_doc: match row.integration_doc {
                Some(json) => serde_json::from_str(&json)?,
                None => Default::default(),
            },
            task_id: row.task_id,
            is_success: row.is_success,
            summary: row.summary,
            description: row.description,
            rendered_template: row.rendered_template,
            error_message: row.error_message,
        };
        result.check_consistency()?;
        Ok(result)
    }
}

/// Represents a code template in the database
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, AsChangeset, Insertable)]
#[diesel(table_name = templates)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TemplateRow {
    pub id: String,
    pub name: String,
    pub language: String,
    pub content: String,
    pub is_system: bool,
    pub user_id: Option<String>,
    pub is_deleted: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<TemplateRow> for CodeTemplate {
    type Error = Error;

    fn try_from(row: TemplateRow) -> Result<Self, Self::Error> {
        Ok(CodeTemplate {
            language: row.language.parse::<CodeLanguage>().map_err(corrupt)?,
            created_at: parse_timestamp(&row.created_at).map_err(corrupt)?,
            updated_at: parse_timestamp(&row.updated_at).map_err(corrupt)?,
            id: row.id,
            name: row.name,
            content: row.content,
            is_system: row.is_system,
            user_id: row.user_id,
            is_deleted: row.is_deleted,
        })
    }
}

/// Represents a group node in the database
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, AsChangeset, Insertable)]
#[diesel(table_name = chart_groups)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GroupRow {
    pub id: String,
    pub name: String,
    pub user_id: String,
    pub parent_id: Option<String>,
    pub is_deleted: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<GroupRow> for Group {
    type Error = Error;

    fn try_from(row: GroupRow) -> Result<Self, Self::Error> {
        Ok(Group {
            created_at: parse_timestamp(&row.created_at).map_err(corrupt)?,
            updated_at: parse_timestamp(&row.updated_at).map_err(corrupt)?,
            id: row.id,
            name: row.name,
            user_id: row.user_id,
            parent_id: row.parent_id,
            is_deleted: row.is_deleted,
        })
    }
}

/// Stored values that fail to decode are internal faults, not caller errors
fn corrupt(err: Error) -> Error {
    match err {
        Error::Internal(_) => err,
        other => Error::Internal(format!("corrupt row: {}", other)),
    }
}
