//! Code templates and the placeholder rendering engine
//!
//! A template body is checked against [`REQUIRED_PLACEHOLDERS`] when it is
//! created or updated. Rendering is a single explicit substitution pass over
//! a fixed set of keys:
//!
//! | placeholder     | value                                  |
//! |-----------------|----------------------------------------|
//! | `{title}`       | task name                              |
//! | `{summary}`     | result summary                         |
//! | `{description}` | result description                     |
//! | `{table_data}`  | JSON array of `{label, value}`         |
//! | `{data_points}` | JSON array of data points              |
//! | `{image_url}`   | public chart image URL                 |
//! | `{language}`    | the template's language tag            |

mod placeholders;

use crate::codegen::CodeLanguage;
use crate::constants::REQUIRED_PLACEHOLDERS;
use crate::core::{Task, TaskResult};
use crate::errors::Error;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub use placeholders::{substitute, PlaceholderValues};

/// A user- or system-owned code template
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeTemplate {
    pub id: String,
    pub name: String,
    pub language: CodeLanguage,
    pub content: String,
    pub is_system: bool,
    /// Owner; `None` for system templates
    pub user_id: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CodeTemplate {
    /// System templates are visible to everyone, user templates to their owner
    pub fn is_visible_to(&self, user_id: &str) -> bool {
        if self.is_deleted {
            return false;
        }
        self.is_system || self.user_id.as_deref() == Some(user_id)
    }
}

/// Output of a render call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedTemplate {
    pub content: String,
    pub language: CodeLanguage,
}

/// Fields needed to create a template
#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub name: String,
    pub language: CodeLanguage,
    pub content: String,
    pub is_system: bool,
    pub user_id: Option<String>,
}

/// Partial update of a user template
#[derive(Debug, Clone, Default)]
pub struct TemplateChanges {
    pub name: Option<String>,
    pub language: Option<CodeLanguage>,
    pub content: Option<String>,
}

/// Returns the required placeholders missing from `content`
///
/// An empty list means the body is valid.
pub fn validate(content: &str) -> Vec<String> {
    REQUIRED_PLACEHOLDERS
        .iter()
        .filter(|placeholder| !content.contains(*placeholder))
        .map(|placeholder| placeholder.to_string())
        .collect()
}

/// Validates a body, turning missing placeholders into an error
pub fn ensure_valid(content: &str) -> Result<(), Error> {
    let missing = validate(content);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingPlaceholders(missing))
    }
}

/// Renders `template` against a task and its materialized result
///
/// # Errors
/// * `NotReady` if the task has no result yet
/// * `GenerationFailed` if processing failed
pub fn render(
    template: &CodeTemplate,
    task: &Task,
    result: Option<&TaskResult>,
) -> Result<RenderedTemplate, Error> {
    let result = result.ok_or(Error::NotReady)?;
    if !result.is_success {
        return Err(Error::GenerationFailed(
            result.error_message.clone().unwrap_or_default(),
        ));
    }

    let mut values = PlaceholderValues::new();
    values
        .set("title", task.name.as_str())
        .set("summary", result.summary.as_str())
        .set("description", result.description.as_str())
        .set("table_data", serde_json::to_string(&result.table_data)?)
        .set("data_points", serde_json::to_string(&result.data_points)?)
        .set("image_url", task.image_url.clone().unwrap_or_default())
        .set("language", template.language.as_str());

    Ok(RenderedTemplate {
        content: substitute(&template.content, &values),
        language: template.language,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{DataPoint, TableRow};
    use crate::core::{TaskKind, TaskStatus};

    fn task() -> Task {
        Task {
            id: "t1".into(),
            name: "Quarterly sales".into(),
            kind: TaskKind::Upload,
            status: TaskStatus::Completed,
            user_id: "u1".into(),
            template_id: None,
            group_id: None,
            image_url: Some("http://host/uploads/a.png".into()),
            is_deleted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn template(content: &str) -> CodeTemplate {
        CodeTemplate {
            id: "tpl".into(),
            name: "Sample".into(),
            language: CodeLanguage::Kotlin,
            content: content.into(),
            is_system: false,
            user_id: Some("u1".into()),
            is_deleted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn result() -> TaskResult {
        TaskResult::from_metadata(
            "t1",
            "Sales rose 20%.".into(),
            vec![DataPoint {
                id: 1,
                label: "Q1".into(),
                value: 12.5,
                x_percent: 0.0,
                y_percent: 87.5,
                description: "Q1 is 12.5".into(),
                ..Default::default()
            }],
            vec![TableRow {
                label: "Q1".into(),
                value: 12.5,
            }],
        )
    }

    #[test]
    fn validate_reports_missing_in_canonical_order() {
        assert_eq!(
            validate("{summary}"),
            vec!["{title}", "{table_data}", "{data_points}"]
        );
        assert!(validate("{title}{summary}{table_data}{data_points}").is_empty());
    }

    #[test]
    fn validate_is_idempotent() {
        let body = "{title} {data_points}";
        assert_eq!(validate(body), validate(body));
    }

    #[test]
    fn ensure_valid_rejects_incomplete_bodies() {
        match ensure_valid("{title}") {
            Err(Error::MissingPlaceholders(missing)) => assert_eq!(missing.len(), 3),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn render_round_trips_summary_and_points() {
        let template = template("{title}|{summary}|{table_data}|{data_points}");
        let result = result();
        let rendered = render(&template, &task(), Some(&result)).unwrap();

        assert_eq!(rendered.language, CodeLanguage::Kotlin);
        let parts: Vec<&str> = rendered.content.split('|').collect();
        assert_eq!(parts[0], "Quarterly sales");
        assert_eq!(parts[1], "Sales rose 20%.");
        let table: Vec<TableRow> = serde_json::from_str(parts[2]).unwrap();
        assert_eq!(table, result.table_data);
        let points: Vec<DataPoint> = serde_json::from_str(parts[3]).unwrap();
        assert_eq!(points, result.data_points);
    }

    #[test]
    fn render_tolerates_extra_placeholders() {
        let template = template("{title}{summary}{table_data}{data_points} {image_url} {language} {nope}");
        let rendered = render(&template, &task(), Some(&result())).unwrap();
        assert!(rendered.content.ends_with("http://host/uploads/a.png kotlin "));
    }

    #[test]
    fn render_requires_a_successful_result() {
        let template = template("{title}{summary}{table_data}{data_points}");
        assert!(matches!(render(&template, &task(), None), Err(Error::NotReady)));

        let failed = TaskResult::failure("t1", "image unreadable");
        match render(&template, &task(), Some(&failed)) {
            Err(Error::GenerationFailed(message)) => assert_eq!(message, "image unreadable"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn visibility_rules() {
        let mut tpl = template("x");
        assert!(tpl.is_visible_to("u1"));
        assert!(!tpl.is_visible_to("u2"));
        tpl.is_system = true;
        tpl.user_id = None;
        assert!(tpl.is_visible_to("u2"));
        tpl.is_deleted = true;
        assert!(!tpl.is_visible_to("u1"));
    }
}
