use crate::analysis::{ChartAnalysis, DataPoint, TableRow};
use crate::codegen::{CodeBundle, CodeLanguage};
use crate::errors::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const UNKNOWN_FAILURE: &str = "Unknown processing error";

/// Materialized output of a completed or failed task
///
/// Built only through [`TaskResult::success`], [`TaskResult::from_metadata`]
/// or [`TaskResult::failure`], which keep the success flag, payload and
/// error message consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: String,
    pub is_success: bool,
    pub summary: String,
    pub description: String,
    pub data_points: Vec<DataPoint>,
    pub table_data: Vec<TableRow>,
    pub generated_code: BTreeMap<CodeLanguage, String>,
    pub integration_doc: BTreeMap<CodeLanguage, Vec<String>>,
    pub rendered_template: Option<String>,
    pub error_message: Option<String>,
}

impl TaskResult {
    /// Successful result from an analysis and its generated code
    pub fn success(task_id: &str, analysis: ChartAnalysis, code: CodeBundle) -> Self {
        Self {
            task_id: task_id.to_string(),
            is_success: true,
            summary: analysis.summary,
            description: analysis.description,
            data_points: analysis.data_points,
            table_data: analysis.table_data,
            generated_code: code.sources,
            integration_doc: code.integration,
            rendered_template: None,
            error_message: None,
        }
    }

    /// Successful result supplied directly by the caller
    pub fn from_metadata(
        task_id: &str,
        summary: String,
        data_points: Vec<DataPoint>,
        table_data: Vec<TableRow>,
    ) -> Self {
        Self {
            task_id: task_id.to_string(),
            is_success: true,
            summary,
            description: String::new(),
            data_points,
            table_data,
            generated_code: BTreeMap::new(),
            integration_doc: BTreeMap::new(),
            rendered_template: None,
            error_message: None,
        }
    }

    /// Failed result; every payload field stays empty
    pub fn failure(task_id: &str, message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.trim().is_empty() {
            message = UNKNOWN_FAILURE.to_string();
        }
        Self {
            task_id: task_id.to_string(),
            is_success: false,
            summary: String::new(),
            description: String::new(),
            data_points: Vec::new(),
            table_data: Vec::new(),
            generated_code: BTreeMap::new(),
            integration_doc: BTreeMap::new(),
            rendered_template: None,
            error_message: Some(message),
        }
    }

    pub fn with_rendered_template(mut self, rendered: String) -> Self {
        if self.is_success {
            self.rendered_template = Some(rendered);
        }
        self
    }

    /// Checks the success/error invariant, used when rows are read back
    pub fn check_consistency(&self) -> Result<(), Error> {
        let consistent = if self.is_success {
            self.error_message.is_none()
        } else {
            self.error_message
                .as_deref()
                .is_some_and(|message| !message.is_empty())
                && self.summary.is_empty()
                && self.description.is_empty()
                && self.data_points.is_empty()
                && self.table_data.is_empty()
                && self.generated_code.is_empty()
                && self.rendered_template.is_none()
        };

        if consistent {
            Ok(())
        } else {
            Err(Error::Internal(format!(
                "inconsistent result stored for task {}",
                self.task_id
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::build_accessible_code;

    fn analysis() -> ChartAnalysis {
        ChartAnalysis {
            summary: "Summary".into(),
            description: "Description".into(),
            data_points: vec![DataPoint {
                id: 1,
                label: "Point 1".into(),
                value: 10.0,
                ..Default::default()
            }],
            table_data: vec![TableRow {
                label: "Point 1".into(),
                value: 10.0,
            }],
        }
    }

    #[test]
    fn success_has_no_error_message() {
        let analysis = analysis();
        let code = build_accessible_code("u", &analysis.summary, &analysis.data_points);
        let result = TaskResult::success("t1", analysis, code);
        assert!(result.is_success);
        assert!(result.error_message.is_none());
        assert_eq!(result.generated_code.len(), 3);
        result.check_consistency().unwrap();
    }

    #[test]
    fn failure_is_empty_and_always_carries_a_message() {
        let result = TaskResult::failure("t1", "");
        assert!(!result.is_success);
        assert_eq!(result.error_message.as_deref(), Some(UNKNOWN_FAILURE));
        assert!(result.summary.is_empty());
        assert!(result.data_points.is_empty());
        result.check_consistency().unwrap();

        let rendered = result.with_rendered_template("x".into());
        assert!(rendered.rendered_template.is_none());
    }

    #[test]
    fn inconsistent_rows_are_detected() {
        let mut result = TaskResult::failure("t1", "boom");
        result.summary = "leaked".into();
        assert!(matches!(result.check_consistency(), Err(Error::Internal(_))));

        let mut result = TaskResult::from_metadata("t2", "s".into(), vec![], vec![]);
        result.error_message = Some("boom".into());
        assert!(result.check_consistency().is_err());
    }
}
