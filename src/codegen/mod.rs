//! Accessible integration code generation
//!
//! Turns a completed analysis into a web snippet, two Android variants and
//! the static integration steps for each of them. Output is a pure function
//! of the inputs.

mod android;
mod web;

use crate::analysis::DataPoint;
use crate::constants::{JAVA_INTEGRATION_STEPS, KOTLIN_INTEGRATION_STEPS, WEB_INTEGRATION_STEPS};
use crate::errors::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Target languages for generated code and templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeLanguage {
    Web,
    Java,
    Kotlin,
}

impl CodeLanguage {
    pub const ALL: [CodeLanguage; 3] = [CodeLanguage::Web, CodeLanguage::Java, CodeLanguage::Kotlin];

    pub fn as_str(self) -> &'static str {
        match self {
            CodeLanguage::Web => "web",
            CodeLanguage::Java => "java",
            CodeLanguage::Kotlin => "kotlin",
        }
    }

    /// File name used when the snippet is exported
    pub fn file_name(self) -> &'static str {
        match self {
            CodeLanguage::Web => "accessible_chart.html",
            CodeLanguage::Java => "AccessibleChartActivity.java",
            CodeLanguage::Kotlin => "AccessibleChartActivity.kt",
        }
    }

    pub fn integration_steps(self) -> Vec<String> {
        let steps: &[&str] = match self {
            CodeLanguage::Web => WEB_INTEGRATION_STEPS,
            CodeLanguage::Java => JAVA_INTEGRATION_STEPS,
            CodeLanguage::Kotlin => KOTLIN_INTEGRATION_STEPS,
        };
        steps.iter().map(|s| s.to_string()).collect()
    }
}

impl fmt::Display for CodeLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodeLanguage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "web" | "html" => Ok(CodeLanguage::Web),
            "java" => Ok(CodeLanguage::Java),
            "kotlin" => Ok(CodeLanguage::Kotlin),
            "" => Err(Error::validation("template language must not be empty")),
            other => Err(Error::validation(format!(
                "unsupported language '{}', expected one of web, java, kotlin",
                other
            ))),
        }
    }
}

/// Everything the generator produces for one chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeBundle {
    pub sources: BTreeMap<CodeLanguage, String>,
    pub integration: BTreeMap<CodeLanguage, Vec<String>>,
}

impl CodeBundle {
    pub fn source(&self, language: CodeLanguage) -> Option<&str> {
        self.sources.get(&language).map(String::as_str)
    }
}

/// Builds the accessible code bundle for a chart
///
/// # Arguments
/// * `image_url` - Public URL of the chart image embedded in the markup
/// * `summary` - Chart summary, used as the accessible name of the chart
/// * `data_points` - Points in display order; one marker per point
pub fn build_accessible_code(image_url: &str, summary: &str, data_points: &[DataPoint]) -> CodeBundle {
    let mut sources = BTreeMap::new();
    sources.insert(CodeLanguage::Web, web::render_markup(image_url, summary, data_points));
    sources.insert(
        CodeLanguage::Java,
        android::render_activity(CodeLanguage::Java, summary, data_points),
    );
    sources.insert(
        CodeLanguage::Kotlin,
        android::render_activity(CodeLanguage::Kotlin, summary, data_points),
    );

    let integration = CodeLanguage::ALL
        .iter()
        .map(|language| (*language, language.integration_steps()))
        .collect();

    CodeBundle {
        sources,
        integration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points() -> Vec<DataPoint> {
        vec![
            DataPoint {
                id: 1,
                label: "Point 1".into(),
                value: 42.0,
                x_percent: 0.0,
                y_percent: 58.0,
                description: "Data point 1 has a value of 42.".into(),
                ..Default::default()
            },
            DataPoint {
                id: 2,
                label: "Point 2".into(),
                value: 17.5,
                x_percent: 100.0,
                y_percent: 82.5,
                description: "Data point 2 has a value of 17.5.".into(),
                ..Default::default()
            },
        ]
    }

    #[test]
    fn bundle_covers_every_language() {
        let bundle = build_accessible_code("http://img/a.png", "Sales", &points());
        for language in CodeLanguage::ALL {
            assert!(bundle.source(language).is_some());
            assert!(!bundle.integration[&language].is_empty());
        }
    }

    #[test]
    fn output_is_deterministic() {
        let a = build_accessible_code("http://img/a.png", "Sales", &points());
        let b = build_accessible_code("http://img/a.png", "Sales", &points());
        assert_eq!(a, b);
    }

    #[test]
    fn language_tags_parse_from_closed_set() {
        assert_eq!("Kotlin".parse::<CodeLanguage>().unwrap(), CodeLanguage::Kotlin);
        assert_eq!("html".parse::<CodeLanguage>().unwrap(), CodeLanguage::Web);
        assert!(matches!("swift".parse::<CodeLanguage>(), Err(Error::Validation(_))));
        assert!(matches!(" ".parse::<CodeLanguage>(), Err(Error::Validation(_))));
    }

    #[test]
    fn languages_serialize_as_map_keys() {
        let bundle = build_accessible_code("u", "s", &[]);
        let json = serde_json::to_value(&bundle.integration).unwrap();
        assert!(json.get("java").is_some());
        assert!(json.get("web").is_some());
    }
}
