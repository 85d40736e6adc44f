//! Chart analysis boundary
//!
//! The worker only depends on the [`ChartAnalyzer`] trait; the bundled
//! [`SimulatedAnalyzer`] stands in for a remote recognition service.

mod simulated;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use simulated::SimulatedAnalyzer;

/// Errors raised while analysing a chart image
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("cannot read image {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported or corrupt image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("analysis service rejected {path}: {reason}")]
    Rejected { path: PathBuf, reason: String },
}

/// One recognised point of the chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DataPoint {
    pub id: u32,
    pub label: String,
    pub value: f64,
    pub x_percent: f64,
    pub y_percent: f64,
    pub x_pixel: f64,
    pub y_pixel: f64,
    pub description: String,
}

/// Tabular projection row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TableRow {
    pub label: String,
    pub value: f64,
}

/// Structured output of one analysis call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartAnalysis {
    pub summary: String,
    pub description: String,
    pub data_points: Vec<DataPoint>,
    pub table_data: Vec<TableRow>,
}

/// Pluggable analysis function invoked by the worker
#[async_trait]
pub trait ChartAnalyzer: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Analyses the image stored at `image_path`
    async fn analyze(&self, image_path: &Path) -> Result<ChartAnalysis, AnalysisError>;
}
