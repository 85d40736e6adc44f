use super::{AnalysisError, ChartAnalysis, ChartAnalyzer, DataPoint, TableRow};
use crate::constants::{ANALYSIS_DESCRIPTION, ANALYSIS_SUMMARY, DEFAULT_POINT_COUNT};
use async_trait::async_trait;
use image::ImageReader;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Deterministic stand-in for a chart recognition service
///
/// Reads the image header to learn its size, then derives point values from
/// a generator seeded with the file name, so the same file always yields the
/// same result.
#[derive(Debug, Clone)]
pub struct SimulatedAnalyzer {
    point_count: usize,
}

impl SimulatedAnalyzer {
    pub fn new() -> Self {
        Self::with_point_count(DEFAULT_POINT_COUNT)
    }

    pub fn with_point_count(point_count: usize) -> Self {
        Self {
            point_count: point_count.max(2),
        }
    }

    fn seed_for(image_path: &Path) -> u64 {
        let file_name = image_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let digest = Sha256::digest(file_name.as_bytes());
        let mut seed = [0u8; 8];
        seed.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(seed)
    }

    fn build(&self, image_path: &Path, width: u32, height: u32) -> ChartAnalysis {
        let mut rng = StdRng::seed_from_u64(Self::seed_for(image_path));
        let last_index = (self.point_count - 1) as f64;

        let mut data_points = Vec::with_capacity(self.point_count);
        let mut table_data = Vec::with_capacity(self.point_count);
        for index in 0..self.point_count {
            let value = rng.random_range(10..=100) as f64;
            let x_percent = round2(index as f64 / last_index * 100.0);
            let y_percent = round2(100.0 - value);
            let label = format!("Point {}", index + 1);

            data_points.push(DataPoint {
                id: index as u32 + 1,
                label: label.clone(),
                value,
                x_percent,
                y_percent,
                x_pixel: round2(x_percent / 100.0 * width as f64),
                y_pixel: round2(y_percent / 100.0 * height as f64),
                description: format!("Data point {} has a value of {}.", index + 1, value),
            });
            table_data.push(TableRow { label, value });
        }

        ChartAnalysis {
            summary: ANALYSIS_SUMMARY.to_string(),
            description: ANALYSIS_DESCRIPTION.to_string(),
            data_points,
            table_data,
        }
    }
}

impl Default for SimulatedAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChartAnalyzer for SimulatedAnalyzer {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn analyze(&self, image_path: &Path) -> Result<ChartAnalysis, AnalysisError> {
        let bytes = tokio::fs::read(image_path)
            .await
            .map_err(|source| AnalysisError::Unreadable {
                path: image_path.to_path_buf(),
                source,
            })?;

        let decode_err = |source| AnalysisError::Decode {
            path: image_path.to_path_buf(),
            source,
        };
        let (width, height) = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|source| AnalysisError::Unreadable {
                path: image_path.to_path_buf(),
                source,
            })?
            .into_dimensions()
            .map_err(decode_err)?;

        debug!(
            "Analysing {} ({}x{})",
            image_path.display(),
            width,
            height
        );
        Ok(self.build(image_path, width, height))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> std::path::PathBuf {
        let path = dir.join(name);
        RgbImage::new(width, height).save(&path).unwrap();
        path
    }

    #[tokio::test]
    async fn produces_reference_point_count_with_matching_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "a.png", 200, 100);

        let analysis = SimulatedAnalyzer::new().analyze(&path).await.unwrap();

        assert_eq!(analysis.data_points.len(), DEFAULT_POINT_COUNT);
        assert_eq!(analysis.table_data.len(), DEFAULT_POINT_COUNT);
        for (point, row) in analysis.data_points.iter().zip(&analysis.table_data) {
            assert_eq!(point.label, row.label);
            assert_eq!(point.value, row.value);
            assert!((10.0..=100.0).contains(&point.value));
            assert_eq!(point.y_percent, 100.0 - point.value);
        }
        let xs: Vec<f64> = analysis.data_points.iter().map(|p| p.x_percent).collect();
        assert_eq!(xs, vec![0.0, 25.0, 50.0, 75.0, 100.0]);
        assert_eq!(analysis.data_points[4].x_pixel, 200.0);
    }

    #[tokio::test]
    async fn same_file_name_gives_same_values() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let a = write_png(first.path(), "chart.png", 10, 10);
        let b = write_png(second.path(), "chart.png", 40, 40);

        let analyzer = SimulatedAnalyzer::new();
        let left = analyzer.analyze(&a).await.unwrap();
        let right = analyzer.analyze(&b).await.unwrap();

        assert_eq!(left.table_data, right.table_data);
    }

    #[tokio::test]
    async fn missing_or_garbage_files_are_analysis_errors() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = SimulatedAnalyzer::new();

        let missing = analyzer.analyze(&dir.path().join("nope.png")).await;
        assert!(matches!(missing, Err(AnalysisError::Unreadable { .. })));

        let garbage = dir.path().join("garbage.png");
        std::fs::write(&garbage, b"definitely not an image").unwrap();
        let result = analyzer.analyze(&garbage).await;
        assert!(result.is_err());
    }
}
