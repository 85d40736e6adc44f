#![allow(dead_code)]

use async_trait::async_trait;
use chartaccess::analysis::{AnalysisError, ChartAnalysis, ChartAnalyzer, SimulatedAnalyzer};
use chartaccess::config::AppConfig;
use chartaccess::core::{ChartWorker, TaskManager, UploadRequest, WorkerContext};
use chartaccess::db::Database;
use chartaccess::event::WorkerEvent;
use image::{ImageFormat, RgbImage};
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::{broadcast, Notify};

pub const USER: &str = "user-1";
pub const OTHER_USER: &str = "user-2";

/// Everything a test needs, backed by an in-memory database
pub struct Harness {
    pub database: Database,
    pub worker: Arc<ChartWorker>,
    pub manager: TaskManager,
    pub uploads: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let config = AppConfig {
            database_path: ":memory:".into(),
            upload_folder: uploads.path().to_path_buf(),
            ..AppConfig::default()
        };
        let database = Database::new(&config.database_path).unwrap();
        let worker = Arc::new(ChartWorker::new());
        let manager = TaskManager::new(database.clone(), Arc::clone(&worker), &config);
        manager.seed_system_templates().unwrap();
        Self {
            database,
            worker,
            manager,
            uploads,
        }
    }

    pub fn context(&self, analyzer: Arc<dyn ChartAnalyzer>) -> WorkerContext {
        WorkerContext::new(self.database.clone(), analyzer)
    }

    /// Starts the worker with the simulated analyzer
    pub fn start(&self) {
        assert!(self.worker.start(self.context(Arc::new(SimulatedAnalyzer::new()))));
    }
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    RgbImage::new(width, height)
        .write_to(&mut bytes, ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

pub fn upload(name: &str) -> UploadRequest {
    UploadRequest {
        name: name.to_string(),
        file_name: format!("{}.png", name),
        bytes: png_bytes(64, 32),
        template_id: None,
        group_id: None,
    }
}

/// Waits for the last event the worker emits for `task_id`
pub async fn final_event(
    events: &mut broadcast::Receiver<WorkerEvent>,
    task_id: &str,
) -> WorkerEvent {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match events.recv().await {
                Ok(event) if event.task_id() == task_id && event.is_final() => return event,
                Ok(_) => continue,
                Err(e) => panic!("worker event channel failed: {}", e),
            }
        }
    })
    .await
    .expect("timed out waiting for the worker")
}

/// Analyzer that always rejects the image
pub struct FailingAnalyzer;

#[async_trait]
impl ChartAnalyzer for FailingAnalyzer {
    fn name(&self) -> &str {
        "failing"
    }

    async fn analyze(&self, image_path: &Path) -> Result<ChartAnalysis, AnalysisError> {
        Err(AnalysisError::Rejected {
            path: image_path.to_path_buf(),
            reason: "no chart found".into(),
        })
    }
}

/// Analyzer that panics on its first call and then behaves normally
#[derive(Default)]
pub struct PanicOnceAnalyzer {
    calls: AtomicUsize,
    inner: SimulatedAnalyzer,
}

#[async_trait]
impl ChartAnalyzer for PanicOnceAnalyzer {
    fn name(&self) -> &str {
        "panic-once"
    }

    async fn analyze(&self, image_path: &Path) -> Result<ChartAnalysis, AnalysisError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("analyzer exploded");
        }
        self.inner.analyze(image_path).await
    }
}

/// Analyzer that holds every call until `release` is notified
#[derive(Default)]
pub struct GatedAnalyzer {
    pub release: Notify,
    inner: SimulatedAnalyzer,
}

#[async_trait]
impl ChartAnalyzer for GatedAnalyzer {
    fn name(&self) -> &str {
        "gated"
    }

    async fn analyze(&self, image_path: &Path) -> Result<ChartAnalysis, AnalysisError> {
        self.release.notified().await;
        self.inner.analyze(image_path).await
    }
}
