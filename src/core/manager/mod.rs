mod group;
mod task;
mod template;
mod utils;

use crate::config::AppConfig;
use crate::core::ChartWorker;
use crate::db::Database;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use group::{CreateGroup, UpdateGroup};
pub use task::{MetadataRequest, UpdateTask, UploadRequest};
pub use template::{CreateTemplate, UpdateTemplate};

/// Producer-side entry point used by the HTTP layer
///
/// Every operation takes the caller's user id and only sees rows owned by
/// that user. Task creation enqueues work on the shared [`ChartWorker`].
#[derive(Clone)]
pub struct TaskManager {
    /// Database handle shared with the worker
    pub database: Database,
    /// Queue consumer; the manager only ever enqueues
    worker: Arc<ChartWorker>,
    /// Folder uploaded images are written to
    upload_folder: PathBuf,
    /// Base of the public image URLs handed to the worker
    public_base_url: String,
}

impl TaskManager {
    /// Creates a new TaskManager
    ///
    /// # Arguments
    /// * `database` - Store shared with the worker
    /// * `worker` - The started (or to be started) chart worker
    /// * `config` - Application configuration (upload folder and public URL)
    pub fn new(database: Database, worker: Arc<ChartWorker>, config: &AppConfig) -> Self {
        Self {
            database,
            worker,
            upload_folder: config.upload_folder.clone(),
            public_base_url: config.public_base_url.clone(),
        }
    }

    pub fn worker(&self) -> &Arc<ChartWorker> {
        &self.worker
    }

    pub fn upload_folder(&self) -> &Path {
        &self.upload_folder
    }
}
