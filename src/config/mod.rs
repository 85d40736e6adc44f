mod parser;

use crate::constants::DEFAULT_POINT_COUNT;
use crate::errors::Error;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub use parser::{apply_env_overrides, load_config};

/// Application configuration
///
/// Every section is optional in the file; missing keys take their defaults.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite database file, or `:memory:`
    pub database_path: String,
    /// Folder receiving uploaded chart images
    pub upload_folder: PathBuf,
    /// Base URL under which `/uploads/...` is reachable by clients
    pub public_base_url: String,
    pub server: ServerConfig,
    pub worker: WorkerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: "chartaccess.db".to_string(),
            upload_folder: PathBuf::from("./uploads"),
            public_base_url: "http://localhost:5000".to_string(),
            server: ServerConfig::default(),
            worker: WorkerConfig::default(),
        }
    }
}

/// HTTP listener settings
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

/// Background worker settings
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct WorkerConfig {
    /// Human-readable duration, e.g. `"30s"` or `"2m"`
    pub slow_task_warning: String,
    /// Number of points produced by the simulated analyzer
    pub point_count: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            slow_task_warning: "30s".to_string(),
            point_count: DEFAULT_POINT_COUNT,
        }
    }
}

impl WorkerConfig {
    /// Parses `slow_task_warning`
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the value is not a valid duration
    pub fn slow_task_warning(&self) -> Result<Duration, Error> {
        humantime::parse_duration(&self.slow_task_warning).map_err(|e| {
            Error::Config(format!(
                "invalid worker.slow_task_warning '{}': {}",
                self.slow_task_warning, e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slow_task_warning_uses_humantime() {
        let mut worker = WorkerConfig::default();
        assert_eq!(worker.slow_task_warning().unwrap(), Duration::from_secs(30));

        worker.slow_task_warning = "1m 30s".into();
        assert_eq!(worker.slow_task_warning().unwrap(), Duration::from_secs(90));

        worker.slow_task_warning = "soon".into();
        assert!(matches!(worker.slow_task_warning(), Err(Error::Config(_))));
    }
}
