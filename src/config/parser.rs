use super::AppConfig;
use crate::errors::Error;
use std::fs;
use std::path::Path;
use url::Url;

use tracing::info;

/// Loads the application configuration
///
/// # Arguments
///
/// * `file_path` - Optional TOML file; defaults are used when absent
///
/// # Returns
///
/// The parsed configuration with `DATABASE_PATH`, `UPLOAD_FOLDER` and
/// `PUBLIC_BASE_URL` applied on top
///
/// # Errors
///
/// Returns an error if:
/// * The file cannot be read
/// * The TOML content cannot be parsed into an AppConfig
pub fn load_config(file_path: Option<&Path>) -> Result<AppConfig, Error> {
    let config = match file_path {
        Some(path) => {
            let toml_str = fs::read_to_string(path)?;
            let config: AppConfig = toml::from_str(&toml_str)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
            info!("Loaded configuration from {}", path.display());
            config
        }
        None => AppConfig::default(),
    };

    let config = apply_env_overrides(config, |key| std::env::var(key).ok());
    validate(&config)?;
    Ok(config)
}

/// Rejects settings the service cannot run with
fn validate(config: &AppConfig) -> Result<(), Error> {
    let base = Url::parse(&config.public_base_url).map_err(|e| {
        Error::Config(format!(
            "invalid public_base_url '{}': {}",
            config.public_base_url, e
        ))
    })?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(Error::Config(format!(
            "public_base_url must be http(s), got '{}'",
            base.scheme()
        )));
    }
    if config.database_path.trim().is_empty() {
        return Err(Error::Config("database_path cannot be empty".to_string()));
    }
    Ok(())
}

/// Overlays environment values on `config`
///
/// `lookup` abstracts the environment so overrides can be tested in isolation.
pub fn apply_env_overrides<F>(mut config: AppConfig, lookup: F) -> AppConfig
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(path) = non_empty("DATABASE_PATH") {
        config.database_path = path;
    }
    if let Some(folder) = non_empty("UPLOAD_FOLDER") {
        config.upload_folder = folder.into();
    }
    if let Some(url) = non_empty("PUBLIC_BASE_URL") {
        config.public_base_url = url;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn file_values_then_env_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "database_path = \"from-file.db\"\n[server]\nport = 8080\n[worker]\nslow_task_warning = \"5s\""
        )
        .unwrap();

        let toml_str = fs::read_to_string(file.path()).unwrap();
        let config: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.database_path, "from-file.db");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.public_base_url, "http://localhost:5000");

        let env: HashMap<&str, &str> = [
            ("UPLOAD_FOLDER", "/srv/uploads"),
            ("PUBLIC_BASE_URL", "https://charts.example"),
            ("DATABASE_PATH", ""),
        ]
        .into_iter()
        .collect();
        let config = apply_env_overrides(config, |key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.database_path, "from-file.db");
        assert_eq!(config.upload_folder, PathBuf::from("/srv/uploads"));
        assert_eq!(config.public_base_url, "https://charts.example");
    }

    #[test]
    fn rejects_non_http_base_url() {
        let mut config = AppConfig::default();
        assert!(validate(&config).is_ok());
        config.public_base_url = "ftp://files".into();
        assert!(matches!(validate(&config), Err(Error::Config(_))));
        config.public_base_url = "not a url".into();
        assert!(matches!(validate(&config), Err(Error::Config(_))));
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server = 12").unwrap();
        assert!(matches!(
            load_config(Some(file.path())),
            Err(Error::Config(_))
        ));
    }
}
