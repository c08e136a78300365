use std::fs;
use std::path::{Path, PathBuf};

use collector_logging::{collector_info, collector_warn};
use collector_runner::RunnerConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::persist::{AtomicFileWriter, PersistError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config path {0:?} has no file name")]
    InvalidPath(PathBuf),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub runner: RunnerConfig,
    pub default_output_path: String,
    pub log_file_prefix: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            runner: RunnerConfig::default(),
            default_output_path: "news_results.xlsx".to_string(),
            log_file_prefix: "automation_log_".to_string(),
            log_dir: None,
        }
    }
}

/// Load the config at `path`, writing defaults there when it does not exist.
/// Unreadable or invalid files fall back to defaults; missing keys are filled in.
/// Relative script paths are anchored at the config file's directory unless
/// the file names a `base_dir` itself.
pub fn load_or_create(path: &Path) -> AppConfig {
    let mut config = match fs::read_to_string(path) {
        Ok(text) => match ron::from_str::<AppConfig>(&text) {
            Ok(config) => {
                collector_info!("Loaded config from {:?}", path);
                config
            }
            Err(err) => {
                collector_warn!("Failed to parse config {:?}: {}; using defaults", path, err);
                AppConfig::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            let config = AppConfig::default();
            match save(path, &config) {
                Ok(()) => collector_info!("Wrote default config to {:?}", path),
                Err(err) => collector_warn!("Could not write default config {:?}: {}", path, err),
            }
            config
        }
        Err(err) => {
            collector_warn!("Failed to read config {:?}: {}; using defaults", path, err);
            AppConfig::default()
        }
    };

    if config.runner.base_dir.is_none() {
        config.runner.base_dir = Some(config_dir(path));
    }
    config
}

pub fn save(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| ConfigError::InvalidPath(path.to_path_buf()))?;
    let content = ron::ser::to_string_pretty(config, ron::ser::PrettyConfig::new())?;
    AtomicFileWriter::new(config_dir(path)).write(filename, &content)?;
    Ok(())
}

fn config_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("collector.ron");

        let config = load_or_create(&path);

        assert!(path.exists());
        assert_eq!(config.runner.base_dir.as_deref(), Some(temp.path()));
        assert_eq!(config.log_file_prefix, "automation_log_");
        let reloaded: AppConfig = ron::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(reloaded, AppConfig::default());
    }

    #[test]
    fn partial_file_is_completed_from_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("collector.ron");
        fs::write(
            &path,
            r#"(runner: (interpreter: "py", fallback_script_paths: []), log_dir: Some("logs"))"#,
        )
        .unwrap();

        let config = load_or_create(&path);

        assert_eq!(config.runner.interpreter, "py");
        assert!(config.runner.fallback_script_paths.is_empty());
        assert_eq!(config.runner.script_path, RunnerConfig::default().script_path);
        assert_eq!(config.log_dir, Some(PathBuf::from("logs")));
        assert_eq!(config.default_output_path, "news_results.xlsx");
    }

    #[test]
    fn invalid_file_falls_back_without_overwriting() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("collector.ron");
        fs::write(&path, "this is not ron (").unwrap();

        let config = load_or_create(&path);

        assert_eq!(config.runner.interpreter, RunnerConfig::default().interpreter);
        assert_eq!(fs::read_to_string(&path).unwrap(), "this is not ron (");
    }

    #[test]
    fn explicit_base_dir_is_kept() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("collector.ron");
        let mut config = AppConfig::default();
        config.runner.base_dir = Some(PathBuf::from("/srv/collector"));
        save(&path, &config).unwrap();

        let loaded = load_or_create(&path);
        assert_eq!(loaded.runner.base_dir, Some(PathBuf::from("/srv/collector")));
    }
}
