use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Where the worker lives and how to invoke it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Interpreter binary. Empty means the script is executed directly.
    pub interpreter: String,
    pub script_path: PathBuf,
    pub fallback_script_paths: Vec<PathBuf>,
    /// Relative script paths are joined onto this directory before probing.
    pub base_dir: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
    pub environment: BTreeMap<String, String>,
    /// WHATWG encoding label of the worker's output; UTF-8 when unset.
    pub output_encoding: Option<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        let interpreter = if cfg!(windows) { "python" } else { "python3" };
        let environment = BTreeMap::from([
            ("PYTHONUNBUFFERED".to_string(), "1".to_string()),
            ("PYTHONIOENCODING".to_string(), "utf-8".to_string()),
        ]);
        Self {
            interpreter: interpreter.to_string(),
            script_path: PathBuf::from("automation-back").join("news_scraper_byKeyword.py"),
            fallback_script_paths: vec![
                PathBuf::from("scripts").join("news_scraper_byKeyword.py"),
                PathBuf::from("news_scraper_byKeyword.py"),
            ],
            base_dir: None,
            working_dir: None,
            environment,
            output_encoding: None,
        }
    }
}

impl RunnerConfig {
    /// Config for running `script_path` with `interpreter` and nothing else.
    pub fn for_script(interpreter: impl Into<String>, script_path: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            script_path: script_path.into(),
            fallback_script_paths: Vec::new(),
            ..Self::default()
        }
    }

    /// Primary and fallback locations with `base_dir` applied.
    pub fn script_candidates(&self) -> (PathBuf, Vec<PathBuf>) {
        let primary = self.anchor(&self.script_path);
        let fallbacks = self
            .fallback_script_paths
            .iter()
            .map(|path| self.anchor(path))
            .collect();
        (primary, fallbacks)
    }

    fn anchor(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}
