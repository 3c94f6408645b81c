//! Logging configuration.
//!
//! The actual subscriber is assembled in the application crate; this module
//! only carries the persisted settings and the log directory bookkeeping.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

/// Persisted logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default log level ("trace", "debug", "info", "warn", "error")
    pub level: String,
    /// Mirror log output to stderr
    pub console_output: bool,
    /// Write log output to a file in the log directory
    pub file_output: bool,
    /// Log directory override; platform data dir when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    /// Number of dated log files kept by cleanup
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

fn default_max_files() -> usize {
    5
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_output: true,
            file_output: false,
            log_dir: None,
            max_files: default_max_files(),
        }
    }
}

impl LogConfig {
    /// Parse the configured level, falling back to INFO on invalid input.
    pub fn parse_level(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::INFO)
    }

    /// Resolve the log directory.
    pub fn log_directory(&self) -> PathBuf {
        if let Some(dir) = &self.log_dir {
            return dir.clone();
        }
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sceneflow")
            .join("logs")
    }

    /// Create the log directory if it does not exist yet.
    pub fn ensure_log_directory(&self) -> std::io::Result<()> {
        fs::create_dir_all(self.log_directory())
    }

    /// Path of the log file for the current day.
    pub fn current_log_path(&self) -> PathBuf {
        let stamp = chrono::Local::now().format("%Y-%m-%d");
        self.log_directory().join(format!("sceneflow-{stamp}.log"))
    }

    /// Delete dated log files beyond `max_files`, oldest first.
    pub fn cleanup_old_logs(&self) -> std::io::Result<()> {
        let dir = self.log_directory();
        if !dir.exists() {
            return Ok(());
        }

        let mut logs: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension().map_or(false, |ext| ext == "log")
                    && path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .map_or(false, |n| n.starts_with("sceneflow-"))
            })
            .collect();

        // Dated names sort chronologically.
        logs.sort();

        if logs.len() > self.max_files {
            let excess = logs.len() - self.max_files;
            for path in logs.into_iter().take(excess) {
                if let Err(e) = fs::remove_file(&path) {
                    tracing::warn!("Failed to remove old log file {:?}: {}", path, e);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_level() {
        let mut config = LogConfig::default();
        assert_eq!(config.parse_level(), LevelFilter::INFO);

        config.level = "debug".to_string();
        assert_eq!(config.parse_level(), LevelFilter::DEBUG);

        config.level = "not-a-level".to_string();
        assert_eq!(config.parse_level(), LevelFilter::INFO);
    }

    #[test]
    fn test_current_log_path_in_override_dir() {
        let tmp = TempDir::new().expect("tempdir");
        let config = LogConfig {
            log_dir: Some(tmp.path().to_path_buf()),
            ..Default::default()
        };
        let path = config.current_log_path();
        assert!(path.starts_with(tmp.path()));
        assert!(path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap()
            .starts_with("sceneflow-"));
    }

    #[test]
    fn test_cleanup_keeps_newest_files() {
        let tmp = TempDir::new().expect("tempdir");
        let config = LogConfig {
            log_dir: Some(tmp.path().to_path_buf()),
            max_files: 2,
            ..Default::default()
        };
        config.ensure_log_directory().expect("mkdir");

        for day in ["2026-01-01", "2026-01-02", "2026-01-03", "2026-01-04"] {
            std::fs::write(tmp.path().join(format!("sceneflow-{day}.log")), b"x")
                .expect("write log");
        }

        config.cleanup_old_logs().expect("cleanup");

        let mut remaining: Vec<String> = std::fs::read_dir(tmp.path())
            .expect("read dir")
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        remaining.sort();
        assert_eq!(
            remaining,
            vec![
                "sceneflow-2026-01-03.log".to_string(),
                "sceneflow-2026-01-04.log".to_string()
            ]
        );
    }
}
