//! Runner configuration.
//!
//! The runner works with CLI flags alone; a JSON config file provides the
//! same settings for unattended batch runs. CLI flags take precedence over
//! file values, file values over built-in defaults.
//!
//! # Example config
//!
//! ```json
//! {
//!   "workers": 7,
//!   "output_dir": "/data/imi/summaries",
//!   "log_level": "info",
//!   "log_dir": "/data/imi/logs",
//!   "cpu_affinity": [1, 2, 3, 4, 5, 6, 7]
//! }
//! ```

use std::path::PathBuf;

use serde::Deserialize;

/// Settings for a batch reconstruction run, deserialized from a JSON file.
///
/// Every field is optional; [`RunnerConfig::default`] is an empty config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunnerConfig {
    /// Number of worker threads. Defaults to `available cores - 1`.
    pub workers: Option<usize>,

    /// Directory receiving one JSON summary per processed day.
    pub output_dir: Option<PathBuf>,

    /// Default log level when `RUST_LOG` is not set.
    pub log_level: Option<String>,

    /// Directory for daily-rotating log files.
    pub log_dir: Option<PathBuf>,

    /// CPU cores to pin worker threads to, by worker index. Workers beyond
    /// the list length run unpinned.
    pub cpu_affinity: Option<Vec<i32>>,
}

impl RunnerConfig {
    /// The core assigned to worker `index`, if any.
    pub fn core_for_worker(&self, index: usize) -> Option<i32> {
        self.cpu_affinity.as_ref().and_then(|cores| cores.get(index).copied())
    }
}

/// Load and parse a JSON config file.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<RunnerConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: RunnerConfig = serde_json::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let json = r#"{
            "workers": 3,
            "output_dir": "/tmp/out",
            "log_level": "debug",
            "cpu_affinity": [2, 4]
        }"#;
        let config: RunnerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.workers, Some(3));
        assert_eq!(config.output_dir, Some(PathBuf::from("/tmp/out")));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.core_for_worker(0), Some(2));
        assert_eq!(config.core_for_worker(1), Some(4));
        assert_eq!(config.core_for_worker(2), None);
    }

    #[test]
    fn empty_object_is_valid() {
        let config: RunnerConfig = serde_json::from_str("{}").unwrap();
        assert!(config.workers.is_none());
        assert!(config.cpu_affinity.is_none());
    }
}
