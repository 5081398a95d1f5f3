//! Configuration file support for kafka-replay
//!
//! Both session configs can be kept in one TOML file. Locating that file is
//! the caller's concern; this module only parses a path or string it is given.
//!
//! ## Example Configuration
//!
//! ```toml
//! # kafka-replay.toml
//!
//! [record]
//! limit = 1000
//! find = "ERROR"
//! max_duration_secs = 300
//!
//! [replay]
//! rate = 100
//! loop_replay = false
//! partition = 0
//! dry_run = false
//! preserve_timestamps = true
//! acks = "none"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::error::{ConfigError, ReplayError, Result};
use crate::replay::{RecordConfig, ReplayConfig};

/// Root configuration structure for TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Record session configuration
    pub record: RecordConfig,

    /// Replay session configuration
    pub replay: ReplayConfig,
}

impl ConfigFile {
    /// Load and validate a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::parse(path.display().to_string(), format!("failed to read: {}", e))
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ReplayError::config_msg(format!("failed to serialize config: {}", e)))
    }

    fn parse(content: &str, origin: &str) -> Result<Self> {
        let config: ConfigFile =
            toml::from_str(content).map_err(|e| ConfigError::parse(origin, e.to_string()))?;
        config.replay.validate()?;
        Ok(config)
    }
}

impl FromStr for ConfigFile {
    type Err = ReplayError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, "<string>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_BATCH_BYTES, DEFAULT_BATCH_SIZE};
    use crate::replay::Acks;
    use tempfile::TempDir;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: ConfigFile = "".parse().unwrap();
        assert_eq!(config.record.limit, 0);
        assert!(config.record.find.is_none());
        assert_eq!(config.replay.rate, 0);
        assert_eq!(config.replay.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.replay.batch_bytes, DEFAULT_BATCH_BYTES);
        assert_eq!(config.replay.acks, Acks::Leader);
    }

    #[test]
    fn test_parse_sections() {
        let config: ConfigFile = r#"
            [record]
            offset = 42
            limit = 10
            find = "ERROR"

            [replay]
            rate = 50
            loop_replay = true
            partition = 3
            dry_run = true
            acks = "none"
        "#
        .parse()
        .unwrap();

        assert_eq!(config.record.offset, Some(42));
        assert_eq!(config.record.limit, 10);
        assert_eq!(config.record.find.as_deref(), Some(&b"ERROR"[..]));
        assert_eq!(config.replay.rate, 50);
        assert!(config.replay.loop_replay);
        assert_eq!(config.replay.partition, Some(3));
        assert!(config.replay.dry_run);
        assert_eq!(config.replay.acks, Acks::None);
    }

    #[test]
    fn test_invalid_batch_size_rejected() {
        let result: Result<ConfigFile> = "[replay]\nbatch_size = 0\n".parse();
        assert!(matches!(result, Err(ReplayError::Config(_))));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let result: Result<ConfigFile> = "[replay\nrate = ".parse();
        assert!(matches!(
            result,
            Err(ReplayError::Config(ConfigError::Parse { .. }))
        ));
    }

    #[test]
    fn test_from_file_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("kafka-replay.toml");

        let mut config = ConfigFile::default();
        config.replay = config.replay.with_rate(25).with_find("timeout");
        std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();

        let loaded = ConfigFile::from_file(&path).unwrap();
        assert_eq!(loaded.replay.rate, 25);
        assert_eq!(loaded.replay.find.as_deref(), Some(&b"timeout"[..]));
    }

    #[test]
    fn test_from_file_missing() {
        let result = ConfigFile::from_file("/nonexistent/kafka-replay.toml");
        assert!(matches!(
            result,
            Err(ReplayError::Config(ConfigError::Parse { .. }))
        ));
    }
}
