// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Runtime settings of a logic engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Skip clean nodes during `update()`; when off every node runs on every pass
    pub dirty_tracking: bool,
    /// Collect an [`UpdateReport`](crate::UpdateReport) on every pass
    pub update_report: bool,
    /// Log aggregated update statistics every this many passes; 0 disables
    pub statistics_logging_rate: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dirty_tracking: true,
            update_report: false,
            statistics_logging_rate: 60,
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a RON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        ron::from_str(&content).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save the configuration to a RON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        let content = ron::ser::to_string_pretty(self, config)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config: EngineConfig = ron::from_str("(update_report: true)").unwrap();
        assert!(config.dirty_tracking);
        assert!(config.update_report);
        assert_eq!(config.statistics_logging_rate, 60);
    }

    #[test]
    fn save_and_load_file() {
        let path = std::env::temp_dir().join(format!("ordoplay_logic_config_{}.ron", std::process::id()));
        let config = EngineConfig {
            dirty_tracking: false,
            update_report: true,
            statistics_logging_rate: 0,
        };
        config.save(&path).unwrap();
        let loaded = EngineConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }
}
