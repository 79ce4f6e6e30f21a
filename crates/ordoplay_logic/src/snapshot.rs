// SPDX-License-Identifier: MIT OR Apache-2.0
//! Serializable snapshots of a logic graph.
//!
//! A snapshot stores what is needed to rebuild the graph: node configs,
//! values of inputs that are not fed by links, and links addressed by
//! property path. Loading runs every link through the normal validation.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::node::NodeId;
use crate::nodes::NodeConfig;
use crate::property::PropertyValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// One node of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Node ID, kept across save and load
    pub id: NodeId,
    /// Display name
    pub name: String,
    /// Kind and configuration
    pub config: NodeConfig,
    /// Values of unlinked input leaves by path
    #[serde(default)]
    pub values: IndexMap<String, PropertyValue>,
}

/// One link of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Node owning the source output
    pub source_node: NodeId,
    /// Path of the source, e.g. `outputs.value`
    pub source_path: String,
    /// Node owning the target input
    pub target_node: NodeId,
    /// Path of the target, e.g. `inputs.value`
    pub target_path: String,
    /// Whether the link is weak
    #[serde(default)]
    pub weak: bool,
}

/// A whole logic graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Format version
    pub version: u32,
    /// Engine settings
    #[serde(default)]
    pub config: EngineConfig,
    /// Nodes in creation order
    pub nodes: Vec<NodeRecord>,
    /// Links in creation order
    #[serde(default)]
    pub links: Vec<LinkRecord>,
}

impl Default for GraphSnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            config: EngineConfig::default(),
            nodes: Vec::new(),
            links: Vec::new(),
        }
    }
}

impl GraphSnapshot {
    /// Serialize to RON text
    pub fn to_ron(&self) -> Result<String, EngineError> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        ron::ser::to_string_pretty(self, config).map_err(|e| EngineError::Snapshot(e.to_string()))
    }

    /// Parse RON text; rejects snapshots newer than this library
    pub fn from_ron(text: &str) -> Result<Self, EngineError> {
        let snapshot: Self = ron::from_str(text).map_err(|e| EngineError::Snapshot(e.to_string()))?;
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(EngineError::Snapshot(format!(
                "snapshot version {} is newer than supported version {SNAPSHOT_VERSION}",
                snapshot.version
            )));
        }
        Ok(snapshot)
    }

    /// Read a snapshot file
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let text = std::fs::read_to_string(path).map_err(|e| EngineError::Snapshot(format!("{}: {e}", path.display())))?;
        Self::from_ron(&text)
    }

    /// Write a snapshot file
    pub fn save(&self, path: &Path) -> Result<(), EngineError> {
        std::fs::write(path, self.to_ron()?).map_err(|e| EngineError::Snapshot(format!("{}: {e}", path.display())))
    }
}
