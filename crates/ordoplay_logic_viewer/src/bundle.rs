// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene bundles: a host scene plus the logic graph driving it.

use ordoplay_logic::{EngineError, GraphSnapshot, LogicEngine, SceneStore, ScriptRegistry};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("Failed to serialize bundle: {0}")]
    Serialize(#[from] ron::Error),
    #[error("No property '{0}'")]
    MissingProperty(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneBundle {
    pub scene: SceneStore,
    pub graph: GraphSnapshot,
}

impl SceneBundle {
    pub fn capture(engine: &LogicEngine) -> Self {
        Self {
            scene: engine.host().clone(),
            graph: engine.snapshot(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, BundleError> {
        let text = std::fs::read_to_string(path).map_err(|source| BundleError::Io {
            path: path.to_owned(),
            source,
        })?;
        ron::from_str(&text).map_err(|source| BundleError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), BundleError> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        let text = ron::ser::to_string_pretty(self, config)?;
        std::fs::write(path, text).map_err(|source| BundleError::Io {
            path: path.to_owned(),
            source,
        })
    }

    /// Build an engine driving a copy of the bundled scene
    pub fn instantiate(&self, scripts: ScriptRegistry) -> Result<LogicEngine, BundleError> {
        Ok(LogicEngine::from_snapshot(&self.graph, self.scene.clone(), scripts)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{demo, scripts};

    #[test]
    fn demo_bundle_survives_a_file_round_trip() {
        let bundle = demo::bundle().unwrap();
        let path = std::env::temp_dir().join(format!("ordoplay_logic_viewer_{}.ron", std::process::id()));
        bundle.save(&path).unwrap();
        let loaded = SceneBundle::load(&path);
        let _ = std::fs::remove_file(&path);

        let loaded = loaded.unwrap();
        assert_eq!(loaded.graph, bundle.graph);
        assert_eq!(loaded.scene.objects().count(), bundle.scene.objects().count());
        let engine = loaded.instantiate(scripts::builtin()).unwrap();
        assert_eq!(engine.node_count(), bundle.graph.nodes.len());
    }

    #[test]
    fn missing_file_reports_the_path() {
        let err = SceneBundle::load(Path::new("/nonexistent/bundle.ron")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/bundle.ron"));
    }
}
