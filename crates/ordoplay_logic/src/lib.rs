// SPDX-License-Identifier: MIT OR Apache-2.0
//! Logic node graph and incremental update scheduler for `OrdoPlay`.
//!
//! Nodes own typed property trees. Output leaves link to input leaves of
//! other nodes, and every `update()` runs the dirty nodes in dependency
//! order while pushing changed values across links.
//!
//! ## Architecture
//!
//! - [`property`]: typed property arenas with dotted paths
//! - [`nodes`]: the closed set of node kinds (scripts, interfaces, host
//!   bindings, timers, animations, anchor points)
//! - [`link`] and [`dependency`]: link validation and execution order
//! - [`scheduler`]: dirty tracking and value propagation
//! - [`engine`]: the facade tying nodes, links and the host scene together
//! - [`snapshot`]: serde snapshots for saving and reloading a graph

pub mod config;
pub mod dependency;
pub mod engine;
pub mod error;
pub mod host;
pub mod link;
pub mod node;
pub mod nodes;
pub mod property;
pub mod report;
pub mod scheduler;
pub mod snapshot;

pub use config::EngineConfig;
pub use dependency::{CycleError, DependencyGraph};
pub use engine::{LogicEngine, ValidationWarning};
pub use error::EngineError;
pub use host::{HostError, HostObjectId, HostObjectKind, HostScene, SceneStore};
pub use link::{Link, LinkError, LinkRegistry};
pub use node::{Node, NodeError, NodeId};
pub use nodes::{
    AnimationChannel, AnimationConfig, InterpolationType, NodeConfig, NodeIo, ScriptDefinition, ScriptRegistry,
    UniformDecl,
};
pub use property::{PropertyDecl, PropertyError, PropertyId, PropertyType, PropertyValue};
pub use report::{UpdateReport, UpdateStatistics};
pub use snapshot::{GraphSnapshot, LinkRecord, NodeRecord};
