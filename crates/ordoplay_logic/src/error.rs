// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine-level errors.

use crate::link::LinkError;
use crate::node::{NodeError, NodeId};
use crate::property::PropertyError;

/// Error returned by [`LogicEngine`](crate::LogicEngine) operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Node still has links or observers
    #[error("Node {0} is still linked or observed; unlink it first")]
    NodeInUse(NodeId),

    /// Node configuration rejected at creation
    #[error("Invalid node configuration: {0}")]
    InvalidConfig(String),

    /// Script definition not registered
    #[error("Unknown script: {0}")]
    UnknownScript(String),

    /// A node failed while being created
    #[error("Failed to create node '{name}': {source}")]
    NodeCreation {
        /// Requested name
        name: String,
        /// Underlying error
        source: NodeError,
    },

    /// A node failed during `update()`; the pass was aborted
    #[error("Node '{name}' ({node}) failed during update: {source}")]
    NodeExecution {
        /// Failing node
        node: NodeId,
        /// Its name
        name: String,
        /// Underlying error
        source: NodeError,
    },

    /// Engine state violates an internal invariant
    #[error("Internal consistency error: {0}")]
    InternalConsistency(String),

    /// Snapshot can't be loaded
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Link error
    #[error(transparent)]
    Link(#[from] LinkError),

    /// Property error
    #[error(transparent)]
    Property(#[from] PropertyError),
}
