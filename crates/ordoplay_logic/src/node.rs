// SPDX-License-Identifier: MIT OR Apache-2.0
//! Logic node instances.

use crate::host::{HostError, HostObjectId, HostScene};
use crate::nodes::{LogicNode, NodeConfig, NodeIo, NodeKind, UpdateContext};
use crate::property::{
    PropertyDecl, PropertyDirection, PropertyId, PropertySemantics, PropertySlot, PropertyTree,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a node within one engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Get the raw ID value
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Runtime error raised by a node's `update()`
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NodeError {
    /// Script function reported a failure
    #[error("{0}")]
    Script(String),

    /// A property the node relies on does not exist
    #[error("Property not found: {0}")]
    MissingProperty(String),

    /// A property holds a value of an unexpected type
    #[error("Property '{0}' has an unexpected type")]
    UnexpectedType(String),

    /// An input holds a value the node can't work with
    #[error("Invalid value for '{path}': {reason}")]
    InvalidInput {
        /// Input path
        path: String,
        /// What is wrong with it
        reason: String,
    },

    /// Bound host object is gone
    #[error("Host object {0} is not available")]
    MissingHostObject(HostObjectId),

    /// Host state cannot be evaluated
    #[error("Invalid host state: {0}")]
    InvalidHostState(String),

    /// Host rejected a write
    #[error(transparent)]
    Host(#[from] HostError),
}

impl NodeError {
    /// Convenience constructor for script failures
    pub fn script(message: impl Into<String>) -> Self {
        Self::Script(message.into())
    }
}

/// A node instance in the logic graph
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    name: String,
    dirty: bool,
    tree: PropertyTree,
    inputs: Option<PropertySlot>,
    outputs: Option<PropertySlot>,
    kind: NodeKind,
}

impl Node {
    /// Build a node of the given kind, creating its whole property tree up front
    pub(crate) fn new(
        id: NodeId,
        name: impl Into<String>,
        mut kind: NodeKind,
        host: &dyn HostScene,
    ) -> Result<Self, NodeError> {
        let interface = kind.interface();
        let mut tree = PropertyTree::new();
        let inputs = interface
            .inputs
            .as_ref()
            .map(|decl| tree.build(&root_decl(decl, "inputs"), PropertyDirection::Input, interface.input_semantics));
        let outputs = interface
            .outputs
            .as_ref()
            .map(|decl| tree.build(&root_decl(decl, "outputs"), PropertyDirection::Output, PropertySemantics::Plain));

        kind.initialize(
            &mut NodeIo {
                tree: &mut tree,
                inputs,
                outputs,
            },
            host,
        )?;

        Ok(Self {
            id,
            name: name.into(),
            dirty: true,
            tree,
            inputs,
            outputs,
            kind,
        })
    }

    /// Node ID
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Node kind with its kind-specific state
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Configuration the node was created from
    pub fn config(&self) -> NodeConfig {
        self.kind.config()
    }

    /// Whether the node must execute on the next pass
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Whether the node depends on host state the graph cannot see
    pub fn is_externally_coupled(&self) -> bool {
        self.kind.is_externally_coupled()
    }

    /// Root of the input tree
    pub fn inputs(&self) -> Option<PropertySlot> {
        self.inputs
    }

    /// Root of the output tree
    pub fn outputs(&self) -> Option<PropertySlot> {
        self.outputs
    }

    /// All properties of this node
    pub fn properties(&self) -> &PropertyTree {
        &self.tree
    }

    pub(crate) fn properties_mut(&mut self) -> &mut PropertyTree {
        &mut self.tree
    }

    /// Engine handle of one of this node's properties
    pub fn property_id(&self, slot: PropertySlot) -> PropertyId {
        PropertyId::new(self.id, slot)
    }

    /// Input property by path below the input root
    pub fn input(&self, path: &str) -> Option<PropertySlot> {
        self.tree.resolve(self.inputs?, path)
    }

    /// Output property by path below the output root
    pub fn output(&self, path: &str) -> Option<PropertySlot> {
        self.tree.resolve(self.outputs?, path)
    }

    /// Property by full path, starting with `inputs` or `outputs`
    pub fn find(&self, path: &str) -> Option<PropertySlot> {
        let (root, rest) = path.split_once('.').unwrap_or((path, ""));
        match root {
            "inputs" => self.input(rest),
            "outputs" => self.output(rest),
            _ => None,
        }
    }

    /// Whether any property of this node has a link
    pub fn has_linked_properties(&self) -> bool {
        self.tree.iter().any(|(_, p)| p.is_linked())
    }

    /// Whether a binding input holds a value not yet written to the host
    pub fn has_pending_binding_values(&self) -> bool {
        self.tree.iter().any(|(_, p)| p.has_new_value())
    }

    /// Run the node's computation
    pub(crate) fn update(&mut self, ctx: &mut UpdateContext<'_>) -> Result<(), NodeError> {
        let Self {
            tree,
            inputs,
            outputs,
            kind,
            ..
        } = self;
        kind.update(
            &mut NodeIo {
                tree,
                inputs: *inputs,
                outputs: *outputs,
            },
            ctx,
        )
    }
}

/// Root properties are always called `inputs` and `outputs`
fn root_decl(decl: &PropertyDecl, name: &str) -> PropertyDecl {
    PropertyDecl {
        name: name.to_owned(),
        ..decl.clone()
    }
}
