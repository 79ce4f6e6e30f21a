// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node kinds.
//!
//! The set of kinds is closed: [`NodeKind`] is a sum type whose variants
//! carry the kind-specific state, and [`LogicNode`] is the capability
//! surface the scheduler dispatches through.

mod anchor;
mod animation;
mod binding;
mod interface;
mod script;
mod timer;

pub use anchor::AnchorPoint;
pub use animation::{AnimationChannel, AnimationConfig, AnimationNode, InterpolationType};
pub use binding::{AppearanceBinding, CameraBinding, NodeBinding, UniformDecl};
pub use interface::InterfaceNode;
pub use script::{ScriptDefinition, ScriptFn, ScriptNode, ScriptRegistry};
pub use timer::TimerNode;

use crate::host::{HostObjectId, HostScene};
use crate::node::{NodeError, NodeId};
use crate::property::{PropertyDecl, PropertySemantics, PropertySlot, PropertyTree, PropertyValue};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Declared property interface of a node kind
#[derive(Debug, Clone, Default)]
pub struct NodeInterface {
    /// Input tree, rooted in a struct
    pub inputs: Option<PropertyDecl>,
    /// Output tree, rooted in a struct
    pub outputs: Option<PropertyDecl>,
    /// How writes to the inputs behave
    pub input_semantics: PropertySemantics,
}

/// What a node sees while it runs: the host scene and the frame clock
pub struct UpdateContext<'a> {
    /// Host scene the bindings write to
    pub host: &'a mut dyn HostScene,
    /// Microseconds since the UNIX epoch at the start of the pass
    pub clock_us: i64,
}

impl<'a> UpdateContext<'a> {
    /// Create a context stamped with the current system time
    pub fn new(host: &'a mut dyn HostScene) -> Self {
        let clock_us = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_micros()).unwrap_or(i64::MAX))
            .unwrap_or_default();
        Self { host, clock_us }
    }
}

/// A node's own property tree, as handed to its kind during initialization and update
pub struct NodeIo<'a> {
    pub(crate) tree: &'a mut PropertyTree,
    pub(crate) inputs: Option<PropertySlot>,
    pub(crate) outputs: Option<PropertySlot>,
}

impl NodeIo<'_> {
    /// Input slot by path below the input root
    pub fn input_slot(&self, path: &str) -> Result<PropertySlot, NodeError> {
        self.inputs
            .and_then(|root| self.tree.resolve(root, path))
            .ok_or_else(|| NodeError::MissingProperty(format!("inputs.{path}")))
    }

    /// Output slot by path below the output root
    pub fn output_slot(&self, path: &str) -> Result<PropertySlot, NodeError> {
        self.outputs
            .and_then(|root| self.tree.resolve(root, path))
            .ok_or_else(|| NodeError::MissingProperty(format!("outputs.{path}")))
    }

    /// Current value of an input leaf
    pub fn input(&self, path: &str) -> Result<&PropertyValue, NodeError> {
        let slot = self.input_slot(path)?;
        self.tree
            .value(slot)
            .ok_or_else(|| NodeError::UnexpectedType(format!("inputs.{path}")))
    }

    /// Current value of an output leaf
    pub fn output(&self, path: &str) -> Result<&PropertyValue, NodeError> {
        let slot = self.output_slot(path)?;
        self.tree
            .value(slot)
            .ok_or_else(|| NodeError::UnexpectedType(format!("outputs.{path}")))
    }

    /// Write an output leaf; the value must match the declared type
    pub fn set_output(&mut self, path: &str, value: impl Into<PropertyValue>) -> Result<(), NodeError> {
        let slot = self.output_slot(path)?;
        self.set_output_slot(slot, value.into())
    }

    pub(crate) fn set_output_slot(&mut self, slot: PropertySlot, value: PropertyValue) -> Result<(), NodeError> {
        let property = self
            .tree
            .get(slot)
            .ok_or_else(|| NodeError::MissingProperty(format!("slot {}", slot.0)))?;
        if property.property_type() != value.property_type() {
            return Err(NodeError::UnexpectedType(self.tree.path_of(slot)));
        }
        self.tree.store(slot, value);
        Ok(())
    }

    /// The whole property tree
    pub fn tree(&self) -> &PropertyTree {
        &*self.tree
    }
}

/// Capability every node kind implements
pub trait LogicNode {
    /// Properties the node exposes
    fn interface(&self) -> NodeInterface;

    /// Seed property values after the tree is built
    fn initialize(&mut self, _io: &mut NodeIo<'_>, _host: &dyn HostScene) -> Result<(), NodeError> {
        Ok(())
    }

    /// Read inputs, compute, write outputs (and host fields for bindings)
    fn update(&mut self, io: &mut NodeIo<'_>, ctx: &mut UpdateContext<'_>) -> Result<(), NodeError>;

    /// Configuration that recreates this node
    fn config(&self) -> NodeConfig;

    /// Whether the node reads host state the graph cannot order against
    fn is_externally_coupled(&self) -> bool {
        false
    }

    /// Whether the node must run on every pass regardless of its inputs
    fn is_always_dirty(&self) -> bool {
        false
    }
}

/// Serializable description of a node, used by the factory and snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeConfig {
    /// Script instantiated from a registered definition
    Script {
        /// Definition ID in the script registry
        script: String,
    },
    /// Interface exposing the same tree as inputs and outputs
    Interface {
        /// Declared properties
        properties: PropertyDecl,
    },
    /// Binding to a host scene node
    NodeBinding {
        /// Bound host object
        object: HostObjectId,
    },
    /// Binding to a host camera
    CameraBinding {
        /// Bound host object
        object: HostObjectId,
    },
    /// Binding to a host appearance
    AppearanceBinding {
        /// Bound host object
        object: HostObjectId,
        /// Exposed uniforms
        uniforms: Vec<UniformDecl>,
    },
    /// Clock ticker
    Timer,
    /// Keyframe animation sampler
    Animation(AnimationConfig),
    /// Screen-space projection of a bound node through a bound camera
    AnchorPoint {
        /// Node binding whose host node is projected
        node_binding: NodeId,
        /// Camera binding used for projection
        camera_binding: NodeId,
    },
}

impl NodeConfig {
    /// Short name of the kind
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Script { .. } => "Script",
            Self::Interface { .. } => "Interface",
            Self::NodeBinding { .. } => "NodeBinding",
            Self::CameraBinding { .. } => "CameraBinding",
            Self::AppearanceBinding { .. } => "AppearanceBinding",
            Self::Timer => "Timer",
            Self::Animation(_) => "Animation",
            Self::AnchorPoint { .. } => "AnchorPoint",
        }
    }
}

/// A node kind together with its runtime state
#[derive(Debug)]
pub enum NodeKind {
    /// Script node
    Script(ScriptNode),
    /// Interface node
    Interface(InterfaceNode),
    /// Host node binding
    NodeBinding(NodeBinding),
    /// Host camera binding
    CameraBinding(CameraBinding),
    /// Host appearance binding
    AppearanceBinding(AppearanceBinding),
    /// Timer node
    Timer(TimerNode),
    /// Animation node
    Animation(AnimationNode),
    /// Anchor point
    AnchorPoint(AnchorPoint),
}

impl NodeKind {
    fn as_logic_node(&self) -> &dyn LogicNode {
        match self {
            Self::Script(n) => n,
            Self::Interface(n) => n,
            Self::NodeBinding(n) => n,
            Self::CameraBinding(n) => n,
            Self::AppearanceBinding(n) => n,
            Self::Timer(n) => n,
            Self::Animation(n) => n,
            Self::AnchorPoint(n) => n,
        }
    }

    fn as_logic_node_mut(&mut self) -> &mut dyn LogicNode {
        match self {
            Self::Script(n) => n,
            Self::Interface(n) => n,
            Self::NodeBinding(n) => n,
            Self::CameraBinding(n) => n,
            Self::AppearanceBinding(n) => n,
            Self::Timer(n) => n,
            Self::Animation(n) => n,
            Self::AnchorPoint(n) => n,
        }
    }

    /// Whether this kind wraps a host object
    pub fn is_binding(&self) -> bool {
        matches!(
            self,
            Self::NodeBinding(_) | Self::CameraBinding(_) | Self::AppearanceBinding(_)
        )
    }
}

impl LogicNode for NodeKind {
    fn interface(&self) -> NodeInterface {
        self.as_logic_node().interface()
    }

    fn initialize(&mut self, io: &mut NodeIo<'_>, host: &dyn HostScene) -> Result<(), NodeError> {
        self.as_logic_node_mut().initialize(io, host)
    }

    fn update(&mut self, io: &mut NodeIo<'_>, ctx: &mut UpdateContext<'_>) -> Result<(), NodeError> {
        self.as_logic_node_mut().update(io, ctx)
    }

    fn config(&self) -> NodeConfig {
        self.as_logic_node().config()
    }

    fn is_externally_coupled(&self) -> bool {
        self.as_logic_node().is_externally_coupled()
    }

    fn is_always_dirty(&self) -> bool {
        self.as_logic_node().is_always_dirty()
    }
}
