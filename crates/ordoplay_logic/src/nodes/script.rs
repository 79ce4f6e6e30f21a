// SPDX-License-Identifier: MIT OR Apache-2.0
//! Script nodes and the registry of script definitions.
//!
//! A script is a native update function paired with its declared interface.
//! Scripts are registered once per engine and instantiated by ID, which is
//! also what snapshots store.

use super::{LogicNode, NodeConfig, NodeInterface, NodeIo, UpdateContext};
use crate::node::NodeError;
use crate::property::PropertyDecl;
use indexmap::IndexMap;
use std::fmt;
use std::rc::Rc;

/// Update function of a script
pub type ScriptFn = Rc<dyn Fn(&mut NodeIo<'_>) -> Result<(), NodeError>>;

/// A script definition: interface plus behaviour
#[derive(Clone)]
pub struct ScriptDefinition {
    /// Unique definition ID
    pub id: String,
    /// Input tree
    pub inputs: PropertyDecl,
    /// Output tree
    pub outputs: PropertyDecl,
    /// Update function
    pub run: ScriptFn,
}

impl ScriptDefinition {
    /// Create a definition
    pub fn new(
        id: impl Into<String>,
        inputs: PropertyDecl,
        outputs: PropertyDecl,
        run: impl Fn(&mut NodeIo<'_>) -> Result<(), NodeError> + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            inputs,
            outputs,
            run: Rc::new(run),
        }
    }
}

impl fmt::Debug for ScriptDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptDefinition")
            .field("id", &self.id)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}

/// Registry of available script definitions
#[derive(Debug, Default)]
pub struct ScriptRegistry {
    definitions: IndexMap<String, ScriptDefinition>,
}

impl ScriptRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition, replacing one with the same ID
    pub fn register(&mut self, definition: ScriptDefinition) {
        self.definitions.insert(definition.id.clone(), definition);
    }

    /// Get a definition by ID
    pub fn get(&self, id: &str) -> Option<&ScriptDefinition> {
        self.definitions.get(id)
    }

    /// All registered IDs
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    /// Create a script node from a definition ID
    pub fn instantiate(&self, id: &str) -> Option<ScriptNode> {
        self.get(id).cloned().map(ScriptNode::new)
    }
}

/// Node running a script definition
#[derive(Debug)]
pub struct ScriptNode {
    definition: ScriptDefinition,
}

impl ScriptNode {
    /// Create a script node
    pub fn new(definition: ScriptDefinition) -> Self {
        Self { definition }
    }

    /// Definition ID
    pub fn script_id(&self) -> &str {
        &self.definition.id
    }
}

impl LogicNode for ScriptNode {
    fn interface(&self) -> NodeInterface {
        NodeInterface {
            inputs: Some(self.definition.inputs.clone()),
            outputs: Some(self.definition.outputs.clone()),
            ..NodeInterface::default()
        }
    }

    fn update(&mut self, io: &mut NodeIo<'_>, _ctx: &mut UpdateContext<'_>) -> Result<(), NodeError> {
        (self.definition.run)(io)
    }

    fn config(&self) -> NodeConfig {
        NodeConfig::Script {
            script: self.definition.id.clone(),
        }
    }
}
