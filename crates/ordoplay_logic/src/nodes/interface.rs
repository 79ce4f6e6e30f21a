// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interface nodes: a named set of values forwarded unchanged.

use super::{LogicNode, NodeConfig, NodeInterface, NodeIo, UpdateContext};
use crate::node::NodeError;
use crate::property::{PropertyDecl, PropertySemantics};

/// Node exposing one declared tree as both inputs and outputs
#[derive(Debug, Clone)]
pub struct InterfaceNode {
    properties: PropertyDecl,
}

impl InterfaceNode {
    /// Create an interface from a struct declaration
    pub fn new(properties: PropertyDecl) -> Self {
        Self { properties }
    }
}

impl LogicNode for InterfaceNode {
    fn interface(&self) -> NodeInterface {
        NodeInterface {
            inputs: Some(self.properties.clone()),
            outputs: Some(self.properties.clone()),
            input_semantics: PropertySemantics::Interface,
        }
    }

    fn update(&mut self, io: &mut NodeIo<'_>, _ctx: &mut UpdateContext<'_>) -> Result<(), NodeError> {
        let (Some(inputs), Some(outputs)) = (io.inputs, io.outputs) else {
            return Ok(());
        };
        // both trees come from the same declaration, so leaves pair up in order
        let pairs: Vec<_> = io
            .tree
            .leaves(inputs)
            .into_iter()
            .zip(io.tree.leaves(outputs))
            .collect();
        for (input, output) in pairs {
            if let Some(value) = io.tree.value(input).cloned() {
                io.tree.store(output, value);
            }
        }
        Ok(())
    }

    fn config(&self) -> NodeConfig {
        NodeConfig::Interface {
            properties: self.properties.clone(),
        }
    }
}
