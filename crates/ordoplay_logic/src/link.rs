// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property links between nodes.
//!
//! A link connects one output leaf to one input leaf of the same type. Every
//! input accepts at most one incoming link, while outputs fan out freely.
//! Link descriptors are stored on both properties and in the registry, which
//! keeps creation order for enumeration and snapshots.

use crate::dependency::DependencyGraph;
use crate::node::{Node, NodeId};
use crate::property::{LinkEnd, Property, PropertyId, PropertyType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A directed link from an output leaf to an input leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Output property providing the value
    pub source: PropertyId,
    /// Input property receiving the value
    pub target: PropertyId,
    /// Weak links carry values but do not order execution
    pub weak: bool,
}

/// Error when creating or removing a link
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LinkError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Property not found
    #[error("Property not found: {0}")]
    PropertyNotFound(PropertyId),

    /// Only primitive properties can be linked
    #[error("Can't link property {0} which is not a primitive type")]
    NotALeaf(PropertyId),

    /// Links go from an output to an input
    #[error("Can't link {from} to {to}: links must go from an output to an input")]
    WrongDirection {
        /// Requested source
        from: PropertyId,
        /// Requested target
        to: PropertyId,
    },

    /// Source and target types differ
    #[error("Types of source property ({source_type}) and target property ({target_type}) don't match")]
    TypeMismatch {
        /// Type of the source
        source_type: PropertyType,
        /// Type of the target
        target_type: PropertyType,
    },

    /// Target input already has an incoming link
    #[error("Property {0} is already linked")]
    AlreadyLinked(PropertyId),

    /// A node may only link to itself weakly
    #[error("Node {0} can't be strongly linked to itself")]
    SelfLink(NodeId),

    /// The link would close a cycle of strong links
    #[error("Linking {from} to {to} would create a cycle")]
    CycleDetected {
        /// Source node
        from: NodeId,
        /// Target node
        to: NodeId,
    },

    /// Target has no incoming link
    #[error("Property {0} is not linked")]
    NotLinked(PropertyId),
}

/// All links of one engine, keyed by target property
#[derive(Debug, Clone, Default)]
pub struct LinkRegistry {
    links: IndexMap<PropertyId, Link>,
}

fn property(nodes: &IndexMap<NodeId, Node>, id: PropertyId) -> Result<&Property, LinkError> {
    nodes
        .get(&id.node)
        .ok_or(LinkError::NodeNotFound(id.node))?
        .properties()
        .get(id.slot)
        .ok_or(LinkError::PropertyNotFound(id))
}

impl LinkRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and create a link; on error nothing changes
    pub fn link(
        &mut self,
        nodes: &mut IndexMap<NodeId, Node>,
        graph: &mut DependencyGraph,
        source: PropertyId,
        target: PropertyId,
        weak: bool,
    ) -> Result<(), LinkError> {
        let source_property = property(nodes, source)?;
        let target_property = property(nodes, target)?;

        if !source_property.is_leaf() {
            return Err(LinkError::NotALeaf(source));
        }
        if !target_property.is_leaf() {
            return Err(LinkError::NotALeaf(target));
        }
        if !source_property.is_output() || !target_property.is_input() {
            return Err(LinkError::WrongDirection {
                from: source,
                to: target,
            });
        }
        if source_property.property_type() != target_property.property_type() {
            return Err(LinkError::TypeMismatch {
                source_type: source_property.property_type(),
                target_type: target_property.property_type(),
            });
        }
        if target_property.has_incoming_link() {
            return Err(LinkError::AlreadyLinked(target));
        }
        if source.node == target.node && !weak {
            return Err(LinkError::SelfLink(source.node));
        }
        if !weak && graph.would_create_cycle(source.node, target.node) {
            return Err(LinkError::CycleDetected {
                from: source.node,
                to: target.node,
            });
        }

        if let Some(node) = nodes.get_mut(&source.node) {
            node.properties_mut()
                .add_outgoing(source.slot, LinkEnd { property: target, weak });
        }
        if let Some(node) = nodes.get_mut(&target.node) {
            node.properties_mut()
                .set_incoming(target.slot, Some(LinkEnd { property: source, weak }));
            node.mark_dirty();
        }
        graph.add_edge(source.node, target.node, weak);
        self.links.insert(target, Link { source, target, weak });

        tracing::debug!(%source, %target, weak, "Linked properties");
        Ok(())
    }

    /// Remove the incoming link of `target`
    pub fn unlink(
        &mut self,
        nodes: &mut IndexMap<NodeId, Node>,
        graph: &mut DependencyGraph,
        target: PropertyId,
    ) -> Result<Link, LinkError> {
        property(nodes, target)?;
        let link = self
            .links
            .shift_remove(&target)
            .ok_or(LinkError::NotLinked(target))?;

        if let Some(node) = nodes.get_mut(&link.source.node) {
            node.properties_mut().remove_outgoing(link.source.slot, target);
        }
        if let Some(node) = nodes.get_mut(&target.node) {
            node.properties_mut().set_incoming(target.slot, None);
        }
        graph.remove_edge(link.source.node, target.node, link.weak);

        tracing::debug!(source = %link.source, %target, "Unlinked properties");
        Ok(link)
    }

    /// Incoming link of a target property
    pub fn incoming(&self, target: PropertyId) -> Option<&Link> {
        self.links.get(&target)
    }

    /// All links in creation order
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Whether any link starts or ends at a property of `node`
    pub fn touches_node(&self, node: NodeId) -> bool {
        self.links
            .values()
            .any(|l| l.source.node == node || l.target.node == node)
    }

    /// Number of links
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether there are no links
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SceneStore;
    use crate::nodes::{InterfaceNode, NodeKind};
    use crate::property::{PropertyDecl, PropertyValue};

    struct Fixture {
        nodes: IndexMap<NodeId, Node>,
        graph: DependencyGraph,
        links: LinkRegistry,
    }

    impl Fixture {
        fn new(count: u64) -> Self {
            let mut nodes = IndexMap::new();
            let mut graph = DependencyGraph::new();
            for raw in 1..=count {
                let decl = PropertyDecl::structure(
                    "",
                    vec![
                        PropertyDecl::new("f", PropertyType::Float),
                        PropertyDecl::new("i", PropertyType::Int32),
                        PropertyDecl::structure("s", vec![PropertyDecl::new("x", PropertyType::Float)]),
                    ],
                );
                let node = Node::new(
                    NodeId(raw),
                    format!("n{raw}"),
                    NodeKind::Interface(InterfaceNode::new(decl)),
                    &SceneStore::new(),
                )
                .unwrap();
                graph.add_node(node.id());
                nodes.insert(node.id(), node);
            }
            Self {
                nodes,
                graph,
                links: LinkRegistry::new(),
            }
        }

        fn prop(&self, node: u64, path: &str) -> PropertyId {
            let node = &self.nodes[&NodeId(node)];
            node.property_id(node.find(path).unwrap())
        }

        fn link(&mut self, source: PropertyId, target: PropertyId, weak: bool) -> Result<(), LinkError> {
            self.links.link(&mut self.nodes, &mut self.graph, source, target, weak)
        }

        fn unlink(&mut self, target: PropertyId) -> Result<Link, LinkError> {
            self.links.unlink(&mut self.nodes, &mut self.graph, target)
        }
    }

    #[test]
    fn link_records_both_ends_and_marks_target_dirty() {
        let mut f = Fixture::new(2);
        let (source, target) = (f.prop(1, "outputs.f"), f.prop(2, "inputs.f"));
        f.nodes[&NodeId(2)].clear_dirty();

        f.link(source, target, false).unwrap();

        let target_node = &f.nodes[&NodeId(2)];
        assert!(target_node.is_dirty());
        assert_eq!(
            target_node.properties().get(target.slot).unwrap().incoming_link(),
            Some(LinkEnd { property: source, weak: false })
        );
        let source_prop = f.nodes[&NodeId(1)].properties().get(source.slot).unwrap().clone();
        assert_eq!(source_prop.outgoing_links(), &[LinkEnd { property: target, weak: false }]);
        assert!(f.graph.is_linked(NodeId(1)));
        assert_eq!(f.links.len(), 1);
    }

    #[test]
    fn validation_order_and_errors() {
        let mut f = Fixture::new(2);
        let out_struct = f.prop(1, "outputs.s");
        let in_f = f.prop(2, "inputs.f");
        let out_f = f.prop(1, "outputs.f");
        let out_i = f.prop(1, "outputs.i");

        assert_eq!(f.link(out_struct, in_f, false), Err(LinkError::NotALeaf(out_struct)));
        assert!(matches!(f.link(out_i, in_f, false), Err(LinkError::TypeMismatch { .. })));

        f.link(out_f, in_f, false).unwrap();
        let other = f.prop(1, "outputs.s.x");
        assert_eq!(f.link(other, in_f, false), Err(LinkError::AlreadyLinked(in_f)));

        let missing = PropertyId::new(NodeId(9), in_f.slot);
        assert_eq!(f.link(out_f, missing, false), Err(LinkError::NodeNotFound(NodeId(9))));
    }

    #[test]
    fn reversed_links_report_both_ends() {
        let mut f = Fixture::new(2);
        let in_f = f.prop(2, "inputs.f");
        let out_f = f.prop(1, "outputs.f");
        let other_in = f.prop(1, "inputs.f");

        let err = f.link(in_f, out_f, false).unwrap_err();
        assert_eq!(err, LinkError::WrongDirection { from: in_f, to: out_f });
        assert!(err.to_string().contains("must go from an output to an input"));

        // input to input is just as wrong
        match f.link(other_in, in_f, false) {
            Err(LinkError::WrongDirection { from, to }) => {
                assert_eq!(from, other_in);
                assert_eq!(to, in_f);
            }
            other => panic!("unexpected result {other:?}"),
        }
        assert!(f.links.is_empty());
    }

    #[test]
    fn self_links_must_be_weak() {
        let mut f = Fixture::new(1);
        let (source, target) = (f.prop(1, "outputs.f"), f.prop(1, "inputs.f"));
        assert_eq!(f.link(source, target, false), Err(LinkError::SelfLink(NodeId(1))));
        assert!(f.link(source, target, true).is_ok());
        assert!(f.graph.is_linked(NodeId(1)));
    }

    #[test]
    fn cycle_is_rejected_without_state_change() {
        let mut f = Fixture::new(2);
        f.link(f.prop(1, "outputs.f"), f.prop(2, "inputs.f"), false).unwrap();

        let back_source = f.prop(2, "outputs.f");
        let back_target = f.prop(1, "inputs.f");
        assert_eq!(
            f.link(back_source, back_target, false),
            Err(LinkError::CycleDetected { from: NodeId(2), to: NodeId(1) })
        );
        assert_eq!(f.links.len(), 1);
        assert!(!f.nodes[&NodeId(1)].properties().get(back_target.slot).unwrap().is_linked());

        // the same link is fine when weak
        assert!(f.link(back_source, back_target, true).is_ok());
    }

    #[test]
    fn unlink_restores_unlinked_state() {
        let mut f = Fixture::new(3);
        let target = f.prop(2, "inputs.f");
        f.link(f.prop(1, "outputs.f"), target, false).unwrap();

        let link = f.unlink(target).unwrap();
        assert_eq!(link.target, target);
        assert!(!f.graph.is_linked(NodeId(1)));
        assert!(!f.graph.is_linked(NodeId(2)));
        assert!(!f.links.touches_node(NodeId(1)));
        assert_eq!(f.unlink(target), Err(LinkError::NotLinked(target)));

        f.link(f.prop(3, "outputs.f"), target, false).unwrap();
        assert_eq!(f.links.incoming(target).map(|l| l.source.node), Some(NodeId(3)));
    }

    #[test]
    fn linked_input_rejects_direct_writes() {
        let mut f = Fixture::new(2);
        let target = f.prop(2, "inputs.f");
        f.link(f.prop(1, "outputs.f"), target, false).unwrap();

        let result = f.nodes[&NodeId(2)]
            .properties_mut()
            .set_value(target.slot, PropertyValue::Float(1.0));
        assert!(matches!(result, Err(crate::property::PropertyError::InputIsLinked(_))));
    }
}
