// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node-level dependency graph and execution order.
//!
//! Strong links and binding dependencies are ordering edges; several
//! property links between the same pair of nodes share one edge with a
//! multiplicity count. Weak links are only counted so that a node taking
//! part in them still reports as linked.

use crate::node::NodeId;
use indexmap::IndexMap;
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
struct NodeEdges {
    /// Nodes depending on this one, with edge multiplicity
    outgoing: IndexMap<NodeId, usize>,
    /// Nodes this one depends on, with edge multiplicity
    incoming: IndexMap<NodeId, usize>,
    weak_links: usize,
}

/// Dependency graph over the nodes of one engine
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: IndexMap<NodeId, NodeEdges>,
    order: Option<Vec<NodeId>>,
}

impl DependencyGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node without edges
    pub fn add_node(&mut self, node: NodeId) {
        self.nodes.entry(node).or_default();
        self.order = None;
    }

    /// Remove a node together with every edge touching it
    pub fn remove_node(&mut self, node: NodeId) {
        let Some(edges) = self.nodes.shift_remove(&node) else {
            return;
        };
        for other in edges.outgoing.keys() {
            if let Some(o) = self.nodes.get_mut(other) {
                o.incoming.shift_remove(&node);
            }
        }
        for other in edges.incoming.keys() {
            if let Some(o) = self.nodes.get_mut(other) {
                o.outgoing.shift_remove(&node);
            }
        }
        self.order = None;
    }

    /// Whether the node is part of the graph
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Record a link from `from` to `to`
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, weak: bool) {
        if weak {
            for node in [from, to] {
                if let Some(edges) = self.nodes.get_mut(&node) {
                    edges.weak_links += 1;
                }
            }
            return;
        }

        if let Some(edges) = self.nodes.get_mut(&from) {
            *edges.outgoing.entry(to).or_default() += 1;
        }
        if let Some(edges) = self.nodes.get_mut(&to) {
            *edges.incoming.entry(from).or_default() += 1;
        }
        self.order = None;
    }

    /// Forget one link from `from` to `to`
    pub fn remove_edge(&mut self, from: NodeId, to: NodeId, weak: bool) {
        if weak {
            for node in [from, to] {
                if let Some(edges) = self.nodes.get_mut(&node) {
                    edges.weak_links = edges.weak_links.saturating_sub(1);
                }
            }
            return;
        }

        if let Some(edges) = self.nodes.get_mut(&from) {
            decrement(&mut edges.outgoing, to);
        }
        if let Some(edges) = self.nodes.get_mut(&to) {
            decrement(&mut edges.incoming, from);
        }
        self.order = None;
    }

    /// Order `dependent` after `binding` without any property link
    pub fn add_binding_dependency(&mut self, dependent: NodeId, binding: NodeId) {
        self.add_edge(binding, dependent, false);
    }

    /// Remove an ordering added by [`Self::add_binding_dependency`]
    pub fn remove_binding_dependency(&mut self, dependent: NodeId, binding: NodeId) {
        self.remove_edge(binding, dependent, false);
    }

    /// Whether a strong edge `from -> to` would close a cycle
    pub fn would_create_cycle(&self, from: NodeId, to: NodeId) -> bool {
        from == to || self.reaches(to, from)
    }

    fn reaches(&self, start: NodeId, goal: NodeId) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            if node == goal {
                return true;
            }
            if !visited.insert(node) {
                continue;
            }
            if let Some(edges) = self.nodes.get(&node) {
                stack.extend(edges.outgoing.keys().copied());
            }
        }
        false
    }

    /// Whether the node takes part in any link or binding dependency
    pub fn is_linked(&self, node: NodeId) -> bool {
        self.nodes
            .get(&node)
            .is_some_and(|e| e.weak_links > 0 || !e.outgoing.is_empty() || !e.incoming.is_empty())
    }

    /// Nodes that must run after `node`
    pub fn dependents(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .get(&node)
            .into_iter()
            .flat_map(|e| e.outgoing.keys().copied())
    }

    /// Nodes that must run before `node`
    pub fn dependencies(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .get(&node)
            .into_iter()
            .flat_map(|e| e.incoming.keys().copied())
    }

    /// Whether the cached order is still valid
    pub fn is_order_cached(&self) -> bool {
        self.order.is_some()
    }

    /// Nodes in execution order: every node after all of its dependencies.
    /// Computed on first use after a change and cached.
    pub fn topological_order(&mut self) -> Result<&[NodeId], CycleError> {
        if self.order.is_none() {
            self.order = Some(self.sort()?);
        }
        Ok(self.order.as_deref().unwrap_or_default())
    }

    /// Post-order walk over dependencies with an explicit stack, so long
    /// chains don't grow the call stack
    fn sort(&self) -> Result<Vec<NodeId>, CycleError> {
        let mut visited = HashSet::new();
        let mut on_path = HashSet::new();
        let mut order = Vec::with_capacity(self.nodes.len());
        // node and index of its next dependency to visit
        let mut stack: Vec<(NodeId, usize)> = Vec::new();

        for root in self.nodes.keys() {
            if visited.contains(root) {
                continue;
            }
            on_path.insert(*root);
            stack.push((*root, 0));

            while let Some(&(node, next)) = stack.last() {
                let dependency = self
                    .nodes
                    .get(&node)
                    .and_then(|e| e.incoming.get_index(next))
                    .map(|(id, _)| *id);
                let Some(dependency) = dependency else {
                    stack.pop();
                    on_path.remove(&node);
                    visited.insert(node);
                    // dependencies are already in `order`
                    order.push(node);
                    continue;
                };

                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }
                if on_path.contains(&dependency) {
                    return Err(CycleError(dependency));
                }
                if !visited.contains(&dependency) {
                    on_path.insert(dependency);
                    stack.push((dependency, 0));
                }
            }
        }

        Ok(order)
    }
}

fn decrement(map: &mut IndexMap<NodeId, usize>, key: NodeId) {
    if let Some(count) = map.get_mut(&key) {
        *count -= 1;
        if *count == 0 {
            map.shift_remove(&key);
        }
    }
}

/// Error when the strong edges contain a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Dependency graph contains a cycle through node {0}")]
pub struct CycleError(pub NodeId);
