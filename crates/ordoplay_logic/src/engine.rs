// SPDX-License-Identifier: MIT OR Apache-2.0
//! The logic engine: owns nodes, links, the dependency graph and the host.

use crate::config::EngineConfig;
use crate::dependency::DependencyGraph;
use crate::error::EngineError;
use crate::host::{HostObjectId, HostScene, SceneStore};
use crate::link::{Link, LinkError, LinkRegistry};
use crate::node::{Node, NodeId};
use crate::nodes::{
    AnchorPoint, AnimationConfig, AnimationNode, AppearanceBinding, CameraBinding, InterfaceNode, NodeBinding,
    NodeConfig, NodeKind, ScriptDefinition, ScriptRegistry, TimerNode, UniformDecl,
};
use crate::property::{
    Property, PropertyDecl, PropertyError, PropertyId, PropertySemantics, PropertyType, PropertyValue,
};
use crate::report::UpdateReport;
use crate::scheduler::Scheduler;
use crate::snapshot::{GraphSnapshot, LinkRecord, NodeRecord, SNAPSHOT_VERSION};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt;

/// Content problem reported by [`LogicEngine::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// Interface output that feeds no other node
    UnlinkedInterfaceOutput {
        /// Interface node
        node: NodeId,
        /// Interface name
        name: String,
        /// Full path of the output, e.g. `outputs.speed`
        output: String,
    },
    /// Two or more interfaces share a name
    DuplicateInterfaceName {
        /// Shared name
        name: String,
        /// Interfaces carrying it, in creation order
        nodes: Vec<NodeId>,
    },
    /// Node has outputs but none of them is linked
    NoOutgoingLinks {
        /// Node
        node: NodeId,
        /// Node name
        name: String,
    },
    /// Node has inputs but none of them is linked
    NoIncomingLinks {
        /// Node
        node: NodeId,
        /// Node name
        name: String,
    },
    /// Binding inputs were set but `update()` has not written them yet
    PendingBindingValues {
        /// Node
        node: NodeId,
        /// Node name
        name: String,
    },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnlinkedInterfaceOutput { node, name, output } => {
                write!(f, "Interface '{name}' ({node}) has unlinked output '{output}'")
            }
            Self::DuplicateInterfaceName { name, nodes } => {
                write!(f, "Interface name '{name}' is used by {} nodes", nodes.len())
            }
            Self::NoOutgoingLinks { node, name } => write!(f, "Node '{name}' ({node}) has no outgoing links"),
            Self::NoIncomingLinks { node, name } => write!(f, "Node '{name}' ({node}) has no incoming links"),
            Self::PendingBindingValues { node, name } => {
                write!(f, "Binding '{name}' ({node}) has values that were not applied, call update()")
            }
        }
    }
}

/// A logic graph bound to a host scene
#[derive(Debug)]
pub struct LogicEngine<H: HostScene = SceneStore> {
    nodes: IndexMap<NodeId, Node>,
    links: LinkRegistry,
    graph: DependencyGraph,
    scheduler: Scheduler,
    scripts: ScriptRegistry,
    host: H,
    next_node_id: u64,
}

impl LogicEngine<SceneStore> {
    /// Create an engine with an empty in-memory scene
    pub fn new() -> Self {
        Self::with_host(SceneStore::new())
    }
}

impl Default for LogicEngine<SceneStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: HostScene> LogicEngine<H> {
    /// Create an engine driving the given host scene
    pub fn with_host(host: H) -> Self {
        Self::with_config(host, EngineConfig::default())
    }

    /// Create an engine with explicit settings
    pub fn with_config(host: H, config: EngineConfig) -> Self {
        Self {
            nodes: IndexMap::new(),
            links: LinkRegistry::new(),
            graph: DependencyGraph::new(),
            scheduler: Scheduler::new(
                config.dirty_tracking,
                config.update_report,
                config.statistics_logging_rate,
            ),
            scripts: ScriptRegistry::new(),
            host,
            next_node_id: 1,
        }
    }

    /// Current settings
    pub fn config(&self) -> EngineConfig {
        EngineConfig {
            dirty_tracking: self.scheduler.dirty_tracking(),
            update_report: self.scheduler.report_enabled(),
            statistics_logging_rate: self.scheduler.statistics_logging_rate(),
        }
    }

    /// Host scene
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Host scene, mutably; changes made here are picked up by anchor points
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Registered script definitions
    pub fn scripts(&self) -> &ScriptRegistry {
        &self.scripts
    }

    /// Register a script definition for [`Self::create_script`]
    pub fn register_script(&mut self, definition: ScriptDefinition) {
        self.scripts.register(definition);
    }

    /// Create a node from a configuration
    pub fn create_node(&mut self, name: impl Into<String>, config: NodeConfig) -> Result<NodeId, EngineError> {
        let id = NodeId(self.next_node_id);
        self.insert_node(id, name.into(), config)?;
        self.next_node_id += 1;
        Ok(id)
    }

    fn insert_node(&mut self, id: NodeId, name: String, config: NodeConfig) -> Result<(), EngineError> {
        if self.nodes.contains_key(&id) {
            return Err(EngineError::InternalConsistency(format!("node {id} already exists")));
        }
        let kind_name = config.kind_name();
        let mut observed = Vec::new();
        let kind = match config {
            NodeConfig::Script { script } => NodeKind::Script(
                self.scripts
                    .instantiate(&script)
                    .ok_or(EngineError::UnknownScript(script))?,
            ),
            NodeConfig::Interface { properties } => {
                check_interface(&properties).map_err(EngineError::InvalidConfig)?;
                NodeKind::Interface(InterfaceNode::new(properties))
            }
            NodeConfig::NodeBinding { object } => NodeKind::NodeBinding(NodeBinding::new(object)),
            NodeConfig::CameraBinding { object } => NodeKind::CameraBinding(CameraBinding::new(object)),
            NodeConfig::AppearanceBinding { object, uniforms } => {
                check_uniforms(&uniforms).map_err(EngineError::InvalidConfig)?;
                NodeKind::AppearanceBinding(AppearanceBinding::new(object, uniforms))
            }
            NodeConfig::Timer => NodeKind::Timer(TimerNode::new()),
            NodeConfig::Animation(config) => {
                NodeKind::Animation(AnimationNode::new(config).map_err(EngineError::InvalidConfig)?)
            }
            NodeConfig::AnchorPoint {
                node_binding,
                camera_binding,
            } => {
                let node_object = self.bound_object(node_binding, |kind| match kind {
                    NodeKind::NodeBinding(b) => Some(b.object()),
                    _ => None,
                })?;
                let camera_object = self.bound_object(camera_binding, |kind| match kind {
                    NodeKind::CameraBinding(b) => Some(b.object()),
                    _ => None,
                })?;
                observed = vec![node_binding, camera_binding];
                NodeKind::AnchorPoint(AnchorPoint::new(node_binding, camera_binding, node_object, camera_object))
            }
        };

        let node = Node::new(id, name.clone(), kind, &self.host)
            .map_err(|source| EngineError::NodeCreation { name: name.clone(), source })?;
        self.nodes.insert(id, node);
        self.graph.add_node(id);
        for binding in observed {
            self.graph.add_binding_dependency(id, binding);
        }

        tracing::debug!(node = %id, name = %name, kind = kind_name, "Created logic node");
        Ok(())
    }

    fn bound_object(
        &self,
        binding: NodeId,
        object_of: impl Fn(&NodeKind) -> Option<HostObjectId>,
    ) -> Result<HostObjectId, EngineError> {
        let node = self.nodes.get(&binding).ok_or(EngineError::NodeNotFound(binding))?;
        object_of(node.kind()).ok_or_else(|| {
            EngineError::InvalidConfig(format!("node '{}' ({binding}) is not the expected binding kind", node.name()))
        })
    }

    /// Create a script node from a registered definition
    pub fn create_script(&mut self, name: impl Into<String>, script: impl Into<String>) -> Result<NodeId, EngineError> {
        self.create_node(name, NodeConfig::Script { script: script.into() })
    }

    /// Create an interface node
    pub fn create_interface(&mut self, name: impl Into<String>, properties: PropertyDecl) -> Result<NodeId, EngineError> {
        self.create_node(name, NodeConfig::Interface { properties })
    }

    /// Create a binding for a host node
    pub fn create_node_binding(&mut self, name: impl Into<String>, object: HostObjectId) -> Result<NodeId, EngineError> {
        self.create_node(name, NodeConfig::NodeBinding { object })
    }

    /// Create a binding for a host camera
    pub fn create_camera_binding(&mut self, name: impl Into<String>, object: HostObjectId) -> Result<NodeId, EngineError> {
        self.create_node(name, NodeConfig::CameraBinding { object })
    }

    /// Create a binding for a host appearance
    pub fn create_appearance_binding(
        &mut self,
        name: impl Into<String>,
        object: HostObjectId,
        uniforms: Vec<UniformDecl>,
    ) -> Result<NodeId, EngineError> {
        self.create_node(name, NodeConfig::AppearanceBinding { object, uniforms })
    }

    /// Create a timer
    pub fn create_timer(&mut self, name: impl Into<String>) -> Result<NodeId, EngineError> {
        self.create_node(name, NodeConfig::Timer)
    }

    /// Create an animation
    pub fn create_animation(&mut self, name: impl Into<String>, config: AnimationConfig) -> Result<NodeId, EngineError> {
        self.create_node(name, NodeConfig::Animation(config))
    }

    /// Create an anchor point observing a node binding through a camera binding
    pub fn create_anchor_point(
        &mut self,
        name: impl Into<String>,
        node_binding: NodeId,
        camera_binding: NodeId,
    ) -> Result<NodeId, EngineError> {
        self.create_node(
            name,
            NodeConfig::AnchorPoint {
                node_binding,
                camera_binding,
            },
        )
    }

    /// Destroy a node; fails while any of its properties is linked or an
    /// anchor point observes it
    pub fn destroy_node(&mut self, id: NodeId) -> Result<(), EngineError> {
        let Some(node) = self.nodes.get(&id) else {
            return Err(EngineError::NodeNotFound(id));
        };
        let linked = node.has_linked_properties();
        if linked || self.graph.dependents(id).next().is_some() {
            return Err(EngineError::NodeInUse(id));
        }

        let observed: Vec<NodeId> = self.graph.dependencies(id).collect();
        for binding in observed {
            self.graph.remove_binding_dependency(id, binding);
        }
        self.graph.remove_node(id);
        self.nodes.shift_remove(&id);

        tracing::debug!(node = %id, "Destroyed logic node");
        Ok(())
    }

    /// Create a strong link: `target` follows `source` within the same pass
    pub fn link(&mut self, source: PropertyId, target: PropertyId) -> Result<(), LinkError> {
        self.links
            .link(&mut self.nodes, &mut self.graph, source, target, false)
    }

    /// Create a weak link: `target` sees `source` from the previous pass
    pub fn link_weak(&mut self, source: PropertyId, target: PropertyId) -> Result<(), LinkError> {
        self.links
            .link(&mut self.nodes, &mut self.graph, source, target, true)
    }

    /// Remove the incoming link of `target`
    pub fn unlink(&mut self, target: PropertyId) -> Result<(), LinkError> {
        self.links
            .unlink(&mut self.nodes, &mut self.graph, target)
            .map(|_| ())
    }

    /// Whether the node takes part in any link or binding dependency
    pub fn is_linked(&self, node: NodeId) -> bool {
        self.graph.is_linked(node)
    }

    /// All links in creation order
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.links()
    }

    /// Get a node
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// All nodes in creation order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// First node with the given name
    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes.values().find(|n| n.name() == name)
    }

    /// Input property by path below the node's input root
    pub fn input(&self, node: NodeId, path: &str) -> Option<PropertyId> {
        let n = self.nodes.get(&node)?;
        Some(n.property_id(n.input(path)?))
    }

    /// Output property by path below the node's output root
    pub fn output(&self, node: NodeId, path: &str) -> Option<PropertyId> {
        let n = self.nodes.get(&node)?;
        Some(n.property_id(n.output(path)?))
    }

    /// Property by handle
    pub fn property(&self, id: PropertyId) -> Option<&Property> {
        self.nodes.get(&id.node)?.properties().get(id.slot)
    }

    /// Value of a leaf property
    pub fn value(&self, id: PropertyId) -> Option<&PropertyValue> {
        self.property(id)?.value()
    }

    /// Full path of a property, e.g. `inputs.viewport.width`
    pub fn path(&self, id: PropertyId) -> Option<String> {
        let node = self.nodes.get(&id.node)?;
        node.properties().get(id.slot)?;
        Some(node.properties().path_of(id.slot))
    }

    /// Number of children of a struct or array property
    pub fn child_count(&self, id: PropertyId) -> usize {
        self.property(id).map_or(0, Property::child_count)
    }

    /// Child by position
    pub fn child(&self, id: PropertyId, index: usize) -> Option<PropertyId> {
        let slot = self.nodes.get(&id.node)?.properties().child(id.slot, index)?;
        Some(PropertyId::new(id.node, slot))
    }

    /// Struct field by name
    pub fn child_by_name(&self, id: PropertyId, name: &str) -> Option<PropertyId> {
        let slot = self.nodes.get(&id.node)?.properties().child_by_name(id.slot, name)?;
        Some(PropertyId::new(id.node, slot))
    }

    /// Set an unlinked input leaf. The node becomes dirty when the value
    /// changed, or on every write for interface and binding inputs.
    pub fn set_value(&mut self, id: PropertyId, value: impl Into<PropertyValue>) -> Result<(), PropertyError> {
        let node = self
            .nodes
            .get_mut(&id.node)
            .ok_or(PropertyError::NodeNotFound(id.node))?;
        let changed = node.properties_mut().set_value(id.slot, value.into())?;
        let always = node
            .properties()
            .get(id.slot)
            .is_some_and(|p| p.semantics() != PropertySemantics::Plain);
        if changed || always {
            node.mark_dirty();
        }
        Ok(())
    }

    /// Run one update pass
    pub fn update(&mut self) -> Result<(), EngineError> {
        self.scheduler
            .run(&mut self.nodes, &mut self.graph, &mut self.host)
    }

    /// Enable or disable skipping of clean nodes
    pub fn set_dirty_tracking_enabled(&mut self, enabled: bool) {
        self.scheduler.set_dirty_tracking(enabled);
    }

    /// Enable or disable update reports
    pub fn enable_update_report(&mut self, enabled: bool) {
        self.scheduler.set_report_enabled(enabled);
    }

    /// Report of the last pass, if reports are enabled
    pub fn last_update_report(&self) -> Option<&UpdateReport> {
        self.scheduler.report()
    }

    /// Log statistics every `rate` passes; 0 disables
    pub fn set_statistics_logging_rate(&mut self, rate: usize) {
        self.scheduler.set_statistics_logging_rate(rate);
    }

    /// Current execution order
    pub fn topological_order(&mut self) -> Result<Vec<NodeId>, EngineError> {
        self.graph
            .topological_order()
            .map(<[NodeId]>::to_vec)
            .map_err(|e| EngineError::InternalConsistency(e.to_string()))
    }

    /// Report content problems that are not errors.
    ///
    /// Interfaces are checked for unlinked outputs and shared names. Other
    /// nodes are reported when none of their outputs feeds anything, except
    /// bindings and anchor points, or when none of their inputs is fed,
    /// except timers, anchor points and bindings an anchor point observes.
    pub fn validate(&self) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        let mut interfaces: IndexMap<&str, Vec<NodeId>> = IndexMap::new();

        for node in self.nodes.values() {
            let tree = node.properties();
            let outputs = node.outputs().map(|root| tree.leaves(root)).unwrap_or_default();
            let inputs = node.inputs().map(|root| tree.leaves(root)).unwrap_or_default();
            let has_outgoing = outputs
                .iter()
                .any(|slot| tree.get(*slot).is_some_and(|p| !p.outgoing_links().is_empty()));
            let has_incoming = inputs
                .iter()
                .any(|slot| tree.get(*slot).is_some_and(Property::has_incoming_link));

            match node.kind() {
                NodeKind::Interface(_) => {
                    interfaces.entry(node.name()).or_default().push(node.id());
                    for slot in &outputs {
                        if tree.get(*slot).is_some_and(|p| p.outgoing_links().is_empty()) {
                            warnings.push(ValidationWarning::UnlinkedInterfaceOutput {
                                node: node.id(),
                                name: node.name().to_owned(),
                                output: tree.path_of(*slot),
                            });
                        }
                    }
                }
                NodeKind::AnchorPoint(_) => {}
                kind => {
                    if !kind.is_binding() && !outputs.is_empty() && !has_outgoing {
                        warnings.push(ValidationWarning::NoOutgoingLinks {
                            node: node.id(),
                            name: node.name().to_owned(),
                        });
                    }
                    let exempt = matches!(kind, NodeKind::Timer(_))
                        || (kind.is_binding() && self.observed_by_anchor(node.id()));
                    if !exempt && !inputs.is_empty() && !has_incoming {
                        warnings.push(ValidationWarning::NoIncomingLinks {
                            node: node.id(),
                            name: node.name().to_owned(),
                        });
                    }
                }
            }

            if node.has_pending_binding_values() {
                warnings.push(ValidationWarning::PendingBindingValues {
                    node: node.id(),
                    name: node.name().to_owned(),
                });
            }
        }

        for (name, nodes) in interfaces {
            if nodes.len() > 1 {
                warnings.push(ValidationWarning::DuplicateInterfaceName {
                    name: name.to_owned(),
                    nodes,
                });
            }
        }

        for warning in &warnings {
            tracing::warn!("{warning}");
        }
        warnings
    }

    fn observed_by_anchor(&self, binding: NodeId) -> bool {
        self.graph
            .dependents(binding)
            .any(|id| matches!(self.nodes.get(&id).map(Node::kind), Some(NodeKind::AnchorPoint(_))))
    }

    /// Capture the graph
    pub fn snapshot(&self) -> GraphSnapshot {
        let nodes = self
            .nodes
            .values()
            .map(|node| {
                let tree = node.properties();
                let values = node
                    .inputs()
                    .map(|root| tree.leaves(root))
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|slot| {
                        let property = tree.get(slot)?;
                        if property.has_incoming_link() {
                            return None;
                        }
                        Some((tree.path_of(slot), property.value()?.clone()))
                    })
                    .collect();
                NodeRecord {
                    id: node.id(),
                    name: node.name().to_owned(),
                    config: node.config(),
                    values,
                }
            })
            .collect();

        let links = self
            .links
            .links()
            .filter_map(|link| {
                Some(LinkRecord {
                    source_node: link.source.node,
                    source_path: self.path(link.source)?,
                    target_node: link.target.node,
                    target_path: self.path(link.target)?,
                    weak: link.weak,
                })
            })
            .collect();

        GraphSnapshot {
            version: SNAPSHOT_VERSION,
            config: self.config(),
            nodes,
            links,
        }
    }

    /// Rebuild a graph on `host`. Node IDs are kept, scripts are looked up in
    /// `scripts`, and every link is validated again.
    pub fn from_snapshot(snapshot: &GraphSnapshot, host: H, scripts: ScriptRegistry) -> Result<Self, EngineError> {
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(EngineError::Snapshot(format!(
                "snapshot version {} is newer than supported version {SNAPSHOT_VERSION}",
                snapshot.version
            )));
        }
        let mut engine = Self::with_config(host, snapshot.config.clone());
        engine.scripts = scripts;

        for record in &snapshot.nodes {
            engine.insert_node(record.id, record.name.clone(), record.config.clone())?;
            engine.next_node_id = engine.next_node_id.max(record.id.raw() + 1);
        }

        for record in &snapshot.links {
            let source = engine.resolve(record.source_node, &record.source_path)?;
            let target = engine.resolve(record.target_node, &record.target_path)?;
            engine
                .links
                .link(&mut engine.nodes, &mut engine.graph, source, target, record.weak)?;
        }

        for record in &snapshot.nodes {
            for (path, value) in &record.values {
                let id = engine.resolve(record.id, path)?;
                // writing an equal value would flag binding inputs as pending
                if engine.value(id) != Some(value) {
                    engine.set_value(id, value.clone())?;
                }
            }
        }

        tracing::info!(
            nodes = engine.nodes.len(),
            links = engine.links.len(),
            "Loaded logic graph from snapshot"
        );
        Ok(engine)
    }

    fn resolve(&self, node: NodeId, path: &str) -> Result<PropertyId, EngineError> {
        let n = self.nodes.get(&node).ok_or(EngineError::NodeNotFound(node))?;
        let slot = n
            .find(path)
            .ok_or_else(|| EngineError::Snapshot(format!("node {node} has no property '{path}'")))?;
        Ok(n.property_id(slot))
    }
}

fn check_interface(decl: &PropertyDecl) -> Result<(), String> {
    if decl.property_type != PropertyType::Struct {
        return Err("interface properties must be declared as a struct".into());
    }
    check_children(decl)
}

fn check_children(decl: &PropertyDecl) -> Result<(), String> {
    match decl.property_type {
        PropertyType::Struct => {
            let mut names = HashSet::new();
            for child in &decl.children {
                if child.name.is_empty() {
                    return Err("struct fields must be named".into());
                }
                if !names.insert(child.name.as_str()) {
                    return Err(format!("duplicate property name '{}'", child.name));
                }
                check_children(child)?;
            }
            Ok(())
        }
        PropertyType::Array => {
            if decl.children.is_empty() {
                return Err(format!("array '{}' has no elements", decl.name));
            }
            decl.children.iter().try_for_each(check_children)
        }
        _ => Ok(()),
    }
}

fn check_uniforms(uniforms: &[UniformDecl]) -> Result<(), String> {
    let mut names = HashSet::new();
    for uniform in uniforms {
        if !uniform.property_type.is_primitive() {
            return Err(format!("uniform '{}' must have a primitive type", uniform.name));
        }
        if uniform.name.is_empty() || !names.insert(uniform.name.as_str()) {
            return Err(format!("invalid or duplicate uniform name '{}'", uniform.name));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_decl() -> PropertyDecl {
        PropertyDecl::structure("", vec![PropertyDecl::new("value", PropertyType::Int32)])
    }

    #[test]
    fn node_ids_are_per_engine() {
        let mut a = LogicEngine::new();
        let mut b = LogicEngine::new();
        let first = a.create_interface("x", value_decl()).unwrap();
        let other = b.create_interface("y", value_decl()).unwrap();
        assert_eq!(first, other);
        assert!(a.node_by_name("y").is_none());
    }

    #[test]
    fn interface_declarations_are_checked() {
        let mut engine = LogicEngine::new();
        let not_struct = PropertyDecl::new("v", PropertyType::Int32);
        assert!(matches!(
            engine.create_interface("bad", not_struct),
            Err(EngineError::InvalidConfig(_))
        ));
        let duplicate = PropertyDecl::structure(
            "",
            vec![PropertyDecl::new("v", PropertyType::Int32), PropertyDecl::new("v", PropertyType::Float)],
        );
        assert!(matches!(
            engine.create_interface("bad", duplicate),
            Err(EngineError::InvalidConfig(_))
        ));
        assert_eq!(engine.node_count(), 0);
    }

    #[test]
    fn unknown_script_is_rejected() {
        let mut engine = LogicEngine::new();
        assert_eq!(
            engine.create_script("s", "missing"),
            Err(EngineError::UnknownScript("missing".into()))
        );
    }

    #[test]
    fn set_value_dirty_rules() {
        let mut engine = LogicEngine::new();
        let node = engine.create_interface("iface", value_decl()).unwrap();
        engine.update().unwrap();
        assert!(!engine.node(node).unwrap().is_dirty());

        // interface inputs mark dirty even without a change
        let input = engine.input(node, "value").unwrap();
        engine.set_value(input, 0).unwrap();
        assert!(engine.node(node).unwrap().is_dirty());

        let output = engine.output(node, "value").unwrap();
        assert!(matches!(engine.set_value(output, 1), Err(PropertyError::NotSettable(_))));
    }

    #[test]
    fn property_navigation() {
        let mut engine = LogicEngine::new();
        let decl = PropertyDecl::structure(
            "",
            vec![PropertyDecl::structure("pos", vec![PropertyDecl::new("x", PropertyType::Float)])],
        );
        let node = engine.create_interface("iface", decl).unwrap();
        let pos = engine.input(node, "pos").unwrap();

        assert_eq!(engine.child_count(pos), 1);
        let x = engine.child_by_name(pos, "x").unwrap();
        assert_eq!(engine.child(pos, 0), Some(x));
        assert_eq!(engine.path(x).as_deref(), Some("inputs.pos.x"));
        assert_eq!(engine.value(x), Some(&PropertyValue::Float(0.0)));
    }

    #[test]
    fn anchor_requires_binding_kinds() {
        let mut engine = LogicEngine::new();
        let object = engine.host_mut().create_node("n");
        let binding = engine.create_node_binding("nb", object).unwrap();
        let iface = engine.create_interface("iface", value_decl()).unwrap();

        assert!(matches!(
            engine.create_anchor_point("anchor", binding, iface),
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(matches!(
            engine.create_anchor_point("anchor", binding, NodeId(99)),
            Err(EngineError::NodeNotFound(_))
        ));
    }
}
