// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed property trees owned by logic nodes.
//!
//! Every node stores its inputs and outputs in a flat [`PropertyTree`] arena.
//! Struct and array properties only group children; values live on the
//! primitive leaves, and only leaves can take part in links.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a property inside its node's property arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertySlot(pub u32);

impl PropertySlot {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Engine-wide handle of a property: the owning node plus its arena slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyId {
    /// Owning node
    pub node: NodeId,
    /// Slot in the node's property tree
    pub slot: PropertySlot,
}

impl PropertyId {
    /// Create a property handle
    pub fn new(node: NodeId, slot: PropertySlot) -> Self {
        Self { node, slot }
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node, self.slot.0)
    }
}

/// Property direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyDirection {
    /// Input property
    Input,
    /// Output property
    Output,
}

/// How writes to an input property affect its node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PropertySemantics {
    /// Node is marked dirty only when the value actually changes
    #[default]
    Plain,
    /// Host binding input: every write is remembered and re-applied to the host
    Binding,
    /// Interface input: every write marks the node dirty
    Interface,
}

/// Semantic type of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    /// Boolean value
    Bool,
    /// 32-bit integer
    Int32,
    /// 64-bit integer
    Int64,
    /// Floating point value
    Float,
    /// 2D float vector
    Vec2f,
    /// 3D float vector
    Vec3f,
    /// 4D float vector
    Vec4f,
    /// 2D integer vector
    Vec2i,
    /// 3D integer vector
    Vec3i,
    /// 4D integer vector
    Vec4i,
    /// String value
    String,
    /// Named children
    Struct,
    /// Indexed children of one declaration
    Array,
}

impl PropertyType {
    /// Whether values of this type can be stored and linked directly
    pub fn is_primitive(self) -> bool {
        !matches!(self, Self::Struct | Self::Array)
    }

    /// Value a freshly created leaf of this type holds
    pub fn default_value(self) -> Option<PropertyValue> {
        let value = match self {
            Self::Bool => PropertyValue::Bool(false),
            Self::Int32 => PropertyValue::Int32(0),
            Self::Int64 => PropertyValue::Int64(0),
            Self::Float => PropertyValue::Float(0.0),
            Self::Vec2f => PropertyValue::Vec2f([0.0; 2]),
            Self::Vec3f => PropertyValue::Vec3f([0.0; 3]),
            Self::Vec4f => PropertyValue::Vec4f([0.0; 4]),
            Self::Vec2i => PropertyValue::Vec2i([0; 2]),
            Self::Vec3i => PropertyValue::Vec3i([0; 3]),
            Self::Vec4i => PropertyValue::Vec4i([0; 4]),
            Self::String => PropertyValue::String(String::new()),
            Self::Struct | Self::Array => return None,
        };
        Some(value)
    }

    /// Human readable type name
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "Bool",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::Float => "Float",
            Self::Vec2f => "Vec2f",
            Self::Vec3f => "Vec3f",
            Self::Vec4f => "Vec4f",
            Self::Vec2i => "Vec2i",
            Self::Vec3i => "Vec3i",
            Self::Vec4i => "Vec4i",
            Self::String => "String",
            Self::Struct => "Struct",
            Self::Array => "Array",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value held by a primitive property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Boolean
    Bool(bool),
    /// 32-bit integer
    Int32(i32),
    /// 64-bit integer
    Int64(i64),
    /// Float
    Float(f32),
    /// 2D float vector
    Vec2f([f32; 2]),
    /// 3D float vector
    Vec3f([f32; 3]),
    /// 4D float vector
    Vec4f([f32; 4]),
    /// 2D integer vector
    Vec2i([i32; 2]),
    /// 3D integer vector
    Vec3i([i32; 3]),
    /// 4D integer vector
    Vec4i([i32; 4]),
    /// String
    String(String),
}

impl PropertyValue {
    /// Get the property type for this value
    pub fn property_type(&self) -> PropertyType {
        match self {
            Self::Bool(_) => PropertyType::Bool,
            Self::Int32(_) => PropertyType::Int32,
            Self::Int64(_) => PropertyType::Int64,
            Self::Float(_) => PropertyType::Float,
            Self::Vec2f(_) => PropertyType::Vec2f,
            Self::Vec3f(_) => PropertyType::Vec3f,
            Self::Vec4f(_) => PropertyType::Vec4f,
            Self::Vec2i(_) => PropertyType::Vec2i,
            Self::Vec3i(_) => PropertyType::Vec3i,
            Self::Vec4i(_) => PropertyType::Vec4i,
            Self::String(_) => PropertyType::String,
        }
    }

    /// Get as bool if possible
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as 32-bit integer if possible
    pub fn as_int32(&self) -> Option<i32> {
        match self {
            Self::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as 64-bit integer if possible
    pub fn as_int64(&self) -> Option<i64> {
        match self {
            Self::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as float if possible
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as 2D float vector if possible
    pub fn as_vec2f(&self) -> Option<[f32; 2]> {
        match self {
            Self::Vec2f(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as 3D float vector if possible
    pub fn as_vec3f(&self) -> Option<[f32; 3]> {
        match self {
            Self::Vec3f(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as 4D float vector if possible
    pub fn as_vec4f(&self) -> Option<[f32; 4]> {
        match self {
            Self::Vec4f(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as string slice if possible
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<f32> for PropertyValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<[f32; 2]> for PropertyValue {
    fn from(v: [f32; 2]) -> Self {
        Self::Vec2f(v)
    }
}

impl From<[f32; 3]> for PropertyValue {
    fn from(v: [f32; 3]) -> Self {
        Self::Vec3f(v)
    }
}

impl From<[f32; 4]> for PropertyValue {
    fn from(v: [f32; 4]) -> Self {
        Self::Vec4f(v)
    }
}

impl From<[i32; 2]> for PropertyValue {
    fn from(v: [i32; 2]) -> Self {
        Self::Vec2i(v)
    }
}

impl From<[i32; 3]> for PropertyValue {
    fn from(v: [i32; 3]) -> Self {
        Self::Vec3i(v)
    }
}

impl From<[i32; 4]> for PropertyValue {
    fn from(v: [i32; 4]) -> Self {
        Self::Vec4i(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

/// Declaration of a property subtree, used to build a node's interface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDecl {
    /// Property name (array elements are addressed by index instead)
    pub name: String,
    /// Semantic type
    pub property_type: PropertyType,
    /// Child declarations for struct and array types
    pub children: Vec<PropertyDecl>,
}

impl PropertyDecl {
    /// Declare a primitive property
    pub fn new(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            property_type,
            children: Vec::new(),
        }
    }

    /// Declare a struct with named children
    pub fn structure(name: impl Into<String>, children: Vec<PropertyDecl>) -> Self {
        Self {
            name: name.into(),
            property_type: PropertyType::Struct,
            children,
        }
    }

    /// Declare a fixed-size array of primitive elements
    pub fn array(name: impl Into<String>, len: usize, element: PropertyType) -> Self {
        Self::array_of(name, len, PropertyDecl::new("", element))
    }

    /// Declare a fixed-size array whose elements follow `element`
    pub fn array_of(name: impl Into<String>, len: usize, element: PropertyDecl) -> Self {
        Self {
            name: name.into(),
            property_type: PropertyType::Array,
            children: (0..len).map(|_| element.clone()).collect(),
        }
    }

    /// Add a child to a struct declaration
    pub fn with_child(mut self, child: PropertyDecl) -> Self {
        self.children.push(child);
        self
    }
}

/// One end of a link, as recorded on a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEnd {
    /// Property on the other side of the link
    pub property: PropertyId,
    /// Whether the link is weak
    pub weak: bool,
}

/// A property in a node's property tree
#[derive(Debug, Clone)]
pub struct Property {
    name: String,
    property_type: PropertyType,
    direction: PropertyDirection,
    semantics: PropertySemantics,
    parent: Option<PropertySlot>,
    children: Vec<PropertySlot>,
    value: Option<PropertyValue>,
    incoming: Option<LinkEnd>,
    outgoing: Vec<LinkEnd>,
    has_new_value: bool,
}

impl Property {
    /// Property name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Semantic type
    pub fn property_type(&self) -> PropertyType {
        self.property_type
    }

    /// Input or output
    pub fn direction(&self) -> PropertyDirection {
        self.direction
    }

    /// Write semantics
    pub fn semantics(&self) -> PropertySemantics {
        self.semantics
    }

    /// Parent slot, `None` for a root
    pub fn parent(&self) -> Option<PropertySlot> {
        self.parent
    }

    /// Child slots in declaration order
    pub fn children(&self) -> &[PropertySlot] {
        &self.children
    }

    /// Number of children
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Whether this property carries a value (and may be linked)
    pub fn is_leaf(&self) -> bool {
        self.property_type.is_primitive()
    }

    /// Whether this is an input property
    pub fn is_input(&self) -> bool {
        self.direction == PropertyDirection::Input
    }

    /// Whether this is an output property
    pub fn is_output(&self) -> bool {
        self.direction == PropertyDirection::Output
    }

    /// Current value; `None` for struct and array properties
    pub fn value(&self) -> Option<&PropertyValue> {
        self.value.as_ref()
    }

    /// Incoming link, if any
    pub fn incoming_link(&self) -> Option<LinkEnd> {
        self.incoming
    }

    /// Outgoing links in creation order
    pub fn outgoing_links(&self) -> &[LinkEnd] {
        &self.outgoing
    }

    /// Whether the property has an incoming link
    pub fn has_incoming_link(&self) -> bool {
        self.incoming.is_some()
    }

    /// Whether the property participates in any link
    pub fn is_linked(&self) -> bool {
        self.incoming.is_some() || !self.outgoing.is_empty()
    }

    /// Whether a binding input holds a value not yet written to the host
    pub fn has_new_value(&self) -> bool {
        self.has_new_value
    }
}

/// Error when reading or writing a property
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PropertyError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Property not found
    #[error("Property not found: {0}")]
    PropertyNotFound(String),

    /// Struct and array properties have no value of their own
    #[error("Property '{0}' is not a primitive type, can't set its value directly")]
    NotALeaf(String),

    /// Outputs are written by their node only
    #[error("Cannot set property '{0}' which is an output")]
    NotSettable(String),

    /// Linked inputs receive values through propagation only
    #[error("Property '{0}' is currently linked, unlink it first before setting its value")]
    InputIsLinked(String),

    /// Value type disagrees with the declared type
    #[error("Invalid type when setting property '{name}': expected {expected}, got {actual}")]
    TypeMismatch {
        /// Property name
        name: String,
        /// Declared type
        expected: PropertyType,
        /// Type of the rejected value
        actual: PropertyType,
    },
}

/// Flat arena holding all properties of one node
#[derive(Debug, Clone, Default)]
pub struct PropertyTree {
    properties: Vec<Property>,
}

impl PropertyTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a subtree from a declaration and return its root slot
    pub fn build(
        &mut self,
        decl: &PropertyDecl,
        direction: PropertyDirection,
        semantics: PropertySemantics,
    ) -> PropertySlot {
        self.build_child(decl, direction, semantics, None)
    }

    fn build_child(
        &mut self,
        decl: &PropertyDecl,
        direction: PropertyDirection,
        semantics: PropertySemantics,
        parent: Option<PropertySlot>,
    ) -> PropertySlot {
        let slot = PropertySlot(self.properties.len() as u32);
        self.properties.push(Property {
            name: decl.name.clone(),
            property_type: decl.property_type,
            direction,
            semantics,
            parent,
            children: Vec::new(),
            value: decl.property_type.default_value(),
            incoming: None,
            outgoing: Vec::new(),
            has_new_value: false,
        });

        if !decl.property_type.is_primitive() {
            let children: Vec<PropertySlot> = decl
                .children
                .iter()
                .map(|child| self.build_child(child, direction, semantics, Some(slot)))
                .collect();
            self.properties[slot.index()].children = children;
        }

        slot
    }

    /// Number of properties in the tree
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the tree is empty
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Get a property by slot
    pub fn get(&self, slot: PropertySlot) -> Option<&Property> {
        self.properties.get(slot.index())
    }

    pub(crate) fn get_mut(&mut self, slot: PropertySlot) -> Option<&mut Property> {
        self.properties.get_mut(slot.index())
    }

    /// Iterate over all properties with their slots
    pub fn iter(&self) -> impl Iterator<Item = (PropertySlot, &Property)> {
        self.properties
            .iter()
            .enumerate()
            .map(|(i, p)| (PropertySlot(i as u32), p))
    }

    /// Child by position (array element or struct field in declaration order)
    pub fn child(&self, slot: PropertySlot, index: usize) -> Option<PropertySlot> {
        self.get(slot)?.children.get(index).copied()
    }

    /// Struct field by name
    pub fn child_by_name(&self, slot: PropertySlot, name: &str) -> Option<PropertySlot> {
        let property = self.get(slot)?;
        if property.property_type != PropertyType::Struct {
            return None;
        }
        property
            .children
            .iter()
            .copied()
            .find(|child| self.properties[child.index()].name == name)
    }

    /// Resolve a dotted path below `root`; array elements are addressed by index
    pub fn resolve(&self, root: PropertySlot, path: &str) -> Option<PropertySlot> {
        let mut current = root;
        if path.is_empty() {
            return Some(current);
        }
        for segment in path.split('.') {
            let property = self.get(current)?;
            current = match property.property_type {
                PropertyType::Array => self.child(current, segment.parse().ok()?)?,
                PropertyType::Struct => self.child_by_name(current, segment)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Dotted path of `slot`, starting with the name of its root
    pub fn path_of(&self, slot: PropertySlot) -> String {
        let mut segments = Vec::new();
        let mut current = Some(slot);
        while let Some(s) = current {
            let Some(property) = self.get(s) else { break };
            let segment = match property.parent.and_then(|p| self.get(p)) {
                Some(parent) if parent.property_type == PropertyType::Array => parent
                    .children
                    .iter()
                    .position(|c| *c == s)
                    .map(|i| i.to_string())
                    .unwrap_or_default(),
                _ => property.name.clone(),
            };
            segments.push(segment);
            current = property.parent;
        }
        segments.reverse();
        segments.join(".")
    }

    /// Primitive leaves below `root`, depth first in declaration order
    pub fn leaves(&self, root: PropertySlot) -> Vec<PropertySlot> {
        let mut leaves = Vec::new();
        let mut stack = vec![root];
        while let Some(slot) = stack.pop() {
            let Some(property) = self.get(slot) else { continue };
            if property.is_leaf() {
                leaves.push(slot);
            } else {
                stack.extend(property.children.iter().rev().copied());
            }
        }
        leaves
    }

    /// Current value of a leaf
    pub fn value(&self, slot: PropertySlot) -> Option<&PropertyValue> {
        self.get(slot)?.value.as_ref()
    }

    /// Set a value the way an outside caller may: only unlinked input leaves
    /// of the matching type. Returns whether the value changed.
    pub fn set_value(&mut self, slot: PropertySlot, value: PropertyValue) -> Result<bool, PropertyError> {
        let property = self
            .get(slot)
            .ok_or_else(|| PropertyError::PropertyNotFound(format!("slot {}", slot.0)))?;

        if property.is_output() {
            return Err(PropertyError::NotSettable(property.name.clone()));
        }
        if !property.is_leaf() {
            return Err(PropertyError::NotALeaf(property.name.clone()));
        }
        if property.incoming.is_some() {
            return Err(PropertyError::InputIsLinked(property.name.clone()));
        }
        if value.property_type() != property.property_type {
            return Err(PropertyError::TypeMismatch {
                name: property.name.clone(),
                expected: property.property_type,
                actual: value.property_type(),
            });
        }

        Ok(self.store(slot, value))
    }

    /// Store a value without caller checks; used by nodes and link propagation.
    /// Returns whether the value changed.
    pub(crate) fn store(&mut self, slot: PropertySlot, value: PropertyValue) -> bool {
        let Some(property) = self.get_mut(slot) else {
            return false;
        };
        debug_assert_eq!(property.property_type, value.property_type());
        if property.semantics == PropertySemantics::Binding {
            property.has_new_value = true;
        }
        let changed = property.value.as_ref() != Some(&value);
        property.value = Some(value);
        changed
    }

    /// Store an initial value read from a host object; not flagged as new
    pub(crate) fn store_initial(&mut self, slot: PropertySlot, value: PropertyValue) {
        if let Some(property) = self.get_mut(slot) {
            if property.property_type == value.property_type() {
                property.value = Some(value);
            }
        }
    }

    /// Clear and return the "new value" flag of a binding input
    pub(crate) fn take_new_value(&mut self, slot: PropertySlot) -> bool {
        self.get_mut(slot)
            .map(|p| std::mem::take(&mut p.has_new_value))
            .unwrap_or(false)
    }

    pub(crate) fn set_incoming(&mut self, slot: PropertySlot, link: Option<LinkEnd>) {
        if let Some(property) = self.get_mut(slot) {
            property.incoming = link;
        }
    }

    pub(crate) fn add_outgoing(&mut self, slot: PropertySlot, link: LinkEnd) {
        if let Some(property) = self.get_mut(slot) {
            property.outgoing.push(link);
        }
    }

    pub(crate) fn remove_outgoing(&mut self, slot: PropertySlot, target: PropertyId) {
        if let Some(property) = self.get_mut(slot) {
            property.outgoing.retain(|l| l.property != target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_inputs() -> PropertyDecl {
        PropertyDecl::structure(
            "inputs",
            vec![
                PropertyDecl::structure(
                    "viewport",
                    vec![
                        PropertyDecl::new("width", PropertyType::Int32),
                        PropertyDecl::new("height", PropertyType::Int32),
                    ],
                ),
                PropertyDecl::array("weights", 3, PropertyType::Float),
            ],
        )
    }

    #[test]
    fn builds_tree_with_default_leaf_values() {
        let mut tree = PropertyTree::new();
        let root = tree.build(&camera_inputs(), PropertyDirection::Input, PropertySemantics::Plain);

        assert_eq!(tree.len(), 8);
        assert_eq!(tree.get(root).unwrap().child_count(), 2);
        assert!(tree.value(root).is_none());

        let width = tree.resolve(root, "viewport.width").unwrap();
        assert_eq!(tree.value(width), Some(&PropertyValue::Int32(0)));
        let weight = tree.resolve(root, "weights.2").unwrap();
        assert_eq!(tree.value(weight), Some(&PropertyValue::Float(0.0)));
    }

    #[test]
    fn named_and_indexed_access() {
        let mut tree = PropertyTree::new();
        let root = tree.build(&camera_inputs(), PropertyDirection::Input, PropertySemantics::Plain);

        let viewport = tree.child_by_name(root, "viewport").unwrap();
        assert_eq!(tree.child(root, 0), Some(viewport));
        let weights = tree.child(root, 1).unwrap();
        // arrays have no named access
        assert!(tree.child_by_name(weights, "0").is_none());
        assert!(tree.child(weights, 3).is_none());
        assert!(tree.resolve(root, "viewport.depth").is_none());
        assert!(tree.resolve(root, "weights.x").is_none());
    }

    #[test]
    fn path_of_round_trips_through_resolve() {
        let mut tree = PropertyTree::new();
        let root = tree.build(&camera_inputs(), PropertyDirection::Input, PropertySemantics::Plain);

        let weight = tree.resolve(root, "weights.1").unwrap();
        assert_eq!(tree.path_of(weight), "inputs.weights.1");
        let height = tree.resolve(root, "viewport.height").unwrap();
        assert_eq!(tree.path_of(height), "inputs.viewport.height");
    }

    #[test]
    fn leaves_are_depth_first() {
        let mut tree = PropertyTree::new();
        let root = tree.build(&camera_inputs(), PropertyDirection::Input, PropertySemantics::Plain);

        let names: Vec<String> = tree.leaves(root).into_iter().map(|s| tree.path_of(s)).collect();
        assert_eq!(
            names,
            vec![
                "inputs.viewport.width",
                "inputs.viewport.height",
                "inputs.weights.0",
                "inputs.weights.1",
                "inputs.weights.2",
            ]
        );
    }

    #[test]
    fn set_value_checks_type_and_reports_change() {
        let mut tree = PropertyTree::new();
        let root = tree.build(&camera_inputs(), PropertyDirection::Input, PropertySemantics::Plain);
        let width = tree.resolve(root, "viewport.width").unwrap();

        assert_eq!(tree.set_value(width, PropertyValue::Int32(640)), Ok(true));
        assert_eq!(tree.set_value(width, PropertyValue::Int32(640)), Ok(false));
        assert!(matches!(
            tree.set_value(width, PropertyValue::Float(1.0)),
            Err(PropertyError::TypeMismatch { .. })
        ));
        assert_eq!(tree.value(width), Some(&PropertyValue::Int32(640)));
    }

    #[test]
    fn set_value_rejects_complex_output_and_linked_properties() {
        let mut tree = PropertyTree::new();
        let root = tree.build(&camera_inputs(), PropertyDirection::Input, PropertySemantics::Plain);
        let out = tree.build(
            &PropertyDecl::structure("outputs", vec![PropertyDecl::new("o", PropertyType::Bool)]),
            PropertyDirection::Output,
            PropertySemantics::Plain,
        );
        let o = tree.child(out, 0).unwrap();
        let width = tree.resolve(root, "viewport.width").unwrap();

        assert!(matches!(tree.set_value(root, PropertyValue::Int32(1)), Err(PropertyError::NotALeaf(_))));
        assert!(matches!(tree.set_value(o, PropertyValue::Bool(true)), Err(PropertyError::NotSettable(_))));

        let source = PropertyId::new(NodeId(7), PropertySlot(0));
        tree.set_incoming(width, Some(LinkEnd { property: source, weak: false }));
        assert!(matches!(
            tree.set_value(width, PropertyValue::Int32(1)),
            Err(PropertyError::InputIsLinked(_))
        ));
    }

    #[test]
    fn binding_inputs_track_new_values() {
        let mut tree = PropertyTree::new();
        let root = tree.build(
            &PropertyDecl::structure("inputs", vec![PropertyDecl::new("visibility", PropertyType::Bool)]),
            PropertyDirection::Input,
            PropertySemantics::Binding,
        );
        let visibility = tree.child(root, 0).unwrap();

        tree.store_initial(visibility, PropertyValue::Bool(true));
        assert!(!tree.get(visibility).unwrap().has_new_value());

        // unchanged writes still count as new for bindings
        assert_eq!(tree.set_value(visibility, PropertyValue::Bool(true)), Ok(false));
        assert!(tree.take_new_value(visibility));
        assert!(!tree.take_new_value(visibility));
    }
}
