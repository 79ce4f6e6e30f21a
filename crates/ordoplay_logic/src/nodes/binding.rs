// SPDX-License-Identifier: MIT OR Apache-2.0
//! Binding nodes that write their inputs into host scene objects.
//!
//! Each input leaf maps to the host field with the same dotted path below
//! `inputs`. Inputs are seeded from the host when the binding is created and
//! written back only when they received a value since the last pass.

use super::{LogicNode, NodeConfig, NodeInterface, NodeIo, UpdateContext};
use crate::host::{camera_fields, node_fields, HostError, HostObjectId, HostObjectKind, HostScene};
use crate::node::NodeError;
use crate::property::{PropertyDecl, PropertySemantics, PropertyType};
use serde::{Deserialize, Serialize};

/// Uniform exposed by an appearance binding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniformDecl {
    /// Uniform name, equal to the host field name
    pub name: String,
    /// Uniform type; must be primitive
    pub property_type: PropertyType,
}

impl UniformDecl {
    /// Declare a uniform
    pub fn new(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            property_type,
        }
    }
}

/// The host object a binding writes to
#[derive(Debug, Clone, Copy)]
struct HostBinding {
    object: HostObjectId,
    accepts: &'static [HostObjectKind],
}

impl HostBinding {
    fn check_object(&self, host: &dyn HostScene) -> Result<(), NodeError> {
        match host.kind(self.object) {
            None => Err(NodeError::MissingHostObject(self.object)),
            Some(kind) if self.accepts.contains(&kind) => Ok(()),
            Some(kind) => Err(NodeError::InvalidHostState(format!(
                "{} is a {kind:?} object, expected one of {:?}",
                self.object, self.accepts
            ))),
        }
    }

    /// Seed every input leaf with the current host field value
    fn read_initial(&self, io: &mut NodeIo<'_>, host: &dyn HostScene) -> Result<(), NodeError> {
        self.check_object(host)?;
        let Some(inputs) = io.inputs else { return Ok(()) };
        for slot in io.tree.leaves(inputs) {
            let field = field_name(io, slot);
            let value = host.field(self.object, &field).ok_or_else(|| HostError::UnknownField {
                object: self.object,
                field: field.clone(),
            })?;
            let declared = io.tree.get(slot).map(|p| p.property_type());
            if declared != Some(value.property_type()) {
                return Err(HostError::FieldTypeMismatch {
                    object: self.object,
                    field,
                }
                .into());
            }
            io.tree.store_initial(slot, value);
        }
        Ok(())
    }

    /// Write inputs that received a value since the last pass
    fn write_pending(&self, io: &mut NodeIo<'_>, ctx: &mut UpdateContext<'_>) -> Result<(), NodeError> {
        if !ctx.host.contains(self.object) {
            return Err(NodeError::MissingHostObject(self.object));
        }
        let Some(inputs) = io.inputs else { return Ok(()) };
        for slot in io.tree.leaves(inputs) {
            if !io.tree.take_new_value(slot) {
                continue;
            }
            let Some(value) = io.tree.value(slot).cloned() else { continue };
            let field = field_name(io, slot);
            tracing::trace!(object = %self.object, field = %field, "Writing binding value");
            ctx.host.set_field(self.object, &field, value)?;
        }
        Ok(())
    }
}

fn field_name(io: &NodeIo<'_>, slot: crate::property::PropertySlot) -> String {
    let path = io.tree.path_of(slot);
    match path.split_once('.') {
        Some((_, rest)) => rest.to_owned(),
        None => path,
    }
}

fn binding_interface(inputs: PropertyDecl) -> NodeInterface {
    NodeInterface {
        inputs: Some(inputs),
        outputs: None,
        input_semantics: PropertySemantics::Binding,
    }
}

/// Binds visibility and transform of a host node
#[derive(Debug, Clone)]
pub struct NodeBinding {
    binding: HostBinding,
}

impl NodeBinding {
    /// Bind to a host node (cameras are nodes too)
    pub fn new(object: HostObjectId) -> Self {
        Self {
            binding: HostBinding {
                object,
                accepts: &[HostObjectKind::Node, HostObjectKind::Camera],
            },
        }
    }

    /// Bound host object
    pub fn object(&self) -> HostObjectId {
        self.binding.object
    }
}

impl LogicNode for NodeBinding {
    fn interface(&self) -> NodeInterface {
        binding_interface(PropertyDecl::structure(
            "",
            vec![
                PropertyDecl::new(node_fields::VISIBILITY, PropertyType::Bool),
                PropertyDecl::new(node_fields::TRANSLATION, PropertyType::Vec3f),
                PropertyDecl::new(node_fields::ROTATION, PropertyType::Vec3f),
                PropertyDecl::new(node_fields::SCALING, PropertyType::Vec3f),
            ],
        ))
    }

    fn initialize(&mut self, io: &mut NodeIo<'_>, host: &dyn HostScene) -> Result<(), NodeError> {
        self.binding.read_initial(io, host)
    }

    fn update(&mut self, io: &mut NodeIo<'_>, ctx: &mut UpdateContext<'_>) -> Result<(), NodeError> {
        self.binding.write_pending(io, ctx)
    }

    fn config(&self) -> NodeConfig {
        NodeConfig::NodeBinding {
            object: self.binding.object,
        }
    }
}

/// Binds viewport and frustum of a host camera
#[derive(Debug, Clone)]
pub struct CameraBinding {
    binding: HostBinding,
}

impl CameraBinding {
    /// Bind to a host camera
    pub fn new(object: HostObjectId) -> Self {
        Self {
            binding: HostBinding {
                object,
                accepts: &[HostObjectKind::Camera],
            },
        }
    }

    /// Bound host object
    pub fn object(&self) -> HostObjectId {
        self.binding.object
    }
}

fn leaf_of(field: &str, property_type: PropertyType) -> PropertyDecl {
    let name = field.split_once('.').map_or(field, |(_, leaf)| leaf);
    PropertyDecl::new(name, property_type)
}

impl LogicNode for CameraBinding {
    fn interface(&self) -> NodeInterface {
        binding_interface(PropertyDecl::structure(
            "",
            vec![
                PropertyDecl::structure(
                    "viewport",
                    vec![
                        leaf_of(camera_fields::VIEWPORT_OFFSET_X, PropertyType::Int32),
                        leaf_of(camera_fields::VIEWPORT_OFFSET_Y, PropertyType::Int32),
                        leaf_of(camera_fields::VIEWPORT_WIDTH, PropertyType::Int32),
                        leaf_of(camera_fields::VIEWPORT_HEIGHT, PropertyType::Int32),
                    ],
                ),
                PropertyDecl::structure(
                    "frustum",
                    vec![
                        leaf_of(camera_fields::NEAR_PLANE, PropertyType::Float),
                        leaf_of(camera_fields::FAR_PLANE, PropertyType::Float),
                        leaf_of(camera_fields::FIELD_OF_VIEW, PropertyType::Float),
                        leaf_of(camera_fields::ASPECT_RATIO, PropertyType::Float),
                    ],
                ),
            ],
        ))
    }

    fn initialize(&mut self, io: &mut NodeIo<'_>, host: &dyn HostScene) -> Result<(), NodeError> {
        self.binding.read_initial(io, host)
    }

    fn update(&mut self, io: &mut NodeIo<'_>, ctx: &mut UpdateContext<'_>) -> Result<(), NodeError> {
        // rejected before anything is written
        let near = io.input("frustum.nearPlane")?.as_float().unwrap_or_default();
        let far = io.input("frustum.farPlane")?.as_float().unwrap_or_default();
        let valid = near > 0.0 && far > near;
        if !valid {
            return Err(NodeError::InvalidHostState(format!(
                "camera frustum planes are invalid (near {near}, far {far})"
            )));
        }
        self.binding.write_pending(io, ctx)
    }

    fn config(&self) -> NodeConfig {
        NodeConfig::CameraBinding {
            object: self.binding.object,
        }
    }
}

/// Binds shader uniforms of a host appearance
#[derive(Debug, Clone)]
pub struct AppearanceBinding {
    binding: HostBinding,
    uniforms: Vec<UniformDecl>,
}

impl AppearanceBinding {
    /// Bind to a host appearance, exposing the given uniforms
    pub fn new(object: HostObjectId, uniforms: Vec<UniformDecl>) -> Self {
        Self {
            binding: HostBinding {
                object,
                accepts: &[HostObjectKind::Appearance],
            },
            uniforms,
        }
    }

    /// Bound host object
    pub fn object(&self) -> HostObjectId {
        self.binding.object
    }

    /// Exposed uniforms
    pub fn uniforms(&self) -> &[UniformDecl] {
        &self.uniforms
    }
}

impl LogicNode for AppearanceBinding {
    fn interface(&self) -> NodeInterface {
        binding_interface(PropertyDecl::structure(
            "",
            self.uniforms
                .iter()
                .map(|u| PropertyDecl::new(u.name.clone(), u.property_type))
                .collect(),
        ))
    }

    fn initialize(&mut self, io: &mut NodeIo<'_>, host: &dyn HostScene) -> Result<(), NodeError> {
        self.binding.read_initial(io, host)
    }

    fn update(&mut self, io: &mut NodeIo<'_>, ctx: &mut UpdateContext<'_>) -> Result<(), NodeError> {
        self.binding.write_pending(io, ctx)
    }

    fn config(&self) -> NodeConfig {
        NodeConfig::AppearanceBinding {
            object: self.binding.object,
            uniforms: self.uniforms.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SceneStore;
    use crate::node::{Node, NodeId};
    use crate::nodes::NodeKind;
    use crate::property::PropertyValue;

    #[test]
    fn node_binding_seeds_inputs_from_host() {
        let mut scene = SceneStore::new();
        let object = scene.create_node("mesh");
        scene.set_field(object, node_fields::VISIBILITY, PropertyValue::Bool(false)).unwrap();

        let node = Node::new(NodeId(1), "binding", NodeKind::NodeBinding(NodeBinding::new(object)), &scene).unwrap();
        let visibility = node.input("visibility").unwrap();
        assert_eq!(node.properties().value(visibility), Some(&PropertyValue::Bool(false)));
        assert!(!node.has_pending_binding_values());
    }

    #[test]
    fn only_new_values_are_written() {
        let mut scene = SceneStore::new();
        let object = scene.create_node("mesh");
        let mut node = Node::new(NodeId(1), "binding", NodeKind::NodeBinding(NodeBinding::new(object)), &scene).unwrap();

        let translation = node.input("translation").unwrap();
        node.properties_mut()
            .set_value(translation, PropertyValue::Vec3f([1.0, 2.0, 3.0]))
            .unwrap();
        // host-side change to a field the logic did not touch
        scene.set_field(object, node_fields::SCALING, PropertyValue::Vec3f([5.0; 3])).unwrap();

        node.update(&mut UpdateContext::new(&mut scene)).unwrap();
        assert_eq!(scene.field(object, node_fields::TRANSLATION), Some(PropertyValue::Vec3f([1.0, 2.0, 3.0])));
        assert_eq!(scene.field(object, node_fields::SCALING), Some(PropertyValue::Vec3f([5.0; 3])));
        assert!(!node.has_pending_binding_values());
    }

    #[test]
    fn camera_binding_maps_nested_fields() {
        let mut scene = SceneStore::new();
        let camera = scene.create_camera("cam");
        let mut node = Node::new(NodeId(1), "cam", NodeKind::CameraBinding(CameraBinding::new(camera)), &scene).unwrap();

        let width = node.input("viewport.width").unwrap();
        assert_eq!(node.properties().value(width), Some(&PropertyValue::Int32(1280)));
        node.properties_mut().set_value(width, PropertyValue::Int32(640)).unwrap();
        node.update(&mut UpdateContext::new(&mut scene)).unwrap();
        assert_eq!(scene.field(camera, camera_fields::VIEWPORT_WIDTH), Some(PropertyValue::Int32(640)));
    }

    #[test]
    fn camera_binding_rejects_invalid_frustum() {
        let mut scene = SceneStore::new();
        let camera = scene.create_camera("cam");
        let mut node = Node::new(NodeId(1), "cam", NodeKind::CameraBinding(CameraBinding::new(camera)), &scene).unwrap();

        let near = node.input("frustum.nearPlane").unwrap();
        node.properties_mut().set_value(near, PropertyValue::Float(500.0)).unwrap();
        let err = node.update(&mut UpdateContext::new(&mut scene)).unwrap_err();
        assert!(matches!(err, NodeError::InvalidHostState(_)));
        assert_eq!(scene.field(camera, camera_fields::NEAR_PLANE), Some(PropertyValue::Float(0.1)));
    }

    #[test]
    fn binding_requires_matching_host_object() {
        let mut scene = SceneStore::new();
        let node_object = scene.create_node("mesh");

        let err = Node::new(NodeId(1), "cam", NodeKind::CameraBinding(CameraBinding::new(node_object)), &scene).unwrap_err();
        assert!(matches!(err, NodeError::InvalidHostState(_)));

        let err = Node::new(NodeId(2), "gone", NodeKind::NodeBinding(NodeBinding::new(HostObjectId(42))), &scene).unwrap_err();
        assert_eq!(err, NodeError::MissingHostObject(HostObjectId(42)));
    }

    #[test]
    fn appearance_binding_exposes_declared_uniforms() {
        let mut scene = SceneStore::new();
        let appearance = scene.create_appearance(
            "material",
            [("u_color".to_owned(), PropertyValue::Vec4f([1.0, 0.0, 0.0, 1.0]))],
        );
        let binding = AppearanceBinding::new(appearance, vec![UniformDecl::new("u_color", PropertyType::Vec4f)]);
        let mut node = Node::new(NodeId(1), "mat", NodeKind::AppearanceBinding(binding), &scene).unwrap();

        let color = node.input("u_color").unwrap();
        node.properties_mut()
            .set_value(color, PropertyValue::Vec4f([0.0, 1.0, 0.0, 1.0]))
            .unwrap();
        node.update(&mut UpdateContext::new(&mut scene)).unwrap();
        assert_eq!(scene.field(appearance, "u_color"), Some(PropertyValue::Vec4f([0.0, 1.0, 0.0, 1.0])));

        let unknown = AppearanceBinding::new(appearance, vec![UniformDecl::new("u_missing", PropertyType::Float)]);
        let err = Node::new(NodeId(2), "bad", NodeKind::AppearanceBinding(unknown), &scene).unwrap_err();
        assert!(matches!(err, NodeError::Host(HostError::UnknownField { .. })));
    }
}
