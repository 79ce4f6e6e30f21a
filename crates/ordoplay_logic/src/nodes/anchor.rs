// SPDX-License-Identifier: MIT OR Apache-2.0
//! Anchor points: screen-space position of a bound host node.
//!
//! The world position depends on the host parent hierarchy, which the
//! dependency graph cannot see, so anchor points are externally coupled and
//! run on every pass.

use super::{LogicNode, NodeConfig, NodeInterface, NodeIo, UpdateContext};
use crate::host::{camera_fields, HostError, HostObjectId, HostScene};
use crate::node::{NodeError, NodeId};
use crate::property::{PropertyDecl, PropertyType, PropertyValue};

const VIEWPORT_COORDS: &str = "viewportCoords";
const DEPTH: &str = "depth";

/// Projects a node binding's host object through a camera binding's camera
#[derive(Debug, Clone)]
pub struct AnchorPoint {
    node_binding: NodeId,
    camera_binding: NodeId,
    node_object: HostObjectId,
    camera_object: HostObjectId,
}

impl AnchorPoint {
    /// Create an anchor for the given bindings and the host objects they wrap
    pub fn new(
        node_binding: NodeId,
        camera_binding: NodeId,
        node_object: HostObjectId,
        camera_object: HostObjectId,
    ) -> Self {
        Self {
            node_binding,
            camera_binding,
            node_object,
            camera_object,
        }
    }

    /// Observed node binding
    pub fn node_binding(&self) -> NodeId {
        self.node_binding
    }

    /// Observed camera binding
    pub fn camera_binding(&self) -> NodeId {
        self.camera_binding
    }

    fn project(&self, host: &dyn HostScene) -> Result<([f32; 2], f32), NodeError> {
        let point = host
            .world_translation(self.node_object)
            .ok_or(NodeError::MissingHostObject(self.node_object))?;
        let eye = host
            .world_translation(self.camera_object)
            .ok_or(NodeError::MissingHostObject(self.camera_object))?;

        let camera = self.camera_object;
        let near = float_field(host, camera, camera_fields::NEAR_PLANE)?;
        let far = float_field(host, camera, camera_fields::FAR_PLANE)?;
        let fov = float_field(host, camera, camera_fields::FIELD_OF_VIEW)?;
        let aspect = float_field(host, camera, camera_fields::ASPECT_RATIO)?;
        let offset_x = int_field(host, camera, camera_fields::VIEWPORT_OFFSET_X)?;
        let offset_y = int_field(host, camera, camera_fields::VIEWPORT_OFFSET_Y)?;
        let width = int_field(host, camera, camera_fields::VIEWPORT_WIDTH)?;
        let height = int_field(host, camera, camera_fields::VIEWPORT_HEIGHT)?;

        // view space: camera at the origin looking down -Z
        let view = [point[0] - eye[0], point[1] - eye[1], point[2] - eye[2]];
        if view[2] >= 0.0 {
            return Err(NodeError::InvalidHostState(format!(
                "anchored object {} is behind the camera",
                self.node_object
            )));
        }
        let valid = far > near && aspect > 0.0 && fov > 0.0;
        if !valid {
            return Err(NodeError::InvalidHostState(format!("camera {camera} has an invalid frustum")));
        }

        let focal = 1.0 / (fov.to_radians() / 2.0).tan();
        let w = -view[2];
        let ndc_x = focal / aspect * view[0] / w;
        let ndc_y = focal * view[1] / w;
        let clip_z = -(far + near) / (far - near) * view[2] - 2.0 * far * near / (far - near);
        let ndc_z = clip_z / w;

        let coords = [
            offset_x as f32 + (ndc_x + 1.0) / 2.0 * width as f32,
            offset_y as f32 + (ndc_y + 1.0) / 2.0 * height as f32,
        ];
        Ok((coords, (ndc_z + 1.0) / 2.0))
    }
}

fn float_field(host: &dyn HostScene, object: HostObjectId, field: &str) -> Result<f32, NodeError> {
    match host.field(object, field) {
        Some(PropertyValue::Float(v)) => Ok(v),
        Some(_) => Err(HostError::FieldTypeMismatch { object, field: field.to_owned() }.into()),
        None => Err(HostError::UnknownField { object, field: field.to_owned() }.into()),
    }
}

fn int_field(host: &dyn HostScene, object: HostObjectId, field: &str) -> Result<i32, NodeError> {
    match host.field(object, field) {
        Some(PropertyValue::Int32(v)) => Ok(v),
        Some(_) => Err(HostError::FieldTypeMismatch { object, field: field.to_owned() }.into()),
        None => Err(HostError::UnknownField { object, field: field.to_owned() }.into()),
    }
}

impl LogicNode for AnchorPoint {
    fn interface(&self) -> NodeInterface {
        NodeInterface {
            inputs: None,
            outputs: Some(PropertyDecl::structure(
                "",
                vec![
                    PropertyDecl::new(VIEWPORT_COORDS, PropertyType::Vec2f),
                    PropertyDecl::new(DEPTH, PropertyType::Float),
                ],
            )),
            ..NodeInterface::default()
        }
    }

    fn update(&mut self, io: &mut NodeIo<'_>, ctx: &mut UpdateContext<'_>) -> Result<(), NodeError> {
        let (coords, depth) = self.project(&*ctx.host)?;
        io.set_output(VIEWPORT_COORDS, coords)?;
        io.set_output(DEPTH, depth)
    }

    fn config(&self) -> NodeConfig {
        NodeConfig::AnchorPoint {
            node_binding: self.node_binding,
            camera_binding: self.camera_binding,
        }
    }

    fn is_externally_coupled(&self) -> bool {
        true
    }

    fn is_always_dirty(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{node_fields, SceneStore};

    fn scene() -> (SceneStore, HostObjectId, HostObjectId) {
        let mut scene = SceneStore::new();
        let node = scene.create_node("target");
        let camera = scene.create_camera("camera");
        scene.set_field(camera, camera_fields::FIELD_OF_VIEW, PropertyValue::Float(90.0)).unwrap();
        scene.set_field(camera, camera_fields::ASPECT_RATIO, PropertyValue::Float(1.0)).unwrap();
        scene.set_field(camera, camera_fields::VIEWPORT_WIDTH, PropertyValue::Int32(100)).unwrap();
        scene.set_field(camera, camera_fields::VIEWPORT_HEIGHT, PropertyValue::Int32(100)).unwrap();
        (scene, node, camera)
    }

    fn anchor(node: HostObjectId, camera: HostObjectId) -> AnchorPoint {
        AnchorPoint::new(NodeId(1), NodeId(2), node, camera)
    }

    #[test]
    fn centered_point_projects_to_viewport_center() {
        let (mut scene, node, camera) = scene();
        scene.set_field(node, node_fields::TRANSLATION, PropertyValue::Vec3f([0.0, 0.0, -10.0])).unwrap();

        let (coords, depth) = anchor(node, camera).project(&scene).unwrap();
        assert!((coords[0] - 50.0).abs() < 1e-3);
        assert!((coords[1] - 50.0).abs() < 1e-3);
        assert!(depth > 0.0 && depth < 1.0);
    }

    #[test]
    fn near_and_far_planes_map_to_depth_range() {
        let (mut scene, node, camera) = scene();
        let a = anchor(node, camera);

        scene.set_field(node, node_fields::TRANSLATION, PropertyValue::Vec3f([0.0, 0.0, -0.1])).unwrap();
        assert!(a.project(&scene).unwrap().1.abs() < 1e-3);
        scene.set_field(node, node_fields::TRANSLATION, PropertyValue::Vec3f([0.0, 0.0, -100.0])).unwrap();
        assert!((a.project(&scene).unwrap().1 - 1.0).abs() < 1e-3);
    }

    #[test]
    fn parent_hierarchy_moves_the_anchor() {
        let (mut scene, node, camera) = scene();
        let parent = scene.create_node("parent");
        scene.set_field(node, node_fields::TRANSLATION, PropertyValue::Vec3f([0.0, 0.0, -10.0])).unwrap();
        scene.set_field(parent, node_fields::TRANSLATION, PropertyValue::Vec3f([10.0, 0.0, 0.0])).unwrap();
        scene.set_parent(node, Some(parent)).unwrap();

        let (coords, _) = anchor(node, camera).project(&scene).unwrap();
        assert!((coords[0] - 100.0).abs() < 1e-3);
    }

    #[test]
    fn point_behind_camera_fails() {
        let (mut scene, node, camera) = scene();
        scene.set_field(node, node_fields::TRANSLATION, PropertyValue::Vec3f([0.0, 0.0, 5.0])).unwrap();
        assert!(matches!(anchor(node, camera).project(&scene), Err(NodeError::InvalidHostState(_))));
    }

    #[test]
    fn missing_host_object_fails() {
        let (mut scene, node, camera) = scene();
        scene.remove(node);
        assert_eq!(anchor(node, camera).project(&scene).unwrap_err(), NodeError::MissingHostObject(node));
    }
}
