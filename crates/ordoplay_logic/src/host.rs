// SPDX-License-Identifier: MIT OR Apache-2.0
//! Host scene objects that binding nodes read and write.
//!
//! The logic graph never interprets host fields itself. Binding nodes copy
//! their inputs into named fields, and anchor points read world positions
//! through [`HostScene::world_translation`]. The parent hierarchy used for
//! world positions lives entirely on the host side and is invisible to the
//! dependency graph.

use crate::property::PropertyValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an object in the host scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostObjectId(pub u64);

impl fmt::Display for HostObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "host#{}", self.0)
    }
}

/// Kind of host object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostObjectKind {
    /// Scene node with a transform
    Node,
    /// Perspective camera
    Camera,
    /// Appearance with shader uniforms
    Appearance,
}

/// Error reported by the host scene
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HostError {
    /// Object does not exist
    #[error("Host object not found: {0}")]
    ObjectNotFound(HostObjectId),

    /// Object has no field with this name
    #[error("Host object {object} has no field '{field}'")]
    UnknownField {
        /// Object
        object: HostObjectId,
        /// Field name
        field: String,
    },

    /// Field exists with a different type
    #[error("Host field '{field}' of {object} has a different type")]
    FieldTypeMismatch {
        /// Object
        object: HostObjectId,
        /// Field name
        field: String,
    },
}

/// Accessors the logic graph needs from a host scene
pub trait HostScene {
    /// Whether the object exists
    fn contains(&self, object: HostObjectId) -> bool;

    /// Kind of the object, if it exists
    fn kind(&self, object: HostObjectId) -> Option<HostObjectKind>;

    /// Read a field
    fn field(&self, object: HostObjectId, field: &str) -> Option<PropertyValue>;

    /// Write a field
    fn set_field(&mut self, object: HostObjectId, field: &str, value: PropertyValue) -> Result<(), HostError>;

    /// Translation of the object in world space, after applying its ancestors
    fn world_translation(&self, object: HostObjectId) -> Option<[f32; 3]>;
}

/// Field names of host node objects
pub mod node_fields {
    /// Visibility flag
    pub const VISIBILITY: &str = "visibility";
    /// Local translation
    pub const TRANSLATION: &str = "translation";
    /// Local rotation (Euler angles in degrees)
    pub const ROTATION: &str = "rotation";
    /// Local scaling
    pub const SCALING: &str = "scaling";
}

/// Field names of host camera objects
pub mod camera_fields {
    /// Viewport x offset in pixels
    pub const VIEWPORT_OFFSET_X: &str = "viewport.offsetX";
    /// Viewport y offset in pixels
    pub const VIEWPORT_OFFSET_Y: &str = "viewport.offsetY";
    /// Viewport width in pixels
    pub const VIEWPORT_WIDTH: &str = "viewport.width";
    /// Viewport height in pixels
    pub const VIEWPORT_HEIGHT: &str = "viewport.height";
    /// Near clipping plane
    pub const NEAR_PLANE: &str = "frustum.nearPlane";
    /// Far clipping plane
    pub const FAR_PLANE: &str = "frustum.farPlane";
    /// Vertical field of view in degrees
    pub const FIELD_OF_VIEW: &str = "frustum.fieldOfView";
    /// Width / height
    pub const ASPECT_RATIO: &str = "frustum.aspectRatio";
}

/// An object stored in a [`SceneStore`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostObject {
    /// Display name
    pub name: String,
    /// Object kind
    pub kind: HostObjectKind,
    /// Parent node for world transforms
    pub parent: Option<HostObjectId>,
    /// Named fields
    pub fields: IndexMap<String, PropertyValue>,
}

/// In-memory host scene
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneStore {
    objects: IndexMap<HostObjectId, HostObject>,
    next_id: u64,
}

impl SceneStore {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, name: impl Into<String>, kind: HostObjectKind, fields: IndexMap<String, PropertyValue>) -> HostObjectId {
        self.next_id += 1;
        let id = HostObjectId(self.next_id);
        self.objects.insert(
            id,
            HostObject {
                name: name.into(),
                kind,
                parent: None,
                fields,
            },
        );
        id
    }

    /// Add a scene node with identity transform
    pub fn create_node(&mut self, name: impl Into<String>) -> HostObjectId {
        let fields = IndexMap::from([
            (node_fields::VISIBILITY.to_owned(), PropertyValue::Bool(true)),
            (node_fields::TRANSLATION.to_owned(), PropertyValue::Vec3f([0.0; 3])),
            (node_fields::ROTATION.to_owned(), PropertyValue::Vec3f([0.0; 3])),
            (node_fields::SCALING.to_owned(), PropertyValue::Vec3f([1.0; 3])),
        ]);
        self.insert(name, HostObjectKind::Node, fields)
    }

    /// Add a perspective camera; cameras are placed with node fields too
    pub fn create_camera(&mut self, name: impl Into<String>) -> HostObjectId {
        let fields = IndexMap::from([
            (node_fields::VISIBILITY.to_owned(), PropertyValue::Bool(true)),
            (node_fields::TRANSLATION.to_owned(), PropertyValue::Vec3f([0.0; 3])),
            (node_fields::ROTATION.to_owned(), PropertyValue::Vec3f([0.0; 3])),
            (node_fields::SCALING.to_owned(), PropertyValue::Vec3f([1.0; 3])),
            (camera_fields::VIEWPORT_OFFSET_X.to_owned(), PropertyValue::Int32(0)),
            (camera_fields::VIEWPORT_OFFSET_Y.to_owned(), PropertyValue::Int32(0)),
            (camera_fields::VIEWPORT_WIDTH.to_owned(), PropertyValue::Int32(1280)),
            (camera_fields::VIEWPORT_HEIGHT.to_owned(), PropertyValue::Int32(720)),
            (camera_fields::NEAR_PLANE.to_owned(), PropertyValue::Float(0.1)),
            (camera_fields::FAR_PLANE.to_owned(), PropertyValue::Float(100.0)),
            (camera_fields::FIELD_OF_VIEW.to_owned(), PropertyValue::Float(60.0)),
            (camera_fields::ASPECT_RATIO.to_owned(), PropertyValue::Float(16.0 / 9.0)),
        ]);
        self.insert(name, HostObjectKind::Camera, fields)
    }

    /// Add an appearance with the given uniforms and their initial values
    pub fn create_appearance(
        &mut self,
        name: impl Into<String>,
        uniforms: impl IntoIterator<Item = (String, PropertyValue)>,
    ) -> HostObjectId {
        self.insert(name, HostObjectKind::Appearance, uniforms.into_iter().collect())
    }

    /// Remove an object; children are re-parented to the scene root
    pub fn remove(&mut self, object: HostObjectId) -> Option<HostObject> {
        let removed = self.objects.shift_remove(&object)?;
        for other in self.objects.values_mut() {
            if other.parent == Some(object) {
                other.parent = None;
            }
        }
        Some(removed)
    }

    /// Change the parent of an object
    pub fn set_parent(&mut self, child: HostObjectId, parent: Option<HostObjectId>) -> Result<(), HostError> {
        if let Some(parent) = parent {
            if !self.objects.contains_key(&parent) {
                return Err(HostError::ObjectNotFound(parent));
            }
        }
        let object = self.objects.get_mut(&child).ok_or(HostError::ObjectNotFound(child))?;
        object.parent = parent;
        Ok(())
    }

    /// Get an object
    pub fn object(&self, object: HostObjectId) -> Option<&HostObject> {
        self.objects.get(&object)
    }

    /// Iterate over all objects
    pub fn objects(&self) -> impl Iterator<Item = (HostObjectId, &HostObject)> {
        self.objects.iter().map(|(id, o)| (*id, o))
    }

    /// Find an object by name
    pub fn find(&self, name: &str) -> Option<HostObjectId> {
        self.objects.iter().find(|(_, o)| o.name == name).map(|(id, _)| *id)
    }
}

impl HostScene for SceneStore {
    fn contains(&self, object: HostObjectId) -> bool {
        self.objects.contains_key(&object)
    }

    fn kind(&self, object: HostObjectId) -> Option<HostObjectKind> {
        self.objects.get(&object).map(|o| o.kind)
    }

    fn field(&self, object: HostObjectId, field: &str) -> Option<PropertyValue> {
        self.objects.get(&object)?.fields.get(field).cloned()
    }

    fn set_field(&mut self, object: HostObjectId, field: &str, value: PropertyValue) -> Result<(), HostError> {
        let host_object = self.objects.get_mut(&object).ok_or(HostError::ObjectNotFound(object))?;
        let slot = host_object.fields.get_mut(field).ok_or_else(|| HostError::UnknownField {
            object,
            field: field.to_owned(),
        })?;
        if slot.property_type() != value.property_type() {
            return Err(HostError::FieldTypeMismatch {
                object,
                field: field.to_owned(),
            });
        }
        *slot = value;
        Ok(())
    }

    fn world_translation(&self, object: HostObjectId) -> Option<[f32; 3]> {
        let mut world = [0.0f32; 3];
        let mut current = Some(object);
        // a parent chain can't be longer than the object count unless it loops
        let mut remaining = self.objects.len();
        while let Some(id) = current {
            if remaining == 0 {
                return None;
            }
            remaining -= 1;
            let host_object = self.objects.get(&id)?;
            if let Some(PropertyValue::Vec3f(t)) = host_object.fields.get(node_fields::TRANSLATION) {
                world = [world[0] + t[0], world[1] + t[1], world[2] + t[2]];
            }
            current = host_object.parent;
        }
        Some(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_field_checks_existence_and_type() {
        let mut scene = SceneStore::new();
        let node = scene.create_node("n");

        assert!(scene.set_field(node, node_fields::VISIBILITY, PropertyValue::Bool(false)).is_ok());
        assert_eq!(scene.field(node, node_fields::VISIBILITY), Some(PropertyValue::Bool(false)));
        assert!(matches!(
            scene.set_field(node, "colour", PropertyValue::Bool(false)),
            Err(HostError::UnknownField { .. })
        ));
        assert!(matches!(
            scene.set_field(node, node_fields::VISIBILITY, PropertyValue::Int32(1)),
            Err(HostError::FieldTypeMismatch { .. })
        ));
        assert!(matches!(
            scene.set_field(HostObjectId(99), node_fields::VISIBILITY, PropertyValue::Bool(true)),
            Err(HostError::ObjectNotFound(_))
        ));
    }

    #[test]
    fn world_translation_accumulates_parents() {
        let mut scene = SceneStore::new();
        let root = scene.create_node("root");
        let child = scene.create_node("child");
        scene.set_field(root, node_fields::TRANSLATION, PropertyValue::Vec3f([1.0, 2.0, 3.0])).unwrap();
        scene.set_field(child, node_fields::TRANSLATION, PropertyValue::Vec3f([0.5, 0.0, -1.0])).unwrap();

        assert_eq!(scene.world_translation(child), Some([0.5, 0.0, -1.0]));
        scene.set_parent(child, Some(root)).unwrap();
        assert_eq!(scene.world_translation(child), Some([1.5, 2.0, 2.0]));

        scene.remove(root);
        assert_eq!(scene.world_translation(child), Some([0.5, 0.0, -1.0]));
    }

    #[test]
    fn parent_loops_do_not_hang() {
        let mut scene = SceneStore::new();
        let a = scene.create_node("a");
        let b = scene.create_node("b");
        scene.set_parent(a, Some(b)).unwrap();
        scene.set_parent(b, Some(a)).unwrap();
        assert_eq!(scene.world_translation(a), None);
    }
}
