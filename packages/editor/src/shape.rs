//! # Document Records
//!
//! Plain data for pages, shapes, bindings and per-session page state.
//! Field names serialize in camelCase so documents round-trip with the
//! JSON the host editor stores.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Shape identifier, unique across a page
pub type ShapeId = String;

/// Style and geometry properties keyed by name
pub type Props = BTreeMap<String, Value>;

/// A node in the document tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    pub id: ShapeId,

    /// Kind tag used to look up the shape's behavior in a `ShapeRegistry`
    #[serde(rename = "type")]
    pub kind: String,

    /// Either the page id or the id of a container shape
    pub parent_id: String,

    /// Fractional sort key among siblings
    pub child_index: f64,

    /// Ordered child ids, present only on container shapes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<ShapeId>>,

    #[serde(default)]
    pub props: Props,

    #[serde(default)]
    pub is_locked: bool,
}

impl Shape {
    pub fn new(id: impl Into<ShapeId>, kind: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            parent_id: parent_id.into(),
            child_index: 1.0,
            children: None,
            props: Props::new(),
            is_locked: false,
        }
    }

    pub fn is_container(&self) -> bool {
        self.children.is_some()
    }

    pub fn children(&self) -> &[ShapeId] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn prop_f64(&self, key: &str) -> Option<f64> {
        self.props.get(key).and_then(Value::as_f64)
    }
}

/// Relation linking two shapes, e.g. connector endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub id: String,
    pub from_id: ShapeId,
    pub to_id: ShapeId,
    #[serde(default)]
    pub props: Props,
}

impl Binding {
    pub fn touches(&self, shape_id: &str) -> bool {
        self.from_id == shape_id || self.to_id == shape_id
    }
}

/// Root container of a document's shape forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub shapes: BTreeMap<ShapeId, Shape>,
    #[serde(default)]
    pub bindings: BTreeMap<String, Binding>,
}

impl Page {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            shapes: BTreeMap::new(),
            bindings: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, zoom: 1.0 }
    }
}

/// Transient per-session view state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageState {
    /// Selected shape ids in selection order, without duplicates
    #[serde(default)]
    pub selected_ids: Vec<ShapeId>,

    /// The group currently drilled into, or the page id
    pub current_parent_id: String,

    /// The group last pointed at during progressive drill-down
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointed_id: Option<ShapeId>,

    #[serde(default)]
    pub camera: Camera,
}

impl PageState {
    pub fn new(page_id: impl Into<String>) -> Self {
        Self {
            selected_ids: Vec::new(),
            current_parent_id: page_id.into(),
            pointed_id: None,
            camera: Camera::default(),
        }
    }
}

/// Editor-wide defaults that outlive any single selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceState {
    /// Last explicitly set value per style key, applied to new shapes
    #[serde(default)]
    pub styles_for_next_shape: Props,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shape_serializes_camel_case() {
        let mut shape = Shape::new("box", "geo", "page");
        shape.child_index = 2.5;
        shape.props.insert("color".to_string(), json!("black"));

        let value = serde_json::to_value(&shape).unwrap();
        assert_eq!(value["type"], "geo");
        assert_eq!(value["parentId"], "page");
        assert_eq!(value["childIndex"], 2.5);
        assert_eq!(value["isLocked"], false);
        // Leaves carry no children key at all
        assert!(value.get("children").is_none());
    }

    #[test]
    fn test_container_detection() {
        let mut group = Shape::new("g", "group", "page");
        assert!(!group.is_container());
        assert!(group.children().is_empty());

        group.children = Some(vec!["a".to_string()]);
        assert!(group.is_container());
        assert_eq!(group.children(), ["a".to_string()]);
    }

    #[test]
    fn test_page_state_defaults_from_json() {
        let state: PageState = serde_json::from_str(r#"{ "currentParentId": "page" }"#).unwrap();
        assert!(state.selected_ids.is_empty());
        assert_eq!(state.pointed_id, None);
        assert_eq!(state.camera, Camera::default());
    }
}
