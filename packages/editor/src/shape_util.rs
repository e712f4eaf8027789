//! # Shape Kinds
//!
//! Per-kind behavior lives behind [`ShapeUtil`]; a [`ShapeRegistry`] maps
//! each kind tag to its behavior record. New kinds are added by
//! registering another implementation, not by extending an enum.
//!
//! Hooks receive shapes by reference and hand back new values, so they
//! cannot reach anything outside the shape they were given.

use crate::kinds::{FrameShapeUtil, GeoShapeUtil, GroupShapeUtil, TextShapeUtil};
use crate::shape::{Props, Shape};
use crate::EditorError;
use serde_json::Value;
use std::collections::HashMap;

/// Behavior record for one shape kind
pub trait ShapeUtil: std::fmt::Debug + Send + Sync {
    /// The kind tag stored in `Shape::kind`
    fn kind(&self) -> &'static str;

    /// Whether shapes of this kind own a `children` list
    fn is_container(&self) -> bool {
        false
    }

    /// Style keys this kind carries. Containers carry none.
    fn style_keys(&self) -> &'static [&'static str] {
        &[]
    }

    fn default_props(&self) -> Props {
        Props::new()
    }

    /// Recompute derived state after the children changed. `None` means
    /// the parent is unchanged.
    fn on_children_change(&self, _parent: &Shape, _children: &[&Shape]) -> Option<Shape> {
        None
    }

    /// Whether a container should be dissolved after losing children
    fn should_delete(&self, _shape: &Shape) -> bool {
        false
    }

    fn set_property(&self, shape: &Shape, key: &str, value: &Value) -> Shape {
        let mut next = shape.clone();
        next.props.insert(key.to_string(), value.clone());
        next
    }

    fn has_style(&self, key: &str) -> bool {
        self.style_keys().contains(&key)
    }
}

/// Capability table from kind tag to behavior
#[derive(Debug, Default)]
pub struct ShapeRegistry {
    utils: HashMap<String, Box<dyn ShapeUtil>>,
}

impl ShapeRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in geo, text, group and frame kinds
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(GeoShapeUtil);
        registry.register(TextShapeUtil);
        registry.register(GroupShapeUtil);
        registry.register(FrameShapeUtil);
        registry
    }

    /// Add or replace the behavior for a kind
    pub fn register(&mut self, util: impl ShapeUtil + 'static) {
        self.utils.insert(util.kind().to_string(), Box::new(util));
    }

    pub fn get(&self, kind: &str) -> Result<&dyn ShapeUtil, EditorError> {
        self.utils
            .get(kind)
            .map(|util| util.as_ref())
            .ok_or_else(|| EditorError::UnknownShapeKind(kind.to_string()))
    }

    pub fn util_for(&self, shape: &Shape) -> Result<&dyn ShapeUtil, EditorError> {
        self.get(&shape.kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.utils.keys().map(String::as_str)
    }
}
