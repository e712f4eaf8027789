//! # Document Mutations
//!
//! Serializable commands the host editor sends to an [`EditSession`].
//!
//! ## Mutation Semantics
//!
//! ### DeleteShapes
//! - Removes the targets and any binding attached to them
//! - Containers left with too few children dissolve into their parent
//! - Surviving children of a deleted container move up a level
//!
//! ### ReparentShapes
//! - Appends the shapes above the new parent's existing children
//! - Fails if the move would make a shape its own ancestor
//! - Reports only the shapes whose parent actually changed
//!
//! ### SetStyle
//! - Applies to the leaves of the selection; containers are looked through
//! - Remembered as the default for shapes created afterwards
//!
//! Every mutation is all-or-nothing: on error the document is unchanged.
//!
//! [`EditSession`]: crate::EditSession

use crate::shape::{Props, Shape, ShapeId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all_fields = "camelCase")]
pub enum Mutation {
    /// Create shapes on top of their parents' existing children
    CreateShapes { shapes: Vec<NewShape> },

    /// Change props or lock state of existing shapes
    UpdateShapes { patches: Vec<ShapePatch> },

    /// Delete shapes, cascading into parents that dissolve
    DeleteShapes { ids: Vec<ShapeId> },

    /// Move shapes under a new parent (a container or the page)
    ReparentShapes { ids: Vec<ShapeId>, new_parent_id: String },

    /// Set a style on the selection
    SetStyle { key: String, value: Value },

    /// Replace the selection
    Select { ids: Vec<ShapeId> },
}

impl Mutation {
    /// Get a debug name for this mutation
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::CreateShapes { .. } => "create_shapes",
            Mutation::UpdateShapes { .. } => "update_shapes",
            Mutation::DeleteShapes { .. } => "delete_shapes",
            Mutation::ReparentShapes { .. } => "reparent_shapes",
            Mutation::SetStyle { .. } => "set_style",
            Mutation::Select { .. } => "select",
        }
    }
}

/// A shape to be created. Missing ids are generated; a missing parent
/// means the group currently drilled into, or the page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewShape {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ShapeId>,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    #[serde(default)]
    pub props: Props,

    #[serde(default)]
    pub is_locked: bool,
}

impl NewShape {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            id: None,
            kind: kind.into(),
            parent_id: None,
            props: Props::new(),
            is_locked: false,
        }
    }

    pub fn with_id(mut self, id: impl Into<ShapeId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }
}

/// Partial update of one shape
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShapePatch {
    pub id: ShapeId,

    #[serde(default)]
    pub props: Props,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_locked: Option<bool>,
}

impl ShapePatch {
    pub fn new(id: impl Into<ShapeId>) -> Self {
        Self {
            id: id.into(),
            props: Props::new(),
            is_locked: None,
        }
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    pub fn locked(mut self, is_locked: bool) -> Self {
        self.is_locked = Some(is_locked);
        self
    }
}

/// Result of applying a mutation
#[derive(Debug, Clone, Default)]
pub struct MutationResult {
    /// New version number
    pub version: u64,

    /// Shapes created or modified in place
    pub changed: Vec<ShapeId>,

    /// Pre-mutation copies of removed shapes
    pub deleted: Vec<Shape>,
}
