//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Shape not found: {0}")]
    ShapeNotFound(String),

    #[error("Invalid parent for shape {id}: {reason}")]
    InvalidParent { id: String, reason: String },

    #[error("That shape was not a parent (it was a {kind}): {id}")]
    NotAContainer { id: String, kind: String },

    #[error("Invalid shape {id}: {reason}")]
    InvalidShape { id: String, reason: String },

    #[error("Shape already exists: {0}")]
    DuplicateShape(String),

    #[error("Unknown shape kind: {0}")]
    UnknownShapeKind(String),

    #[error("Inconsistent children of {parent} at {child}: {reason}")]
    InconsistentChildren {
        parent: String,
        child: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Document is not file-backed")]
    NotFileBacked,
}

impl EditorError {
    pub(crate) fn self_parent(id: &str) -> Self {
        EditorError::InvalidParent {
            id: id.to_string(),
            reason: "shape has the same id as its parent".to_string(),
        }
    }

    pub(crate) fn unbounded_chain(id: &str) -> Self {
        EditorError::InvalidParent {
            id: id.to_string(),
            reason: "ancestor chain does not reach the page".to_string(),
        }
    }
}
