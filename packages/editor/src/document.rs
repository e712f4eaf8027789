//! # Document Handle
//!
//! A Document is one page of shapes plus the page state it was saved with.
//! Documents can be:
//! - **Memory-backed**: Temporary, for testing or in-memory operations
//! - **File-backed**: JSON on disk, tracked with a dirty flag
//!
//! ## Lifecycle
//!
//! ```text
//! Load → Validate → Edit → Save
//!   ↓        ↓        ↓      ↓
//! JSON    Graph   Mutations JSON
//! ```
//!
//! Structural validation happens here, at the load boundary, so the
//! mutators can treat a broken parent chain as a bug rather than as input.

use crate::graph::ShapeGraph;
use crate::shape::{Page, PageState};
use crate::shape_util::ShapeRegistry;
use crate::EditorError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, instrument};

/// Serialized form of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    pub page: Page,
    pub page_state: PageState,
}

/// Editable whiteboard document
#[derive(Debug)]
pub struct Document {
    /// Path to the JSON file (if any)
    pub path: PathBuf,

    /// Current version number (increments on each mutation)
    pub version: u64,

    /// Selection, drill parent and camera
    pub page_state: PageState,

    /// Backing storage strategy
    storage: DocumentStorage,
}

/// Storage backend for document
#[derive(Debug)]
pub enum DocumentStorage {
    /// In-memory only (for testing, temp docs)
    Memory { graph: ShapeGraph },

    /// File-backed (single-user editing)
    File { graph: ShapeGraph, dirty: bool },
}

impl Document {
    /// Empty memory-backed document with a single page
    pub fn new(page_id: impl Into<String>) -> Self {
        let page_id = page_id.into();
        Self {
            path: PathBuf::new(),
            version: 0,
            page_state: PageState::new(page_id.clone()),
            storage: DocumentStorage::Memory {
                graph: ShapeGraph::new(Page::new(page_id)),
            },
        }
    }

    /// Create a memory-backed document from a snapshot validated against
    /// the built-in shape kinds
    pub fn from_snapshot(snapshot: DocumentSnapshot) -> Result<Self, EditorError> {
        Self::from_snapshot_with(snapshot, &ShapeRegistry::with_defaults())
    }

    pub fn from_snapshot_with(snapshot: DocumentSnapshot, registry: &ShapeRegistry) -> Result<Self, EditorError> {
        let graph = ShapeGraph::new(snapshot.page);
        validate(&graph, registry)?;

        Ok(Self {
            path: PathBuf::new(),
            version: 0,
            page_state: snapshot.page_state,
            storage: DocumentStorage::Memory { graph },
        })
    }

    /// Parse and validate a memory-backed document from JSON
    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        let snapshot: DocumentSnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(snapshot)
    }

    /// Load document from file (file-backed), validated against the
    /// built-in shape kinds
    pub fn load(path: PathBuf) -> Result<Self, EditorError> {
        Self::load_with(path, &ShapeRegistry::with_defaults())
    }

    /// Load document from file, validated against `registry`
    #[instrument(skip(path, registry), fields(path = %path.display()))]
    pub fn load_with(path: PathBuf, registry: &ShapeRegistry) -> Result<Self, EditorError> {
        let source = std::fs::read_to_string(&path)?;
        let snapshot: DocumentSnapshot = serde_json::from_str(&source)?;
        let graph = ShapeGraph::new(snapshot.page);
        validate(&graph, registry)?;

        info!(shapes = graph.len(), "Loaded document");
        Ok(Self {
            path,
            version: 0,
            page_state: snapshot.page_state,
            storage: DocumentStorage::File { graph, dirty: false },
        })
    }

    /// Load without structural validation. Only for documents produced by
    /// this crate.
    pub fn load_unchecked(path: PathBuf) -> Result<Self, EditorError> {
        let source = std::fs::read_to_string(&path)?;
        let snapshot: DocumentSnapshot = serde_json::from_str(&source)?;

        Ok(Self {
            path,
            version: 0,
            page_state: snapshot.page_state,
            storage: DocumentStorage::File {
                graph: ShapeGraph::new(snapshot.page),
                dirty: false,
            },
        })
    }

    pub fn graph(&self) -> &ShapeGraph {
        match &self.storage {
            DocumentStorage::Memory { graph } => graph,
            DocumentStorage::File { graph, .. } => graph,
        }
    }

    /// Get mutable graph reference (marks file-backed documents dirty)
    pub fn graph_mut(&mut self) -> &mut ShapeGraph {
        match &mut self.storage {
            DocumentStorage::Memory { graph } => graph,
            DocumentStorage::File { graph, dirty } => {
                *dirty = true;
                graph
            }
        }
    }

    /// Graph and page state borrowed together for mutations that read the
    /// selection while writing shapes
    pub(crate) fn parts_mut(&mut self) -> (&mut ShapeGraph, &mut PageState) {
        let graph = match &mut self.storage {
            DocumentStorage::Memory { graph } => graph,
            DocumentStorage::File { graph, dirty } => {
                *dirty = true;
                graph
            }
        };
        (graph, &mut self.page_state)
    }

    /// Check if document has unsaved changes
    pub fn is_dirty(&self) -> bool {
        match &self.storage {
            DocumentStorage::File { dirty, .. } => *dirty,
            _ => false,
        }
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            page: self.graph().page().clone(),
            page_state: self.page_state.clone(),
        }
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, EditorError> {
        let snapshot = self.snapshot();
        let json = if pretty {
            serde_json::to_string_pretty(&snapshot)?
        } else {
            serde_json::to_string(&snapshot)?
        };
        Ok(json)
    }

    /// Save document to disk (if file-backed)
    pub fn save(&mut self) -> Result<(), EditorError> {
        self.save_with(true)
    }

    /// Save document to disk, pretty-printed or compact
    pub fn save_with(&mut self, pretty: bool) -> Result<(), EditorError> {
        let json = self.to_json(pretty)?;
        match &mut self.storage {
            DocumentStorage::File { dirty, .. } => {
                std::fs::write(&self.path, json)?;
                *dirty = false;
                Ok(())
            }
            _ => Err(EditorError::NotFileBacked),
        }
    }
}

/// Check the structural invariants every mutation relies on:
/// shapes are stored under their own id, only container kinds carry
/// `children`, parent chains end at the page, and each container's
/// `children` list agrees with its children's `parent_id`.
pub fn validate(graph: &ShapeGraph, registry: &ShapeRegistry) -> Result<(), EditorError> {
    let mut listed_by: HashMap<&str, &str> = HashMap::new();

    for (key, shape) in &graph.page().shapes {
        if *key != shape.id {
            return Err(EditorError::InvalidShape {
                id: key.clone(),
                reason: format!("stored under {key} but has id {}", shape.id),
            });
        }

        let util = registry.util_for(shape)?;
        if util.is_container() != shape.is_container() {
            let reason = if util.is_container() {
                format!("{} shapes need a children list", shape.kind)
            } else {
                format!("{} shapes cannot have children", shape.kind)
            };
            return Err(EditorError::InvalidShape { id: shape.id.clone(), reason });
        }
    }

    for shape in graph.shapes() {
        if shape.parent_id == shape.id {
            return Err(EditorError::self_parent(&shape.id));
        }

        if !graph.is_page(&shape.parent_id) {
            let parent = graph.get(&shape.parent_id).ok_or_else(|| EditorError::InvalidParent {
                id: shape.id.clone(),
                reason: format!("parent {} does not exist", shape.parent_id),
            })?;

            if !parent.is_container() {
                return Err(EditorError::NotAContainer {
                    id: parent.id.clone(),
                    kind: parent.kind.clone(),
                });
            }
        }

        for child_id in shape.children() {
            let inconsistent = |reason: &str| EditorError::InconsistentChildren {
                parent: shape.id.clone(),
                child: child_id.clone(),
                reason: reason.to_string(),
            };

            let child = graph.get(child_id).ok_or_else(|| inconsistent("child does not exist"))?;
            if child.parent_id != shape.id {
                return Err(inconsistent("child names a different parent"));
            }
            if listed_by.insert(child_id.as_str(), shape.id.as_str()).is_some() {
                return Err(inconsistent("child is listed more than once"));
            }
        }
    }

    for shape in graph.shapes() {
        if !graph.is_page(&shape.parent_id) && !listed_by.contains_key(shape.id.as_str()) {
            return Err(EditorError::InconsistentChildren {
                parent: shape.parent_id.clone(),
                child: shape.id.clone(),
                reason: "child is missing from its parent's children".to_string(),
            });
        }
    }

    // Every parent is a listed container, so a chain longer than the shape
    // count can only be a cycle.
    let bound = graph.depth_bound();
    for shape in graph.shapes() {
        let mut current = shape;
        let mut steps = 0;
        while !graph.is_page(&current.parent_id) {
            steps += 1;
            if steps > bound {
                return Err(EditorError::unbounded_chain(&shape.id));
            }
            current = graph.shape(&current.parent_id)?;
        }
    }

    Ok(())
}
