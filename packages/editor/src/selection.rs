//! # Selection Resolution
//!
//! Ancestor walks that decide which shape a pointer event or command
//! really targets once groups are nested, plus detached snapshots of
//! the selection for duplicate and clipboard commands.
//!
//! Every walk is iterative and bounded by the number of shapes on the
//! page, so a corrupted parent chain surfaces as `InvalidParent` instead
//! of looping or exhausting the stack.

use crate::graph::ShapeGraph;
use crate::shape::{PageState, Shape, ShapeId};
use crate::EditorError;
use serde::Serialize;
use std::collections::HashSet;
use tracing::warn;

/// A mapped snapshot entry: the shape id plus whatever the mapping produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeSnapshot<K> {
    pub id: ShapeId,
    #[serde(flatten)]
    pub data: K,
}

/// Read-only view resolving targets against the current page state
#[derive(Debug, Clone, Copy)]
pub struct SelectionResolver<'a> {
    graph: &'a ShapeGraph,
    page_state: &'a PageState,
}

impl<'a> SelectionResolver<'a> {
    pub fn new(graph: &'a ShapeGraph, page_state: &'a PageState) -> Self {
        Self { graph, page_state }
    }

    /// The shape a click on `id` lands on: the ancestor that sits directly
    /// in the page or in the group currently drilled into. Unknown ids
    /// resolve to themselves.
    pub fn pointed_id(&self, id: &str) -> Result<ShapeId, EditorError> {
        if !self.graph.contains(id) {
            return Ok(id.to_string());
        }

        let current_parent_id = &self.page_state.current_parent_id;
        self.climb(id, |parent_id| parent_id == current_parent_id)
    }

    /// Like [`pointed_id`](Self::pointed_id), but also stops below the
    /// previously pointed group so repeated double clicks drill one level
    /// at a time
    pub fn drilled_pointed_id(&self, id: &str) -> Result<ShapeId, EditorError> {
        let current_parent_id = &self.page_state.current_parent_id;
        let pointed_id = self.page_state.pointed_id.as_deref();

        self.climb(id, |parent_id| {
            parent_id == current_parent_id || Some(parent_id) == pointed_id
        })
    }

    /// The ancestor of `id` that is a direct child of the page or of the
    /// current drill parent
    pub fn top_parent_id(&self, id: &str) -> Result<ShapeId, EditorError> {
        let current_parent_id = &self.page_state.current_parent_id;
        self.climb(id, |parent_id| parent_id == current_parent_id)
    }

    fn climb(&self, id: &str, stop_at: impl Fn(&str) -> bool) -> Result<ShapeId, EditorError> {
        let mut current = id;

        for _ in 0..self.graph.depth_bound() {
            let shape = self.graph.shape(current)?;

            if shape.parent_id == shape.id {
                return Err(EditorError::self_parent(&shape.id));
            }

            if self.graph.is_page(&shape.parent_id) || stop_at(&shape.parent_id) {
                return Ok(shape.id.clone());
            }

            current = &shape.parent_id;
        }

        Err(EditorError::unbounded_chain(id))
    }

    /// `id` followed by all of its descendants in pre-order
    pub fn document_branch(&self, id: &str) -> Result<Vec<ShapeId>, EditorError> {
        self.graph.shape(id)?;

        let mut branch = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![id];

        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }

            let Some(shape) = self.graph.get(current) else {
                warn!(shape_id = %current, "Skipping dangling child reference");
                continue;
            };

            branch.push(shape.id.clone());
            stack.extend(shape.children().iter().rev().map(String::as_str));
        }

        Ok(branch)
    }

    /// Leaf shapes contributing style for `id`: the shape itself when it is
    /// a leaf, otherwise every leaf below it
    pub fn leaf_ids(&self, id: &str) -> Result<Vec<ShapeId>, EditorError> {
        Ok(self
            .document_branch(id)?
            .into_iter()
            .filter(|id| self.graph.get(id).is_some_and(|shape| !shape.is_container()))
            .collect())
    }

    pub fn graph(&self) -> &'a ShapeGraph {
        self.graph
    }

    pub fn selected_ids(&self) -> &'a [ShapeId] {
        &self.page_state.selected_ids
    }

    pub fn selected_shapes(&self) -> Vec<&'a Shape> {
        self.page_state
            .selected_ids
            .iter()
            .filter_map(|id| self.graph.get(id))
            .collect()
    }

    /// Detached copies of every selected shape and its descendants,
    /// excluding locked shapes
    pub fn selected_branch_snapshot(&self) -> Result<Vec<Shape>, EditorError> {
        let mut seen = HashSet::new();
        let mut copies = Vec::new();

        for id in &self.page_state.selected_ids {
            for branch_id in self.document_branch(id)? {
                if !seen.insert(branch_id.clone()) {
                    continue;
                }
                let shape = self.graph.shape(&branch_id)?;
                if !shape.is_locked {
                    copies.push(shape.clone());
                }
            }
        }

        Ok(copies)
    }

    pub fn selected_branch_snapshot_with<K>(
        &self,
        map: impl Fn(&Shape) -> K,
    ) -> Result<Vec<ShapeSnapshot<K>>, EditorError> {
        Ok(self
            .selected_branch_snapshot()?
            .iter()
            .map(|shape| ShapeSnapshot {
                id: shape.id.clone(),
                data: map(shape),
            })
            .collect())
    }

    /// Detached copies of just the selected shapes, excluding locked ones
    pub fn selected_shape_snapshot(&self) -> Vec<Shape> {
        self.selected_shapes()
            .into_iter()
            .filter(|shape| !shape.is_locked)
            .cloned()
            .collect()
    }

    pub fn selected_shape_snapshot_with<K>(&self, map: impl Fn(&Shape) -> K) -> Vec<ShapeSnapshot<K>> {
        self.selected_shape_snapshot()
            .iter()
            .map(|shape| ShapeSnapshot {
                id: shape.id.clone(),
                data: map(shape),
            })
            .collect()
    }
}
