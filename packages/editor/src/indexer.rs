//! # Fractional Indexing
//!
//! Sibling order is the ascending order of `child_index`. New slots are
//! carved out by taking midpoints; when float precision runs out the
//! siblings are renumbered `1..=N` and the midpoint is taken again.

use crate::graph::ShapeGraph;
use crate::shape::ShapeId;
use crate::EditorError;
use tracing::debug;

/// Linear interpolation between `a` and `b`
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

impl ShapeGraph {
    /// A child index strictly between `id` and its next sibling, or one
    /// past `id` when it is the topmost sibling
    pub fn child_index_above(&mut self, id: &str) -> Result<f64, EditorError> {
        let shape = self.shape(id)?;
        let parent_id = shape.parent_id.clone();

        let siblings: Vec<ShapeId> = self
            .siblings_of_parent(&parent_id)
            .into_iter()
            .map(|s| s.id.clone())
            .collect();

        let Some(position) = siblings.iter().position(|sibling| sibling == id) else {
            return Err(EditorError::ShapeNotFound(id.to_string()));
        };

        let Some(next_id) = siblings.get(position + 1) else {
            return Ok(self.shape(id)?.child_index + 1.0);
        };

        let (current, next) = (self.shape(id)?.child_index, self.shape(next_id)?.child_index);
        let midpoint = (current + next) / 2.0;

        if midpoint > current && midpoint < next {
            return Ok(midpoint);
        }

        debug!(shape_id = %id, parent_id = %parent_id, siblings = siblings.len(), "Child index precision exhausted, reindexing siblings");
        self.force_integer_child_indices(&siblings);

        let (current, next) = (self.shape(id)?.child_index, self.shape(next_id)?.child_index);
        Ok((current + next) / 2.0)
    }

    /// The index that places a new child above every existing child of
    /// `parent_id`, which may be the page or a container shape
    pub fn top_child_index(&self, parent_id: &str) -> Result<f64, EditorError> {
        let indices: Vec<f64> = if self.is_page(parent_id) {
            self.shapes()
                .filter(|shape| shape.parent_id == parent_id)
                .map(|shape| shape.child_index)
                .collect()
        } else {
            let parent = self.shape(parent_id)?;
            let Some(children) = &parent.children else {
                return Err(EditorError::NotAContainer {
                    id: parent.id.clone(),
                    kind: parent.kind.clone(),
                });
            };
            children
                .iter()
                .filter_map(|id| self.get(id))
                .map(|child| child.child_index)
                .collect()
        };

        Ok(indices.into_iter().reduce(f64::max).map_or(1.0, |top| top + 1.0))
    }

    /// Assign `1..=N` to `ids` in the given order. Missing ids are skipped
    /// without consuming a slot.
    pub fn force_integer_child_indices(&mut self, ids: &[ShapeId]) {
        let mut next = 1.0;
        for id in ids {
            if let Some(shape) = self.get_mut(id) {
                shape.child_index = next;
                next += 1.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{Page, Shape};

    fn graph_with(indices: &[(&str, f64)]) -> ShapeGraph {
        let mut page = Page::new("page");
        for (id, index) in indices {
            let mut shape = Shape::new(*id, "geo", "page");
            shape.child_index = *index;
            page.shapes.insert(id.to_string(), shape);
        }
        ShapeGraph::new(page)
    }

    #[test]
    fn test_child_index_above_takes_midpoint() {
        let mut graph = graph_with(&[("a", 1.0), ("b", 2.0)]);
        assert_eq!(graph.child_index_above("a").unwrap(), 1.5);
    }

    #[test]
    fn test_child_index_above_last_sibling() {
        let mut graph = graph_with(&[("a", 1.0), ("b", 2.0)]);
        assert_eq!(graph.child_index_above("b").unwrap(), 3.0);
    }

    #[test]
    fn test_child_index_above_reindexes_on_collision() {
        let next = f64::from_bits(1.0f64.to_bits() + 1);
        let mut graph = graph_with(&[("a", 1.0), ("b", next), ("c", 7.0)]);

        let index = graph.child_index_above("a").unwrap();

        assert_eq!(graph.shape("a").unwrap().child_index, 1.0);
        assert_eq!(graph.shape("b").unwrap().child_index, 2.0);
        assert_eq!(graph.shape("c").unwrap().child_index, 3.0);
        assert_eq!(index, 1.5);
    }

    #[test]
    fn test_child_index_above_reindexes_ties() {
        let mut graph = graph_with(&[("a", 1.0), ("b", 1.0)]);
        let index = graph.child_index_above("a").unwrap();
        assert!(index > graph.shape("a").unwrap().child_index);
        assert!(index < graph.shape("b").unwrap().child_index);
    }

    #[test]
    fn test_top_child_index() {
        let graph = graph_with(&[("a", 4.0), ("b", 2.5)]);
        assert_eq!(graph.top_child_index("page").unwrap(), 5.0);

        let empty = graph_with(&[]);
        assert_eq!(empty.top_child_index("page").unwrap(), 1.0);
    }

    #[test]
    fn test_top_child_index_requires_container() {
        let graph = graph_with(&[("a", 1.0)]);
        assert!(matches!(
            graph.top_child_index("a"),
            Err(EditorError::NotAContainer { id, .. }) if id == "a"
        ));
    }

    #[test]
    fn test_force_integer_child_indices_is_idempotent() {
        let mut graph = graph_with(&[("a", 0.25), ("b", 0.5), ("c", 9.0)]);
        let order = vec!["c".to_string(), "a".to_string(), "b".to_string()];

        graph.force_integer_child_indices(&order);
        let first = graph.clone();
        graph.force_integer_child_indices(&order);

        assert_eq!(graph, first);
        assert_eq!(graph.shape("c").unwrap().child_index, 1.0);
        assert_eq!(graph.shape("a").unwrap().child_index, 2.0);
        assert_eq!(graph.shape("b").unwrap().child_index, 3.0);
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(1.0, 2.0, 0.0), 1.0);
        assert_eq!(lerp(1.0, 2.0, 0.5), 1.5);
    }
}
