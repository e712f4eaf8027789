//! # Shape Graph
//!
//! Id-indexed arena owning every shape and binding on a page. Lookups are
//! pure; the crate's mutators are the only writers.

use crate::shape::{Binding, Page, Shape};
use crate::EditorError;

#[derive(Debug, Clone, PartialEq)]
pub struct ShapeGraph {
    page: Page,
}

impl ShapeGraph {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_id(&self) -> &str {
        &self.page.id
    }

    pub fn is_page(&self, id: &str) -> bool {
        self.page.id == id
    }

    /// Look up a shape, treating a missing id as a caller error
    pub fn shape(&self, id: &str) -> Result<&Shape, EditorError> {
        self.page
            .shapes
            .get(id)
            .ok_or_else(|| EditorError::ShapeNotFound(id.to_string()))
    }

    pub fn get(&self, id: &str) -> Option<&Shape> {
        self.page.shapes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.page.shapes.contains_key(id)
    }

    pub fn shapes(&self) -> impl Iterator<Item = &Shape> {
        self.page.shapes.values()
    }

    pub fn len(&self) -> usize {
        self.page.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.page.shapes.is_empty()
    }

    pub fn binding(&self, id: &str) -> Option<&Binding> {
        self.page.bindings.get(id)
    }

    pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
        self.page.bindings.values()
    }

    /// Shapes whose `parent_id` is `parent_id`, sorted by child index
    pub fn siblings_of_parent(&self, parent_id: &str) -> Vec<&Shape> {
        let mut siblings: Vec<&Shape> = self
            .page
            .shapes
            .values()
            .filter(|shape| shape.parent_id == parent_id)
            .collect();
        siblings.sort_by(|a, b| a.child_index.total_cmp(&b.child_index).then_with(|| a.id.cmp(&b.id)));
        siblings
    }

    /// Resolve a container's `children` list to shapes, skipping stale ids
    pub fn children_of(&self, parent: &Shape) -> Vec<&Shape> {
        parent
            .children()
            .iter()
            .filter_map(|id| self.page.shapes.get(id))
            .collect()
    }

    /// Upper bound on any ancestor walk; a longer chain must contain a cycle
    pub(crate) fn depth_bound(&self) -> usize {
        self.page.shapes.len() + 1
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Shape> {
        self.page.shapes.get_mut(id)
    }

    pub(crate) fn insert(&mut self, shape: Shape) {
        self.page.shapes.insert(shape.id.clone(), shape);
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<Shape> {
        self.page.shapes.remove(id)
    }

    /// Drop every binding that references one of `shape_ids`
    pub(crate) fn remove_bindings_touching(&mut self, shape_ids: &[&str]) -> Vec<Binding> {
        let doomed: Vec<String> = self
            .page
            .bindings
            .values()
            .filter(|binding| shape_ids.iter().any(|id| binding.touches(id)))
            .map(|binding| binding.id.clone())
            .collect();

        doomed
            .iter()
            .filter_map(|id| self.page.bindings.remove(id))
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn into_page(self) -> Page {
        self.page
    }
}
