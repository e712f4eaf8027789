//! # Edit Session Management
//!
//! An EditSession is the single logical owner of a document while it is
//! being edited. It holds the shape-kind registry, the style cache and
//! the "styles for next shape" defaults, and is the surface the host
//! editor calls into.
//!
//! Mutations run against a draft copy of the graph that replaces the live
//! one only when the whole operation succeeds, so a failed call leaves
//! the document exactly as it was.

use crate::graph::ShapeGraph;
use crate::id_generator::IDGenerator;
use crate::mutations::{Mutation, MutationResult, NewShape, ShapePatch};
use crate::selection::{SelectionResolver, ShapeSnapshot};
use crate::shape::{Binding, InstanceState, Page, PageState, Shape, ShapeId};
use crate::shape_util::{ShapeRegistry, ShapeUtil};
use crate::styles::{SharedStyleMap, StyleAggregator};
use crate::tree::TreeMutator;
use crate::{Document, EditorError};
use serde_json::Value;
use std::rc::Rc;
use tracing::{debug, info, instrument};

/// Single-user edit session
pub struct EditSession {
    /// Unique session identifier
    pub id: String,

    /// Document being edited
    pub document: Document,

    /// Editor-wide defaults such as styles for the next shape
    pub instance: InstanceState,

    registry: ShapeRegistry,
    styles: StyleAggregator,
    ids: IDGenerator,
}

impl EditSession {
    /// Create new edit session with the built-in shape kinds
    pub fn new(id: impl Into<String>, document: Document) -> Self {
        Self::with_registry(id, document, ShapeRegistry::with_defaults())
    }

    pub fn with_registry(id: impl Into<String>, document: Document, registry: ShapeRegistry) -> Self {
        let ids = IDGenerator::new(document.graph().page_id());
        Self {
            id: id.into(),
            document,
            instance: InstanceState::default(),
            registry,
            styles: StyleAggregator::new(),
            ids,
        }
    }

    /// Register an additional shape kind
    pub fn register_shape(&mut self, util: impl ShapeUtil + 'static) {
        self.registry.register(util);
    }

    pub fn registry(&self) -> &ShapeRegistry {
        &self.registry
    }

    pub fn version(&self) -> u64 {
        self.document.version
    }

    // Lookups

    pub fn graph(&self) -> &ShapeGraph {
        self.document.graph()
    }

    pub fn shape(&self, id: &str) -> Result<&Shape, EditorError> {
        self.graph().shape(id)
    }

    pub fn page(&self) -> &Page {
        self.graph().page()
    }

    pub fn shapes(&self) -> impl Iterator<Item = &Shape> {
        self.graph().shapes()
    }

    pub fn binding(&self, id: &str) -> Option<&Binding> {
        self.graph().binding(id)
    }

    pub fn page_state(&self) -> &PageState {
        &self.document.page_state
    }

    // Selection

    pub fn resolver(&self) -> SelectionResolver<'_> {
        SelectionResolver::new(self.document.graph(), &self.document.page_state)
    }

    pub fn selected_ids(&self) -> &[ShapeId] {
        &self.document.page_state.selected_ids
    }

    pub fn selected_shapes(&self) -> Vec<&Shape> {
        self.resolver().selected_shapes()
    }

    /// Replace the selection. Duplicates are dropped, keeping first
    /// occurrences in order.
    pub fn set_selected_ids(&mut self, ids: &[ShapeId]) -> Result<(), EditorError> {
        let mut selected: Vec<ShapeId> = Vec::with_capacity(ids.len());
        for id in ids {
            self.shape(id)?;
            if !selected.contains(id) {
                selected.push(id.clone());
            }
        }
        self.document.page_state.selected_ids = selected;
        Ok(())
    }

    pub fn select(&mut self, ids: &[&str]) -> Result<(), EditorError> {
        let ids: Vec<ShapeId> = ids.iter().map(|id| id.to_string()).collect();
        self.set_selected_ids(&ids)
    }

    pub fn select_none(&mut self) {
        self.document.page_state.selected_ids.clear();
    }

    /// Select every direct child of the group currently drilled into
    pub fn select_all(&mut self) {
        let parent_id = &self.document.page_state.current_parent_id;
        let ids: Vec<ShapeId> = self
            .document
            .graph()
            .siblings_of_parent(parent_id)
            .into_iter()
            .map(|shape| shape.id.clone())
            .collect();
        self.document.page_state.selected_ids = ids;
    }

    /// Drill into a container, or back out to the page
    pub fn set_current_parent_id(&mut self, id: &str) -> Result<(), EditorError> {
        if !self.graph().is_page(id) {
            let shape = self.shape(id)?;
            if !shape.is_container() {
                return Err(EditorError::NotAContainer {
                    id: shape.id.clone(),
                    kind: shape.kind.clone(),
                });
            }
        }
        self.document.page_state.current_parent_id = id.to_string();
        Ok(())
    }

    pub fn set_pointed_id(&mut self, id: Option<&str>) {
        self.document.page_state.pointed_id = id.map(str::to_string);
    }

    pub fn pointed_id(&self, id: &str) -> Result<ShapeId, EditorError> {
        self.resolver().pointed_id(id)
    }

    pub fn drilled_pointed_id(&self, id: &str) -> Result<ShapeId, EditorError> {
        self.resolver().drilled_pointed_id(id)
    }

    pub fn top_parent_id(&self, id: &str) -> Result<ShapeId, EditorError> {
        self.resolver().top_parent_id(id)
    }

    pub fn document_branch(&self, id: &str) -> Result<Vec<ShapeId>, EditorError> {
        self.resolver().document_branch(id)
    }

    pub fn selected_branch_snapshot(&self) -> Result<Vec<Shape>, EditorError> {
        self.resolver().selected_branch_snapshot()
    }

    pub fn selected_branch_snapshot_with<K>(
        &self,
        map: impl Fn(&Shape) -> K,
    ) -> Result<Vec<ShapeSnapshot<K>>, EditorError> {
        self.resolver().selected_branch_snapshot_with(map)
    }

    pub fn selected_shape_snapshot(&self) -> Vec<Shape> {
        self.resolver().selected_shape_snapshot()
    }

    pub fn selected_shape_snapshot_with<K>(&self, map: impl Fn(&Shape) -> K) -> Vec<ShapeSnapshot<K>> {
        self.resolver().selected_shape_snapshot_with(map)
    }

    // Ordering

    /// May renumber the siblings of `id` when precision runs out; sibling
    /// order is preserved either way
    pub fn child_index_above(&mut self, id: &str) -> Result<f64, EditorError> {
        self.document.graph_mut().child_index_above(id)
    }

    pub fn top_child_index(&self, parent_id: &str) -> Result<f64, EditorError> {
        self.graph().top_child_index(parent_id)
    }

    // Styles

    /// Shared styles of the current selection. The same `Rc` comes back
    /// until the selection or a contributing style value changes.
    pub fn shared_styles(&self) -> Result<Rc<SharedStyleMap>, EditorError> {
        self.styles
            .shared_styles(&self.resolver(), &self.registry, self.document.version)
    }

    pub fn set_style(&mut self, key: &str, value: impl Into<Value>) -> Result<Vec<ShapeId>, EditorError> {
        let value = value.into();
        let page_state = self.document.page_state.clone();
        let mut instance = self.instance.clone();

        let changed = self.transact(|graph, registry| {
            StyleAggregator::set_style(graph, registry, &page_state, &mut instance, key, value)
        })?;

        self.instance = instance;
        Ok(changed)
    }

    // Structure

    #[instrument(skip(self, shapes), fields(session = %self.id, count = shapes.len()))]
    pub fn create_shapes(&mut self, shapes: Vec<NewShape>) -> Result<Vec<ShapeId>, EditorError> {
        let mut ids = Vec::with_capacity(shapes.len());
        for shape in &shapes {
            let id = match &shape.id {
                Some(id) => id.clone(),
                None => self.next_free_id(&ids),
            };
            ids.push(id);
        }

        let current_parent_id = self.document.page_state.current_parent_id.clone();
        let styles_for_next_shape = self.instance.styles_for_next_shape.clone();

        self.transact(move |graph, registry| {
            let mut created = Vec::with_capacity(ids.len());
            for (id, new_shape) in ids.into_iter().zip(shapes) {
                if graph.contains(&id) {
                    return Err(EditorError::DuplicateShape(id));
                }

                let util = registry.get(&new_shape.kind)?;

                let parent_id = match new_shape.parent_id {
                    Some(parent_id) => parent_id,
                    None if graph.is_page(&current_parent_id) || graph.contains(&current_parent_id) => {
                        current_parent_id.clone()
                    }
                    None => graph.page_id().to_string(),
                };

                let mut props = util.default_props();
                for key in util.style_keys() {
                    if let Some(value) = styles_for_next_shape.get(*key) {
                        props.insert(key.to_string(), value.clone());
                    }
                }
                props.extend(new_shape.props);

                let shape = Shape {
                    id: id.clone(),
                    kind: new_shape.kind,
                    child_index: graph.top_child_index(&parent_id)?,
                    parent_id: parent_id.clone(),
                    children: util.is_container().then(Vec::new),
                    props,
                    is_locked: new_shape.is_locked,
                };

                debug!(shape_id = %id, kind = %shape.kind, parent_id = %parent_id, "Creating shape");
                graph.insert(shape);

                if let Some(parent) = graph.get_mut(&parent_id) {
                    if let Some(children) = &mut parent.children {
                        children.push(id.clone());
                    }
                }
                created.push(id);
            }

            TreeMutator::new(graph, registry).update_parents(&created)?;
            Ok(created)
        })
    }

    #[instrument(skip(self, patches), fields(session = %self.id, count = patches.len()))]
    pub fn update_shapes(&mut self, patches: Vec<ShapePatch>) -> Result<Vec<ShapeId>, EditorError> {
        self.transact(move |graph, registry| {
            let mut changed = Vec::new();

            for patch in patches {
                let shape = graph.shape(&patch.id)?;
                let util = registry.util_for(shape)?;

                let mut next = patch
                    .props
                    .iter()
                    .fold(shape.clone(), |shape, (key, value)| util.set_property(&shape, key, value));
                if let Some(is_locked) = patch.is_locked {
                    next.is_locked = is_locked;
                }

                if next != *shape {
                    changed.push(next.id.clone());
                    graph.insert(next);
                }
            }

            TreeMutator::new(graph, registry).update_parents(&changed)?;
            Ok(changed)
        })
    }

    /// Delete shapes, cascading into dissolving parents. Returns copies of
    /// every removed shape.
    #[instrument(skip(self, ids), fields(session = %self.id, count = ids.len()))]
    pub fn delete_shapes(&mut self, ids: &[ShapeId]) -> Result<Vec<Shape>, EditorError> {
        let deleted = self.transact(|graph, registry| {
            let deleted = TreeMutator::new(graph, registry).delete_shapes(ids)?;

            let deleted_ids: Vec<&str> = deleted.iter().map(|shape| shape.id.as_str()).collect();
            let bindings = graph.remove_bindings_touching(&deleted_ids);
            if !bindings.is_empty() {
                debug!(bindings = bindings.len(), "Removed bindings of deleted shapes");
            }
            Ok(deleted)
        })?;

        self.forget_missing();
        Ok(deleted)
    }

    pub fn update_parents(&mut self, changed_ids: &[ShapeId]) -> Result<(), EditorError> {
        self.transact(|graph, registry| TreeMutator::new(graph, registry).update_parents(changed_ids))
    }

    pub fn reparent_shapes(&mut self, ids: &[ShapeId], new_parent_id: &str) -> Result<Vec<Shape>, EditorError> {
        let deleted = self.transact(|graph, registry| {
            TreeMutator::new(graph, registry).reparent_shapes(ids, new_parent_id)
        })?;

        self.forget_missing();
        Ok(deleted)
    }

    /// Apply a serialized mutation
    pub fn apply(&mut self, mutation: Mutation) -> Result<MutationResult, EditorError> {
        let name = mutation.name();
        let mut result = MutationResult::default();

        match mutation {
            Mutation::CreateShapes { shapes } => result.changed = self.create_shapes(shapes)?,
            Mutation::UpdateShapes { patches } => result.changed = self.update_shapes(patches)?,
            Mutation::DeleteShapes { ids } => result.deleted = self.delete_shapes(&ids)?,
            Mutation::ReparentShapes { ids, new_parent_id } => {
                let mut moved: Vec<ShapeId> = Vec::new();
                for id in &ids {
                    let moves = self.graph().get(id).is_some_and(|shape| shape.parent_id != new_parent_id);
                    if moves && !moved.contains(id) {
                        moved.push(id.clone());
                    }
                }

                result.deleted = self.reparent_shapes(&ids, &new_parent_id)?;
                result.changed = moved;
            }
            Mutation::SetStyle { key, value } => result.changed = self.set_style(&key, value)?,
            Mutation::Select { ids } => self.set_selected_ids(&ids)?,
        }

        result.version = self.document.version;
        info!(mutation = name, version = result.version, "Applied mutation");
        Ok(result)
    }

    /// Run `op` on a draft of the graph and commit it only on success
    fn transact<T>(
        &mut self,
        op: impl FnOnce(&mut ShapeGraph, &ShapeRegistry) -> Result<T, EditorError>,
    ) -> Result<T, EditorError> {
        let mut draft = self.document.graph().clone();
        let value = op(&mut draft, &self.registry)?;

        *self.document.graph_mut() = draft;
        self.document.version += 1;
        Ok(value)
    }

    /// Drop page-state references to shapes that no longer exist
    fn forget_missing(&mut self) {
        let (graph, page_state) = self.document.parts_mut();

        page_state.selected_ids.retain(|id| graph.contains(id));

        if !graph.is_page(&page_state.current_parent_id) && !graph.contains(&page_state.current_parent_id) {
            page_state.current_parent_id = graph.page_id().to_string();
        }

        if page_state.pointed_id.as_deref().is_some_and(|id| !graph.contains(id)) {
            page_state.pointed_id = None;
        }
    }

    fn next_free_id(&mut self, reserved: &[ShapeId]) -> ShapeId {
        loop {
            let id = self.ids.new_id();
            if !self.graph().contains(&id) && !reserved.contains(&id) {
                return id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session() -> EditSession {
        EditSession::new("client-1", Document::new("page"))
    }

    #[test]
    fn test_session_creation() {
        let session = session();

        assert_eq!(session.id, "client-1");
        assert_eq!(session.version(), 0);
        assert!(session.selected_ids().is_empty());
    }

    #[test]
    fn test_create_shapes_stack_upwards() {
        let mut session = session();
        let ids = session
            .create_shapes(vec![NewShape::new("geo"), NewShape::new("geo")])
            .unwrap();

        assert_eq!(session.shape(&ids[0]).unwrap().child_index, 1.0);
        assert_eq!(session.shape(&ids[1]).unwrap().child_index, 2.0);
        assert_eq!(session.version(), 1);
    }

    #[test]
    fn test_failed_mutation_leaves_document_untouched() {
        let mut session = session();
        session.create_shapes(vec![NewShape::new("geo").with_id("a")]).unwrap();

        let result = session.create_shapes(vec![
            NewShape::new("geo").with_id("b"),
            NewShape::new("hexagon").with_id("c"),
        ]);

        assert!(matches!(result, Err(EditorError::UnknownShapeKind(_))));
        assert!(session.shape("b").is_err());
        assert_eq!(session.version(), 1);
    }

    #[test]
    fn test_set_selected_ids_dedupes_and_validates() {
        let mut session = session();
        session
            .create_shapes(vec![NewShape::new("geo").with_id("a"), NewShape::new("geo").with_id("b")])
            .unwrap();

        session.select(&["b", "a", "b"]).unwrap();
        assert_eq!(session.selected_ids(), ["b".to_string(), "a".to_string()]);

        assert!(session.select(&["nope"]).is_err());
        assert_eq!(session.selected_ids().len(), 2);
    }

    #[test]
    fn test_new_shapes_use_last_style() {
        let mut session = session();
        session.set_style("color", "red").unwrap();

        let ids = session.create_shapes(vec![NewShape::new("geo")]).unwrap();
        assert_eq!(session.shape(&ids[0]).unwrap().props["color"], json!("red"));

        // Explicit props win over remembered styles
        let ids = session
            .create_shapes(vec![NewShape::new("geo").with_prop("color", "blue")])
            .unwrap();
        assert_eq!(session.shape(&ids[0]).unwrap().props["color"], json!("blue"));
    }

    #[test]
    fn test_apply_reparent_reports_only_moved_shapes() {
        let mut session = session();
        session
            .create_shapes(vec![
                NewShape::new("frame").with_id("f"),
                NewShape::new("geo").with_id("a").with_parent("f"),
                NewShape::new("geo").with_id("b"),
            ])
            .unwrap();

        let result = session
            .apply(Mutation::ReparentShapes {
                ids: vec!["a".to_string(), "b".to_string(), "b".to_string()],
                new_parent_id: "f".to_string(),
            })
            .unwrap();

        assert_eq!(result.changed, vec!["b".to_string()]);
        assert!(result.deleted.is_empty());
        assert_eq!(session.shape("b").unwrap().parent_id, "f");
        assert_eq!(session.shape("f").unwrap().children(), ["a".to_string(), "b".to_string()]);
    }
}
