//! # Tree Mutations
//!
//! Cascading delete, reparenting and parent refresh over a [`ShapeGraph`].
//!
//! ## Delete cascade
//!
//! Deleting runs in generations. Each generation removes its targets,
//! unlinks them from their parents' `children`, and asks every affected
//! parent whether it should dissolve. A dissolving parent hands its
//! remaining children to its own parent, slotted between its child index
//! and the next sibling's, and becomes a target of the next generation.
//! A generation never revisits a removed shape, so the cascade ends once
//! no parent asks to be dissolved.
//!
//! Structural unlinking always happens before a parent is evaluated, so an
//! error part way through leaves no dangling references behind.

use crate::graph::ShapeGraph;
use crate::indexer::lerp;
use crate::shape::{Shape, ShapeId};
use crate::shape_util::ShapeRegistry;
use crate::EditorError;
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// Single-writer view over the graph used by every structural mutation
pub struct TreeMutator<'a> {
    graph: &'a mut ShapeGraph,
    registry: &'a ShapeRegistry,
}

impl<'a> TreeMutator<'a> {
    pub fn new(graph: &'a mut ShapeGraph, registry: &'a ShapeRegistry) -> Self {
        Self { graph, registry }
    }

    /// Delete `ids` and cascade into parents that dissolve as a result.
    ///
    /// Returns pre-mutation copies of every removed shape, targets first,
    /// then dissolved parents in the order they were collapsed. Surviving
    /// descendants of a deleted container move up to the nearest surviving
    /// ancestor.
    #[instrument(skip(self, ids), fields(targets = ids.len()))]
    pub fn delete_shapes(&mut self, ids: &[ShapeId]) -> Result<Vec<Shape>, EditorError> {
        for id in ids {
            self.graph.shape(id)?;
        }

        let mut targets: Vec<ShapeId> = Vec::new();
        for id in ids {
            if !targets.contains(id) {
                targets.push(id.clone());
            }
        }

        self.hoist_survivors(&targets)?;

        let mut deleted = Vec::new();
        let mut generation = 0;

        while !targets.is_empty() {
            generation += 1;
            debug!(generation, targets = targets.len(), "Deleting generation");
            targets = self.delete_generation(&targets, &mut deleted)?;
        }

        info!(deleted = deleted.len(), generations = generation, "Deleted shapes");
        Ok(deleted)
    }

    fn delete_generation(&mut self, ids: &[ShapeId], deleted: &mut Vec<Shape>) -> Result<Vec<ShapeId>, EditorError> {
        let targets: Vec<Shape> = ids.iter().filter_map(|id| self.graph.get(id)).cloned().collect();
        let target_ids: HashSet<&str> = targets.iter().map(|shape| shape.id.as_str()).collect();

        let mut parent_ids: Vec<String> = Vec::new();
        for shape in &targets {
            if !parent_ids.contains(&shape.parent_id) {
                parent_ids.push(shape.parent_id.clone());
            }
        }

        for shape in &targets {
            self.graph.remove(&shape.id);
        }

        let mut dissolving = Vec::new();

        for parent_id in &parent_ids {
            // Either the page, or a parent removed earlier in this cascade
            let Some(parent) = self.graph.get(parent_id) else {
                continue;
            };

            let Some(children) = &parent.children else {
                return Err(EditorError::NotAContainer {
                    id: parent.id.clone(),
                    kind: parent.kind.clone(),
                });
            };

            let mut next = parent.clone();
            next.children = Some(
                children
                    .iter()
                    .filter(|id| !target_ids.contains(id.as_str()))
                    .cloned()
                    .collect(),
            );
            self.graph.insert(next);
            self.refresh(parent_id)?;

            let parent = self.graph.shape(parent_id)?;
            if self.registry.util_for(parent)?.should_delete(parent) {
                debug!(parent_id = %parent_id, remaining = parent.children().len(), "Dissolving parent");
                self.dissolve(parent_id)?;
                dissolving.push(parent_id.clone());
            }
        }

        deleted.extend(targets);
        Ok(dissolving)
    }

    /// Move a dissolving parent's children up one level and empty it
    fn dissolve(&mut self, parent_id: &str) -> Result<(), EditorError> {
        let parent = self.graph.shape(parent_id)?;
        let mut children: Vec<&Shape> = self.graph.children_of(parent);
        children.sort_by(|a, b| a.child_index.total_cmp(&b.child_index));
        let children: Vec<ShapeId> = children.into_iter().map(|child| child.id.clone()).collect();

        self.relocate_above(parent_id, &children)?;

        if let Some(parent) = self.graph.get_mut(parent_id) {
            parent.children = Some(Vec::new());
        }
        Ok(())
    }

    /// Before removing targeted containers, lift every surviving descendant
    /// into the nearest ancestor that is not itself being deleted
    fn hoist_survivors(&mut self, targets: &[ShapeId]) -> Result<(), EditorError> {
        let target_set: HashSet<&str> = targets.iter().map(String::as_str).collect();

        let roots: Vec<&ShapeId> = targets
            .iter()
            .filter(|id| {
                self.graph
                    .get(id)
                    .is_some_and(|shape| !target_set.contains(shape.parent_id.as_str()))
            })
            .collect();

        for root in roots {
            let survivors = self.surviving_descendants(root, &target_set);
            if survivors.is_empty() {
                continue;
            }
            debug!(root = %root, survivors = survivors.len(), "Hoisting children of deleted container");
            self.relocate_above(root, &survivors)?;
        }
        Ok(())
    }

    /// Topmost non-targeted shapes below `root`, in sibling order, reached
    /// only through targeted containers
    fn surviving_descendants(&self, root: &str, target_set: &HashSet<&str>) -> Vec<ShapeId> {
        let mut survivors = Vec::new();
        let mut stack = vec![root.to_string()];

        while let Some(id) = stack.pop() {
            let Some(shape) = self.graph.get(&id) else {
                continue;
            };

            let mut children = self.graph.children_of(shape);
            children.sort_by(|a, b| a.child_index.total_cmp(&b.child_index));

            for child in children.into_iter().rev() {
                if target_set.contains(child.id.as_str()) {
                    stack.push(child.id.clone());
                } else {
                    survivors.push(child.id.clone());
                }
            }
        }

        // Children were pushed in reverse sibling order
        survivors.reverse();
        survivors
    }

    /// Reparent `ids` to the parent of `anchor_id`, spacing their child
    /// indices evenly from the anchor's index up to the next sibling's
    fn relocate_above(&mut self, anchor_id: &str, ids: &[ShapeId]) -> Result<(), EditorError> {
        if ids.is_empty() {
            return Ok(());
        }

        let next_index = self.graph.child_index_above(anchor_id)?;
        let anchor = self.graph.shape(anchor_id)?;
        let (start, new_parent_id) = (anchor.child_index, anchor.parent_id.clone());

        let len = ids.len() as f64;
        for (i, id) in ids.iter().enumerate() {
            let old_parent_id = self.graph.shape(id)?.parent_id.clone();
            if let Some(old_parent) = self.graph.get_mut(&old_parent_id) {
                if let Some(children) = &mut old_parent.children {
                    children.retain(|child_id| child_id != id);
                }
            }

            if let Some(child) = self.graph.get_mut(id) {
                child.parent_id = new_parent_id.clone();
                child.child_index = lerp(start, next_index, i as f64 / len);
            }
        }

        if !self.graph.is_page(&new_parent_id) {
            let grandparent = self.graph.shape(&new_parent_id)?;
            let mut next = grandparent.clone();
            let Some(children) = &mut next.children else {
                return Err(EditorError::NotAContainer {
                    id: next.id.clone(),
                    kind: next.kind.clone(),
                });
            };
            for id in ids {
                if !children.contains(id) {
                    children.push(id.clone());
                }
            }
            self.graph.insert(next);
            self.refresh(&new_parent_id)?;
        }
        Ok(())
    }

    /// Run `on_children_change` for one container and store the result
    fn refresh(&mut self, parent_id: &str) -> Result<(), EditorError> {
        let parent = self.graph.shape(parent_id)?;
        if !parent.is_container() {
            return Err(EditorError::NotAContainer {
                id: parent.id.clone(),
                kind: parent.kind.clone(),
            });
        }

        let util = self.registry.util_for(parent)?;
        let children = self.graph.children_of(parent);
        if let Some(next) = util.on_children_change(parent, &children) {
            self.graph.insert(next);
        }
        Ok(())
    }

    /// Refresh the parents of `changed_ids`, then their parents, up to the
    /// page. Each parent is refreshed once per level.
    #[instrument(skip(self, changed_ids), fields(changed = changed_ids.len()))]
    pub fn update_parents(&mut self, changed_ids: &[ShapeId]) -> Result<(), EditorError> {
        let mut level: Vec<ShapeId> = changed_ids.to_vec();

        for _ in 0..self.graph.depth_bound() {
            let mut parent_ids: Vec<ShapeId> = Vec::new();
            for id in &level {
                let Some(shape) = self.graph.get(id) else {
                    continue;
                };
                if shape.parent_id == shape.id {
                    return Err(EditorError::self_parent(&shape.id));
                }
                if self.graph.is_page(&shape.parent_id) || parent_ids.contains(&shape.parent_id) {
                    continue;
                }
                parent_ids.push(shape.parent_id.clone());
            }

            if parent_ids.is_empty() {
                return Ok(());
            }

            for parent_id in &parent_ids {
                self.refresh(parent_id)?;
            }
            level = parent_ids;
        }

        Err(EditorError::unbounded_chain(changed_ids.first().map_or("", String::as_str)))
    }

    /// Move `ids` under `new_parent_id`, above its current children.
    ///
    /// Former containers that should dissolve afterwards are deleted
    /// through the normal cascade, whose result is returned.
    #[instrument(skip(self, ids), fields(moved = ids.len(), new_parent_id = %new_parent_id))]
    pub fn reparent_shapes(&mut self, ids: &[ShapeId], new_parent_id: &str) -> Result<Vec<Shape>, EditorError> {
        if !self.graph.is_page(new_parent_id) {
            let parent = self.graph.shape(new_parent_id)?;
            if !parent.is_container() {
                return Err(EditorError::NotAContainer {
                    id: parent.id.clone(),
                    kind: parent.kind.clone(),
                });
            }
        }

        for id in ids {
            self.graph.shape(id)?;
            if self.is_ancestor_or_self(id, new_parent_id)? {
                return Err(EditorError::InvalidParent {
                    id: id.clone(),
                    reason: format!("moving under {new_parent_id} would create a cycle"),
                });
            }
        }

        let mut old_parent_ids: Vec<String> = Vec::new();
        let mut top = self.graph.top_child_index(new_parent_id)?;

        for id in ids {
            let old_parent_id = self.graph.shape(id)?.parent_id.clone();
            if old_parent_id == new_parent_id {
                continue;
            }

            if let Some(old_parent) = self.graph.get_mut(&old_parent_id) {
                if let Some(children) = &mut old_parent.children {
                    children.retain(|child_id| child_id != id);
                }
                if !old_parent_ids.contains(&old_parent_id) {
                    old_parent_ids.push(old_parent_id.clone());
                }
            }

            if let Some(shape) = self.graph.get_mut(id) {
                shape.parent_id = new_parent_id.to_string();
                shape.child_index = top;
                top += 1.0;
            }

            if let Some(parent) = self.graph.get_mut(new_parent_id) {
                if let Some(children) = &mut parent.children {
                    children.push(id.clone());
                }
            }
        }

        self.update_parents(ids)?;

        let mut dissolving = Vec::new();
        for parent_id in &old_parent_ids {
            self.refresh(parent_id)?;
            let parent = self.graph.shape(parent_id)?;
            if self.registry.util_for(parent)?.should_delete(parent) {
                dissolving.push(parent_id.clone());
            }
        }

        self.update_parents(&old_parent_ids)?;

        if dissolving.is_empty() {
            return Ok(Vec::new());
        }
        self.delete_shapes(&dissolving)
    }

    /// Whether `ancestor_id` is `id` or lies on the parent chain of `descendant_id`
    fn is_ancestor_or_self(&self, ancestor_id: &str, descendant_id: &str) -> Result<bool, EditorError> {
        let mut current = descendant_id;

        for _ in 0..self.graph.depth_bound() {
            if current == ancestor_id {
                return Ok(true);
            }
            if self.graph.is_page(current) {
                return Ok(false);
            }
            let shape = self.graph.shape(current)?;
            if shape.parent_id == shape.id {
                return Err(EditorError::self_parent(&shape.id));
            }
            current = &shape.parent_id;
        }

        Err(EditorError::unbounded_chain(descendant_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Page;
    use serde_json::json;

    fn add(page: &mut Page, id: &str, kind: &str, parent: &str, index: f64) {
        let mut shape = Shape::new(id, kind, parent);
        shape.child_index = index;
        shape.props.insert("x".to_string(), json!(index * 10.0));
        shape.props.insert("y".to_string(), json!(0.0));
        shape.props.insert("w".to_string(), json!(5.0));
        shape.props.insert("h".to_string(), json!(5.0));
        if kind == "group" || kind == "frame" {
            shape.children = Some(Vec::new());
        }
        if let Some(parent) = page.shapes.get_mut(parent) {
            if let Some(children) = &mut parent.children {
                children.push(id.to_string());
            }
        }
        page.shapes.insert(id.to_string(), shape);
    }

    /// page: [left 1, group 2 [a 1, b 2, c 3], right 3]
    fn grouped() -> ShapeGraph {
        let mut page = Page::new("page");
        add(&mut page, "left", "geo", "page", 1.0);
        add(&mut page, "group", "group", "page", 2.0);
        add(&mut page, "a", "geo", "group", 1.0);
        add(&mut page, "b", "geo", "group", 2.0);
        add(&mut page, "c", "geo", "group", 3.0);
        add(&mut page, "right", "geo", "page", 3.0);
        ShapeGraph::new(page)
    }

    fn ids(list: &[&str]) -> Vec<ShapeId> {
        list.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_delete_leaf_keeps_group() {
        let mut graph = grouped();
        let registry = ShapeRegistry::with_defaults();

        let deleted = TreeMutator::new(&mut graph, &registry).delete_shapes(&ids(&["a"])).unwrap();

        assert_eq!(deleted.len(), 1);
        assert!(!graph.contains("a"));
        assert_eq!(graph.shape("group").unwrap().children(), ids(&["b", "c"]));
    }

    #[test]
    fn test_delete_cascades_into_dissolving_group() {
        let mut graph = grouped();
        let registry = ShapeRegistry::with_defaults();

        let deleted = TreeMutator::new(&mut graph, &registry).delete_shapes(&ids(&["a", "b"])).unwrap();

        let deleted_ids: Vec<&str> = deleted.iter().map(|shape| shape.id.as_str()).collect();
        assert_eq!(deleted_ids, vec!["a", "b", "group"]);

        let c = graph.shape("c").unwrap();
        assert_eq!(c.parent_id, "page");
        assert_eq!(c.child_index, 2.0);

        // Siblings of the dissolved group keep their slots
        assert_eq!(graph.shape("left").unwrap().child_index, 1.0);
        assert_eq!(graph.shape("right").unwrap().child_index, 3.0);
    }

    #[test]
    fn test_deleting_container_hoists_children_in_order() {
        let mut graph = grouped();
        let registry = ShapeRegistry::with_defaults();

        TreeMutator::new(&mut graph, &registry).delete_shapes(&ids(&["group"])).unwrap();

        assert!(!graph.contains("group"));
        let order: Vec<&str> = graph.siblings_of_parent("page").iter().map(|s| s.id.as_str()).collect();
        assert_eq!(order, vec!["left", "a", "b", "c", "right"]);
    }

    #[test]
    fn test_deleting_branch_removes_everything() {
        let mut graph = grouped();
        let registry = ShapeRegistry::with_defaults();

        let deleted = TreeMutator::new(&mut graph, &registry)
            .delete_shapes(&ids(&["group", "a", "b", "c"]))
            .unwrap();

        assert_eq!(deleted.len(), 4);
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_delete_unknown_id_changes_nothing() {
        let mut graph = grouped();
        let before = graph.clone();
        let registry = ShapeRegistry::with_defaults();

        let result = TreeMutator::new(&mut graph, &registry).delete_shapes(&ids(&["a", "nope"]));

        assert!(matches!(result, Err(EditorError::ShapeNotFound(id)) if id == "nope"));
        assert_eq!(graph, before);
    }

    #[test]
    fn test_update_parents_refreshes_group_bounds() {
        let mut graph = grouped();
        let registry = ShapeRegistry::with_defaults();

        let mut c = graph.shape("c").unwrap().clone();
        c.props.insert("x".to_string(), json!(100.0));
        graph.insert(c);

        TreeMutator::new(&mut graph, &registry).update_parents(&ids(&["c"])).unwrap();

        let group = graph.shape("group").unwrap();
        assert_eq!(group.prop_f64("x"), Some(10.0));
        assert_eq!(group.prop_f64("w"), Some(95.0));
    }

    #[test]
    fn test_update_parents_rejects_leaf_parent() {
        let mut graph = grouped();
        let registry = ShapeRegistry::with_defaults();

        let mut a = graph.shape("a").unwrap().clone();
        a.parent_id = "left".to_string();
        graph.insert(a);

        let result = TreeMutator::new(&mut graph, &registry).update_parents(&ids(&["a"]));
        assert!(matches!(result, Err(EditorError::NotAContainer { id, .. }) if id == "left"));
    }

    #[test]
    fn test_reparent_rejects_cycles() {
        let mut graph = grouped();
        let mut page = graph.clone().into_page();
        add(&mut page, "inner", "frame", "group", 4.0);
        graph = ShapeGraph::new(page);
        let registry = ShapeRegistry::with_defaults();

        let result = TreeMutator::new(&mut graph, &registry).reparent_shapes(&ids(&["group"]), "inner");
        assert!(matches!(result, Err(EditorError::InvalidParent { .. })));
    }

    #[test]
    fn test_reparent_out_of_group_dissolves_it() {
        let mut graph = grouped();
        let registry = ShapeRegistry::with_defaults();

        let deleted = TreeMutator::new(&mut graph, &registry)
            .reparent_shapes(&ids(&["a", "b"]), "page")
            .unwrap();

        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].id, "group");
        assert_eq!(graph.shape("c").unwrap().parent_id, "page");
        assert_eq!(graph.shape("a").unwrap().child_index, 4.0);
        assert_eq!(graph.shape("b").unwrap().child_index, 5.0);
    }

    #[test]
    fn test_reparent_into_nested_group_refreshes_ancestors() {
        // page: [outer 1 [p 1, inner 2 [q 1, r 2]], mover 2]
        let mut page = Page::new("page");
        add(&mut page, "outer", "group", "page", 1.0);
        add(&mut page, "p", "geo", "outer", 1.0);
        add(&mut page, "inner", "group", "outer", 2.0);
        add(&mut page, "q", "geo", "inner", 1.0);
        add(&mut page, "r", "geo", "inner", 2.0);
        add(&mut page, "mover", "geo", "page", 2.0);
        if let Some(mover) = page.shapes.get_mut("mover") {
            mover.props.insert("x".to_string(), json!(500.0));
        }
        let mut graph = ShapeGraph::new(page);
        let registry = ShapeRegistry::with_defaults();

        let deleted = TreeMutator::new(&mut graph, &registry)
            .reparent_shapes(&ids(&["mover"]), "inner")
            .unwrap();

        assert!(deleted.is_empty());
        let inner = graph.shape("inner").unwrap();
        assert_eq!(inner.prop_f64("x"), Some(10.0));
        assert_eq!(inner.prop_f64("w"), Some(495.0));

        let outer = graph.shape("outer").unwrap();
        assert_eq!(outer.prop_f64("x"), Some(10.0));
        assert_eq!(outer.prop_f64("w"), Some(495.0));
        assert_eq!(outer.children(), ids(&["p", "inner"]));
    }
}
