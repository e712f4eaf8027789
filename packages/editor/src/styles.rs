//! # Style Aggregation
//!
//! Groups carry no style of their own, so both reading and writing styles
//! look through containers to the leaf shapes below them.
//!
//! [`StyleAggregator::shared_styles`] hands out an `Rc` and keeps handing
//! out the same one until the selection or one of the contributing style
//! values changes. Callers can compare results with `Rc::ptr_eq` to skip
//! work when nothing relevant moved.

use crate::graph::ShapeGraph;
use crate::selection::SelectionResolver;
use crate::shape::{InstanceState, PageState, Shape, ShapeId};
use crate::shape_util::ShapeRegistry;
use crate::tree::TreeMutator;
use crate::EditorError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;
use tracing::{debug, info, instrument};

/// A style value aggregated over a selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SharedStyle {
    /// Every contributing shape has this value
    Shared { value: Value },

    /// At least two contributing shapes differ
    Mixed,
}

impl SharedStyle {
    pub fn shared(value: impl Into<Value>) -> Self {
        SharedStyle::Shared { value: value.into() }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            SharedStyle::Shared { value } => Some(value),
            SharedStyle::Mixed => None,
        }
    }
}

/// Shared styles keyed by style key
pub type SharedStyleMap = BTreeMap<String, SharedStyle>;

/// One style value contributed by one leaf shape
#[derive(Debug, Clone, PartialEq)]
struct StyleInput {
    shape_id: ShapeId,
    key: &'static str,
    value: Value,
}

#[derive(Debug)]
struct StyleCache {
    selection: Vec<ShapeId>,
    version: u64,
    inputs: Vec<StyleInput>,
    styles: Rc<SharedStyleMap>,
}

#[derive(Debug, Default)]
pub struct StyleAggregator {
    cache: RefCell<Option<StyleCache>>,
}

impl StyleAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared-or-mixed value for every style key carried by the selected
    /// leaves. `version` identifies the document revision being read.
    pub fn shared_styles(
        &self,
        resolver: &SelectionResolver<'_>,
        registry: &ShapeRegistry,
        version: u64,
    ) -> Result<Rc<SharedStyleMap>, EditorError> {
        let selection = resolver.selected_ids();
        let mut cache = self.cache.borrow_mut();

        if let Some(cached) = cache.as_mut() {
            if cached.selection == selection && cached.version == version {
                return Ok(Rc::clone(&cached.styles));
            }
        }

        let inputs = collect_inputs(resolver, registry)?;

        if let Some(cached) = cache.as_mut() {
            if cached.selection == selection && cached.inputs == inputs {
                debug!(version, "Style inputs unchanged, reusing shared styles");
                cached.version = version;
                return Ok(Rc::clone(&cached.styles));
            }
        }

        let styles = Rc::new(aggregate(&inputs));
        *cache = Some(StyleCache {
            selection: selection.to_vec(),
            version,
            inputs,
            styles: Rc::clone(&styles),
        });
        Ok(styles)
    }

    /// Set `key` to `value` on every selected leaf whose kind carries that
    /// style, looking through selected containers, and remember the value
    /// for shapes created next. Returns the ids of shapes that changed.
    #[instrument(skip(graph, registry, page_state, instance, value), fields(selected = page_state.selected_ids.len()))]
    pub fn set_style(
        graph: &mut ShapeGraph,
        registry: &ShapeRegistry,
        page_state: &PageState,
        instance: &mut InstanceState,
        key: &str,
        value: Value,
    ) -> Result<Vec<ShapeId>, EditorError> {
        let updates: Vec<Shape> = {
            let resolver = SelectionResolver::new(graph, page_state);
            let mut seen = HashSet::new();
            let mut updates = Vec::new();

            for selected_id in resolver.selected_ids() {
                if !graph.contains(selected_id) {
                    continue;
                }
                for leaf_id in resolver.leaf_ids(selected_id)? {
                    if !seen.insert(leaf_id.clone()) {
                        continue;
                    }
                    let leaf = graph.shape(&leaf_id)?;
                    let util = registry.util_for(leaf)?;
                    if !util.has_style(key) {
                        continue;
                    }
                    let next = util.set_property(leaf, key, &value);
                    if next != *leaf {
                        updates.push(next);
                    }
                }
            }
            updates
        };

        let changed: Vec<ShapeId> = updates.iter().map(|shape| shape.id.clone()).collect();
        for shape in updates {
            graph.insert(shape);
        }

        TreeMutator::new(graph, registry).update_parents(&changed)?;
        instance.styles_for_next_shape.insert(key.to_string(), value);

        info!(key, changed = changed.len(), "Set style");
        Ok(changed)
    }
}

fn collect_inputs(resolver: &SelectionResolver<'_>, registry: &ShapeRegistry) -> Result<Vec<StyleInput>, EditorError> {
    let graph = resolver.graph();
    let mut seen = HashSet::new();
    let mut inputs = Vec::new();

    for selected_id in resolver.selected_ids() {
        if !graph.contains(selected_id) {
            continue;
        }
        for leaf_id in resolver.leaf_ids(selected_id)? {
            if !seen.insert(leaf_id.clone()) {
                continue;
            }
            let leaf = graph.shape(&leaf_id)?;
            for key in registry.util_for(leaf)?.style_keys() {
                if let Some(value) = leaf.props.get(*key) {
                    inputs.push(StyleInput {
                        shape_id: leaf_id.clone(),
                        key: *key,
                        value: value.clone(),
                    });
                }
            }
        }
    }

    Ok(inputs)
}

fn aggregate(inputs: &[StyleInput]) -> SharedStyleMap {
    let mut styles = SharedStyleMap::new();

    for input in inputs {
        styles
            .entry(input.key.to_string())
            .and_modify(|style| {
                if style.value().is_some_and(|value| *value != input.value) {
                    *style = SharedStyle::Mixed;
                }
            })
            .or_insert_with(|| SharedStyle::shared(input.value.clone()));
    }

    styles
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(shape_id: &str, key: &'static str, value: &str) -> StyleInput {
        StyleInput {
            shape_id: shape_id.to_string(),
            key,
            value: json!(value),
        }
    }

    #[test]
    fn test_aggregate_shared_and_mixed() {
        let styles = aggregate(&[
            input("a", "color", "black"),
            input("a", "fill", "none"),
            input("b", "color", "black"),
            input("b", "fill", "solid"),
            input("c", "fill", "none"),
        ]);

        assert_eq!(styles["color"], SharedStyle::shared("black"));
        assert_eq!(styles["fill"], SharedStyle::Mixed);
    }

    #[test]
    fn test_mixed_is_sticky() {
        let styles = aggregate(&[
            input("a", "color", "black"),
            input("b", "color", "red"),
            input("c", "color", "black"),
        ]);
        assert_eq!(styles["color"], SharedStyle::Mixed);
    }

    #[test]
    fn test_shared_style_serialization() {
        assert_eq!(
            serde_json::to_value(SharedStyle::shared("black")).unwrap(),
            json!({ "type": "shared", "value": "black" })
        );
        assert_eq!(serde_json::to_value(SharedStyle::Mixed).unwrap(), json!({ "type": "mixed" }));
    }
}
