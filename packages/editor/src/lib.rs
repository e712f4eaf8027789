//! # Inkboard Editor
//!
//! Shape-tree engine for a whiteboard document.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ document: JSON ⇄ Page + PageState           │
//! │  - Validate parent chains at load           │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ graph: id-indexed shapes, sibling queries   │
//! │  - indexer: fractional child indices        │
//! │  - shape_util: per-kind behavior table      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ tree: delete cascade, reparent, refresh     │
//! │ selection: drill-down ids, branch snapshots │
//! │ styles: shared styles, set style            │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ session: EditSession, all-or-nothing edits  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Parents own order**: siblings sort by `child_index`, ties by id
//! 2. **Groups are views**: their bounds follow their children and they
//!    dissolve when too few children remain
//! 3. **Bounded walks**: every ancestor walk stops after as many steps as
//!    there are shapes, so a corrupt chain is an error and never a hang
//! 4. **Atomic edits**: a failed mutation leaves the document unchanged
//!
//! ## Usage
//!
//! ```rust,ignore
//! use inkboard_editor::{Document, EditSession, NewShape};
//!
//! let mut session = EditSession::new("client-1", Document::load("board.json".into())?);
//!
//! let ids = session.create_shapes(vec![NewShape::new("geo"), NewShape::new("text")])?;
//! session.set_selected_ids(&ids)?;
//! session.set_style("color", "red")?;
//!
//! let styles = session.shared_styles()?;
//! session.delete_shapes(&ids)?;
//! session.document.save()?;
//! ```

mod document;
mod errors;
mod graph;
mod id_generator;
mod indexer;
mod kinds;
mod mutations;
mod selection;
mod session;
mod shape;
mod shape_util;
mod styles;
mod tree;

pub use document::{validate, Document, DocumentSnapshot, DocumentStorage};
pub use errors::EditorError;
pub use graph::ShapeGraph;
pub use id_generator::{get_page_seed, IDGenerator};
pub use indexer::lerp;
pub use kinds::{FrameShapeUtil, GeoShapeUtil, GroupShapeUtil, TextShapeUtil};
pub use mutations::{Mutation, MutationResult, NewShape, ShapePatch};
pub use selection::{SelectionResolver, ShapeSnapshot};
pub use session::EditSession;
pub use shape::{Binding, Camera, InstanceState, Page, PageState, Props, Shape, ShapeId};
pub use shape_util::{ShapeRegistry, ShapeUtil};
pub use styles::{SharedStyle, SharedStyleMap, StyleAggregator};
pub use tree::TreeMutator;
