pub mod apply;
pub mod branch;
pub mod styles;
pub mod validate;

pub use apply::{apply, ApplyArgs};
pub use branch::{branch, BranchArgs};
pub use styles::{styles, StylesArgs};
pub use validate::{validate, ValidateArgs};

use crate::config::Config;
use anyhow::{Context, Result};
use inkboard_editor::{Document, EditSession};
use std::path::Path;

/// Load a document honoring `validateOnLoad`
fn load_document(path: &Path, config: &Config) -> Result<Document> {
    let doc = if config.validate_on_load {
        Document::load(path.to_path_buf())
    } else {
        Document::load_unchecked(path.to_path_buf())
    };
    doc.with_context(|| format!("Failed to load {}", path.display()))
}

/// Open an edit session seeded with the configured style defaults
fn open_session(path: &Path, config: &Config) -> Result<EditSession> {
    let mut session = EditSession::new("inkboard-cli", load_document(path, config)?);
    session
        .instance
        .styles_for_next_shape
        .extend(config.styles_for_next_shape.clone());
    Ok(session)
}

fn to_json<T: serde::Serialize>(value: &T, config: &Config) -> Result<String> {
    let json = if config.pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}
