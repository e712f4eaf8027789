use super::{load_document, to_json};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use inkboard_editor::{SelectionResolver, ShapeGraph};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct BranchArgs {
    /// Document JSON file
    pub input: PathBuf,

    /// Shape whose branch to print
    pub id: String,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub fn branch(args: BranchArgs, config: &Config) -> Result<()> {
    let doc = load_document(&args.input, config)?;
    let resolver = SelectionResolver::new(doc.graph(), &doc.page_state);
    let branch = resolver.document_branch(&args.id)?;

    if args.format == "json" {
        println!("{}", to_json(&branch, config)?);
        return Ok(());
    }

    for id in &branch {
        let shape = doc.graph().shape(id)?;
        let indent = "  ".repeat(depth_below(doc.graph(), id, &args.id));
        let locked = if shape.is_locked { " (locked)".dimmed().to_string() } else { String::new() };

        println!(
            "{}{} {} {}{}",
            indent,
            id.bold(),
            shape.kind.cyan(),
            format!("@{}", shape.child_index).dimmed(),
            locked
        );
    }

    Ok(())
}

/// Number of parent steps from `id` up to `root`
fn depth_below(graph: &ShapeGraph, id: &str, root: &str) -> usize {
    let mut depth = 0;
    let mut current = id;

    while current != root && depth <= graph.len() {
        match graph.get(current) {
            Some(shape) => current = &shape.parent_id,
            None => break,
        }
        depth += 1;
    }

    depth
}
