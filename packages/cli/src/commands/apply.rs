use super::open_session;
use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use inkboard_editor::Mutation;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Document JSON file
    pub input: PathBuf,

    /// JSON array of mutations to apply in order
    pub mutations: PathBuf,

    /// Save the result back to the document file
    #[arg(short, long)]
    pub write: bool,
}

pub fn apply(args: ApplyArgs, config: &Config) -> Result<()> {
    let mut session = open_session(&args.input, config)?;

    let source = fs::read_to_string(&args.mutations)
        .with_context(|| format!("Failed to read {}", args.mutations.display()))?;
    let mutations: Vec<Mutation> = serde_json::from_str(&source)
        .with_context(|| format!("Invalid mutations in {}", args.mutations.display()))?;

    println!(
        "✏️  {} {} mutations to {}",
        "Applying".green().bold(),
        mutations.len(),
        args.input.display()
    );

    for (i, mutation) in mutations.into_iter().enumerate() {
        let name = mutation.name();
        debug!(index = i, mutation = name, "Applying mutation");

        let result = session
            .apply(mutation)
            .with_context(|| format!("Mutation #{} ({}) failed", i + 1, name))?;

        println!(
            "   {} {} {}",
            "✓".green(),
            name,
            format!("v{} · {} changed", result.version, result.changed.len()).dimmed()
        );
        for shape in &result.deleted {
            println!("     {} {} {}", "-".red(), shape.id, shape.kind.dimmed());
        }
    }

    if args.write {
        session
            .document
            .save_with(config.pretty)
            .with_context(|| format!("Failed to save {}", args.input.display()))?;
        println!();
        println!("💾 {} {}", "Saved".green().bold(), args.input.display());
    } else {
        println!();
        println!("   Dry run, pass --write to save");
    }

    Ok(())
}
