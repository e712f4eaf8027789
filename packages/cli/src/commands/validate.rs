use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use inkboard_editor::Document;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Document JSON file to check
    pub input: PathBuf,
}

pub fn validate(args: ValidateArgs, _config: &Config) -> Result<()> {
    println!("🔍 {} {}", "Validating".green().bold(), args.input.display());

    // Always validate here, regardless of validateOnLoad
    let doc = Document::load(args.input.clone())?;
    let graph = doc.graph();

    let containers = graph.shapes().filter(|shape| shape.is_container()).count();
    let roots = graph.siblings_of_parent(graph.page_id()).len();

    println!("   Page:       {}", graph.page_id());
    println!("   Shapes:     {}", graph.len());
    println!("   Containers: {}", containers);
    println!("   Top level:  {}", roots);
    println!("   Bindings:   {}", graph.bindings().count());
    println!();
    println!("   {} Document structure is valid", "✓".green());

    Ok(())
}
