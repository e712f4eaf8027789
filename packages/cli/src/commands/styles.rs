use super::{open_session, to_json};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use inkboard_editor::SharedStyle;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct StylesArgs {
    /// Document JSON file
    pub input: PathBuf,

    /// Shapes to aggregate over instead of the saved selection
    #[arg(short, long, value_delimiter = ',')]
    pub select: Vec<String>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub fn styles(args: StylesArgs, config: &Config) -> Result<()> {
    let mut session = open_session(&args.input, config)?;
    if !args.select.is_empty() {
        session.set_selected_ids(&args.select)?;
    }

    let styles = session.shared_styles()?;

    if args.format == "json" {
        println!("{}", to_json(&*styles, config)?);
        return Ok(());
    }

    if session.selected_ids().is_empty() {
        println!("{} Nothing selected", "!".yellow());
        return Ok(());
    }

    println!("Selection: {}", session.selected_ids().join(", ").bold());
    for (key, style) in styles.iter() {
        match style {
            SharedStyle::Shared { value } => println!("  {:<16} {}", key, value.to_string().green()),
            SharedStyle::Mixed => println!("  {:<16} {}", key, "mixed".yellow()),
        }
    }

    Ok(())
}
