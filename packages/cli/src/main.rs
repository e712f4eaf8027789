mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{apply, branch, styles, validate, ApplyArgs, BranchArgs, StylesArgs, ValidateArgs};
use config::Config;

/// Inkboard CLI - inspect and edit whiteboard documents
#[derive(Parser, Debug)]
#[command(name = "inkboard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a document's tree structure
    Validate(ValidateArgs),

    /// Print a shape and everything below it
    Branch(BranchArgs),

    /// Print the shared styles of a selection
    Styles(StylesArgs),

    /// Apply a list of mutations to a document
    Apply(ApplyArgs),
}

fn init_tracing(config: &Config) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?.display().to_string();
    let config = Config::load(&cwd)?;
    init_tracing(&config);

    match cli.command {
        Command::Validate(args) => validate(args, &config),
        Command::Branch(args) => branch(args, &config),
        Command::Styles(args) => styles(args, &config),
        Command::Apply(args) => apply(args, &config),
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
