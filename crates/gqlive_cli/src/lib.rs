//! Command-line interface for gqlive.
//!
//! # Usage
//!
//! ```bash
//! # Execute the operation in a file against its configured endpoint
//! gqlive run queries/user.graphql
//!
//! # Resolve the config from a different workspace root
//! gqlive run queries/user.graphql --root ../app
//!
//! # Show what the scanner sees in a file
//! gqlive inspect queries/user.graphql
//! ```
//!
//! `run` resolves the workspace's graphql config, prompts for any declared
//! variables, executes the operation and prints every result increment.
//! Subscriptions keep streaming until Ctrl-C.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use colored::Colorize;

use gqlive_core::OperationLiteral;
use gqlive_session::{OperationSession, Prompter, Renderer};

#[derive(Parser, Debug)]
#[command(name = "gqlive")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute the operation in a GraphQL file
    Run {
        /// File holding the operation
        file: PathBuf,

        /// Workspace root holding the graphql config
        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// Print the scanned operation header of a file
    Inspect {
        /// File to inspect
        file: PathBuf,
    },

    /// Print version information
    Version,
}

pub async fn run(cli: Cli) -> Result<i32, Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Run { file, root } => run_operation(&file, root.as_deref(), cli.quiet).await,
        Commands::Inspect { file } => inspect_file(&file),
        Commands::Version => {
            println!("gqlive {}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
    }
}

async fn run_operation(
    file: &Path,
    root: Option<&Path>,
    quiet: bool,
) -> Result<i32, Box<dyn std::error::Error>> {
    let root = match root {
        Some(root) => root.to_path_buf(),
        None => std::env::current_dir()?,
    };
    let root = std::fs::canonicalize(&root)?;
    let source = std::fs::canonicalize(file)?;
    let text = std::fs::read_to_string(&source)?;
    let literal = OperationLiteral::from_text(&source, text)?;
    let subscription = literal.kind().is_subscription();
    tracing::debug!(
        source = %source.display(),
        kind = %literal.kind(),
        "scanned operation literal"
    );

    let session = OperationSession::new(
        root,
        literal,
        Arc::new(TerminalPrompter),
        Arc::new(TerminalRenderer),
    );
    let outcome = session.run().await;
    if outcome.is_failure() {
        return Ok(1);
    }

    if subscription {
        if !quiet {
            eprintln!("{}", "Listening for messages, Ctrl-C to stop.".dimmed());
        }
        tokio::signal::ctrl_c().await?;
    }
    Ok(0)
}

fn inspect_file(file: &Path) -> Result<i32, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(file)?;
    let literal = OperationLiteral::from_text(file, text)?;
    let document = literal.document();

    let name = document.name.as_deref().unwrap_or("(anonymous)");
    println!("{} {}", document.kind.to_string().blue(), name);
    for declaration in &document.variables {
        println!("  ${}: {:?}", declaration.name.green(), declaration.ty);
    }
    Ok(0)
}

/// Prompter over stdin; reads happen off the runtime's worker threads.
struct TerminalPrompter;

fn read_line_blocking() -> Option<String> {
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
    }
}

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn prompt(&self, message: &str) -> Option<String> {
        let message = message.to_string();
        tokio::task::spawn_blocking(move || {
            eprint!("{} ", format!("{message}:").cyan());
            io::stderr().flush().ok();
            read_line_blocking()
        })
        .await
        .ok()
        .flatten()
    }

    async fn select(&self, message: &str, options: &[String]) -> Option<String> {
        if options.len() <= 1 {
            return options.first().cloned();
        }
        let message = message.to_string();
        let options = options.to_vec();
        tokio::task::spawn_blocking(move || {
            eprintln!("{}", message.cyan());
            for (index, option) in options.iter().enumerate() {
                eprintln!("  {} {}", format!("{}.", index + 1).dimmed(), option);
            }
            eprint!("{} ", "Choice [1]:".cyan());
            io::stderr().flush().ok();
            let input = read_line_blocking()?;
            let index = match input.trim() {
                "" => 0,
                n => n.parse::<usize>().ok()?.checked_sub(1)?,
            };
            options.get(index).cloned()
        })
        .await
        .ok()
        .flatten()
    }
}

/// Prints the full buffer after every mutation, separated from the
/// previous frame by a rule.
struct TerminalRenderer;

impl Renderer for TerminalRenderer {
    fn render(&self, content: &str) {
        println!("{}", "----------------------------------------".dimmed());
        println!("{content}");
    }
}
