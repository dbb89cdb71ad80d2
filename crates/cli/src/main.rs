//! Campus advisor CLI — the main entry point.
//!
//! Commands:
//! - `chat`   — Interactive chat or single-message mode
//! - `tools`  — Print the tool descriptors sent to the model
//! - `index`  — Build a handbook search index from text files
//! - `eval`   — Grade question/answer pairs with a judge model

use std::path::PathBuf;

use advisor_tools::Handbook;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "advisor",
    about = "Campus advisor — a tool-calling assistant for Duke University",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the advisor
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Print the registered tool descriptors as JSON
    Tools,

    /// Build a handbook index from plain-text files (pages split on form feeds)
    Index {
        /// Which handbook the files belong to (mem or pratt)
        #[arg(long)]
        handbook: Handbook,

        /// Where to write the index JSON
        #[arg(short, long)]
        out: PathBuf,

        /// Handbook text files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Evaluate question/answer pairs with a judge model
    Eval {
        /// JSON file with `[{"question": ..., "answer": ...}]`
        input: PathBuf,

        /// Where to write the JSON report
        output: PathBuf,

        /// Judge model (defaults to `eval.model` from config)
        #[arg(long)]
        model: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Chat { message } => commands::chat::run(message).await?,
        Commands::Tools => commands::tools::run().await?,
        Commands::Index {
            handbook,
            out,
            files,
        } => commands::index::run(handbook, out, files).await?,
        Commands::Eval {
            input,
            output,
            model,
        } => commands::eval::run(input, output, model).await?,
    }

    Ok(())
}
