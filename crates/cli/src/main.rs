//! splice CLI: the main entry point.
//!
//! Commands:
//! - `merge`   Merge a continuation fragment onto accumulated text
//! - `check`   Judge whether an artifact looks complete
//! - `replay`  Run the continuation loop against a recorded transcript
//! - `config`  Print the effective or default configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "splice",
    about = "splice: reassemble truncated generation output into complete artifacts",
    version,
    author
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
    /// Merge FRAGMENT onto ACCUMULATED and print the result
    Merge {
        /// File holding the text accumulated so far
        accumulated: PathBuf,

        /// File holding the next fragment
        fragment: PathBuf,

        /// Report which overlap strategy matched (on stderr)
        #[arg(long)]
        explain: bool,
    },

    /// Judge whether FILE looks like a complete rendition of the original
    Check {
        /// The produced artifact
        file: PathBuf,

        /// The original content it was produced from
        #[arg(long)]
        original: PathBuf,

        /// Content class (brace-delimited, indentation-delimited, tag-delimited, freeform).
        /// Defaults to a guess from FILE's extension.
        #[arg(long)]
        class: Option<String>,

        /// Print the assessment as JSON
        #[arg(long)]
        json: bool,
    },

    /// Reassemble an artifact from a recorded backend transcript
    Replay {
        /// Transcript JSON file
        transcript: PathBuf,

        /// Original content (transform mode)
        #[arg(long)]
        original: Option<PathBuf>,

        /// Content class; defaults to a guess from --original's extension
        #[arg(long)]
        class: Option<String>,

        /// transform or generate
        #[arg(long, default_value = "transform")]
        mode: String,

        /// Prompt for the first round
        #[arg(long, default_value = "Reproduce the recorded output.")]
        prompt: String,

        /// Print every prompt the backend received (on stderr)
        #[arg(long)]
        show_prompts: bool,
    },

    /// Print the configuration as TOML
    Config {
        /// Print built-in defaults instead of the loaded configuration
        #[arg(long)]
        defaults: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries artifacts only
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
        Commands::Merge {
            accumulated,
            fragment,
            explain,
        } => commands::merge::run(&accumulated, &fragment, explain)?,
        Commands::Check {
            file,
            original,
            class,
            json,
        } => commands::check::run(&file, &original, class.as_deref(), json)?,
        Commands::Replay {
            transcript,
            original,
            class,
            mode,
            prompt,
            show_prompts,
        } => {
            commands::replay::run(commands::replay::ReplayArgs {
                transcript,
                original,
                class,
                mode,
                prompt,
                show_prompts,
            })
            .await?
        }
        Commands::Config { defaults } => commands::config_cmd::show(defaults)?,
    }

    Ok(())
}
