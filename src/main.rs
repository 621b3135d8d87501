//! picoco CLI - photo vocabulary study tool.

use clap::{Parser, Subcommand};
use picoco::cli;
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "PICOCO_LOG";

/// Filter used when `PICOCO_LOG` is unset or invalid.
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Parser)]
#[command(name = "picoco")]
#[command(author, version, about = "Turn a photo into vocabulary cards", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the session API over HTTP.
    Serve {
        /// Listen address. Defaults to server.bind from config.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Analyze a photo and print vocabulary, phrases, and dialogue as JSON.
    Analyze {
        /// Image file path, data URL, or http(s) URL.
        image: String,

        /// Fail instead of printing empty content when analysis fails.
        #[arg(long)]
        strict: bool,
    },

    /// Upload a photo to the session API and print the session ID.
    Upload {
        /// Image file path, data URL, or http(s) URL.
        image: String,
    },

    /// Resolve the current image through the fallback chain.
    Resolve {
        /// Session ID to look up first.
        #[arg(short, long)]
        session: Option<String>,

        /// Host message to apply if nothing resolves ("-" reads stdin).
        #[arg(long)]
        host_message: Option<String>,
    },

    /// Star or unstar a card.
    Star {
        /// Category (voca, phrase, or dialogue).
        category: String,

        /// Key parts: word meaning | id phrase translation | id message side.
        #[arg(required = true)]
        parts: Vec<String>,
    },

    /// List starred cards of a category as JSON.
    Starred {
        /// Category (voca, phrase, or dialogue).
        category: String,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Commands::Serve { bind } => cli::serve::run(bind.as_deref()),
        Commands::Analyze { image, strict } => cli::analyze::run(&image, strict),
        Commands::Upload { image } => cli::upload::run(&image),
        Commands::Resolve {
            session,
            host_message,
        } => cli::resolve::run(session.as_deref(), host_message.as_deref()),
        Commands::Star { category, parts } => cli::star::run(&category, &parts),
        Commands::Starred { category } => cli::starred::run(&category),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("picoco: error: {e}");
            ExitCode::FAILURE
        }
    }
}
