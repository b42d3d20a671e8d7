//! Merchant assistant CLI - migrations, seeding and knowledge-base tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! ma-cli migrate
//!
//! # Upsert SKUs from a YAML file
//! ma-cli seed skus --file seeds/skus.yaml
//!
//! # Ingest a document into the knowledge base
//! ma-cli ingest docs/safety-stock.pdf
//!
//! # Ask a one-shot question
//! ma-cli ask "Which SKUs need restocking?"
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ma-cli")]
#[command(author, version, about = "Merchant assistant CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Ingest a PDF, TXT or MD file into the knowledge base
    Ingest {
        /// Path to the document
        path: PathBuf,
    },
    /// Ask the assistant one question and print the answer
    Ask {
        /// The question
        question: String,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert SKUs by SKU number
    Skus {
        /// YAML file with a list of SKUs
        #[arg(short, long, default_value = "seeds/skus.yaml")]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Skus { file } => commands::seed::skus(&file).await?,
        },
        Commands::Ingest { path } => commands::knowledge::ingest(&path).await?,
        Commands::Ask { question } => commands::knowledge::ask(&question).await?,
    }
    Ok(())
}
