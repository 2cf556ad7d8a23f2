//! Vouch CLI, the main entry point.
//!
//! Commands:
//! - `onboard`   Write a default config and an empty content tree
//! - `gateway`   Start the HTTP gateway
//! - `status`    Show configuration and governance limits
//! - `doctor`    Diagnose configuration, content and upstream reachability
//! - `evidence`  Rank portfolio evidence against a query (no model call)

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "vouch",
    about = "Vouch: evidence-grounded, budget-gated portfolio assistant",
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
    /// Initialize configuration and the content directory
    Onboard,

    /// Start the HTTP gateway server
    Gateway {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show configuration and governance limits
    Status,

    /// Diagnose system health
    Doctor,

    /// Rank portfolio evidence against a query
    Evidence {
        /// Free-text query, e.g. "dbt pipeline"
        query: String,

        /// Maximum number of items to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
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
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Gateway { port } => commands::gateway::run(port).await?,
        Commands::Status => commands::status::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
        Commands::Evidence { query, limit } => commands::evidence::run(query, limit).await?,
    }

    Ok(())
}
