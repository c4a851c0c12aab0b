use clap::{Parser, Subcommand};

use crate::commands;
use crate::constants::{DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL_SECONDS, DEFAULT_PORT};

#[derive(Parser)]
#[command(name = "marketproxy")]
#[command(about = "Market data proxy with TTL caching", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Cache TTL in seconds
        #[arg(long, default_value_t = DEFAULT_CACHE_TTL_SECONDS)]
        cache_ttl: u64,

        /// Maximum number of cached responses
        #[arg(long, default_value_t = DEFAULT_CACHE_CAPACITY)]
        cache_capacity: usize,
    },
    /// Refresh the live snapshot once and exit
    Snapshot,
}

pub async fn run() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            cache_ttl,
            cache_capacity,
        } => {
            commands::serve::run(port, cache_ttl, cache_capacity).await;
        }
        Commands::Snapshot => {
            commands::snapshot::run().await;
        }
    }
}
