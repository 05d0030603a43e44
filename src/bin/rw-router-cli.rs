use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;

use rw_router::config::{load_config, ObservabilityConfig};
use rw_router::observability::init_logging;
use rw_router::sql::classify;

#[derive(Parser)]
#[command(name = "rw-router-cli")]
#[command(about = "Inspect read/write routing decisions and router configuration", long_about = None)]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how a SQL statement would be routed
    Classify {
        /// SQL text, comments and literals included
        sql: String,
    },
    /// Load and validate a TOML configuration file
    CheckConfig {
        path: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&ObservabilityConfig {
        log_level: cli.log_level,
        ..Default::default()
    });

    match cli.command {
        Commands::Classify { sql } => {
            let kind = classify(&sql)?;
            let report = json!({
                "kind": kind.as_str(),
                "read": kind.is_read(),
                "routes_to": if kind.is_read() { "read" } else { "write" },
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::CheckConfig { path } => {
            let config = load_config(&path)?;
            tracing::info!(path = %path.display(), "Configuration is valid");
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
