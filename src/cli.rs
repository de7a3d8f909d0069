use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "synthgate")]
#[command(author, version, about = "Rate limiting and API-key admission gate for the SynthSEO API")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the gate server
    Start {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Generate a new API key, replacing the current one
    GenerateApiKey,

    /// Show the current API key
    ShowApiKey {
        /// Print the full key instead of a masked one
        #[arg(long)]
        reveal: bool,
    },

    /// Show or change the stored requests-per-minute ceiling
    RateLimit {
        /// New ceiling; omit to show the current value
        value: Option<u32>,

        /// Remove the stored value and fall back to the config
        #[arg(long, conflicts_with = "value")]
        reset: bool,
    },

    /// Delete expired rate windows and audit entries now
    Cleanup,

    /// Show recorded rate windows for a client (e.g. ip_203.0.113.5)
    Usage {
        client_id: String,
    },

    /// Show recent admitted requests from the audit log
    Audit {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses --config if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
