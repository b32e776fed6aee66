//! hsdp - command-line client for the HSDP platform
//!
//! Main entry point for the hsdp CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{auth, cdr, tdr, user};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// hsdp - command-line client for HSDP IAM, CDR and TDR
#[derive(Parser)]
#[command(name = "hsdp")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (default: ~/.config/hsdp/config.toml)
    #[arg(long, global = true, env = "HSDP_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// IAM user operations
    User(user::UserArgs),

    /// Clinical Data Repository (FHIR) operations
    Cdr(cdr::CdrArgs),

    /// Tenant Data Repository operations
    Tdr(tdr::TdrArgs),

    /// IAM token operations
    Auth(auth::AuthArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "hsdp=debug,hsdp_client=debug,hsdp_oauth=debug,info"
    } else {
        "hsdp=info,hsdp_client=info,hsdp_oauth=info,warn"
    };

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let config = hsdp_config::load_config(cli.config.as_deref())?;

    let ctx = commands::Context {
        config,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::User(args) => user::run(args, &ctx).await,
        Commands::Cdr(args) => cdr::run(args, &ctx).await,
        Commands::Tdr(args) => tdr::run(args, &ctx).await,
        Commands::Auth(args) => auth::run(args, &ctx).await,
    }
}
