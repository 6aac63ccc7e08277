//! LevelUp CLI - a terminal storefront over the LevelUp backend.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! levelup products list
//! levelup products show JM001
//!
//! # Fill and pay for a cart
//! levelup cart add JM001
//! levelup cart remove JM001 --all
//! levelup cart checkout --redeem
//!
//! # Account
//! levelup auth register -e ana@duoc.cl -p secret --first-name Ana --last-name Pérez
//! levelup auth login -e ana@duoc.cl -p secret
//! levelup auth whoami
//! levelup auth logout
//!
//! # User administration (admin token required)
//! levelup users list
//! levelup users update ana@duoc.cl --points 1200
//! ```
//!
//! # Environment Variables
//!
//! - `LEVELUP_API_BASE_URL` - Backend root URL
//! - `LEVELUP_STORAGE_PATH` - File holding the cart and session between runs
//! - `LEVELUP_HTTP_TIMEOUT_SECS` - Per-request timeout
//! - `RUST_LOG` - Log filter (logs go to stderr)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use levelup_client::ClientConfig;

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(name = "levelup")]
#[command(author, version, about = "LevelUp storefront CLI")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the product catalog
    Products {
        #[command(subcommand)]
        action: commands::products::ProductsAction,
    },
    /// Manage the shopping cart
    Cart {
        #[command(subcommand)]
        action: commands::cart::CartAction,
    },
    /// Register, log in and out
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Administer user accounts
    Users {
        #[command(subcommand)]
        action: commands::users::UsersAction,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(json: bool) {
    // Logs go to stderr; stdout is reserved for command output.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn,levelup_client=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    let mut ctx = Context::open(&config)?;

    match cli.command {
        Commands::Products { action } => commands::products::run(&ctx, action).await?,
        Commands::Cart { action } => commands::cart::run(&mut ctx, action).await?,
        Commands::Auth { action } => commands::auth::run(&mut ctx, action).await?,
        Commands::Users { action } => commands::users::run(&mut ctx, action).await?,
    }
    Ok(())
}
