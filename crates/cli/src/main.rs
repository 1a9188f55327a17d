//! Bergamot CLI - Checkout inspection tools.
//!
//! # Usage
//!
//! ```bash
//! # Derive and print the checkout state for an order
//! bgm-cli order status <order-id> --token <access-token>
//!
//! # Mint a sales channel token from COMMERCE_CLIENT_ID / COMMERCE_CLIENT_SECRET
//! bgm-cli order status <order-id>
//! ```
//!
//! # Commands
//!
//! - `order status` - Derive the checkout state for an order
//!
//! # Environment Variables
//!
//! - `COMMERCE_ENDPOINT` - Commerce platform base URL (required)
//! - `COMMERCE_CLIENT_ID` - Sales channel client id (when `--token` absent)
//! - `COMMERCE_CLIENT_SECRET` - Optional client secret for token minting
//! - `SENTRY_DSN` - Optional Sentry DSN for error reporting

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use bergamot_checkout::config::CheckoutConfig;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "bgm-cli")]
#[command(author, version, about = "Bergamot checkout CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect orders
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Derive and print the checkout state for an order
    Status {
        /// The order ID to derive state for
        order_id: String,

        /// Sales channel access token; minted from env credentials when
        /// omitted
        #[arg(short, long)]
        token: Option<String>,

        /// Print compact JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CheckoutConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::debug!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() {
    // CheckoutConfig::from_env loads .env itself via dotenvy.
    let config = match CheckoutConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the tracing subscriber.
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bergamot_checkout=info,bgm_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli, &config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &CheckoutConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Order { action } => match action {
            OrderAction::Status {
                order_id,
                token,
                compact,
            } => {
                commands::order::status(config, &order_id, token.as_deref(), compact).await?;
            }
        },
    }
    Ok(())
}
