//! Storefront state CLI - drive the cart and dashboard navigation.
//!
//! Every invocation rehydrates state from the data directory, applies one
//! command, and persists the result, just like a page reload would.
//!
//! # Usage
//!
//! ```bash
//! # Add two units of a product
//! np-cli cart add --id p1 --name "Pineapple" --price 10 --quantity 2
//!
//! # Set a line's quantity exactly (0 or less removes it)
//! np-cli cart update p1 1
//!
//! # Show the cart with totals
//! np-cli cart show
//!
//! # Open a dashboard section on a specific entity
//! np-cli dashboard open orders --entity o-1042
//! ```
//!
//! # Commands
//!
//! - `cart add|remove|update|clear|show` - Cart store operations
//! - `dashboard show|open|select|user` - Dashboard navigation state

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use storefront_state::{AppError, AppState, StateConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "np-cli")]
#[command(author, version, about = "Storefront cart and dashboard state tools")]
struct Cli {
    /// Override the data directory (default: `STOREFRONT_DATA_DIR` or .storefront)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage dashboard navigation
    Dashboard {
        #[command(subcommand)]
        action: DashboardAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Add an item, merging with an existing line of the same ID
    Add {
        /// Product ID
        #[arg(long)]
        id: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Unit price (e.g. 19.99)
        #[arg(short, long)]
        price: String,

        /// Quantity to add; fractions are floored
        #[arg(short, long, default_value = "1")]
        quantity: String,

        /// Category
        #[arg(long)]
        category: Option<String>,

        /// Subcategory
        #[arg(long)]
        subcategory: Option<String>,
    },
    /// Remove a line
    Remove {
        /// Product ID
        id: String,
    },
    /// Set a line's quantity exactly; zero or negative removes it
    Update {
        /// Product ID
        id: String,

        /// New quantity
        #[arg(allow_hyphen_values = true)]
        quantity: String,
    },
    /// Remove every line
    Clear,
    /// Show lines and totals
    Show,
}

#[derive(Subcommand)]
enum DashboardAction {
    /// Show the current section and selections
    Show,
    /// Switch section, optionally selecting an entity in it
    Open {
        /// Section (overview, products, orders, clients, inventory, settings)
        section: String,

        /// Entity to select in the section
        #[arg(short, long)]
        entity: Option<String>,
    },
    /// Select an entity in the current section, or clear the selection
    Select {
        /// Entity ID
        id: Option<String>,
    },
    /// Select a user, or clear the selection when no ID is given
    User {
        /// User ID
        id: Option<String>,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StateConfig) -> Option<sentry::ClientInitGuard> {
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

    tracing::info!("Sentry initialized");
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
async fn main() {
    let cli = Cli::parse();

    // Load configuration from environment (needed for Sentry init)
    let mut config = StateConfig::from_env().expect("Failed to load configuration");
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "np_cli=info,storefront_state=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli.command, config).await {
        e.report();
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: StateConfig) -> Result<(), AppError> {
    let state = AppState::new(config)?;

    match command {
        Commands::Cart { action } => match action {
            CartAction::Add {
                id,
                name,
                price,
                quantity,
                category,
                subcategory,
            } => {
                let input = commands::cart::AddInput {
                    id,
                    name,
                    price,
                    quantity,
                    category,
                    subcategory,
                };
                commands::cart::add(&state, input).await?;
            }
            CartAction::Remove { id } => commands::cart::remove(&state, &id),
            CartAction::Update { id, quantity } => {
                commands::cart::update(&state, &id, &quantity)?;
            }
            CartAction::Clear => commands::cart::clear(&state),
            CartAction::Show => commands::cart::show(&state),
        },
        Commands::Dashboard { action } => match action {
            DashboardAction::Show => commands::dashboard::show(&state),
            DashboardAction::Open { section, entity } => {
                commands::dashboard::open(&state, &section, entity)?;
            }
            DashboardAction::Select { id } => commands::dashboard::select_entity(&state, id),
            DashboardAction::User { id } => commands::dashboard::select_user(&state, id),
        },
    }
    Ok(())
}
