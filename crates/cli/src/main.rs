//! Sweet Shop CLI - browse, buy, and manage the catalog from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (password may also come from SWEET_SHOP_PASSWORD)
//! sweet-shop login -u admin -p secret
//!
//! # Browse and buy
//! sweet-shop list
//! sweet-shop search --category Chocolate --max-price 5
//! sweet-shop purchase 3 -q 2
//!
//! # Manage inventory (admin accounts)
//! sweet-shop add -n "Sour Worms" -c Gummies -p 1.99 -q 40
//! sweet-shop restock 3 -q 25
//! ```
//!
//! # Environment Variables
//!
//! - `SWEET_SHOP_API_URL` - Base URL of the service (default `http://localhost:8080/api`)
//! - `SWEET_SHOP_TIMEOUT_SECS` - Optional request timeout
//! - `SWEET_SHOP_SESSION_FILE` - Where the signed-in session is kept
//! - `RUST_LOG` - Log filter (default `sweet_shop_client=info,sweet_shop_cli=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::Write;
use std::num::NonZeroU32;

use clap::{Parser, Subcommand};
use sweet_shop_client::ClientConfig;
use sweet_shop_core::{Price, SweetId};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

mod commands;
mod error;
mod render;
mod shop;

use commands::admin::SweetEdit;
use commands::parse_price;
use error::CliError;
use shop::HttpShop;

#[derive(Parser)]
#[command(name = "sweet-shop")]
#[command(author, version, about = "Sweet Shop storefront and inventory tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "SWEET_SHOP_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign in
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "SWEET_SHOP_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show who is signed in
    Whoami,
    /// List the whole catalog
    List,
    /// Search the catalog
    Search {
        /// Name fragment
        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(long, value_parser = parse_price)]
        min_price: Option<Price>,

        #[arg(long, value_parser = parse_price)]
        max_price: Option<Price>,
    },
    /// Show one sweet
    Show { id: SweetId },
    /// Buy a sweet (customer accounts)
    Purchase {
        id: SweetId,

        #[arg(short, long, default_value = "1")]
        quantity: NonZeroU32,
    },
    /// Add a sweet to the catalog (admin)
    Add {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        category: String,

        #[arg(short, long, value_parser = parse_price)]
        price: Price,

        #[arg(short, long, default_value_t = 0)]
        quantity: u32,

        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Change a sweet's fields; unspecified fields keep their value (admin)
    Edit {
        id: SweetId,

        #[command(flatten)]
        changes: SweetEdit,
    },
    /// Remove a sweet from the catalog (admin)
    Delete { id: SweetId },
    /// Add stock to a sweet (admin)
    Restock {
        id: SweetId,

        #[arg(short, long)]
        quantity: NonZeroU32,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sweet_shop_client=info,sweet_shop_cli=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = ClientConfig::from_env()?;
    let shop = HttpShop::connect(&config)?;
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Register {
            username,
            email,
            password,
        } => commands::auth::register(&shop, &mut out, username, email, password).await?,
        Commands::Login { username, password } => {
            commands::auth::login(&shop, &mut out, username, password).await?;
        }
        Commands::Logout => commands::auth::logout(&shop, &mut out)?,
        Commands::Whoami => commands::auth::whoami(&shop, &mut out)?,
        Commands::List => commands::catalog::list(&shop, &mut out).await?,
        Commands::Search {
            name,
            category,
            min_price,
            max_price,
        } => {
            let filter = commands::catalog::filter(name, category, min_price, max_price);
            commands::catalog::search(&shop, &mut out, &filter).await?;
        }
        Commands::Show { id } => commands::catalog::show(&shop, &mut out, id).await?,
        Commands::Purchase { id, quantity } => {
            commands::catalog::purchase(&shop, &mut out, id, quantity).await?;
        }
        Commands::Add {
            name,
            category,
            price,
            quantity,
            description,
        } => {
            let draft = sweet_shop_core::SweetDraft {
                name,
                category,
                price,
                quantity,
                description,
            };
            commands::admin::add(&shop, &mut out, &draft).await?;
        }
        Commands::Edit { id, changes } => {
            commands::admin::edit(&shop, &mut out, id, changes).await?;
        }
        Commands::Delete { id } => commands::admin::delete(&shop, &mut out, id).await?,
        Commands::Restock { id, quantity } => {
            commands::admin::restock(&shop, &mut out, id, quantity).await?;
        }
    }

    out.flush()?;
    Ok(())
}
