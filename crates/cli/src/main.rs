//! GreenCart CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations (app tables and the session store)
//! greencart migrate
//!
//! # Grant or revoke seller access for an existing account
//! greencart seller promote asha@example.com
//! greencart seller demote asha@example.com
//!
//! # Create a seller account directly
//! GREENCART_SELLER_PASSWORD=... greencart seller create -e sam@example.com -n "Sam"
//!
//! # Load the sample catalog into an empty products table
//! greencart seed products
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "greencart")]
#[command(author, version, about = "GreenCart CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage seller accounts
    Seller {
        #[command(subcommand)]
        action: SellerAction,
    },
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum SellerAction {
    /// Give an existing account seller access
    Promote {
        /// Account email address
        email: String,
    },
    /// Remove seller access from an account
    Demote {
        /// Account email address
        email: String,
    },
    /// Create a new seller account
    Create {
        /// Seller email address
        #[arg(short, long)]
        email: String,

        /// Seller display name
        #[arg(short, long)]
        name: String,

        /// Password (at least 8 characters)
        #[arg(long, env = "GREENCART_SELLER_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert the sample catalog if no products exist
    Products {
        /// Insert even if products already exist
        #[arg(long)]
        force: bool,
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
        Commands::Seller { action } => match action {
            SellerAction::Promote { email } => commands::seller::set_flag(&email, true).await?,
            SellerAction::Demote { email } => commands::seller::set_flag(&email, false).await?,
            SellerAction::Create {
                email,
                name,
                password,
            } => commands::seller::create(&email, &name, &password).await?,
        },
        Commands::Seed { target } => match target {
            SeedTarget::Products { force } => commands::seed::products(force).await?,
        },
    }
    Ok(())
}
