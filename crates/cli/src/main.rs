//! Sushi Delivery CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! sushi-cli migrate
//!
//! # Seed roles, demo users and the catalog
//! sushi-cli seed
//!
//! # Create a user with one or more roles
//! sushi-cli user create -e ops@sushi.local -n "Ops" -p secret123 -r admin,client
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Upsert demo data
//! - `user create` - Create accounts

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use sushi_delivery_core::RoleCode;

mod commands;

#[derive(Parser)]
#[command(name = "sushi-cli")]
#[command(author, version, about = "Sushi Delivery CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed roles, demo users, categories and products
    Seed,
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Full name
        #[arg(short, long)]
        name: String,

        /// Password (at least 6 characters)
        #[arg(short, long)]
        password: String,

        /// Phone number
        #[arg(long)]
        phone: Option<String>,

        /// Comma-separated roles (`client`, `admin`, `courier`)
        #[arg(short, long, value_delimiter = ',', default_value = "client")]
        role: Vec<RoleCode>,
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
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Seed => commands::seed::demo_data().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                name,
                password,
                phone,
                role,
            } => {
                commands::user::create(&email, &name, password, phone.as_deref(), &role).await?;
            }
        },
    }
    Ok(())
}
