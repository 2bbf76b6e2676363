//! Stockroom CLI - database migrations and account management.
//!
//! # Usage
//!
//! ```bash
//! # Run back-office migrations
//! sr-cli migrate
//!
//! # Insert or refresh the built-in plans
//! sr-cli plans seed
//!
//! # List plans with their product limits
//! sr-cli plans list
//!
//! # Create a user without going through the sign-up page
//! sr-cli user create -e owner@example.com -n "Shop Owner" -p 'correct horse' --plan pro
//! ```
//!
//! # Environment Variables
//!
//! - `BACKOFFICE_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sr-cli")]
#[command(author, version, about = "Stockroom CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage subscription plans
    Plans {
        #[command(subcommand)]
        action: PlanAction,
    },
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum PlanAction {
    /// Insert or update the built-in plans
    Seed,
    /// Show every plan
    List,
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Password (at least 8 characters)
        #[arg(short, long)]
        password: String,

        /// Plan code (`free`, `pro`, `business`)
        #[arg(long, default_value = "free")]
        plan: String,
    },
}

#[tokio::main]
async fn main() {
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
        Commands::Plans { action } => match action {
            PlanAction::Seed => commands::plans::seed().await?,
            PlanAction::List => commands::plans::list().await?,
        },
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                name,
                password,
                plan,
            } => {
                commands::user::create(&email, &name, &password, &plan).await?;
            }
        },
    }
    Ok(())
}
