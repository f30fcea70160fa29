//! Tech blog CLI - database migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Run blog and session-store migrations
//! techblog-cli migrate
//!
//! # Manage categories
//! techblog-cli category add "Web Dev"
//! techblog-cli category list
//!
//! # Does this GitHub account resolve to ADMIN_GITHUB_USERNAME?
//! techblog-cli admin check 583231
//!
//! # Same, starting from a local user ID
//! techblog-cli admin user 1
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "techblog-cli")]
#[command(author, version, about = "Tech blog operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations (blog tables and sessions)
    Migrate,
    /// Manage categories
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },
    /// Inspect the admin check
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum CategoryAction {
    /// Add a category; the slug is derived from the name
    Add {
        /// Display name
        name: String,
    },
    /// List categories with their post counts
    List,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Resolve a GitHub account ID and compare it to the admin login
    Check {
        /// GitHub's numeric account ID
        account_id: String,
    },
    /// Check a local user through its linked GitHub account
    User {
        /// Local user ID
        user_id: i32,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "techblog_cli=info,techblog_web=info".into()),
        )
        .init();

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
        Commands::Category { action } => match action {
            CategoryAction::Add { name } => commands::category::add(&name).await?,
            CategoryAction::List => commands::category::list().await?,
        },
        Commands::Admin { action } => match action {
            AdminAction::Check { account_id } => commands::admin::check(&account_id).await?,
            AdminAction::User { user_id } => commands::admin::check_user(user_id).await?,
        },
    }
    Ok(())
}
