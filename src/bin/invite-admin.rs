use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use invite_analytics::analytics::{sweep_once, AnalyticsService, DateRange};
use invite_analytics::config::Config;
use invite_analytics::models::Profile;
use invite_analytics::storage::{self, StorageError};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "invite-admin")]
#[command(about = "Invitation analytics admin CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register or update a profile so its link can be tracked
    PutProfile {
        /// Profile ID
        id: String,
        /// Public link slug
        slug: String,
        /// Mark the link as deactivated
        #[arg(long)]
        inactive: bool,
        /// Link expiry as RFC 3339 (e.g. 2025-02-01T00:00:00Z)
        #[arg(long)]
        expires_at: Option<String>,
    },
    /// Print the full analytics record for a profile as JSON
    Show {
        /// Profile ID
        profile_id: String,
    },
    /// Print the analytics summary for a profile as JSON
    Summary {
        /// Profile ID
        profile_id: String,
        /// One of 7d, 30d, all
        #[arg(long, default_value = "all")]
        range: DateRange,
    },
    /// Delete expired view sessions now
    SweepSessions,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let storage = storage::open(&config.database).await?;
    let analytics = AnalyticsService::new(Arc::clone(&storage));

    match cli.command {
        Commands::PutProfile {
            id,
            slug,
            inactive,
            expires_at,
        } => {
            let expires_at = expires_at
                .map(|raw| {
                    DateTime::parse_from_rfc3339(&raw)
                        .map(|t| t.with_timezone(&Utc))
                        .with_context(|| format!("invalid --expires-at '{raw}'"))
                })
                .transpose()?;

            let profile = Profile {
                id,
                slug,
                is_active: !inactive,
                expires_at,
            };

            match storage.put_profile(&profile).await {
                Ok(()) => println!("✓ Saved profile '{}' with slug '{}'", profile.id, profile.slug),
                Err(StorageError::Conflict) => {
                    println!("⚠ Slug '{}' already belongs to another profile", profile.slug)
                }
                Err(StorageError::Other(e)) => return Err(e),
            }
        }
        Commands::Show { profile_id } => {
            let record = analytics.get_analytics(&profile_id).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Summary { profile_id, range } => {
            let summary = analytics.get_summary(&profile_id, range, Utc::now()).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::SweepSessions => {
            let purged = sweep_once(&storage).await;
            println!("✓ Purged {} expired sessions", purged);
        }
    }

    Ok(())
}
