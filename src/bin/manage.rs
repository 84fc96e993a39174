use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use rust_image_backend::config::AppConfig;
use rust_image_backend::entities::{prelude::*, users};
use rust_image_backend::infrastructure::{database, seed};
use rust_image_backend::services::tier_service::TierService;
use rust_image_backend::utils::auth::create_jwt_with_ttl;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Administrative edits: thumbnail sizes, tiers, users and development tokens.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a thumbnail height in pixels
    CreateThumbnail { size: i32 },

    /// Create a tier, or replace the sizes and capability of an existing one
    SetTier {
        name: String,
        /// Thumbnail heights, e.g. --sizes 200,400
        #[arg(long, value_delimiter = ',')]
        sizes: Vec<i32>,
        #[arg(long)]
        can_create_link: bool,
    },

    /// List tiers with their thumbnail sizes
    ListTiers,

    /// Create a user, optionally on a tier
    CreateUser {
        username: String,
        email: String,
        #[arg(long)]
        tier: Option<String>,
    },

    /// Move a user to another tier; omit --tier to remove it
    AssignTier {
        username: String,
        #[arg(long)]
        tier: Option<String>,
    },

    /// Print a bearer token for a user
    IssueToken {
        username: String,
        /// Lifetime in hours
        #[arg(long, default_value_t = 24)]
        hours: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "manage=info,rust_image_backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🔌 Connecting to database...");
    let db = database::setup_database().await?;
    seed::seed_default_tiers(&db).await?;

    match cli.command {
        Command::CreateThumbnail { size } => {
            let thumbnail = TierService::create_thumbnail(&db, size).await?;
            info!("✅ Thumbnail {} (id {})", thumbnail.value, thumbnail.id);
        }
        Command::SetTier {
            name,
            sizes,
            can_create_link,
        } => {
            let profile = TierService::create_tier(&db, &name, &sizes, can_create_link).await?;
            info!(
                "✅ Tier {} (id {}): sizes {:?}, can_create_link={}",
                profile.name(),
                profile.tier.id,
                profile.thumbnail_sizes,
                profile.can_create_link()
            );
        }
        Command::ListTiers => {
            for profile in TierService::list_tiers(&db).await? {
                println!(
                    "{}\t{:?}\tcan_create_link={}",
                    profile.name(),
                    profile.thumbnail_sizes,
                    profile.can_create_link()
                );
            }
        }
        Command::CreateUser {
            username,
            email,
            tier,
        } => {
            let user = TierService::create_user(&db, &username, &email, tier.as_deref()).await?;
            info!("✅ User {} created with id {}", user.username, user.id);
        }
        Command::AssignTier { username, tier } => {
            let user = TierService::assign_tier(&db, &username, tier.as_deref()).await?;
            info!("✅ User {} now on tier id {:?}", user.username, user.tier_id);
        }
        Command::IssueToken { username, hours } => {
            let user = Users::find()
                .filter(users::Column::Username.eq(&username))
                .one(&db)
                .await?
                .ok_or_else(|| anyhow::anyhow!("User {} does not exist", username))?;

            let config = AppConfig::from_env();
            let token = create_jwt_with_ttl(
                &user.id,
                &config.jwt_secret,
                chrono::Duration::hours(hours),
            )?;
            println!("{}", token);
        }
    }

    Ok(())
}
