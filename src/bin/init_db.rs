//! Wipes the database named by `DATABASE_URL` and loads the demo campus:
//! `admin`, `coord`, `student1`..`student53` (password `123`), the Tech
//! Innovators Club with one event, one update and one pending applicant.

use anyhow::{Context, Result};
use campus_clubs::{config::Config, db, services::seed_service};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "campus_clubs=info,sqlx=warn".into()))
        .with(fmt::layer())
        .init();

    let config = Config::load().context("Failed to read configuration")?;
    let db_pool = db::create_db_pool(&config.database_url)
        .await
        .context("Couldn't open the database")?;

    let seeded = seed_service::seed(&db_pool, config.bcrypt_cost)
        .await
        .context("Seeding failed")?;

    println!(
        "Database initialized: {} user accounts, club {} with event {}.",
        seeded.student_ids.len() + 2,
        seeded.club_id,
        seeded.event_id
    );
    Ok(())
}
