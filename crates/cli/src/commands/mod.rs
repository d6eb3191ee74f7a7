//! CLI subcommands.

pub mod migrate;
pub mod seed;
pub mod seller;

use secrecy::SecretString;
use sqlx::PgPool;

/// Connect to the database named by `GREENCART_DATABASE_URL` (or `DATABASE_URL`).
///
/// # Errors
///
/// Returns an error if neither variable is set or the connection fails.
pub async fn connect() -> Result<PgPool, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("GREENCART_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "GREENCART_DATABASE_URL not set")?;

    tracing::info!("Connecting to database...");
    Ok(greencart_server::db::create_pool(&database_url).await?)
}
