//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! greencart migrate
//! ```
//!
//! # Environment Variables
//!
//! - `GREENCART_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! App tables live in `crates/server/migrations/` and are embedded at build
//! time. The session table is created by the session store itself.

use tower_sessions_sqlx_store::PostgresStore;

use super::connect;

/// Run app migrations, then create the session store table.
///
/// # Errors
///
/// Returns an error if the connection or any migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Creating session store table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
