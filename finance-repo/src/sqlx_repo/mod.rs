mod transaction_repo;
mod user_repo;

use crate::transaction_repo::TransactionRepo;
use crate::user_repo::UserRepo;
use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub struct SQLxRepo {
    pool: Pool<Sqlite>,
}

impl SQLxRepo {
    pub fn new(pool: Pool<Sqlite>) -> SQLxRepo {
        SQLxRepo { pool }
    }
}

/// Connects to the SQLite database at `database_url`, creating the file if needed, and brings the
/// schema up to date.
pub async fn create_repos(
    database_url: &str,
    max_pool_size: u32,
) -> Result<(Arc<dyn UserRepo>, Arc<dyn TransactionRepo>), anyhow::Error> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid database url {}", database_url))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(10));
    let pool = SqlitePoolOptions::new()
        .max_connections(max_pool_size)
        .connect_with(options)
        .await
        .context("Unable to connect to database")?;

    info!("Running migrations");
    sqlx::migrate!()
        .run(&pool)
        .await
        .context("Unable to run migrations")?;

    let repo = Arc::new(SQLxRepo::new(pool));
    let user_repo: Arc<dyn UserRepo> = repo.clone();
    let transaction_repo: Arc<dyn TransactionRepo> = repo;
    Ok((user_repo, transaction_repo))
}
