use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

pub use migrations::run_migrations;
pub use seeder::seed_development_data;

mod migrations;
mod seeder;

pub type Database = sqlx::Pool<sqlx::Sqlite>;
pub(crate) type Transaction = sqlx::Transaction<'static, sqlx::Sqlite>;

/// Opens a pool against the given SQLite url, creating the database file if it is missing.
/// Writers wait up to five seconds for the write lock.
pub async fn connect(url: &str) -> Result<Database, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));
    SqlitePoolOptions::new().connect_with(options).await
}

/// Opens a private in-memory database. The pool is pinned to a single connection that is never
/// recycled, since every new SQLite memory connection starts out empty.
pub async fn connect_in_memory() -> Result<Database, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CountRow {
    pub count: i64,
}
