use std::time::Duration;

use sea_orm::{
    ConnectOptions, Database,
    sqlx::sqlite::{SqliteJournalMode, SqliteSynchronous},
};
use sea_orm_migration::MigratorTrait;

pub mod entities;
pub mod models;
pub mod retry;
pub mod types;

pub use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, RuntimeErr, SqlErr, TransactionSession, TransactionTrait};

pub type DbPool = DatabaseConnection;

const SQLITE_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Store handle built once at startup and handed to everything that needs it.
#[derive(Clone)]
pub struct DBService {
    pub pool: DbPool,
}

impl DBService {
    /// Connects, applies pending migrations and returns the handle.
    pub async fn new(database_url: &str, max_connections: u32) -> Result<DBService, DbErr> {
        let is_sqlite = database_url.starts_with("sqlite:");
        let is_memory = database_url.contains(":memory:");

        let mut options = ConnectOptions::new(database_url.to_string());
        options
            // Every connection to an in-memory SQLite url opens its own database.
            .max_connections(if is_memory { 1 } else { max_connections.max(1) })
            .sqlx_logging(false);
        if is_sqlite && !is_memory {
            options.map_sqlx_sqlite_opts(|opts| {
                opts.create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal)
                    .synchronous(SqliteSynchronous::Normal)
                    .busy_timeout(SQLITE_BUSY_TIMEOUT)
            });
        }

        let pool = Database::connect(options).await?;
        db_migration::Migrator::up(&pool, None).await?;
        tracing::debug!(max_connections, is_sqlite, "Database ready");
        Ok(DBService { pool })
    }
}
