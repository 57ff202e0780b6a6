//! SQLite persistence layer for the friend-alerting backend.
//!
//! This crate provides async database operations for users, relationships,
//! pings, and check-in sessions using SQLx with SQLite. Store functions take
//! either a pool or an open transaction, so callers can compose several of
//! them into one atomic unit.
//!
//! # Example
//!
//! ```no_run
//! use database::{relationship, user, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:safety.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Register the two parties
//!     user::upsert_user(db.pool(), "alice", "alice").await?;
//!     user::upsert_user(db.pool(), "bob", "bob").await?;
//!
//!     // Look up their relationship, if any
//!     let existing = relationship::find_by_pair(db.pool(), "alice", "bob").await?;
//!     assert!(existing.is_none());
//!
//!     Ok(())
//! }
//! ```

pub mod checkin;
pub mod error;
pub mod models;
pub mod ping;
pub mod relationship;
pub mod user;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use models::{
    CheckInSession, CheckInStatus, NewPing, Ping, PingStatus, Relationship, RelationshipStatus,
    User,
};
pub use validation::ValidationError;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::str::FromStr;
use std::time::Duration;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    pub const DEFAULT_POOL_SIZE: u32 = 20;

    /// How long a connection waits for the write lock before giving up.
    const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// let db = database::Database::connect("sqlite:data/safety.db?mode=rwc").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Self::BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Open a migrated in-memory database.
    ///
    /// Every SQLite connection gets its own private in-memory database, so the
    /// pool is pinned to a single connection that never idles out.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Begin a transaction that takes the write lock up front.
    ///
    /// Use this for any transaction that reads before it writes. A deferred
    /// `BEGIN` in that shape fails with `SQLITE_BUSY` when another connection
    /// upgrades first, while `BEGIN IMMEDIATE` queues on the busy timeout.
    pub async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
