//! PageStore port - the five page operations plus schema setup.

use async_trait::async_trait;
use r2d2_sqlite::rusqlite;

use crate::domain::Page;

/// Anything that can go wrong below the bus boundary.
///
/// Never sent across the bus as-is: handlers turn it into a `DbError` reply.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Every pooled connection would get its own private database.
    #[error("database {0:?} is not a file; in-memory and temporary databases cannot be pooled")]
    InMemory(String),
}

/// Storage for wiki pages.
///
/// Every method uses one pooled connection for its whole duration and gives
/// it back on every exit path.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Create the pages table if it is missing. Safe to call repeatedly.
    async fn ensure_schema(&self) -> Result<(), StoreError>;

    /// All page names, sorted by byte order whatever order the rows came in.
    async fn list_page_names(&self) -> Result<Vec<String>, StoreError>;

    async fn get_page(&self, name: &str) -> Result<Option<Page>, StoreError>;

    /// Fails when `name` is taken; the table is left untouched.
    async fn create_page(&self, name: &str, content: &str) -> Result<(), StoreError>;

    /// Unknown `id` is a successful no-op.
    async fn save_page(&self, id: i64, content: &str) -> Result<(), StoreError>;

    /// Unknown `id` is a successful no-op.
    async fn delete_page(&self, id: i64) -> Result<(), StoreError>;
}
