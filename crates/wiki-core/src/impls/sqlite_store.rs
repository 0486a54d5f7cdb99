//! SqlitePageStore - `PageStore` over an r2d2 pool of SQLite connections.
//!
//! # 学習ポイント
//! - rusqlite は blocking API なので `spawn_blocking` の中で実行
//! - pooled connection は closure の終わりで drop され pool に戻る
//!   (成功・SQL エラー・panic のどの経路でも)

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use r2d2_sqlite::rusqlite::{self, OptionalExtension, params};
use tracing::{debug, info};

use super::sql_queries::{Query, QueryTable};
use crate::domain::Page;
use crate::ports::{PageStore, StoreError};

/// Per-connection busy timeout, so concurrent writers wait instead of failing.
const BUSY_TIMEOUT_SECS: u64 = 5;
/// How long a caller may wait for a free pooled connection.
const CONNECTION_TIMEOUT_SECS: u64 = 10;
/// Connections opened eagerly when the pool is built.
const MIN_IDLE: u32 = 2;

pub struct SqlitePageStore {
    pool: Pool<SqliteConnectionManager>,
    queries: Arc<QueryTable>,
}

impl SqlitePageStore {
    /// Open (or create) the database file at `path` behind a pool of at most
    /// `max_pool_size` connections.
    pub fn open(
        path: impl AsRef<Path>,
        max_pool_size: u32,
        queries: QueryTable,
    ) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if is_private_database(path) {
            return Err(StoreError::InMemory(path.display().to_string()));
        }
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECS))?;
            conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))?;
            Ok(())
        });
        let max_size = max_pool_size.max(1);
        let pool = Pool::builder()
            .max_size(max_size)
            .min_idle(Some(MIN_IDLE.min(max_size)))
            .connection_timeout(Duration::from_secs(CONNECTION_TIMEOUT_SECS))
            .build(manager)?;

        info!(path = %path.display(), max_pool_size = max_size, "sqlite pool opened");
        Ok(Self {
            pool,
            queries: Arc::new(queries),
        })
    }

    /// Connections currently held by the pool (idle or in use).
    pub fn pool_size(&self) -> u32 {
        self.pool.state().connections
    }

    /// Connections currently checked out.
    pub fn connections_in_use(&self) -> u32 {
        let state = self.pool.state();
        state.connections - state.idle_connections
    }

    /// Run `f` on one pooled connection off the async scheduler.
    async fn with_conn<F, R>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&rusqlite::Connection, &QueryTable) -> Result<R, StoreError> + Send + 'static,
        R: Send + 'static,
    {
        let pool = self.pool.clone();
        let queries = Arc::clone(&self.queries);
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            f(&conn, &queries)
        })
        .await?
    }
}

/// Paths SQLite opens as a per-connection database instead of a shared file.
fn is_private_database(path: &Path) -> bool {
    let raw = path.to_string_lossy();
    raw.is_empty()
        || raw == ":memory:"
        || raw.starts_with("file::memory:")
        || raw.contains("mode=memory")
}

#[async_trait]
impl PageStore for SqlitePageStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        self.with_conn(|conn, queries| {
            conn.execute_batch(queries.get(Query::CreatePagesTable))?;
            Ok(())
        })
        .await
    }

    async fn list_page_names(&self) -> Result<Vec<String>, StoreError> {
        self.with_conn(|conn, queries| {
            let mut stmt = conn.prepare(queries.get(Query::AllPages))?;
            let mut names = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            // 表示順は契約: SQL の ORDER BY には頼らない
            names.sort();
            Ok(names)
        })
        .await
    }

    async fn get_page(&self, name: &str) -> Result<Option<Page>, StoreError> {
        let name = name.to_string();
        self.with_conn(move |conn, queries| {
            let page = conn
                .query_row(queries.get(Query::GetPage), params![name], |row| {
                    Ok(Page {
                        id: row.get(0)?,
                        name: name.clone(),
                        content: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    })
                })
                .optional()?;
            Ok(page)
        })
        .await
    }

    async fn create_page(&self, name: &str, content: &str) -> Result<(), StoreError> {
        let (name, content) = (name.to_string(), content.to_string());
        self.with_conn(move |conn, queries| {
            conn.execute(queries.get(Query::CreatePage), params![name, content])?;
            debug!(name = %name, "page created");
            Ok(())
        })
        .await
    }

    async fn save_page(&self, id: i64, content: &str) -> Result<(), StoreError> {
        let content = content.to_string();
        self.with_conn(move |conn, queries| {
            let changed = conn.execute(queries.get(Query::SavePage), params![content, id])?;
            debug!(id, changed, "page saved");
            Ok(())
        })
        .await
    }

    async fn delete_page(&self, id: i64) -> Result<(), StoreError> {
        self.with_conn(move |conn, queries| {
            let changed = conn.execute(queries.get(Query::DeletePage), params![id])?;
            debug!(id, changed, "page deleted");
            Ok(())
        })
        .await
    }
}
