//! Impls - ports の実装
//!
//! - **SqlitePageStore**: r2d2 + SQLite による `PageStore`
//! - **QueryTable**: SQL 文の読み込み（store 専用）

pub mod sql_queries;
pub mod sqlite_store;

pub use self::sql_queries::{Query, QueryTable, QueryTableError};
pub use self::sqlite_store::SqlitePageStore;
