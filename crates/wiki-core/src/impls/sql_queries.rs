//! QueryTable - the SQL statements, keyed by logical operation.
//!
//! Loaded once when the service starts and owned by the store afterwards.
//! Statements come from a TOML file of `key = "SQL"` pairs; without a file the
//! bundled `sql/queries.toml` is used.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

const BUNDLED_QUERIES: &str = include_str!("../../sql/queries.toml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Query {
    CreatePagesTable,
    AllPages,
    GetPage,
    CreatePage,
    SavePage,
    DeletePage,
}

impl Query {
    pub const ALL: [Query; 6] = [
        Query::CreatePagesTable,
        Query::AllPages,
        Query::GetPage,
        Query::CreatePage,
        Query::SavePage,
        Query::DeletePage,
    ];

    /// Key in the statements file.
    pub fn key(&self) -> &'static str {
        match self {
            Query::CreatePagesTable => "create-pages-table",
            Query::AllPages => "all-pages",
            Query::GetPage => "get-page",
            Query::CreatePage => "create-page",
            Query::SavePage => "save-page",
            Query::DeletePage => "delete-page",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueryTableError {
    #[error("failed to read SQL statements from {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse SQL statements: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("SQL statement '{0}' is missing")]
    Missing(&'static str),
}

#[derive(Debug, Clone)]
pub struct QueryTable {
    statements: HashMap<Query, String>,
}

impl QueryTable {
    /// The statements shipped with the crate.
    pub fn bundled() -> Result<Self, QueryTableError> {
        Self::from_toml_str(BUNDLED_QUERIES)
    }

    /// Read `path` when given, otherwise fall back to the bundled statements.
    pub fn load(path: Option<&Path>) -> Result<Self, QueryTableError> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| QueryTableError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&text)
            }
            None => Self::bundled(),
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, QueryTableError> {
        let mut raw: HashMap<String, String> = toml::from_str(text)?;
        let mut statements = HashMap::with_capacity(Query::ALL.len());
        for query in Query::ALL {
            let sql = raw
                .remove(query.key())
                .filter(|sql| !sql.trim().is_empty())
                .ok_or(QueryTableError::Missing(query.key()))?;
            statements.insert(query, sql);
        }
        Ok(Self { statements })
    }

    pub fn get(&self, query: Query) -> &str {
        // from_toml_str が全 Query を保証している
        self.statements
            .get(&query)
            .map(String::as_str)
            .unwrap_or_default()
    }
}
