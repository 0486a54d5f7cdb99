//! Configuration of the database service.
//!
//! Every field has a default, so an empty TOML table is a valid config.

use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const DEFAULT_DATABASE_URL: &str = "db/wiki.db";
pub const DEFAULT_MAX_POOL_SIZE: u32 = 30;
pub const DEFAULT_QUEUE: &str = "wikidb.queue";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file, optionally prefixed with `sqlite://` or `sqlite:`.
    pub url: String,
    pub max_pool_size: u32,
    /// TOML file with the SQL statements; the bundled set is used when absent.
    pub sql_queries_file: Option<PathBuf>,
    /// Bus channel the service listens on.
    pub queue: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_pool_size: DEFAULT_MAX_POOL_SIZE,
            sql_queries_file: None,
            queue: DEFAULT_QUEUE.to_string(),
        }
    }
}

impl DatabaseConfig {
    pub fn database_path(&self) -> &Path {
        let url = self.url.as_str();
        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);
        Path::new(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn empty_table_gives_defaults() {
        let config: DatabaseConfig = toml::from_str("").unwrap();
        assert_eq!(config, DatabaseConfig::default());
        assert_eq!(config.max_pool_size, 30);
        assert_eq!(config.queue, "wikidb.queue");
    }

    #[test]
    fn partial_table_keeps_other_defaults() {
        let config: DatabaseConfig = toml::from_str(
            r#"
            url = "/var/lib/wiki.db"
            sql_queries_file = "conf/queries.toml"
            "#,
        )
        .unwrap();
        assert_eq!(config.database_path(), Path::new("/var/lib/wiki.db"));
        assert_eq!(config.sql_queries_file, Some(PathBuf::from("conf/queries.toml")));
        assert_eq!(config.max_pool_size, DEFAULT_MAX_POOL_SIZE);
    }

    #[rstest]
    #[case("sqlite://db/wiki.db", "db/wiki.db")]
    #[case("sqlite:/tmp/w.db", "/tmp/w.db")]
    #[case("plain.db", "plain.db")]
    fn url_prefix_is_stripped(#[case] url: &str, #[case] expected: &str) {
        let config = DatabaseConfig {
            url: url.to_string(),
            ..DatabaseConfig::default()
        };
        assert_eq!(config.database_path(), Path::new(expected));
    }
}
