//! Command line + config file.
//!
//! 優先順位: フラグ / 環境変数 > `--config` の TOML > 既定値

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;

use wiki_core::{BusConfig, DatabaseConfig};

pub const DEFAULT_HTTP_PORT: u16 = 8080;

#[derive(Debug, Parser)]
#[command(name = "wiki", version, about = "Wiki server backed by SQLite over an in-process bus")]
pub struct Cli {
    /// TOML file with [database], [bus] and [http] tables.
    #[arg(long, short = 'c', env = "WIKI_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite database file (`sqlite://` prefix allowed).
    #[arg(long, env = "WIKI_DB_URL")]
    pub db_url: Option<String>,

    #[arg(long, env = "WIKI_DB_MAX_POOL_SIZE")]
    pub db_max_pool_size: Option<u32>,

    /// TOML file overriding the bundled SQL statements.
    #[arg(long, env = "WIKI_SQL_QUERIES_FILE")]
    pub sql_queries_file: Option<PathBuf>,

    /// Bus channel between the web and database sides.
    #[arg(long, env = "WIKI_DB_QUEUE")]
    pub db_queue: Option<String>,

    #[arg(long, env = "WIKI_HTTP_PORT")]
    pub http_port: Option<u16>,

    #[arg(long, env = "WIKI_REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_HTTP_PORT,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub bus: BusConfig,
    pub http: HttpConfig,
}

impl Settings {
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn resolve(cli: Cli) -> anyhow::Result<Self> {
        let base = match &cli.config {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        Ok(base.apply(cli))
    }

    fn apply(mut self, cli: Cli) -> Self {
        if let Some(url) = cli.db_url {
            self.database.url = url;
        }
        if let Some(size) = cli.db_max_pool_size {
            self.database.max_pool_size = size;
        }
        if let Some(path) = cli.sql_queries_file {
            self.database.sql_queries_file = Some(path);
        }
        if let Some(queue) = cli.db_queue {
            self.database.queue = queue;
        }
        if let Some(port) = cli.http_port {
            self.http.port = port;
        }
        if let Some(ms) = cli.request_timeout_ms {
            self.bus.request_timeout_ms = ms;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["wiki"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn no_flags_gives_defaults() {
        let settings = Settings::default().apply(cli(&[]));
        assert_eq!(settings.http.port, 8080);
        assert_eq!(settings.database.queue, "wikidb.queue");
        assert_eq!(settings.database.max_pool_size, 30);
        assert_eq!(settings.bus.request_timeout_ms, 30_000);
    }

    #[test]
    fn file_values_are_read() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [database]
            url = "sqlite://data/w.db"
            queue = "pages.queue"

            [http]
            port = 9000
            "#
        )
        .unwrap();

        let settings = Settings::from_toml_file(file.path()).unwrap();
        assert_eq!(settings.database.database_path(), Path::new("data/w.db"));
        assert_eq!(settings.database.queue, "pages.queue");
        assert_eq!(settings.database.max_pool_size, 30);
        assert_eq!(settings.http.port, 9000);
    }

    #[test]
    fn flags_override_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[http]\nport = 9000\n[bus]\nrequest_timeout_ms = 10").unwrap();
        let path = file.path().display().to_string();

        let settings =
            Settings::resolve(cli(&["--config", &path, "--http-port", "9100"])).unwrap();
        assert_eq!(settings.http.port, 9100);
        assert_eq!(settings.bus.request_timeout_ms, 10);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = Settings::resolve(cli(&["--config", "/nonexistent/wiki.toml"])).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
