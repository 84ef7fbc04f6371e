//! SQLite-backed validation cache (sqlx).
//!
//! sqlx is async; this type owns a small tokio runtime and blocks on it so the
//! backend can stay synchronous. Do not call it from inside another runtime.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{unix_timestamp, ValidationCache, ValidationRecord};

pub struct SqliteValidationCache {
    pool: SqlitePool,
    runtime: tokio::runtime::Runtime,
}

impl SqliteValidationCache {
    /// Default location: `~/.local/state/hbcache/validation.db`.
    pub fn default_path() -> Result<PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("hbcache")?;
        Ok(xdg_dirs.get_state_home().join("hbcache").join("validation.db"))
    }

    /// Open (or create) the database at the default location.
    pub fn open_default() -> Result<Self> {
        Self::open_at(Self::default_path()?)
    }

    /// Open (or create) the database at `path`, creating parent dirs if needed.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            // Several processes may validate the same endpoint at once.
            .busy_timeout(Duration::from_secs(5));

        let runtime = build_runtime()?;
        let pool = runtime
            .block_on(
                SqlitePoolOptions::new()
                    .max_connections(4)
                    .connect_with(options),
            )
            .with_context(|| format!("open validation cache: {}", path.display()))?;

        let cache = Self { pool, runtime };
        cache.migrate()?;
        tracing::debug!("validation cache opened at {}", path.display());
        Ok(cache)
    }

    fn migrate(&self) -> Result<()> {
        self.block_on(async {
            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS binary_caches (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    url TEXT NOT NULL UNIQUE,
                    want_mass_query INTEGER NOT NULL,
                    priority INTEGER NOT NULL,
                    created_at INTEGER NOT NULL
                );
                "#,
            )
            .execute(&self.pool)
            .await?;
            Ok::<_, anyhow::Error>(())
        })
    }

    fn block_on<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.runtime.block_on(fut)
    }
}

fn build_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("hbcache-sqlite")
        .enable_all()
        .build()
        .context("start validation cache runtime")
}

impl ValidationCache for SqliteValidationCache {
    fn get(&self, uri: &str) -> Result<Option<ValidationRecord>> {
        self.block_on(async {
            let row = sqlx::query(
                r#"
                SELECT url, want_mass_query, priority, created_at
                FROM binary_caches
                WHERE url = ?1
                "#,
            )
            .bind(uri)
            .fetch_optional(&self.pool)
            .await?;

            let Some(row) = row else {
                return Ok(None);
            };
            Ok::<_, anyhow::Error>(Some(ValidationRecord {
                uri: row.get("url"),
                want_mass_query: row.get::<i64, _>("want_mass_query") != 0,
                priority: row.get("priority"),
                created_at: row.get("created_at"),
            }))
        })
    }

    fn create(&self, uri: &str, want_mass_query: bool, priority: i64) -> Result<()> {
        self.block_on(async {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO binary_caches (url, want_mass_query, priority, created_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(uri)
            .bind(want_mass_query as i64)
            .bind(priority)
            .bind(unix_timestamp())
            .execute(&self.pool)
            .await?;
            Ok::<_, anyhow::Error>(())
        })
    }
}
