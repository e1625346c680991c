//! SQLite-based audit store

use crate::persistence::{AuditRecord, AuditStore};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;
use uuid::Uuid;

/// Default table audit records are written to
pub const DEFAULT_TABLE: &str = "requests";

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid"));

/// Whether `name` can be used as a table name without quoting
pub fn is_valid_table_name(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// SQLite audit store
pub struct SqliteAuditStore {
    pool: SqlitePool,
    table: String,
}

impl SqliteAuditStore {
    /// Open (creating if needed) a database at `db_path`
    ///
    /// `":memory:"` opens a private in-memory database.
    pub async fn new(db_path: &str) -> Result<Self> {
        Self::with_table(db_path, DEFAULT_TABLE).await
    }

    /// Open a store writing to a custom table
    pub async fn with_table(db_path: &str, table: &str) -> Result<Self> {
        if !is_valid_table_name(table) {
            bail!("Invalid audit table name: {}", table);
        }

        let pool = connect(db_path).await?;
        let store = Self {
            pool,
            table: table.to_string(),
        };
        store.init().await?;

        Ok(store)
    }

    /// Create store with default path
    pub async fn with_default_path() -> Result<Self> {
        let db_path = crate::config::default_database_path();
        Self::new(&db_path.to_string_lossy()).await
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id TEXT PRIMARY KEY,
                method TEXT NOT NULL,
                url TEXT NOT NULL,
                status INTEGER NOT NULL,
                ip TEXT,
                user_agent TEXT,
                created TEXT NOT NULL
            )
            "#,
            table = self.table
        ))
        .execute(&self.pool)
        .await
        .context("Failed to create audit table")?;

        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_created ON {table}(created)",
            table = self.table
        ))
        .execute(&self.pool)
        .await
        .context("Failed to create audit index")?;

        Ok(())
    }

    /// Convert DateTime<Utc> to NaiveDateTime for SQLite
    fn to_naive(dt: DateTime<Utc>) -> NaiveDateTime {
        dt.naive_utc()
    }

    /// Convert NaiveDateTime to DateTime<Utc>
    fn from_naive(dt: NaiveDateTime) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(dt, Utc)
    }

    fn from_row(row: &SqliteRow) -> Result<AuditRecord> {
        Ok(AuditRecord {
            id: Uuid::parse_str(&row.get::<String, _>("id"))?,
            method: row.get("method"),
            url: row.get("url"),
            status: u16::try_from(row.get::<i64, _>("status")).context("Invalid status code")?,
            ip: row.get("ip"),
            user_agent: row.get("user_agent"),
            created: Self::from_naive(row.get("created")),
        })
    }
}

/// Build a pool for `db_path`; in-memory databases get a single long-lived connection
pub async fn connect(db_path: &str) -> Result<SqlitePool> {
    let in_memory = db_path == ":memory:";
    let options = if in_memory {
        SqliteConnectOptions::from_str("sqlite::memory:")?
    } else {
        if let Some(parent) = Path::new(db_path).parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
    };

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    pool_options
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to database {}", db_path))
}

#[async_trait::async_trait]
impl AuditStore for SqliteAuditStore {
    async fn save(&self, record: &AuditRecord) -> Result<()> {
        sqlx::query(&format!(
            r#"
            INSERT INTO {}
            (id, method, url, status, ip, user_agent, created)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            self.table
        ))
        .bind(record.id.to_string())
        .bind(&record.method)
        .bind(&record.url)
        .bind(i64::from(record.status))
        .bind(&record.ip)
        .bind(&record.user_agent)
        .bind(Self::to_naive(record.created))
        .execute(&self.pool)
        .await
        .context("Failed to save audit record")?;

        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<Option<AuditRecord>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT id, method, url, status, ip, user_agent, created
            FROM {}
            WHERE id = ?1
            "#,
            self.table
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load audit record")?;

        row.as_ref().map(Self::from_row).transpose()
    }

    async fn recent(&self, limit: usize) -> Result<Vec<AuditRecord>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT id, method, url, status, ip, user_agent, created
            FROM {}
            ORDER BY created DESC
            LIMIT ?1
            "#,
            self.table
        ))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list audit records")?;

        rows.iter().map(Self::from_row).collect()
    }

    async fn count(&self) -> Result<usize> {
        let row = sqlx::query(&format!("SELECT COUNT(*) AS total FROM {}", self.table))
            .fetch_one(&self.pool)
            .await
            .context("Failed to count audit records")?;

        Ok(row.get::<i64, _>("total") as usize)
    }
}
