use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, SqlitePool, Transaction};

use crate::domain::pagination::{PageRequest, SortDirection, SortField};

mod devices;
mod transactions;
mod users;

/// SQLite adapter backing every repository port and the user directory.
#[derive(Debug, Clone)]
pub struct Sqlite {
    pool: SqlitePool,
}

impl Sqlite {
    pub async fn new(path: &str) -> Result<Sqlite, anyhow::Error> {
        let options = SqliteConnectOptions::from_str(path)
            .with_context(|| format!("invalid database path {}", path))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePool::connect_with(options)
            .await
            .with_context(|| format!("failed to open database at {}", path))?;

        Self::migrated(pool).await
    }

    /// Private database living as long as the returned adapter. Backed by a single connection,
    /// since every SQLite connection to `:memory:` opens a separate database.
    pub async fn in_memory() -> Result<Sqlite, anyhow::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .context("invalid in-memory database options")?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("failed to open in-memory database")?;

        Self::migrated(pool).await
    }

    async fn migrated(pool: SqlitePool) -> Result<Sqlite, anyhow::Error> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run database migrations")?;

        Ok(Sqlite { pool })
    }

    /// Starts a transaction that takes the write lock up front. A deferred transaction that
    /// reads first fails with `SQLITE_BUSY` instead of waiting when another connection commits
    /// before its first write.
    async fn begin_write(&self) -> Result<Transaction<'static, sqlx::Sqlite>, anyhow::Error> {
        self.pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .context("failed to start SQLite write transaction")
    }
}

/// File-backed database in the temp dir, removed on drop. Unlike [Sqlite::in_memory] it serves
/// several connections at once.
#[cfg(test)]
pub(crate) struct TempDatabase {
    pub(crate) sqlite: Sqlite,
    path: std::path::PathBuf,
}

#[cfg(test)]
impl TempDatabase {
    pub(crate) async fn new() -> TempDatabase {
        let path = std::env::temp_dir().join(format!("inventory-{}.db", uuid::Uuid::new_v4()));
        let sqlite = Sqlite::new(&format!("sqlite://{}", path.display()))
            .await
            .unwrap();

        TempDatabase { sqlite, path }
    }
}

#[cfg(test)]
impl Drop for TempDatabase {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", self.path.display(), suffix));
        }
    }
}

/// Appends `ORDER BY`, `LIMIT` and `OFFSET` for `page`. Row id breaks ties so pages never
/// overlap.
fn push_page<F: SortField>(
    query_builder: &mut QueryBuilder<'_, sqlx::Sqlite>,
    page: &PageRequest<F>,
    column: fn(F) -> &'static str,
) {
    query_builder.push(" ORDER BY ");
    for key in page.sort() {
        query_builder.push(column(key.field())).push(match key.direction() {
            SortDirection::Asc => " ASC, ",
            SortDirection::Desc => " DESC, ",
        });
    }

    query_builder
        .push("rowid ASC LIMIT ")
        .push_bind(i64::from(page.limit()))
        .push(" OFFSET ")
        .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));
}

const UNIQUE_CONSTRAINT_VIOLATION_CODE: &str = "2067";

/// Returns the database message of a unique constraint violation, which names the offending
/// `table.column`.
fn unique_constraint_violation(err: &sqlx::Error) -> Option<String> {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            if code == UNIQUE_CONSTRAINT_VIOLATION_CODE {
                return Some(db_err.message().to_string());
            }
        }
    }

    None
}
