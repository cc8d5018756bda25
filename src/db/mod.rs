pub mod migrations;
pub mod queries;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::errors::AppError;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct Store {
    path: Arc<PathBuf>,
    busy_timeout: Duration,
}

impl Store {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        anyhow::ensure!(
            path != Path::new(":memory:"),
            "DATABASE_URL must point at a file; in-memory databases are per-connection"
        );

        let store = Self {
            path: Arc::new(path.to_path_buf()),
            busy_timeout: BUSY_TIMEOUT,
        };

        let conn = store.connect().context("failed to open database")?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("failed to set database pragmas")?;
        migrations::run_migrations(&conn)?;

        Ok(store)
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn connect(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(self.path.as_ref())?;
        conn.busy_timeout(self.busy_timeout)?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(conn)
    }

    pub fn unit_of_work_blocking<T, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, AppError>,
    {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    pub async fn unit_of_work<T, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, AppError> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.unit_of_work_blocking(f)).await?
    }

    pub async fn read<T, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&Connection) -> Result<T, AppError> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || {
            let conn = store.connect()?;
            f(&conn)
        })
        .await?
    }
}
