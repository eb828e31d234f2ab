//! Relational backend over SQLite (`rusqlite`).
//!
//! Table: `pages(url TEXT, first_name TEXT)`; no uniqueness constraint, the
//! processor checks existence before inserting.

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use ra_core::{
    errors::ResultExt,
    storage::{Page, Storage},
    Error, Result,
};

pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    /// Open (creating if needed) the database file on the blocking pool, so a
    /// caller-side timeout can give up on a stuck filesystem.
    pub async fn open(path: &Path) -> Result<Self> {
        let path = path.to_path_buf();
        let conn = tokio::task::spawn_blocking(move || -> Result<Connection> {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .map_err(Error::storage)
                    .context("can't create database directory")?;
            }

            Connection::open(&path)
                .map_err(Error::storage)
                .context("can't open database")
        })
        .await
        .map_err(Error::storage)??;
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(Error::storage)
            .context("can't open database")?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run `f` on the blocking pool; rusqlite calls are synchronous.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| Error::storage("sqlite connection lock poisoned"))?;
            f(&guard).map_err(Error::storage)
        })
        .await
        .map_err(Error::storage)?
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn init(&self) -> Result<()> {
        self.with_conn(|c| {
            c.query_row("SELECT 1", [], |_| Ok(()))?;
            c.execute(
                "CREATE TABLE IF NOT EXISTS pages (url TEXT, first_name TEXT)",
                [],
            )?;
            Ok(())
        })
        .await
        .context("can't create 'pages' table")
    }

    async fn save(&self, page: &Page) -> Result<()> {
        let page = page.clone();
        self.with_conn(move |c| {
            c.execute(
                "INSERT INTO pages (url, first_name) VALUES (?1, ?2)",
                params![page.url, page.owner_name],
            )
            .map(|_| ())
        })
        .await
        .context("can't save page")
    }

    async fn pick_random(&self, owner_name: &str) -> Result<Option<Page>> {
        let owner = owner_name.to_string();
        self.with_conn(move |c| {
            let url: Option<String> = c
                .query_row(
                    "SELECT url FROM pages WHERE first_name = ?1 ORDER BY RANDOM() LIMIT 1",
                    [&owner],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(url.map(|url| Page::new(url, owner)))
        })
        .await
        .context("can't pick random page")
    }

    async fn remove(&self, page: &Page) -> Result<()> {
        let page = page.clone();
        self.with_conn(move |c| {
            c.execute(
                "DELETE FROM pages WHERE url = ?1 AND first_name = ?2",
                params![page.url, page.owner_name],
            )
            .map(|_| ())
        })
        .await
        .context("can't remove page")
    }

    async fn is_exists(&self, page: &Page) -> Result<bool> {
        let page = page.clone();
        self.with_conn(move |c| {
            let count: i64 = c.query_row(
                "SELECT COUNT(*) FROM pages WHERE url = ?1 AND first_name = ?2",
                params![page.url, page.owner_name],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
        .await
        .context("can't check if page exists")
    }
}
