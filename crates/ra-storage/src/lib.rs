//! Persistence backends for saved pages.
//!
//! Each backend implements `ra_core::storage::Storage`; `open` picks one from
//! the configured `StorageBackend` and runs its bootstrap.

use std::sync::Arc;

use ra_core::{
    config::StorageBackend,
    errors::ResultExt,
    storage::{memory::MemoryStorage, Storage},
    Result,
};
use tracing::info;

pub mod files;
#[cfg(feature = "mongo")]
pub mod mongo;
pub mod sqlite;

pub use files::FileStorage;
#[cfg(feature = "mongo")]
pub use mongo::MongoStorage;
pub use sqlite::SqliteStorage;

/// Connect to the configured backend and make sure it is ready for use.
pub async fn open(backend: &StorageBackend) -> Result<Arc<dyn Storage>> {
    let storage: Arc<dyn Storage> = match backend {
        StorageBackend::Memory => Arc::new(MemoryStorage::new()),
        StorageBackend::Files { base_path } => Arc::new(FileStorage::new(base_path)),
        StorageBackend::Sqlite { path } => Arc::new(SqliteStorage::open(path).await?),
        StorageBackend::Mongo {
            uri,
            database,
            collection,
        } => mongo_backend(uri, database, collection).await?,
    };

    storage.init().await.context("can't init the storage")?;
    info!(backend = backend_name(backend), "storage ready");
    Ok(storage)
}

#[cfg(feature = "mongo")]
async fn mongo_backend(uri: &str, database: &str, collection: &str) -> Result<Arc<dyn Storage>> {
    Ok(Arc::new(
        MongoStorage::connect(uri, database, collection).await?,
    ))
}

#[cfg(not(feature = "mongo"))]
async fn mongo_backend(_uri: &str, _database: &str, _collection: &str) -> Result<Arc<dyn Storage>> {
    Err(ra_core::Error::Config(
        "mongo storage requested but this build lacks the `mongo` feature".to_string(),
    ))
}

fn backend_name(backend: &StorageBackend) -> &'static str {
    match backend {
        StorageBackend::Memory => "memory",
        StorageBackend::Files { .. } => "files",
        StorageBackend::Sqlite { .. } => "sqlite",
        StorageBackend::Mongo { .. } => "mongo",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ra_core::storage::Page;

    #[tokio::test]
    async fn opens_files_backend_in_fresh_directory() {
        let dir = tempfile::tempdir().unwrap();
        let storage = open(&StorageBackend::Files {
            base_path: dir.path().join("pages"),
        })
        .await
        .unwrap();

        let p = Page::new("https://example.com/a", "Alice");
        storage.save(&p).await.unwrap();
        assert!(storage.is_exists(&p).await.unwrap());
    }

    #[tokio::test]
    async fn opens_sqlite_backend_and_creates_schema() {
        let dir = tempfile::tempdir().unwrap();
        let backend = StorageBackend::Sqlite {
            path: dir.path().join("nested/storage.db"),
        };

        let storage = open(&backend).await.unwrap();
        storage
            .save(&Page::new("https://example.com/a", "Alice"))
            .await
            .unwrap();
        drop(storage);

        // Reopening keeps data and re-running init is harmless.
        let storage = open(&backend).await.unwrap();
        assert!(storage
            .is_exists(&Page::new("https://example.com/a", "Alice"))
            .await
            .unwrap());
    }

    #[cfg(not(feature = "mongo"))]
    #[tokio::test]
    async fn mongo_without_feature_is_a_config_error() {
        let err = open(&StorageBackend::Mongo {
            uri: "mongodb://localhost".to_string(),
            database: "read-adviser".to_string(),
            collection: "pages".to_string(),
        })
        .await
        .err()
        .unwrap();
        assert!(matches!(err, ra_core::Error::Config(_)));
    }
}
