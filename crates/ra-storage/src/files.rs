//! File-tree backend: `<base>/<owner>/<page hash>` holding a JSON record.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use rand::Rng;
use tokio::fs;
use tracing::debug;

use ra_core::{
    errors::ResultExt,
    storage::{content_hash, Page, Storage},
    Error, Result,
};

pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn owner_dir(&self, owner_name: &str) -> PathBuf {
        self.base_path.join(owner_dir_name(owner_name))
    }

    fn page_path(&self, page: &Page) -> PathBuf {
        self.owner_dir(&page.owner_name).join(page.hash())
    }

    async fn decode_page(path: &Path) -> Result<Page> {
        let bytes = fs::read(path)
            .await
            .map_err(Error::storage)
            .context("can't decode page")?;
        serde_json::from_slice(&bytes).context("can't decode page")
    }
}

/// Common NAME_MAX; longer components fail with ENAMETOOLONG.
const MAX_DIR_NAME_BYTES: usize = 255;

/// Display names are user-controlled; anything that is not a single plain path
/// component of acceptable length gets a hashed directory instead.
fn owner_dir_name(owner_name: &str) -> String {
    let plain = !owner_name.is_empty()
        && owner_name.len() <= MAX_DIR_NAME_BYTES
        && owner_name != "."
        && owner_name != ".."
        && !owner_name.contains(|c| matches!(c, '/' | '\\' | '\0'));
    if plain {
        owner_name.to_string()
    } else {
        format!("_{}", content_hash(&[owner_name]))
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn save(&self, page: &Page) -> Result<()> {
        let dir = self.owner_dir(&page.owner_name);
        fs::create_dir_all(&dir)
            .await
            .map_err(Error::storage)
            .context("can't save page")?;

        let bytes = serde_json::to_vec(page).context("can't save page")?;
        fs::write(self.page_path(page), bytes)
            .await
            .map_err(Error::storage)
            .context("can't save page")
    }

    async fn pick_random(&self, owner_name: &str) -> Result<Option<Page>> {
        let dir = self.owner_dir(owner_name);
        debug!(path = %dir.display(), "picking random page");

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::storage(e).wrap("can't pick random page")),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(Error::storage)
            .context("can't pick random page")?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(Error::storage)
                .context("can't pick random page")?;
            if file_type.is_file() {
                files.push(entry.path());
            }
        }

        if files.is_empty() {
            return Ok(None);
        }

        let n = rand::thread_rng().gen_range(0..files.len());
        Self::decode_page(&files[n])
            .await
            .map(Some)
            .context("can't pick random page")
    }

    async fn remove(&self, page: &Page) -> Result<()> {
        let path = self.page_path(page);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::storage(e).wrap(format!("can't remove page {}", path.display()))),
        }
    }

    async fn is_exists(&self, page: &Page) -> Result<bool> {
        let path = self.page_path(page);
        fs::try_exists(&path).await.map_err(|e| {
            Error::storage(e).wrap(format!("can't check if file {} exists", path.display()))
        })
    }
}
