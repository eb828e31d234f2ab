use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use rand::Rng;

use crate::{
    storage::{Page, Storage},
    Error, Result,
};

/// Process-local backend. Pages are lost on restart.
#[derive(Default)]
pub struct MemoryStorage {
    pages: Mutex<HashMap<String, Vec<String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_pages<T>(&self, f: impl FnOnce(&mut HashMap<String, Vec<String>>) -> T) -> Result<T> {
        let mut guard = self
            .pages
            .lock()
            .map_err(|_| Error::storage("memory storage lock poisoned"))?;
        Ok(f(&mut guard))
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn save(&self, page: &Page) -> Result<()> {
        self.with_pages(|pages| {
            pages
                .entry(page.owner_name.clone())
                .or_default()
                .push(page.url.clone());
        })
    }

    async fn pick_random(&self, owner_name: &str) -> Result<Option<Page>> {
        self.with_pages(|pages| {
            let urls = pages.get(owner_name).filter(|u| !u.is_empty())?;
            let n = rand::thread_rng().gen_range(0..urls.len());
            Some(Page::new(urls[n].clone(), owner_name))
        })
    }

    async fn remove(&self, page: &Page) -> Result<()> {
        self.with_pages(|pages| {
            if let Some(urls) = pages.get_mut(&page.owner_name) {
                if let Some(pos) = urls.iter().position(|u| u == &page.url) {
                    urls.remove(pos);
                }
                if urls.is_empty() {
                    pages.remove(&page.owner_name);
                }
            }
        })
    }

    async fn is_exists(&self, page: &Page) -> Result<bool> {
        self.with_pages(|pages| {
            pages
                .get(&page.owner_name)
                .is_some_and(|urls| urls.contains(&page.url))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_exists_remove_round_trip() {
        let s = MemoryStorage::new();
        let p = Page::new("https://example.com/a", "Alice");

        assert!(!s.is_exists(&p).await.unwrap());
        s.save(&p).await.unwrap();
        assert!(s.is_exists(&p).await.unwrap());
        s.remove(&p).await.unwrap();
        assert!(!s.is_exists(&p).await.unwrap());

        // Absent page: still fine.
        s.remove(&p).await.unwrap();
    }

    #[tokio::test]
    async fn pick_random_is_partitioned_and_exhausts() {
        let s = MemoryStorage::new();
        s.save(&Page::new("https://a.example/1", "Alice")).await.unwrap();
        s.save(&Page::new("https://a.example/2", "Alice")).await.unwrap();
        s.save(&Page::new("https://b.example/1", "Bob")).await.unwrap();

        let mut seen = Vec::new();
        while let Some(p) = s.pick_random("Alice").await.unwrap() {
            assert_eq!(p.owner_name, "Alice");
            s.remove(&p).await.unwrap();
            seen.push(p.url);
        }
        seen.sort();
        assert_eq!(seen, vec!["https://a.example/1", "https://a.example/2"]);

        assert!(s.pick_random("Alice").await.unwrap().is_none());
        assert!(s.pick_random("Carol").await.unwrap().is_none());
        assert_eq!(
            s.pick_random("Bob").await.unwrap(),
            Some(Page::new("https://b.example/1", "Bob"))
        );
    }
}
