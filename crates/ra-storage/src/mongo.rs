//! Document-store backend over MongoDB.

use async_trait::async_trait;
use mongodb::{
    bson::{doc, Document},
    Client, Collection,
};
use serde::{Deserialize, Serialize};

use ra_core::{
    errors::ResultExt,
    storage::{Page, Storage},
    Error, Result,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
struct PageDoc {
    url: String,
    first_name: String,
}

impl From<&Page> for PageDoc {
    fn from(p: &Page) -> Self {
        Self {
            url: p.url.clone(),
            first_name: p.owner_name.clone(),
        }
    }
}

impl PageDoc {
    fn filter(&self) -> Document {
        doc! {
            "url": self.url.as_str(),
            "first_name": self.first_name.as_str(),
        }
    }
}

pub struct MongoStorage {
    client: Client,
    database: String,
    pages: Collection<PageDoc>,
}

impl MongoStorage {
    pub async fn connect(uri: &str, database: &str, collection: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(Error::storage)
            .context("can't connect to mongodb")?;
        let pages = client.database(database).collection::<PageDoc>(collection);

        Ok(Self {
            client,
            database: database.to_string(),
            pages,
        })
    }
}

#[async_trait]
impl Storage for MongoStorage {
    /// The driver connects lazily; ping so an unreachable server fails startup.
    async fn init(&self) -> Result<()> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map(|_| ())
            .map_err(Error::storage)
            .context("can't ping mongodb")
    }

    async fn save(&self, page: &Page) -> Result<()> {
        self.pages
            .insert_one(PageDoc::from(page), None)
            .await
            .map(|_| ())
            .map_err(Error::storage)
            .context("can't save page")
    }

    async fn pick_random(&self, owner_name: &str) -> Result<Option<Page>> {
        let pipeline = vec![
            doc! { "$match": { "first_name": owner_name } },
            doc! { "$sample": { "size": 1 } },
        ];

        let mut cursor = self
            .pages
            .aggregate(pipeline, None)
            .await
            .map_err(Error::storage)
            .context("can't pick random page")?;

        let found = cursor
            .advance()
            .await
            .map_err(Error::storage)
            .context("can't pick random page")?;
        if !found {
            return Ok(None);
        }

        let raw: Document = cursor
            .deserialize_current()
            .map_err(Error::storage)
            .context("can't pick random page")?;
        let doc: PageDoc = mongodb::bson::from_document(raw)
            .map_err(Error::storage)
            .context("can't decode page")?;

        Ok(Some(Page::new(doc.url, doc.first_name)))
    }

    async fn remove(&self, page: &Page) -> Result<()> {
        self.pages
            .delete_one(PageDoc::from(page).filter(), None)
            .await
            .map(|_| ())
            .map_err(Error::storage)
            .context("can't remove page")
    }

    async fn is_exists(&self, page: &Page) -> Result<bool> {
        let count = self
            .pages
            .count_documents(PageDoc::from(page).filter(), None)
            .await
            .map_err(Error::storage)
            .context("can't check if page exists")?;
        Ok(count > 0)
    }
}
