//! Telegram updates → internal events, plus the forward-only polling cursor.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    domain::UpdateId,
    errors::ResultExt,
    events::{Event, Fetcher},
    messaging::{port::TelegramApi, types::Update},
    Result,
};

pub struct UpdateTranslator {
    tg: Arc<dyn TelegramApi>,
    offset: UpdateId,
}

impl UpdateTranslator {
    pub fn new(tg: Arc<dyn TelegramApi>) -> Self {
        Self {
            tg,
            offset: UpdateId(0),
        }
    }

    /// Offset that the next fetch will request.
    pub fn offset(&self) -> UpdateId {
        self.offset
    }
}

#[async_trait]
impl Fetcher for UpdateTranslator {
    async fn fetch(&mut self, limit: usize) -> Result<Vec<Event>> {
        let updates = self
            .tg
            .updates(self.offset, limit)
            .await
            .context("can't get events")?;

        let Some(last) = updates.iter().map(|u| u.id).max() else {
            return Ok(Vec::new());
        };

        // Advance before anyone sees the events: a fetched batch is never redelivered.
        self.offset = UpdateId(last.0 + 1).max(self.offset);

        Ok(updates.into_iter().map(translate).collect())
    }
}

pub fn translate(update: Update) -> Event {
    match update.message {
        Some(msg) => Event::message(msg.chat_id, msg.sender_first_name, msg.text),
        None => Event::unknown(),
    }
}
