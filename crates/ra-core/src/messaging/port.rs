use async_trait::async_trait;

use crate::{
    domain::{ChatId, UpdateId},
    messaging::types::Update,
    Result,
};

/// Transport port consumed by the translator and the command processor.
///
/// The Telegram adapter implements this over the Bot API; tests use an
/// in-process fake.
#[async_trait]
pub trait TelegramApi: Send + Sync {
    /// Fetch up to `limit` updates starting at `offset` (inclusive).
    async fn updates(&self, offset: UpdateId, limit: usize) -> Result<Vec<Update>>;

    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<()>;
}
