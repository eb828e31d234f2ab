//! Telegram adapter (teloxide).
//!
//! Implements the `ra-core` `TelegramApi` port over the Bot API: long-poll
//! `getUpdates` for the consumer and `sendMessage` for replies.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{UpdateKind, User},
};

use tokio::time::sleep;
use tracing::warn;

use ra_core::{
    domain::{ChatId, UpdateId},
    errors::Error,
    messaging::{
        port::TelegramApi,
        types::{IncomingMessage, Update as RawUpdate},
    },
    Result,
};

/// Telegram accepts at most 100 updates per `getUpdates` call.
const MAX_UPDATES_LIMIT: usize = 100;

#[derive(Clone)]
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(token: impl Into<String>, api_url: Option<&str>) -> Result<Self> {
        let mut bot = Bot::new(token);
        if let Some(raw) = api_url {
            let url = url::Url::parse(raw)
                .map_err(|e| Error::Config(format!("invalid TELEGRAM_API_URL {raw:?}: {e}")))?;
            bot = bot.set_api_url(url);
        }
        Ok(Self { bot })
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        warn!(retry_after = ?d, "telegram asked to slow down");
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Error::transport(other)),
                },
            }
        }
    }
}

#[async_trait]
impl TelegramApi for TelegramClient {
    async fn updates(&self, offset: UpdateId, limit: usize) -> Result<Vec<RawUpdate>> {
        let offset = i32::try_from(offset.0)
            .map_err(|_| Error::transport(format!("update offset {} out of range", offset.0)))?;
        // Bounded above by MAX_UPDATES_LIMIT, so the cast cannot truncate.
        let limit = limit.clamp(1, MAX_UPDATES_LIMIT) as u8;

        let updates = self
            .with_retry(|| self.bot.get_updates().offset(offset).limit(limit))
            .await?;

        Ok(updates.into_iter().map(convert_update).collect())
    }

    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.with_retry(|| self.bot.send_message(Self::tg_chat(chat_id), text.to_string()))
            .await?;
        Ok(())
    }
}

fn convert_update(upd: teloxide::types::Update) -> RawUpdate {
    let id = UpdateId(i64::from(upd.id));
    let message = match upd.kind {
        UpdateKind::Message(msg) => Some(IncomingMessage {
            text: msg.text().unwrap_or_default().to_string(),
            sender_first_name: msg.from().map(first_name).unwrap_or_default(),
            chat_id: ChatId(msg.chat.id.0),
        }),
        _ => None,
    };
    RawUpdate { id, message }
}

fn first_name(user: &User) -> String {
    user.first_name.clone()
}
