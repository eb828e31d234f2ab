//! Command interpretation: one inbound message in, at most one reply out.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::{
    domain::ChatId,
    errors::ResultExt,
    events::{Event, EventKind, Meta, MessageMeta, Processor},
    messages::Reply,
    messaging::port::TelegramApi,
    storage::{Page, Storage},
    Error, Result,
};

pub const RND_CMD: &str = "/rnd";
pub const HELP_CMD: &str = "/help";
pub const START_CMD: &str = "/start";

/// Action chosen for a message, in precedence order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    SavePage(String),
    SendRandom,
    SendHelp,
    SendHello,
    Unknown,
}

impl Command {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();

        if is_url(text) {
            return Command::SavePage(text.to_string());
        }

        // Telegram may send `/cmd@botname` in group chats.
        let cmd = match text.split_once('@') {
            Some((cmd, bot)) if cmd.starts_with('/') && !bot.contains(char::is_whitespace) => cmd,
            _ => text,
        };

        match cmd {
            RND_CMD => Command::SendRandom,
            HELP_CMD => Command::SendHelp,
            START_CMD => Command::SendHello,
            _ => Command::Unknown,
        }
    }
}

/// Absolute URL with an authority (`scheme://host...`). The parser would
/// otherwise accept `https:example.com` and invent a host for it.
fn is_url(text: &str) -> bool {
    let Ok(u) = url::Url::parse(text) else {
        return false;
    };
    let has_authority = text
        .get(u.scheme().len() + 1..)
        .is_some_and(|rest| rest.starts_with("//"));
    has_authority && u.host_str().is_some_and(|h| !h.is_empty())
}

pub struct CommandProcessor {
    tg: Arc<dyn TelegramApi>,
    storage: Arc<dyn Storage>,
}

impl CommandProcessor {
    pub fn new(tg: Arc<dyn TelegramApi>, storage: Arc<dyn Storage>) -> Self {
        Self { tg, storage }
    }

    async fn process_message(&self, event: Event) -> Result<()> {
        let meta = meta(event.meta).context("can't get meta")?;
        debug!(chat_id = meta.chat_id.0, sender = %meta.sender_name, "message meta");

        self.do_cmd(&event.text, meta.chat_id, &meta.sender_name)
            .await
    }

    async fn do_cmd(&self, text: &str, chat_id: ChatId, sender_name: &str) -> Result<()> {
        let cmd = Command::parse(text);
        info!(command = ?cmd, sender = %sender_name, "got new command");

        match cmd {
            Command::SavePage(url) => self
                .save_page(chat_id, Page::new(url, sender_name))
                .await
                .context("can't do command: save page"),
            Command::SendRandom => self
                .send_random(chat_id, sender_name)
                .await
                .context("can't do command: send random page"),
            Command::SendHelp => self.reply(chat_id, Reply::Help).await,
            Command::SendHello => self.reply(chat_id, Reply::Hello).await,
            Command::Unknown => self.reply(chat_id, Reply::UnknownCommand).await,
        }
    }

    async fn save_page(&self, chat_id: ChatId, page: Page) -> Result<()> {
        if self.storage.is_exists(&page).await? {
            return self.reply(chat_id, Reply::AlreadyExists).await;
        }

        self.storage.save(&page).await?;
        self.reply(chat_id, Reply::Saved).await
    }

    async fn send_random(&self, chat_id: ChatId, sender_name: &str) -> Result<()> {
        let Some(page) = self.storage.pick_random(sender_name).await? else {
            return self.reply(chat_id, Reply::NoSavedPages).await;
        };

        // The link is shown before removal; a failed remove leaves it stored.
        self.tg.send_message(chat_id, &page.url).await?;
        self.storage.remove(&page).await
    }

    async fn reply(&self, chat_id: ChatId, reply: Reply) -> Result<()> {
        self.tg.send_message(chat_id, reply.text()).await
    }
}

#[async_trait]
impl Processor for CommandProcessor {
    async fn process(&self, event: Event) -> Result<()> {
        match event.kind {
            EventKind::Message => self
                .process_message(event)
                .await
                .context("can't process message"),
            EventKind::Unknown => Err(Error::UnknownEventType.wrap("can't process message")),
        }
    }
}

fn meta(meta: Meta) -> Result<MessageMeta> {
    match meta {
        Meta::Message(m) => Ok(m),
        Meta::Unknown => Err(Error::UnknownMetaType),
    }
}
