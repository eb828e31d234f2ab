//! Internal event model shared by the translator, the processor and the consumer.

use async_trait::async_trait;

use crate::{domain::ChatId, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    Message,
    Unknown,
}

/// Per-event metadata. Only message events carry a payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Meta {
    Unknown,
    Message(MessageMeta),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageMeta {
    pub chat_id: ChatId,
    pub sender_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub text: String,
    pub meta: Meta,
}

impl Event {
    pub fn message(
        chat_id: ChatId,
        sender_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            kind: EventKind::Message,
            text: text.into(),
            meta: Meta::Message(MessageMeta {
                chat_id,
                sender_name: sender_name.into(),
            }),
        }
    }

    pub fn unknown() -> Self {
        Self {
            kind: EventKind::Unknown,
            text: String::new(),
            meta: Meta::Unknown,
        }
    }
}

/// Source of event batches. Implementations own the polling cursor.
#[async_trait]
pub trait Fetcher: Send {
    async fn fetch(&mut self, limit: usize) -> Result<Vec<Event>>;
}

/// Handles one event at a time.
#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, event: Event) -> Result<()>;
}
