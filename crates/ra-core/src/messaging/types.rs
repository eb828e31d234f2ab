use crate::domain::{ChatId, UpdateId};

/// Raw inbound item from the polling endpoint, already stripped of
/// Telegram-specific fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Update {
    pub id: UpdateId,
    pub message: Option<IncomingMessage>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncomingMessage {
    pub text: String,
    pub sender_first_name: String,
    pub chat_id: ChatId,
}

impl Update {
    pub fn message(id: i64, chat_id: i64, sender: &str, text: &str) -> Self {
        Self {
            id: UpdateId(id),
            message: Some(IncomingMessage {
                text: text.to_string(),
                sender_first_name: sender.to_string(),
                chat_id: ChatId(chat_id),
            }),
        }
    }

    pub fn empty(id: i64) -> Self {
        Self {
            id: UpdateId(id),
            message: None,
        }
    }
}
