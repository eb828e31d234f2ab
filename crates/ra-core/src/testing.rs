//! In-process fakes shared by unit tests.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

use async_trait::async_trait;

use crate::{
    domain::{ChatId, UpdateId},
    messaging::{port::TelegramApi, types::Update},
    Error, Result,
};

/// Fake Bot API: serves queued updates by offset and records replies.
#[derive(Default)]
pub struct FakeTelegram {
    pool: Mutex<Vec<Update>>,
    offsets: Mutex<Vec<UpdateId>>,
    sent: Mutex<Vec<(ChatId, String)>>,
    fail_fetch: AtomicBool,
    fail_send: AtomicBool,
}

impl FakeTelegram {
    pub fn push_batch(&self, updates: Vec<Update>) {
        self.pool.lock().unwrap().extend(updates);
    }

    pub fn fail_next_fetch(&self) {
        self.fail_fetch.store(true, Ordering::SeqCst);
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_send.store(fail, Ordering::SeqCst);
    }

    pub fn requested_offsets(&self) -> Vec<UpdateId> {
        self.offsets.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<(ChatId, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, t)| t).collect()
    }
}

#[async_trait]
impl TelegramApi for FakeTelegram {
    async fn updates(&self, offset: UpdateId, limit: usize) -> Result<Vec<Update>> {
        self.offsets.lock().unwrap().push(offset);
        if self.fail_fetch.swap(false, Ordering::SeqCst) {
            return Err(Error::transport("connection reset"));
        }

        let mut out: Vec<Update> = self
            .pool
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.id >= offset)
            .cloned()
            .collect();
        out.sort_by_key(|u| u.id);
        out.truncate(limit);
        Ok(out)
    }

    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<()> {
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(Error::transport("chat not found"));
        }
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }
}
