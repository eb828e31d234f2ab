//! Core of the read-later adviser bot.
//!
//! Framework-agnostic: Telegram and the persistence engines live behind ports
//! (`messaging::port::TelegramApi`, `storage::Storage`) implemented in adapter
//! crates. The fetch → process → store loop is `consumer::Consumer`.

pub mod config;
pub mod consumer;
pub mod domain;
pub mod errors;
pub mod events;
pub mod logging;
pub mod messages;
pub mod messaging;
pub mod processor;
pub mod storage;
pub mod translator;

#[cfg(test)]
mod testing;

pub use errors::{Error, Result};
