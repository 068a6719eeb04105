//! Telegram Bot API transport: long polling in, `sendMessage` out.

pub mod client;
pub mod poller;
pub mod wire;

pub use client::TelegramClient;
pub use poller::Poller;
