use super::directory::{Address, Directory};
use super::event::MessageId;
use super::message::OutgoingMessage;
use super::record::{CheckRecord, CheckStatus, RecordId};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Durable recipient directory. Loaded before every lookup, saved after every change.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn load(&self) -> Result<Directory>;
    async fn save(&self, directory: &Directory) -> Result<()>;
}

/// External record-of-truth for dispatched checks, one row per check.
#[async_trait]
pub trait RecordSheet: Send + Sync {
    /// Appends a row for `record` carrying `status`.
    async fn append_row(&self, record: &CheckRecord, status: CheckStatus) -> Result<()>;
    /// Rewrites the status cell of the first row whose id column equals `id`.
    async fn update_status(&self, id: RecordId, status: CheckStatus) -> Result<()>;
}

/// Outbound side of the chat transport.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, to: Address, message: OutgoingMessage) -> Result<()>;
    /// Removes the inline buttons from a message sent earlier.
    async fn clear_buttons(&self, to: Address, message_id: MessageId) -> Result<()>;
    /// Tells the transport a button press has been handled.
    async fn acknowledge(&self, callback_id: &str) -> Result<()>;
}

pub type DirectoryStoreBox = Arc<dyn DirectoryStore>;
pub type RecordSheetBox = Arc<dyn RecordSheet>;
pub type MessengerBox = Arc<dyn Messenger>;
