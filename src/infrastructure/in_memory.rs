use crate::domain::directory::{Address, Directory};
use crate::domain::event::MessageId;
use crate::domain::message::OutgoingMessage;
use crate::domain::ports::{DirectoryStore, Messenger, RecordSheet};
use crate::domain::record::{CheckRecord, CheckStatus, RecordId};
use crate::error::{AppError, Result};
use crate::infrastructure::csv_sheet::{SHEET_HEADER, record_row, set_status, status_column};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A directory kept in memory. Useful for tests and throwaway runs.
#[derive(Default, Clone)]
pub struct InMemoryDirectoryStore {
    directory: Arc<RwLock<Directory>>,
}

impl InMemoryDirectoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_directory(directory: Directory) -> Self {
        Self {
            directory: Arc::new(RwLock::new(directory)),
        }
    }
}

#[async_trait]
impl DirectoryStore for InMemoryDirectoryStore {
    async fn load(&self) -> Result<Directory> {
        Ok(self.directory.read().await.clone())
    }

    async fn save(&self, directory: &Directory) -> Result<()> {
        *self.directory.write().await = directory.clone();
        Ok(())
    }
}

/// Rows of cells with the CSV sheet's layout, header row first.
#[derive(Clone)]
pub struct InMemoryRecordSheet {
    rows: Arc<RwLock<Vec<Vec<String>>>>,
}

impl Default for InMemoryRecordSheet {
    fn default() -> Self {
        let header = SHEET_HEADER.iter().map(|s| s.to_string()).collect();
        Self {
            rows: Arc::new(RwLock::new(vec![header])),
        }
    }
}

impl InMemoryRecordSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn rows(&self) -> Vec<Vec<String>> {
        self.rows.read().await.clone()
    }

    pub async fn status_of(&self, id: RecordId) -> Option<String> {
        let rows = self.rows.read().await;
        let column = status_column(rows.first()?)?;
        let id = id.to_string();
        rows.iter()
            .skip(1)
            .find(|row| row.first() == Some(&id))
            .and_then(|row| row.get(column).cloned())
    }
}

#[async_trait]
impl RecordSheet for InMemoryRecordSheet {
    async fn append_row(&self, record: &CheckRecord, status: CheckStatus) -> Result<()> {
        self.rows.write().await.push(record_row(record, status));
        Ok(())
    }

    async fn update_status(&self, id: RecordId, status: CheckStatus) -> Result<()> {
        set_status(&mut self.rows.write().await, id, status)
    }
}

/// Records everything it is asked to deliver. Unreachable addresses fail.
#[derive(Default, Clone)]
pub struct InMemoryMessenger {
    outbox: Arc<RwLock<Vec<(Address, OutgoingMessage)>>>,
    cleared: Arc<RwLock<Vec<(Address, MessageId)>>>,
    acknowledged: Arc<RwLock<Vec<String>>>,
    unreachable: Arc<RwLock<HashSet<Address>>>,
}

impl InMemoryMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn mark_unreachable(&self, address: Address) {
        self.unreachable.write().await.insert(address);
    }

    pub async fn outbox(&self) -> Vec<(Address, OutgoingMessage)> {
        self.outbox.read().await.clone()
    }

    pub async fn sent_to(&self, address: Address) -> Vec<OutgoingMessage> {
        self.outbox
            .read()
            .await
            .iter()
            .filter(|(to, _)| *to == address)
            .map(|(_, message)| message.clone())
            .collect()
    }

    pub async fn cleared(&self) -> Vec<(Address, MessageId)> {
        self.cleared.read().await.clone()
    }

    pub async fn acknowledged(&self) -> Vec<String> {
        self.acknowledged.read().await.clone()
    }

    async fn check_reachable(&self, address: Address) -> Result<()> {
        if self.unreachable.read().await.contains(&address) {
            return Err(AppError::Transport(format!("chat {} not found", address)));
        }
        Ok(())
    }
}

#[async_trait]
impl Messenger for InMemoryMessenger {
    async fn send(&self, to: Address, message: OutgoingMessage) -> Result<()> {
        self.check_reachable(to).await?;
        self.outbox.write().await.push((to, message));
        Ok(())
    }

    async fn clear_buttons(&self, to: Address, message_id: MessageId) -> Result<()> {
        self.check_reachable(to).await?;
        self.cleared.write().await.push((to, message_id));
        Ok(())
    }

    async fn acknowledge(&self, callback_id: &str) -> Result<()> {
        self.acknowledged.write().await.push(callback_id.to_string());
        Ok(())
    }
}
