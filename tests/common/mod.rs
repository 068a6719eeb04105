#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use checkrelay::application::workflow::CheckWorkflow;
use checkrelay::domain::directory::{Address, Directory, DirectoryEntry};
use checkrelay::domain::event::{CallbackAction, InboundEvent, MessageId, Sender};
use checkrelay::domain::ports::RecordSheet;
use checkrelay::domain::record::{CheckRecord, CheckStatus, RecordId, Verdict};
use checkrelay::error::{AppError, Result};
use checkrelay::infrastructure::in_memory::{
    InMemoryDirectoryStore, InMemoryMessenger, InMemoryRecordSheet,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub const OPERATOR: Address = Address(900);
pub const SECOND_OPERATOR: Address = Address(901);
pub const ALICE: Address = Address(1);
pub const BOB: Address = Address(2);

pub fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

/// alice has no note, bob's note is his full name.
pub fn sample_directory() -> Directory {
    let mut directory = Directory::new();
    directory.upsert("alice", DirectoryEntry::new(ALICE, ""));
    directory.upsert("bob", DirectoryEntry::new(BOB, "Robert Brown"));
    directory
}

/// Record sheet that can be told to fail appends or status updates.
#[derive(Clone, Default)]
pub struct FlakySheet {
    pub inner: InMemoryRecordSheet,
    fail_append: Arc<AtomicBool>,
    fail_update: Arc<AtomicBool>,
}

impl FlakySheet {
    pub fn fail_appends(&self, fail: bool) {
        self.fail_append.store(fail, Ordering::SeqCst);
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_update.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordSheet for FlakySheet {
    async fn append_row(&self, record: &CheckRecord, status: CheckStatus) -> Result<()> {
        if self.fail_append.load(Ordering::SeqCst) {
            return Err(AppError::ExternalStore("sheet offline".to_string()));
        }
        self.inner.append_row(record, status).await
    }

    async fn update_status(&self, id: RecordId, status: CheckStatus) -> Result<()> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(AppError::ExternalStore("sheet offline".to_string()));
        }
        self.inner.update_status(id, status).await
    }
}

pub struct Harness {
    pub workflow: Arc<CheckWorkflow>,
    pub directory: InMemoryDirectoryStore,
    pub sheet: FlakySheet,
    pub messenger: InMemoryMessenger,
}

pub fn harness() -> Harness {
    let directory = InMemoryDirectoryStore::with_directory(sample_directory());
    let sheet = FlakySheet::default();
    let messenger = InMemoryMessenger::new();
    let workflow = CheckWorkflow::new(
        Arc::new(directory.clone()),
        Arc::new(sheet.clone()),
        Arc::new(messenger.clone()),
        vec![OPERATOR, SECOND_OPERATOR],
    )
    .with_today(fixed_today);

    Harness {
        workflow: Arc::new(workflow),
        directory,
        sheet,
        messenger,
    }
}

pub fn sender(address: Address) -> Sender {
    Sender {
        address,
        username: None,
    }
}

pub fn text(from: Address, text: &str) -> InboundEvent {
    InboundEvent::from_text(sender(from), text)
}

pub fn press(from: Address, action: CallbackAction) -> InboundEvent {
    InboundEvent::Callback {
        from: sender(from),
        callback_id: format!("cb-{}", from),
        message_id: Some(MessageId(77)),
        action,
    }
}

impl Harness {
    pub async fn say(&self, from: Address, input: &str) {
        self.workflow.handle(text(from, input)).await;
    }

    pub async fn press(&self, from: Address, action: CallbackAction) {
        self.workflow.handle(press(from, action)).await;
    }

    /// Walks an operator from `/check` to the preview.
    pub async fn draft_check(
        &self,
        operator: Address,
        recipient: &str,
        date: &str,
        full_name: &str,
    ) {
        for input in ["/check", recipient, date, "100", "50", full_name] {
            self.say(operator, input).await;
        }
    }

    /// The id and verdict buttons from the latest prompt sent to `recipient`.
    pub async fn decision_for(
        &self,
        recipient: Address,
        verdict: Verdict,
    ) -> Option<(RecordId, CallbackAction)> {
        let prompts = self.messenger.sent_to(recipient).await;
        prompts.last()?.actions().into_iter().find_map(|action| match action {
            CallbackAction::Decision {
                record_id,
                verdict: v,
                ..
            } if v == verdict => Some((record_id, action)),
            _ => None,
        })
    }

    pub async fn last_text_to(&self, address: Address) -> String {
        self.messenger
            .sent_to(address)
            .await
            .last()
            .map(|message| message.text.clone())
            .unwrap_or_default()
    }
}
