use crate::application::broadcast::broadcast;
use crate::domain::directory::Address;
use crate::domain::event::CallbackAction;
use crate::domain::message::{Button, Keyboard, OutgoingMessage};
use crate::domain::ports::{DirectoryStoreBox, MessengerBox, RecordSheetBox};
use crate::domain::record::{CheckRecord, CheckStatus, DraftRecord, RecordId, Verdict};
use crate::error::{AppError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReceipt {
    pub record: CheckRecord,
    pub recipient: Address,
    pub notified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionReport {
    pub record: CheckRecord,
    pub sheet_updated: bool,
    pub undelivered: Vec<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Applied(DecisionReport),
    /// No pending entry: it was decided already or never existed.
    Expired,
}

/// Checks handed to recipients and waiting for their answer. Each entry is
/// consumed by the first decision that reaches it.
#[derive(Clone)]
pub struct ApprovalLedger {
    entries: Arc<Mutex<HashMap<RecordId, CheckRecord>>>,
    directory: DirectoryStoreBox,
    sheet: RecordSheetBox,
    messenger: MessengerBox,
    operators: Arc<[Address]>,
}

impl ApprovalLedger {
    pub fn new(
        directory: DirectoryStoreBox,
        sheet: RecordSheetBox,
        messenger: MessengerBox,
        operators: &[Address],
    ) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            directory,
            sheet,
            messenger,
            operators: operators.into(),
        }
    }

    /// The sheet row is written before the entry exists and before the recipient
    /// hears about it.
    pub async fn dispatch(&self, draft: DraftRecord) -> Result<DispatchReceipt> {
        let recipient = self
            .directory
            .load()
            .await?
            .address_of(&draft.recipient)
            .ok_or_else(|| AppError::RecipientUnknown(draft.recipient.clone()))?;

        let record = CheckRecord::dispatch(draft);

        if let Err(e) = self.sheet.append_row(&record, CheckStatus::Pending).await {
            tracing::error!(record_id = %record.id, error = %e, "Failed to record check");
            return Err(e);
        }

        self.entries.lock().await.insert(record.id, record.clone());

        let notified = match self
            .messenger
            .send(recipient, recipient_prompt(&record, recipient))
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    record_id = %record.id,
                    %recipient,
                    error = %e,
                    "Check recorded but recipient could not be notified"
                );
                false
            }
        };

        tracing::info!(
            record_id = %record.id,
            recipient = %record.draft.recipient,
            notified,
            "Check dispatched"
        );
        Ok(DispatchReceipt {
            record,
            recipient,
            notified,
        })
    }

    pub async fn decide(&self, record_id: RecordId, verdict: Verdict) -> Result<Decision> {
        // the verdict stands even if the sheet update below fails
        let taken = self.entries.lock().await.remove(&record_id);
        let Some(mut record) = taken else {
            tracing::info!(%record_id, "Decision for expired or unknown check");
            return Ok(Decision::Expired);
        };

        record.decide(verdict)?;

        let sheet_updated = match self.sheet.update_status(record.id, record.status).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(%record_id, error = %e, "Failed to update check status");
                false
            }
        };

        let summary = operator_summary(&record, sheet_updated);
        let undelivered = broadcast(self.messenger.as_ref(), &self.operators, &summary).await;

        tracing::info!(%record_id, status = %record.status, sheet_updated, "Check decided");
        Ok(Decision::Applied(DecisionReport {
            record,
            sheet_updated,
            undelivered,
        }))
    }

    pub async fn pending(&self, record_id: RecordId) -> Option<CheckRecord> {
        self.entries.lock().await.get(&record_id).cloned()
    }

    pub async fn pending_count(&self) -> usize {
        self.entries.lock().await.len()
    }
}

fn recipient_prompt(record: &CheckRecord, recipient: Address) -> OutgoingMessage {
    let draft = &record.draft;
    let decision = |verdict| CallbackAction::Decision {
        recipient,
        record_id: record.id,
        verdict,
    };

    OutgoingMessage::text(format!(
        "🔔 You have a check to confirm:\n📅 Date: {}\n💰 Amount 1: {}\n💰 Amount 2: {}\n📛 Full name: {}\nStatus: Pending ⏳",
        draft.date, draft.amount_primary, draft.amount_secondary, draft.full_name
    ))
    .with_keyboard(Keyboard::Inline(vec![
        vec![Button::new("✔ Confirm", decision(Verdict::Accept))],
        vec![Button::new("✖ Reject", decision(Verdict::Reject))],
    ]))
}

fn operator_summary(record: &CheckRecord, sheet_updated: bool) -> OutgoingMessage {
    let draft = &record.draft;
    let status = match (sheet_updated, record.status) {
        (false, _) => "Error ❌",
        (true, CheckStatus::Accepted) => "Accepted ✅",
        (true, CheckStatus::Rejected) => "Rejected ❌",
        (true, CheckStatus::Pending) => "Pending ⏳",
    };

    OutgoingMessage::text(format!(
        "📊 Check for @{} ({})\nAmounts: {}/{}\nFull name: {}\nStatus: {}",
        draft.recipient,
        draft.date,
        draft.amount_primary,
        draft.amount_secondary,
        draft.full_name,
        status
    ))
}
