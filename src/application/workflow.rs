use crate::application::broadcast::broadcast;
use crate::application::ledger::{ApprovalLedger, Decision};
use crate::domain::conversation::{Input, Outcome, Session, StepContext};
use crate::domain::directory::{Address, DirectoryEntry};
use crate::domain::event::{CallbackAction, Command, InboundEvent, MessageId, Sender};
use crate::domain::message::{Keyboard, OutgoingMessage};
use crate::domain::ports::{DirectoryStoreBox, MessengerBox, RecordSheetBox};
use crate::domain::record::{RecordId, Verdict};
use crate::error::{AppError, Result};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

/// One operator's conversation. `None` once it has ended.
type SessionSlot = Arc<Mutex<Option<Session>>>;

/// Routes inbound events to commands, conversation sessions and the ledger.
///
/// Safe to call concurrently, but callers must feed one chat's events in order
/// (see `SenderLanes`).
pub struct CheckWorkflow {
    directory: DirectoryStoreBox,
    messenger: MessengerBox,
    ledger: ApprovalLedger,
    operators: Vec<Address>,
    operator_set: HashSet<Address>,
    sessions: Mutex<HashMap<Address, SessionSlot>>,
    today: fn() -> NaiveDate,
}

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

impl CheckWorkflow {
    pub fn new(
        directory: DirectoryStoreBox,
        sheet: RecordSheetBox,
        messenger: MessengerBox,
        operators: Vec<Address>,
    ) -> Self {
        let ledger = ApprovalLedger::new(directory.clone(), sheet, messenger.clone(), &operators);
        Self {
            directory,
            messenger,
            ledger,
            operator_set: operators.iter().copied().collect(),
            operators,
            sessions: Mutex::new(HashMap::new()),
            today: local_today,
        }
    }

    /// Replaces the clock used for "today".
    pub fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn ledger(&self) -> &ApprovalLedger {
        &self.ledger
    }

    pub fn is_operator(&self, address: Address) -> bool {
        self.operator_set.contains(&address)
    }

    /// Whether `operator` has a conversation in progress.
    pub async fn has_session(&self, operator: Address) -> bool {
        let slot = self.sessions.lock().await.get(&operator).cloned();
        match slot {
            Some(slot) => slot.lock().await.is_some(),
            None => false,
        }
    }

    /// Failures are logged and reported to the sender.
    pub async fn handle(&self, event: InboundEvent) {
        let sender = event.sender().address;
        if let Err(e) = self.route(event).await {
            tracing::error!(%sender, error = %e, "Failed to handle event");
            let notice = OutgoingMessage::text(format!("⚠️ Something went wrong: {}", e));
            if let Err(e) = self.messenger.send(sender, notice).await {
                tracing::warn!(%sender, error = %e, "Failed to report error");
            }
        }
    }

    async fn route(&self, event: InboundEvent) -> Result<()> {
        match event {
            InboundEvent::Command { from, command } => self.on_command(from, command).await,
            InboundEvent::InvalidCommand { from, usage } => {
                if !self.is_operator(from.address) {
                    return self.refuse(from.address).await;
                }
                self.reply(from.address, OutgoingMessage::text(format!("❌ {}", usage)))
                    .await
            }
            InboundEvent::Text { from, text } => {
                self.on_input(from.address, Input::Text(&text)).await
            }
            InboundEvent::Callback {
                from,
                callback_id,
                message_id,
                action,
            } => {
                if let Err(e) = self.messenger.acknowledge(&callback_id).await {
                    tracing::debug!(error = %e, "Failed to acknowledge callback");
                }
                match action {
                    CallbackAction::Decision {
                        recipient,
                        record_id,
                        verdict,
                    } => {
                        self.on_decision(from, message_id, recipient, record_id, verdict)
                            .await
                    }
                    other => match Input::from_action(other) {
                        Some(input) => self.on_input(from.address, input).await,
                        None => Ok(()),
                    },
                }
            }
        }
    }

    async fn on_command(&self, from: Sender, command: Command) -> Result<()> {
        if command.is_privileged() && !self.is_operator(from.address) {
            return self.refuse(from.address).await;
        }

        match command {
            Command::Start => self.on_start(from).await,
            Command::BeginWorkflow => {
                let (session, prompt) = Session::begin();
                let slot = self.slot(from.address).await;
                *slot.lock().await = Some(session);
                tracing::info!(operator = %from.address, "Check conversation started");
                self.reply(from.address, prompt).await
            }
            Command::AddEntry { key, address, note } => {
                let mut directory = self.directory.load().await?;
                directory.upsert(&key, DirectoryEntry::new(address, note.clone()));
                self.directory.save(&directory).await?;
                self.reply(
                    from.address,
                    OutgoingMessage::text(format!(
                        "✅ User @{} (ID: {}) added! Note: {}",
                        key, address, note
                    )),
                )
                .await
            }
            Command::ListDirectory => {
                let directory = self.directory.load().await?;
                let text = if directory.is_empty() {
                    "📂 The user list is empty.".to_string()
                } else {
                    let lines: Vec<String> = directory
                        .iter()
                        .map(|(key, entry)| {
                            format!(
                                "@{} -> {} | Note: {}",
                                key,
                                entry.address,
                                entry.note().unwrap_or("no note")
                            )
                        })
                        .collect();
                    format!("📋 Users:\n{}", lines.join("\n"))
                };
                self.reply(from.address, OutgoingMessage::text(text)).await
            }
            Command::SetNote { key, note } => {
                let mut directory = self.directory.load().await?;
                match directory.set_note(&key, note) {
                    Ok(()) => {
                        self.directory.save(&directory).await?;
                        self.reply(
                            from.address,
                            OutgoingMessage::text(format!("✅ Note for @{} updated!", key)),
                        )
                        .await
                    }
                    Err(AppError::EntryNotFound(key)) => {
                        self.reply(
                            from.address,
                            OutgoingMessage::text(format!("❌ User @{} not found!", key)),
                        )
                        .await
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }

    /// Registers the caller and tells operators about non-operator newcomers.
    async fn on_start(&self, from: Sender) -> Result<()> {
        if let Some(username) = from.username.as_deref() {
            let mut directory = self.directory.load().await?;
            let is_new = directory.register(username, from.address);
            self.directory.save(&directory).await?;
            tracing::info!(%username, address = %from.address, is_new, "User registered");
        }

        if !self.is_operator(from.address) {
            let notice = OutgoingMessage::text(format!(
                "👤 New user: @{} (ID: {})",
                from.username.as_deref().unwrap_or("unknown"),
                from.address
            ));
            broadcast(self.messenger.as_ref(), &self.operators, &notice).await;
        }

        self.reply(
            from.address,
            OutgoingMessage::text(
                "🌟 Welcome to the check bot!\nOperators can use /check to create a new check.",
            ),
        )
        .await
    }

    async fn on_input(&self, operator: Address, input: Input<'_>) -> Result<()> {
        let slot = self.sessions.lock().await.get(&operator).cloned();
        let Some(slot) = slot else {
            tracing::debug!(%operator, "Input without a conversation, dropped");
            return Ok(());
        };

        let mut guard = slot.lock().await;
        let Some(session) = guard.as_mut() else {
            tracing::debug!(%operator, "Input for a finished conversation, dropped");
            return Ok(());
        };

        let directory = self.directory.load().await?;
        let ctx = StepContext {
            directory: &directory,
            today: (self.today)(),
        };

        match session.handle(input, &ctx) {
            Outcome::Continue(messages) => {
                for message in messages {
                    self.reply(operator, message).await?;
                }
                Ok(())
            }
            Outcome::Cancelled(message) => {
                *guard = None;
                tracing::info!(%operator, "Check conversation cancelled");
                self.reply(operator, message).await
            }
            Outcome::Submit(draft) => match self.ledger.dispatch(draft).await {
                Ok(receipt) => {
                    *guard = None;
                    let text = if receipt.notified {
                        format!("✅ Check sent to @{}!", receipt.record.draft.recipient)
                    } else {
                        format!(
                            "⚠️ Check saved as pending, but @{} could not be reached.",
                            receipt.record.draft.recipient
                        )
                    };
                    let message = OutgoingMessage::text(text).with_keyboard(Keyboard::Remove);
                    self.reply(operator, message).await
                }
                Err(AppError::RecipientUnknown(key)) => {
                    self.reply(
                        operator,
                        OutgoingMessage::text(format!("❌ User @{} not found!", key)),
                    )
                    .await
                }
                Err(e) => {
                    self.reply(
                        operator,
                        OutgoingMessage::text(format!("❌ Failed to save the check: {}", e)),
                    )
                    .await
                }
            },
            Outcome::Ignored => {
                tracing::debug!(
                    %operator,
                    step = ?session.step(),
                    "Input does not fit the current step"
                );
                Ok(())
            }
        }
    }

    async fn on_decision(
        &self,
        from: Sender,
        message_id: Option<MessageId>,
        recipient: Address,
        record_id: RecordId,
        verdict: Verdict,
    ) -> Result<()> {
        if from.address != recipient {
            tracing::warn!(
                %record_id,
                presser = %from.address,
                %recipient,
                "Decision from a different chat refused"
            );
            return self
                .reply(
                    from.address,
                    OutgoingMessage::text("🚫 This check was not sent to you."),
                )
                .await;
        }

        match self.ledger.decide(record_id, verdict).await? {
            Decision::Expired => {
                self.reply(
                    from.address,
                    OutgoingMessage::text("❌ The check is expired or not found!"),
                )
                .await
            }
            Decision::Applied(report) => {
                if let Some(message_id) = message_id
                    && let Err(e) = self.messenger.clear_buttons(from.address, message_id).await
                {
                    tracing::warn!(%record_id, error = %e, "Failed to remove decision buttons");
                }

                let text = match (report.sheet_updated, verdict) {
                    (false, _) => "❌ Failed to update the check status!",
                    (true, Verdict::Accept) => "✅ Check confirmed!",
                    (true, Verdict::Reject) => "❌ Check rejected!",
                };
                self.reply(from.address, OutgoingMessage::text(text)).await
            }
        }
    }

    async fn refuse(&self, to: Address) -> Result<()> {
        self.reply(
            to,
            OutgoingMessage::text("🚫 This command is only available to operators."),
        )
        .await
    }

    async fn reply(&self, to: Address, message: OutgoingMessage) -> Result<()> {
        self.messenger.send(to, message).await
    }

    async fn slot(&self, operator: Address) -> SessionSlot {
        self.sessions
            .lock()
            .await
            .entry(operator)
            .or_default()
            .clone()
    }
}
