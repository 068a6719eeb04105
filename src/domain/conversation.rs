//! The check-building conversation held with one operator.
//!
//! A [`Session`] walks the operator through a fixed sequence of steps and fills a
//! [`DraftRecord`] one field at a time. It performs no I/O: the caller supplies a
//! fresh directory snapshot and today's date for every input, sends the returned
//! messages, and dispatches the draft when the outcome is [`Outcome::Submit`].

use super::directory::Directory;
use super::event::{CallbackAction, NameChoice, PreviewChoice};
use super::message::{Button, Keyboard, OutgoingMessage};
use super::record::{CheckDate, DraftRecord};
use chrono::NaiveDate;

pub const CANCEL_LABEL: &str = "❌ Cancel";
pub const TODAY_LABEL: &str = "📅 Today";
pub const ENTER_DATE_LABEL: &str = "📝 Enter date";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    AwaitingRecipient,
    AwaitingDate,
    AwaitingAmountPrimary,
    AwaitingAmountSecondary,
    /// The recipient has a note; the operator picks it or types a name.
    ChoosingFullName { note: String },
    AwaitingFullName,
    Preview,
}

/// One input directed at a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input<'a> {
    Text(&'a str),
    Preview(PreviewChoice),
    FullName(NameChoice),
}

impl<'a> Input<'a> {
    /// Conversation buttons map onto inputs; decision buttons belong to the ledger.
    pub fn from_action(action: CallbackAction) -> Option<Input<'a>> {
        match action {
            CallbackAction::Preview(choice) => Some(Input::Preview(choice)),
            CallbackAction::FullName(choice) => Some(Input::FullName(choice)),
            CallbackAction::Decision { .. } => None,
        }
    }
}

/// External facts a step may need.
pub struct StepContext<'a> {
    pub directory: &'a Directory,
    pub today: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The session goes on; send these to the operator.
    Continue(Vec<OutgoingMessage>),
    /// The operator cancelled; the session and its draft are gone.
    Cancelled(OutgoingMessage),
    /// The operator confirmed the preview. The session stays in `Preview` until
    /// the caller reports a successful dispatch.
    Submit(DraftRecord),
    /// The input does not belong to the current step.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    step: Step,
    draft: DraftRecord,
}

impl Session {
    /// Starts a session with an empty draft and returns the first prompt.
    pub fn begin() -> (Self, OutgoingMessage) {
        let session = Self {
            step: Step::AwaitingRecipient,
            draft: DraftRecord::default(),
        };
        (session, recipient_prompt())
    }

    pub fn step(&self) -> &Step {
        &self.step
    }

    pub fn draft(&self) -> &DraftRecord {
        &self.draft
    }

    pub fn handle(&mut self, input: Input<'_>, ctx: &StepContext<'_>) -> Outcome {
        if let Input::Text(text) = input
            && is_cancel(text)
        {
            self.draft = DraftRecord::default();
            let message = OutgoingMessage::text("❌ Check creation cancelled.");
            return Outcome::Cancelled(message.with_keyboard(Keyboard::Remove));
        }

        match (&self.step, input) {
            (Step::AwaitingRecipient, Input::Text(text)) => self.on_recipient(text, ctx),
            (Step::AwaitingDate, Input::Text(text)) => self.on_date(text, ctx),
            (Step::AwaitingAmountPrimary, Input::Text(text)) => match text.parse() {
                Ok(amount) => {
                    self.draft.amount_primary = amount;
                    self.step = Step::AwaitingAmountSecondary;
                    Outcome::Continue(vec![amount_prompt(2)])
                }
                Err(_) => Outcome::Continue(vec![amount_error()]),
            },
            (Step::AwaitingAmountSecondary, Input::Text(text)) => match text.parse() {
                Ok(amount) => {
                    self.draft.amount_secondary = amount;
                    Outcome::Continue(vec![self.enter_full_name(ctx)])
                }
                Err(_) => Outcome::Continue(vec![amount_error()]),
            },
            (Step::ChoosingFullName { note }, Input::FullName(NameChoice::UseNote)) => {
                let note = note.clone();
                Outcome::Continue(vec![self.finish_full_name(note)])
            }
            (Step::ChoosingFullName { .. }, Input::FullName(NameChoice::EnterManually)) => {
                self.step = Step::AwaitingFullName;
                Outcome::Continue(vec![full_name_prompt()])
            }
            (Step::ChoosingFullName { .. } | Step::AwaitingFullName, Input::Text(text)) => {
                let name = text.trim();
                if name.is_empty() {
                    Outcome::Continue(vec![full_name_prompt()])
                } else {
                    Outcome::Continue(vec![self.finish_full_name(name.to_string())])
                }
            }
            (Step::Preview, Input::Preview(PreviewChoice::Send)) => {
                Outcome::Submit(self.draft.clone())
            }
            (Step::Preview, Input::Preview(PreviewChoice::Redo)) => {
                self.draft = DraftRecord::default();
                self.step = Step::AwaitingRecipient;
                Outcome::Continue(vec![recipient_prompt()])
            }
            (Step::Preview, Input::Text(_)) => Outcome::Continue(vec![preview(&self.draft)]),
            _ => Outcome::Ignored,
        }
    }

    fn on_recipient(&mut self, text: &str, ctx: &StepContext<'_>) -> Outcome {
        let Some(resolution) = ctx.directory.resolve(text) else {
            return Outcome::Continue(vec![OutgoingMessage::text(
                "❌ User not found! Check the username, user id or note.",
            )]);
        };

        let found = OutgoingMessage::text(format!(
            "✅ Found user by {}: @{}",
            resolution.matched_by, resolution.key
        ));
        self.draft.recipient = resolution.key;
        self.step = Step::AwaitingDate;
        Outcome::Continue(vec![found, date_prompt()])
    }

    fn on_date(&mut self, text: &str, ctx: &StepContext<'_>) -> Outcome {
        let text = text.trim();
        let date = if text == TODAY_LABEL || text.eq_ignore_ascii_case("today") {
            CheckDate::new(ctx.today)
        } else if text == ENTER_DATE_LABEL {
            return Outcome::Continue(vec![OutgoingMessage::text(
                "📝 Type the date as DD.MM.YYYY:",
            )]);
        } else {
            match CheckDate::parse(text) {
                Ok(date) => date,
                Err(_) => {
                    return Outcome::Continue(vec![OutgoingMessage::text(
                        "❌ Wrong format! Use DD.MM.YYYY",
                    )]);
                }
            }
        };

        self.draft.date = date;
        self.step = Step::AwaitingAmountPrimary;
        Outcome::Continue(vec![amount_prompt(1)])
    }

    /// Offers the stored note as the full name when the recipient has one.
    fn enter_full_name(&mut self, ctx: &StepContext<'_>) -> OutgoingMessage {
        let note = ctx
            .directory
            .get(&self.draft.recipient)
            .and_then(|entry| entry.note())
            .map(str::to_string);

        match note {
            Some(note) => {
                let message = OutgoingMessage::text(format!(
                    "📛 Full name of the recipient? The note says: {}",
                    note
                ))
                .with_keyboard(Keyboard::Inline(vec![
                    vec![Button::new(
                        "✅ Use note",
                        CallbackAction::FullName(NameChoice::UseNote),
                    )],
                    vec![Button::new(
                        "✍️ Enter manually",
                        CallbackAction::FullName(NameChoice::EnterManually),
                    )],
                ]));
                self.step = Step::ChoosingFullName { note };
                message
            }
            None => {
                self.step = Step::AwaitingFullName;
                full_name_prompt()
            }
        }
    }

    fn finish_full_name(&mut self, name: String) -> OutgoingMessage {
        self.draft.full_name = name;
        self.step = Step::Preview;
        preview(&self.draft)
    }
}

fn is_cancel(text: &str) -> bool {
    let text = text.trim();
    text == CANCEL_LABEL || text.eq_ignore_ascii_case("cancel")
}

pub fn cancel_keyboard() -> Keyboard {
    Keyboard::Reply(vec![vec![CANCEL_LABEL.to_string()]])
}

fn date_keyboard() -> Keyboard {
    Keyboard::Reply(vec![
        vec![TODAY_LABEL.to_string(), ENTER_DATE_LABEL.to_string()],
        vec![CANCEL_LABEL.to_string()],
    ])
}

fn recipient_prompt() -> OutgoingMessage {
    OutgoingMessage::text("👤 Enter the recipient's username (without @), note or user id:")
        .with_keyboard(cancel_keyboard())
}

fn date_prompt() -> OutgoingMessage {
    OutgoingMessage::text("📅 Choose the check date:").with_keyboard(date_keyboard())
}

fn amount_prompt(n: u8) -> OutgoingMessage {
    OutgoingMessage::text(format!("💰 Enter amount {}:", n)).with_keyboard(cancel_keyboard())
}

fn amount_error() -> OutgoingMessage {
    OutgoingMessage::text("❌ The amount must be a whole number!")
}

fn full_name_prompt() -> OutgoingMessage {
    OutgoingMessage::text("📛 Enter the recipient's full name:").with_keyboard(cancel_keyboard())
}

fn preview(draft: &DraftRecord) -> OutgoingMessage {
    OutgoingMessage::text(format!(
        "📋 Check preview\n👤: @{}\n📅 Date: {}\n💰 Amount 1: {}\n💰 Amount 2: {}\n📛 Full name: {}",
        draft.recipient, draft.date, draft.amount_primary, draft.amount_secondary, draft.full_name
    ))
    .with_keyboard(Keyboard::Inline(vec![vec![
        Button::new("✅ Send", CallbackAction::Preview(PreviewChoice::Send)),
        Button::new("🔄 Redo", CallbackAction::Preview(PreviewChoice::Redo)),
    ]]))
}
