use super::event::CallbackAction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: CallbackAction,
}

impl Button {
    pub fn new(label: impl Into<String>, action: CallbackAction) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

/// Keyboard attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Keyboard {
    /// Leave whatever keyboard the chat currently shows.
    #[default]
    Keep,
    /// Persistent reply keyboard; each label is sent back as plain text.
    Reply(Vec<Vec<String>>),
    /// Hide the reply keyboard.
    Remove,
    /// Buttons attached to the message itself.
    Inline(Vec<Vec<Button>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub text: String,
    pub keyboard: Keyboard,
}

impl OutgoingMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: Keyboard::Keep,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = keyboard;
        self
    }

    /// Payloads of all inline buttons, row by row.
    pub fn actions(&self) -> Vec<CallbackAction> {
        match &self.keyboard {
            Keyboard::Inline(rows) => rows.iter().flatten().map(|b| b.action).collect(),
            _ => Vec::new(),
        }
    }
}
