//! Bot API payloads and their translation to and from domain types.

use crate::domain::directory::Address;
use crate::domain::event::{CallbackAction, InboundEvent, MessageId, Sender};
use crate::domain::message::Keyboard;
use serde::Deserialize;
use serde_json::{Value, json};

/// Envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

/// What the poller should do with an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    Event(InboundEvent),
    /// A button press with a payload we do not understand; only acknowledge it.
    UnknownCallback(String),
    Skip,
}

fn sender_of(user: &User) -> Sender {
    Sender {
        address: Address(user.id),
        username: user.username.clone(),
    }
}

impl Update {
    pub fn route(self) -> Routed {
        if let Some(query) = self.callback_query {
            let action = query.data.as_deref().and_then(CallbackAction::parse);
            return match action {
                Some(action) => Routed::Event(InboundEvent::Callback {
                    from: sender_of(&query.from),
                    callback_id: query.id,
                    message_id: query.message.map(|m| MessageId(m.message_id)),
                    action,
                }),
                None => {
                    tracing::debug!(payload = ?query.data, "Unknown callback payload");
                    Routed::UnknownCallback(query.id)
                }
            };
        }

        let Some(message) = self.message else {
            return Routed::Skip;
        };
        let Some(text) = message.text else {
            return Routed::Skip;
        };
        let from = match &message.from {
            Some(user) => sender_of(user),
            None => Sender {
                address: Address(message.chat.id),
                username: None,
            },
        };
        Routed::Event(InboundEvent::from_text(from, &text))
    }
}

/// `reply_markup` for a keyboard, or `None` to leave the chat's keyboard alone.
pub fn reply_markup(keyboard: &Keyboard) -> Option<Value> {
    match keyboard {
        Keyboard::Keep => None,
        Keyboard::Remove => Some(json!({ "remove_keyboard": true })),
        Keyboard::Reply(rows) => {
            let rows: Vec<Vec<Value>> = rows
                .iter()
                .map(|row| row.iter().map(|label| json!({ "text": label })).collect())
                .collect();
            Some(json!({ "keyboard": rows, "resize_keyboard": true }))
        }
        Keyboard::Inline(rows) => {
            let rows: Vec<Vec<Value>> = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|button| {
                            json!({
                                "text": button.label,
                                "callback_data": button.action.encode(),
                            })
                        })
                        .collect()
                })
                .collect();
            Some(json!({ "inline_keyboard": rows }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::{Command, PreviewChoice};
    use crate::domain::message::Button;

    fn parse(json: &str) -> Update {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_text_message_becomes_command() {
        let update = parse(
            r#"{"update_id": 7, "message": {"message_id": 1, "from": {"id": 42, "username": "boss"},
                "chat": {"id": 42}, "text": "/check"}}"#,
        );
        let Routed::Event(InboundEvent::Command { from, command }) = update.route() else {
            panic!("expected a command");
        };
        assert_eq!(from.address, Address(42));
        assert_eq!(from.username.as_deref(), Some("boss"));
        assert_eq!(command, Command::BeginWorkflow);
    }

    #[test]
    fn test_callback_becomes_action() {
        let update = parse(
            r#"{"update_id": 8, "callback_query": {"id": "cb", "from": {"id": 42},
                "message": {"message_id": 99, "chat": {"id": 42}}, "data": "preview:send"}}"#,
        );
        assert_eq!(
            update.route(),
            Routed::Event(InboundEvent::Callback {
                from: Sender {
                    address: Address(42),
                    username: None
                },
                callback_id: "cb".to_string(),
                message_id: Some(MessageId(99)),
                action: CallbackAction::Preview(PreviewChoice::Send),
            })
        );
    }

    #[test]
    fn test_unknown_callback_and_non_text() {
        let update = parse(
            r#"{"update_id": 9, "callback_query": {"id": "cb2", "from": {"id": 1}, "data": "bogus"}}"#,
        );
        assert_eq!(update.route(), Routed::UnknownCallback("cb2".to_string()));

        let update = parse(
            r#"{"update_id": 10, "message": {"message_id": 2, "chat": {"id": 5}}}"#,
        );
        assert_eq!(update.route(), Routed::Skip);
    }

    #[test]
    fn test_reply_markup_shapes() {
        assert_eq!(reply_markup(&Keyboard::Keep), None);
        assert_eq!(
            reply_markup(&Keyboard::Remove),
            Some(json!({ "remove_keyboard": true }))
        );
        assert_eq!(
            reply_markup(&Keyboard::Reply(vec![vec!["A".to_string(), "B".to_string()]])),
            Some(json!({
                "keyboard": [[{ "text": "A" }, { "text": "B" }]],
                "resize_keyboard": true
            }))
        );
        assert_eq!(
            reply_markup(&Keyboard::Inline(vec![vec![Button::new(
                "Send",
                CallbackAction::Preview(PreviewChoice::Send)
            )]])),
            Some(json!({
                "inline_keyboard": [[{ "text": "Send", "callback_data": "preview:send" }]]
            }))
        );
    }
}
