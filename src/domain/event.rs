use super::directory::{Address, normalize_key};
use super::record::{RecordId, Verdict};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(pub i64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub address: Address,
    pub username: Option<String>,
}

/// Everything the workflow reacts to, already parsed by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Command {
        from: Sender,
        command: Command,
    },
    /// A recognised command with unusable arguments.
    InvalidCommand {
        from: Sender,
        usage: String,
    },
    Text {
        from: Sender,
        text: String,
    },
    Callback {
        from: Sender,
        callback_id: String,
        message_id: Option<MessageId>,
        action: CallbackAction,
    },
}

impl InboundEvent {
    pub fn sender(&self) -> &Sender {
        match self {
            InboundEvent::Command { from, .. }
            | InboundEvent::InvalidCommand { from, .. }
            | InboundEvent::Text { from, .. }
            | InboundEvent::Callback { from, .. } => from,
        }
    }

    pub fn from_text(from: Sender, text: &str) -> Self {
        match Command::parse(text) {
            Some(Ok(command)) => InboundEvent::Command { from, command },
            Some(Err(AppError::ValidationError(usage))) => {
                InboundEvent::InvalidCommand { from, usage }
            }
            Some(Err(e)) => InboundEvent::InvalidCommand {
                from,
                usage: e.to_string(),
            },
            None => InboundEvent::Text {
                from,
                text: text.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    BeginWorkflow,
    AddEntry {
        key: String,
        address: Address,
        note: String,
    },
    ListDirectory,
    SetNote {
        key: String,
        note: String,
    },
}

pub const ADD_USER_USAGE: &str = "Usage: /add_user <username> <user_id> [note]";
pub const SET_NOTE_USAGE: &str = "Usage: /set_note <username> <note>";

impl Command {
    /// `None` when the text is not a known command.
    pub fn parse(text: &str) -> Option<Result<Command, AppError>> {
        let text = text.trim();
        let rest = text.strip_prefix('/')?;
        let head = rest.split_whitespace().next().unwrap_or_default();
        // Group chats address commands as /name@bot.
        let name = head.split('@').next().unwrap_or_default();

        let command = match name {
            "start" => Ok(Command::Start),
            "check" => Ok(Command::BeginWorkflow),
            "list_users" => Ok(Command::ListDirectory),
            "add_user" => {
                let args = split_args(text, 4);
                if args.len() < 3 {
                    Err(AppError::ValidationError(ADD_USER_USAGE.to_string()))
                } else if !args[2].bytes().all(|b| b.is_ascii_digit()) {
                    Err(AppError::ValidationError("user_id must be a number".to_string()))
                } else {
                    args[2].parse::<Address>().map(|address| Command::AddEntry {
                        key: normalize_key(args[1]),
                        address,
                        note: args.get(3).map(|s| s.to_string()).unwrap_or_default(),
                    })
                }
            }
            "set_note" => {
                let args = split_args(text, 3);
                if args.len() < 3 {
                    Err(AppError::ValidationError(SET_NOTE_USAGE.to_string()))
                } else {
                    Ok(Command::SetNote {
                        key: normalize_key(args[1]),
                        note: args[2].to_string(),
                    })
                }
            }
            _ => return None,
        };
        Some(command)
    }

    pub fn is_privileged(&self) -> bool {
        !matches!(self, Command::Start)
    }
}

/// Splits on runs of whitespace into at most `max` parts; the last part keeps
/// its inner whitespace.
fn split_args(text: &str, max: usize) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = text.trim();
    while !rest.is_empty() {
        if parts.len() + 1 == max {
            parts.push(rest);
            break;
        }
        match rest.find(char::is_whitespace) {
            Some(i) => {
                parts.push(&rest[..i]);
                rest = rest[i..].trim_start();
            }
            None => {
                parts.push(rest);
                break;
            }
        }
    }
    parts
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewChoice {
    Send,
    Redo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameChoice {
    UseNote,
    EnterManually,
}

/// Button payloads, decoded once at the transport boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    Preview(PreviewChoice),
    FullName(NameChoice),
    Decision {
        recipient: Address,
        record_id: RecordId,
        verdict: Verdict,
    },
}

impl CallbackAction {
    /// Wire form, at most 64 bytes.
    pub fn encode(&self) -> String {
        match self {
            CallbackAction::Preview(PreviewChoice::Send) => "preview:send".to_string(),
            CallbackAction::Preview(PreviewChoice::Redo) => "preview:redo".to_string(),
            CallbackAction::FullName(NameChoice::UseNote) => "name:note".to_string(),
            CallbackAction::FullName(NameChoice::EnterManually) => "name:manual".to_string(),
            CallbackAction::Decision {
                recipient,
                record_id,
                verdict,
            } => {
                let tag = match verdict {
                    Verdict::Accept => "accept",
                    Verdict::Reject => "reject",
                };
                format!("{}:{}:{}", tag, recipient, record_id)
            }
        }
    }

    pub fn parse(payload: &str) -> Option<Self> {
        match payload {
            "preview:send" => return Some(CallbackAction::Preview(PreviewChoice::Send)),
            "preview:redo" => return Some(CallbackAction::Preview(PreviewChoice::Redo)),
            "name:note" => return Some(CallbackAction::FullName(NameChoice::UseNote)),
            "name:manual" => return Some(CallbackAction::FullName(NameChoice::EnterManually)),
            _ => {}
        }

        let mut parts = payload.splitn(3, ':');
        let verdict = match parts.next()? {
            "accept" => Verdict::Accept,
            "reject" => Verdict::Reject,
            _ => return None,
        };
        let recipient = parts.next()?.parse::<Address>().ok()?;
        let record_id = parts.next()?.parse::<RecordId>().ok()?;
        Some(CallbackAction::Decision {
            recipient,
            record_id,
            verdict,
        })
    }
}
