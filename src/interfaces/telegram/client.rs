use super::wire::{ApiResponse, Update, User, reply_markup};
use crate::domain::directory::Address;
use crate::domain::event::MessageId;
use crate::domain::message::OutgoingMessage;
use crate::domain::ports::Messenger;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;

/// Headroom on top of the long-poll timeout before the HTTP request gives up.
const REQUEST_SLACK: Duration = Duration::from_secs(10);

/// Thin Bot API client over HTTPS.
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
}

fn transport(err: reqwest::Error) -> AppError {
    // the request url carries the bot token
    AppError::Transport(err.without_url().to_string())
}

impl TelegramClient {
    pub fn new(api_url: &str, token: &str, poll_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(poll_timeout + REQUEST_SLACK)
            .build()
            .map_err(transport)?;
        Ok(Self {
            http,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Result<T> {
        let response = self
            .http
            .post(format!("{}/{}", self.base_url, method))
            .json(body)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let reply: ApiResponse<T> = response.json().await.map_err(transport)?;
        match reply {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse { description, .. } => Err(AppError::Transport(format!(
                "{} failed ({}): {}",
                method,
                status,
                description.unwrap_or_else(|| "no description".to_string())
            ))),
        }
    }

    /// Identifies the bot. Used at startup to prove the token and endpoint work.
    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", &json!({})).await
    }

    /// Long-polls for updates after `offset`.
    pub async fn get_updates(&self, offset: i64, timeout: Duration) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": timeout.as_secs(),
                "allowed_updates": ["message", "callback_query"],
            }),
        )
        .await
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send(&self, to: Address, message: OutgoingMessage) -> Result<()> {
        let mut body = json!({ "chat_id": to.0, "text": message.text });
        if let Some(markup) = reply_markup(&message.keyboard) {
            body["reply_markup"] = markup;
        }
        self.call::<Value>("sendMessage", &body).await?;
        Ok(())
    }

    async fn clear_buttons(&self, to: Address, message_id: MessageId) -> Result<()> {
        self.call::<Value>(
            "editMessageReplyMarkup",
            &json!({ "chat_id": to.0, "message_id": message_id.0 }),
        )
        .await?;
        Ok(())
    }

    async fn acknowledge(&self, callback_id: &str) -> Result<()> {
        self.call::<Value>(
            "answerCallbackQuery",
            &json!({ "callback_query_id": callback_id }),
        )
        .await?;
        Ok(())
    }
}
