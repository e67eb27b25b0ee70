//! Messaging transport.
//!
//! The core only needs [`Messenger::send`]; the rest is used by the command
//! poller and menu handler. [`TelegramClient`] talks to the Bot API.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::error::MessengerError;
use crate::models::telegram::ApiResponse;
use crate::models::{InlineKeyboard, Update, UserId};

#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, chat_id: UserId, text: &str) -> Result<(), MessengerError>;

    async fn send_with_keyboard(
        &self,
        chat_id: UserId,
        text: &str,
        keyboard: &InlineKeyboard,
    ) -> Result<(), MessengerError>;

    async fn answer_callback(&self, callback_id: &str) -> Result<(), MessengerError>;

    /// Pending updates with `update_id >= offset`.
    async fn poll_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, MessengerError>;
}

#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    api_url: String,
    token: String,
}

impl TelegramClient {
    pub fn new(http: Client, api_url: &str, token: String) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<Option<T>, MessengerError> {
        let res = self.http.post(self.method_url(method)).json(&body).send().await?;
        let envelope = res.json::<ApiResponse<T>>().await?;

        if !envelope.ok {
            return Err(MessengerError::Api {
                method: method.to_string(),
                description: envelope.description.unwrap_or_default(),
            });
        }
        Ok(envelope.result)
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send(&self, chat_id: UserId, text: &str) -> Result<(), MessengerError> {
        let body = json!({ "chat_id": chat_id, "text": text, "parse_mode": "HTML" });
        self.call::<serde_json::Value>("sendMessage", body).await?;
        Ok(())
    }

    async fn send_with_keyboard(
        &self,
        chat_id: UserId,
        text: &str,
        keyboard: &InlineKeyboard,
    ) -> Result<(), MessengerError> {
        let body = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
            "reply_markup": keyboard,
        });
        self.call::<serde_json::Value>("sendMessage", body).await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), MessengerError> {
        let body = json!({ "callback_query_id": callback_id });
        self.call::<serde_json::Value>("answerCallbackQuery", body).await?;
        Ok(())
    }

    async fn poll_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, MessengerError> {
        let mut body = json!({ "timeout": 0 });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }
        let updates = self.call::<Vec<Update>>("getUpdates", body).await?;
        Ok(updates.unwrap_or_default())
    }
}
