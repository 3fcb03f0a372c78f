// Thin client for the Telegram Bot API: https://core.telegram.org/bots/api

pub mod models;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;

pub use crate::models::{
    ApiResponse, CallbackQuery, Chat, ChatMember, InlineKeyboardButton, InlineKeyboardMarkup,
    Message, Update, User,
};

#[derive(Debug, Error)]
pub enum TelegramError {
    /// The recipient has blocked the bot, or the bot was kicked (API 403).
    /// Callers treat this as a permanent per-recipient condition, distinct
    /// from transient failures.
    #[error("recipient has blocked the bot")]
    Forbidden,

    #[error("telegram api error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct TelegramOptions {
    pub bot_token: String,
}

#[derive(Debug, Clone)]
pub struct TelegramService {
    options: TelegramOptions,
    client: Client,
}

impl TelegramService {
    pub fn new(options: TelegramOptions) -> Self {
        Self {
            options,
            client: Client::new(),
        }
    }

    fn url(&self, method: &str) -> String {
        format!(
            "https://api.telegram.org/bot{token}/{method}",
            token = self.options.bot_token
        )
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T, TelegramError> {
        let response = self
            .client
            .post(self.url(method))
            .json(&body)
            .send()
            .await?;

        let envelope: ApiResponse<T> = response.json().await?;
        if envelope.ok {
            return envelope.result.ok_or(TelegramError::Api {
                code: 0,
                description: "response envelope missing result".to_string(),
            });
        }

        let code = envelope.error_code.unwrap_or(0);
        let description = envelope.description.unwrap_or_default();
        if code == 403 {
            Err(TelegramError::Forbidden)
        } else {
            Err(TelegramError::Api { code, description })
        }
    }

    /// Identify the bot account (used for building referral deep links).
    pub async fn get_me(&self) -> Result<User, TelegramError> {
        self.call("getMe", json!({})).await
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<Message, TelegramError> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
        });
        if let Some(markup) = reply_markup {
            body["reply_markup"] = serde_json::to_value(markup)
                .expect("keyboard markup serializes");
        }
        self.call("sendMessage", body).await
    }

    /// Long-poll for updates. `timeout_secs` is the server-side hold time.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        let mut body = json!({
            "timeout": timeout_secs,
            "allowed_updates": ["message", "callback_query"],
        });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }
        self.call("getUpdates", body).await
    }

    /// Look up a user's membership in a chat. `chat_id` accepts either a
    /// numeric id or an `@channelname` handle.
    pub async fn get_chat_member(
        &self,
        chat_id: &str,
        user_id: i64,
    ) -> Result<ChatMember, TelegramError> {
        self.call(
            "getChatMember",
            json!({
                "chat_id": chat_id,
                "user_id": user_id,
            }),
        )
        .await
    }

    /// Acknowledge a callback query so the client stops its spinner.
    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
    ) -> Result<(), TelegramError> {
        self.call::<bool>(
            "answerCallbackQuery",
            json!({ "callback_query_id": callback_query_id }),
        )
        .await
        .map(|_| ())
    }

    pub async fn set_webhook(&self, url: &str) -> Result<(), TelegramError> {
        self.call::<bool>(
            "setWebhook",
            json!({
                "url": url,
                "allowed_updates": ["message", "callback_query"],
            }),
        )
        .await
        .map(|_| ())
    }
}
