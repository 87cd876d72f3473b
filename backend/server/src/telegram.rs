//! # Telegram
//!
//! Minimal Bot API client.
//!
//! - Every method is a `POST https://api.telegram.org/bot<token>/<method>` with a JSON body
//! - Replies are `{ ok, result }` or `{ ok: false, description }`
//! - The token is part of the URL, so URLs are stripped from request errors before they are logged
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::utils::Scalar;

pub const TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("Request failed: {0}")]
    Http(reqwest::Error),

    #[error("Telegram API error: {0}")]
    Api(String),
}

impl From<reqwest::Error> for TelegramError {
    fn from(e: reqwest::Error) -> Self {
        TelegramError::Http(e.without_url())
    }
}

/// Chat identifier, numeric ids are kept in their decimal string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Scalar", into = "String")]
pub struct ChatId(String);

impl ChatId {
    pub fn new(id: impl Into<String>) -> Self {
        ChatId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Scalar> for ChatId {
    fn from(raw: Scalar) -> Self {
        ChatId(raw.as_text())
    }
}

impl From<ChatId> for String {
    fn from(id: ChatId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub enum ParseMode {
    Markdown,
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineButton {
    pub text: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboard {
    pub inline_keyboard: Vec<Vec<InlineButton>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MessageOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboard>,
}

impl MessageOptions {
    pub fn markdown() -> Self {
        Self {
            parse_mode: Some(ParseMode::Markdown),
            reply_markup: None,
        }
    }

    pub fn with_link(mut self, text: impl Into<String>, url: impl Into<String>) -> Self {
        self.reply_markup = Some(InlineKeyboard {
            inline_keyboard: vec![vec![InlineButton {
                text: text.into(),
                url: url.into(),
            }]],
        });
        self
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a ChatId,
    text: &'a str,
    #[serde(flatten)]
    options: &'a MessageOptions,
}

#[derive(Serialize)]
struct SendLocation<'a> {
    chat_id: &'a ChatId,
    latitude: f64,
    longitude: f64,
}

#[derive(Serialize)]
struct GetUpdates<'a> {
    offset: i64,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Deserialize)]
struct Reply<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
}

impl User {
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {last}", self.first_name),
            None => self.first_name.clone(),
        }
    }
}

pub struct Telegram {
    http: Client,
    base_url: String,
    token: String,
}

impl Telegram {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    async fn call<B: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T, TelegramError> {
        let url = format!("{}/bot{}/{method}", self.base_url, self.token);
        let reply: Reply<T> = self.http.post(url).json(body).send().await?.json().await?;

        match reply {
            Reply {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            Reply { description, .. } => Err(TelegramError::Api(
                description.unwrap_or_else(|| format!("{method} failed")),
            )),
        }
    }

    pub async fn send_message(
        &self,
        chat_id: &ChatId,
        text: &str,
        options: &MessageOptions,
    ) -> Result<(), TelegramError> {
        let body = SendMessage {
            chat_id,
            text,
            options,
        };

        self.call::<_, serde_json::Value>("sendMessage", &body)
            .await
            .map(|_| ())
    }

    pub async fn send_location(
        &self,
        chat_id: &ChatId,
        latitude: f64,
        longitude: f64,
    ) -> Result<(), TelegramError> {
        let body = SendLocation {
            chat_id,
            latitude,
            longitude,
        };

        self.call::<_, serde_json::Value>("sendLocation", &body)
            .await
            .map(|_| ())
    }

    /// Long-polls for new messages, blocking up to `timeout` seconds on Telegram's side.
    pub async fn get_updates(&self, offset: i64, timeout: u64) -> Result<Vec<Update>, TelegramError> {
        let body = GetUpdates {
            offset,
            timeout,
            allowed_updates: &["message"],
        };

        self.call("getUpdates", &body).await
    }
}
