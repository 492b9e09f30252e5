//! Telegram Bot API client for outbound messages and command polling.
//!
//! This crate wraps the small Bot API subset the relay needs:
//! - `sendMessage` / `sendChatAction` for outbound notifications and replies
//! - `getUpdates` long-polling for inbound control commands
//!
//! Blocking methods are meant for dedicated polling threads; the async send
//! path exists for callers already inside a tokio runtime (the Discord
//! gateway event handler).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default Bot API base URL. Tests point this at a local mock server.
const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Timeout for plain sends.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Extra slack on top of the long-poll timeout so the HTTP request
/// outlives the server-side hold.
const POLL_TIMEOUT_SLACK: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("telegram api error: {0}")]
    Api(String),
}

/// Client for the Telegram Bot API.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    bot_token: String,
    api_base: String,
}

impl TelegramClient {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Client against a non-default API base (used by tests).
    pub fn with_api_base(bot_token: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }

    /// Long-poll for new updates after `offset`. Blocks for up to
    /// `timeout_secs` server-side; the HTTP timeout is slightly longer.
    pub fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        let mut params: Vec<(&str, String)> = vec![("timeout", timeout_secs.to_string())];
        if let Some(offset) = offset {
            params.push(("offset", offset.to_string()));
        }

        let client = reqwest::blocking::Client::new();
        let response = client
            .get(self.method_url("getUpdates"))
            .timeout(Duration::from_secs(timeout_secs) + POLL_TIMEOUT_SLACK)
            .query(&params)
            .send()?;

        let api_response: ApiResponse<Vec<Update>> = response.json()?;
        if !api_response.ok {
            return Err(TelegramError::Api(describe(api_response.description)));
        }

        let updates = api_response.result.unwrap_or_default();
        debug!("getUpdates returned {} update(s)", updates.len());
        Ok(updates)
    }

    /// Send a text message to a chat. `parse_mode` is usually `"HTML"`.
    pub fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<&str>,
    ) -> Result<Message, TelegramError> {
        let request = SendMessageRequest {
            chat_id,
            text: text.to_string(),
            parse_mode: parse_mode.map(|mode| mode.to_string()),
        };

        let client = reqwest::blocking::Client::new();
        let response = client
            .post(self.method_url("sendMessage"))
            .timeout(SEND_TIMEOUT)
            .json(&request)
            .send()?;

        let api_response: ApiResponse<Message> = response.json()?;
        if !api_response.ok {
            return Err(TelegramError::Api(describe(api_response.description)));
        }
        api_response
            .result
            .ok_or_else(|| TelegramError::Api("missing result in sendMessage response".to_string()))
    }

    /// Send a chat action (e.g. `"typing"`). Best-effort UX nicety.
    pub fn send_chat_action(&self, chat_id: i64, action: &str) -> Result<(), TelegramError> {
        let client = reqwest::blocking::Client::new();
        let response = client
            .post(self.method_url("sendChatAction"))
            .timeout(Duration::from_secs(5))
            .json(&serde_json::json!({ "chat_id": chat_id, "action": action }))
            .send()?;

        let api_response: ApiResponse<serde_json::Value> = response.json()?;
        if !api_response.ok {
            return Err(TelegramError::Api(describe(api_response.description)));
        }
        Ok(())
    }

    /// Async variant of [`send_message`](Self::send_message), for callers
    /// already inside a tokio runtime.
    pub async fn send_message_async(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<&str>,
    ) -> Result<(), TelegramError> {
        let request = SendMessageRequest {
            chat_id,
            text: text.to_string(),
            parse_mode: parse_mode.map(|mode| mode.to_string()),
        };

        let client = reqwest::Client::new();
        let response = client
            .post(self.method_url("sendMessage"))
            .timeout(SEND_TIMEOUT)
            .json(&request)
            .send()
            .await?;

        let api_response: ApiResponse<Message> = response.json().await?;
        if !api_response.ok {
            return Err(TelegramError::Api(describe(api_response.description)));
        }
        Ok(())
    }
}

fn describe(description: Option<String>) -> String {
    description.unwrap_or_else(|| "unknown error".to_string())
}

// ============================================================================
// Bot API types (subset)
// ============================================================================

/// Envelope every Bot API call returns.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub description: Option<String>,
    pub result: Option<T>,
}

/// One entry from `getUpdates`.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    /// Strictly increasing update identifier; the poll cursor is
    /// `update_id + 1` of the newest update seen.
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub date: i64,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: String,
    pub title: Option<String>,
    pub username: Option<String>,
}

/// Request body for `sendMessage`.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn get_updates_parses_messages() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/bottest-token/getUpdates")
            .match_query(Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "ok": true,
                    "result": [
                        {
                            "update_id": 42,
                            "message": {
                                "message_id": 7,
                                "from": {"id": 111, "is_bot": false, "first_name": "Budi"},
                                "chat": {"id": 111, "type": "private"},
                                "date": 1700000000,
                                "text": "/lastorder"
                            }
                        }
                    ]
                }"#,
            )
            .create();

        let client = TelegramClient::with_api_base("test-token", server.url());
        let updates = client.get_updates(Some(40), 0).unwrap();

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].update_id, 42);
        let message = updates[0].message.as_ref().unwrap();
        assert_eq!(message.chat.id, 111);
        assert_eq!(message.text.as_deref(), Some("/lastorder"));
    }

    #[test]
    fn send_message_success() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/bottest-token/sendMessage")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "chat_id": 123,
                "text": "hello",
                "parse_mode": "HTML"
            })))
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "ok": true,
                    "result": {
                        "message_id": 9,
                        "chat": {"id": 123, "type": "private"},
                        "date": 1700000001
                    }
                }"#,
            )
            .create();

        let client = TelegramClient::with_api_base("test-token", server.url());
        let sent = client.send_message(123, "hello", Some("HTML")).unwrap();

        assert_eq!(sent.message_id, 9);
        mock.assert();
    }

    #[test]
    fn send_message_api_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/bottest-token/sendMessage")
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok": false, "description": "Bad Request: chat not found"}"#)
            .create();

        let client = TelegramClient::with_api_base("test-token", server.url());
        let result = client.send_message(123, "hello", None);

        match result {
            Err(TelegramError::Api(description)) => {
                assert!(description.contains("chat not found"));
            }
            other => panic!("expected api error, got {:?}", other.map(|m| m.message_id)),
        }
    }

    #[test]
    fn send_chat_action_ok() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/bottest-token/sendChatAction")
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok": true, "result": true}"#)
            .create();

        let client = TelegramClient::with_api_base("test-token", server.url());
        client.send_chat_action(123, "typing").unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn send_message_async_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/bottest-token/sendMessage")
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "ok": true,
                    "result": {
                        "message_id": 10,
                        "chat": {"id": 123, "type": "private"},
                        "date": 1700000002
                    }
                }"#,
            )
            .create_async()
            .await;

        let client = TelegramClient::with_api_base("test-token", server.url());
        client
            .send_message_async(123, "hello", Some("HTML"))
            .await
            .unwrap();
        mock.assert_async().await;
    }
}
