use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;

/// Ways a chat request can fail. `Network` and `Status` are transport
/// failures; `MalformedReply` is a 2xx whose body carries no usable reply.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("chat service returned {0}")]
    Status(StatusCode),

    #[error("reply missing from response body")]
    MalformedReply,
}

impl TransportError {
    pub fn is_malformed(&self) -> bool {
        matches!(self, TransportError::MalformedReply)
    }
}

/// One prior turn of the conversation as the service expects it:
/// `{ "role": "user"|"model", "parts": [{ "text": ... }] }`
#[derive(Debug, Clone, Serialize)]
pub struct HistoryTurn {
    role: String,
    parts: Vec<Part>,
}

impl HistoryTurn {
    pub fn new(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    chat_history: &'a [HistoryTurn],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    response: Option<String>,
}

/// HTTP client for the chat service
#[derive(Clone)]
pub struct ChatTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ChatTransport {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.endpoint_base().to_string(),
        }
    }

    /// Send one message plus the prior history and return the reply text.
    pub async fn send(
        &self,
        message: &str,
        history: &[HistoryTurn],
    ) -> Result<String, TransportError> {
        let url = format!("{}/chat", self.base_url);
        let payload = ChatRequest {
            message,
            chat_history: history,
        };

        debug!(url = %url, turns = history.len(), "posting chat message");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "chat service returned an error status");
            return Err(TransportError::Status(status));
        }

        let body = response.text().await?;
        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|_| TransportError::MalformedReply)?;

        match parsed.response {
            Some(reply) if !reply.trim().is_empty() => Ok(reply),
            _ => {
                warn!("chat service reply was empty or missing");
                Err(TransportError::MalformedReply)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport_for(server: &MockServer) -> ChatTransport {
        let mut config = Config::default();
        config.endpoint = server.uri();
        ChatTransport::new(&config)
    }

    #[tokio::test]
    async fn send_returns_reply_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(header("Content-Type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": "Hi there"
            })))
            .mount(&server)
            .await;

        let reply = transport_for(&server)
            .send("Hello, are you working?", &[])
            .await
            .expect("reply");
        assert_eq!(reply, "Hi there");
    }

    #[tokio::test]
    async fn send_posts_message_and_role_mapped_history() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(body_partial_json(json!({
                "message": "and my budget is small",
                "chat_history": [
                    { "role": "model", "parts": [{ "text": "How can I help?" }] },
                    { "role": "user", "parts": [{ "text": "I need leads" }] },
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": "Understood."
            })))
            .expect(1)
            .mount(&server)
            .await;

        let history = vec![
            HistoryTurn::new("model", "How can I help?"),
            HistoryTurn::new("user", "I need leads"),
        ];
        let reply = transport_for(&server)
            .send("and my budget is small", &history)
            .await
            .expect("reply");
        assert_eq!(reply, "Understood.");
    }

    #[tokio::test]
    async fn non_2xx_status_is_a_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = transport_for(&server)
            .send("hello", &[])
            .await
            .expect_err("status error");
        assert!(matches!(err, TransportError::Status(s) if s.as_u16() == 500));
        assert!(!err.is_malformed());
    }

    #[tokio::test]
    async fn missing_reply_field_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok"
            })))
            .mount(&server)
            .await;

        let err = transport_for(&server)
            .send("hello", &[])
            .await
            .expect_err("malformed");
        assert!(err.is_malformed());
    }

    #[tokio::test]
    async fn empty_reply_field_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": "   "
            })))
            .mount(&server)
            .await;

        let err = transport_for(&server)
            .send("hello", &[])
            .await
            .expect_err("malformed");
        assert!(err.is_malformed());
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = transport_for(&server)
            .send("hello", &[])
            .await
            .expect_err("malformed");
        assert!(err.is_malformed());
    }
}
