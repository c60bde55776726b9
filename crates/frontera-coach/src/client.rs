//! OpenAI-compatible chat-completion client.
//!
//! Requests carry a per-attempt timeout, and a transient failure (timeout,
//! connection error, 5xx) is retried exactly once. Anything else surfaces
//! immediately so the server can map it to an upstream error.

use crate::error::CoachError;
use frontera_core::config::CoachConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Clone)]
pub struct CoachClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl CoachClient {
    pub fn new(config: &CoachConfig) -> Result<Self, CoachError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    /// Generate a completion, retrying once on a transient failure.
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String, CoachError> {
        match self.request_once(messages).await {
            Ok(content) => Ok(content),
            Err(err) if err.is_retryable() => {
                tracing::warn!(error = %err, "coach request failed, retrying once");
                self.request_once(messages).await
            }
            Err(err) => Err(err),
        }
    }

    async fn request_once(&self, messages: &[ChatMessage]) -> Result<String, CoachError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: 0.7,
        };

        let mut req = self.http.post(&url).json(&request);
        // No header for local models.
        if !self.api_key.is_empty() {
            req = req.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                CoachError::Timeout
            } else if e.is_connect() {
                CoachError::Connect(e.to_string())
            } else {
                CoachError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CoachError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| CoachError::BadResponse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| CoachError::BadResponse("response carried no choices".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(base_url: String) -> CoachConfig {
        CoachConfig {
            base_url,
            api_key: "test-key".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 5,
        }
    }

    fn completion_body(content: &str) -> String {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })
        .to_string()
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body("Let's map your company territory."))
            .create_async()
            .await;

        let client = CoachClient::new(&test_config(server.url())).unwrap();
        let reply = client
            .chat(&[ChatMessage::user("where do I start?")])
            .await
            .unwrap();
        assert_eq!(reply, "Let's map your company territory.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn retries_once_then_surfaces_server_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(500)
            .with_body("overloaded")
            .expect(2)
            .create_async()
            .await;

        let client = CoachClient::new(&test_config(server.url())).unwrap();
        let err = client.chat(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, CoachError::Api { status: 500, .. }));
        // Exactly two attempts: the original and one retry.
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body("bad key")
            .expect(1)
            .create_async()
            .await;

        let client = CoachClient::new(&test_config(server.url())).unwrap();
        let err = client.chat(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, CoachError::Api { status: 401, .. }));
        assert!(!err.is_retryable());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn empty_choices_is_bad_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let client = CoachClient::new(&test_config(server.url())).unwrap();
        let err = client.chat(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, CoachError::BadResponse(_)));
    }

    #[tokio::test]
    async fn no_auth_header_when_key_empty() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", mockito::Matcher::Missing)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body("local"))
            .create_async()
            .await;

        let mut config = test_config(server.url());
        config.api_key = String::new();
        let client = CoachClient::new(&config).unwrap();
        client.chat(&[ChatMessage::user("hi")]).await.unwrap();
        mock.assert_async().await;
    }
}
