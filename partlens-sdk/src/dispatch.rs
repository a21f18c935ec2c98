// ABOUTME: Request dispatcher for the chat-completions API
// ABOUTME: Executes one bounded call and normalizes every outcome into DispatchResult or PartlensError

use log;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::builder::ChatClientConfig;
use crate::constants::urls;
use crate::envelope::{Message, RequestEnvelope};
use crate::error::{PartlensError, Result};

/// Successful completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult {
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

#[derive(Debug)]
pub struct ChatClient {
    http: reqwest::Client,
    api_key: SecretString,
    endpoint: Url,
    timeout: Duration,
}

impl ChatClient {
    pub(crate) fn from_config(config: ChatClientConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .as_deref()
            .unwrap_or(urls::OPENAI_CHAT_COMPLETIONS);
        let endpoint = Url::parse(endpoint)
            .map_err(|e| PartlensError::Configuration(format!("Invalid API URL: {}", e)))?;

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| {
                PartlensError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            api_key: config.api_key,
            endpoint,
            timeout: config.timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Send `messages` to `model`, adapting parameters to what the model accepts.
    pub async fn dispatch(
        &self,
        model: &str,
        messages: &[Message],
        temperature: f64,
        token_limit: u32,
    ) -> Result<DispatchResult> {
        let envelope = RequestEnvelope::build(model, messages.to_vec(), temperature, token_limit);
        self.send(&envelope).await
    }

    /// Execute a prepared envelope under the client's deadline. Never retries.
    pub async fn send(&self, envelope: &RequestEnvelope) -> Result<DispatchResult> {
        log::debug!(
            "Calling {} with model {} ({} messages)",
            self.endpoint,
            envelope.model,
            envelope.messages.len()
        );

        // Dropping the in-flight future on timeout closes the connection
        match tokio::time::timeout(self.timeout, self.execute(envelope)).await {
            Ok(result) => result,
            Err(_) => {
                log::warn!("API call exceeded {}ms", self.timeout.as_millis());
                Err(PartlensError::Timeout)
            }
        }
    }

    async fn execute(&self, envelope: &RequestEnvelope) -> Result<DispatchResult> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(self.api_key.expose_secret())
            .json(envelope)
            .send()
            .await?;

        let status = response.status();
        log::debug!("API responded with status {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = parse_error_message(&body)
                .unwrap_or_else(|| format!("API error ({})", status.as_u16()));
            return Err(PartlensError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let completion: CompletionResponse = serde_json::from_str(&body)?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default();

        Ok(DispatchResult { content })
    }
}

/// Extract `error.message` from an error response body.
fn parse_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()?
        .error?
        .message
        .filter(|message| !message.is_empty())
}
