// ABOUTME: Builder pattern implementation for ChatClient configuration
// ABOUTME: Provides type-safe configuration with defaults for timeout, endpoint and user agent

use crate::constants::{timeouts, USER_AGENT};
use crate::dispatch::ChatClient;
use crate::error::PartlensError;
use secrecy::SecretString;
use std::time::Duration;
use typed_builder::TypedBuilder;

#[derive(Debug, TypedBuilder)]
#[builder(build_method(into = Result<ChatClient, PartlensError>))]
pub struct ChatClientConfig {
    pub api_key: SecretString,

    /// Deadline for one call, covering connect, send and reading the body
    #[builder(default = timeouts::API_CALL_TIMEOUT)]
    pub timeout: Duration,

    /// Chat-completions URL; the OpenAI endpoint when unset
    #[builder(default = None)]
    pub endpoint: Option<String>,

    #[builder(default = USER_AGENT.to_string(), setter(into))]
    pub user_agent: String,
}

impl From<ChatClientConfig> for Result<ChatClient, PartlensError> {
    fn from(config: ChatClientConfig) -> Self {
        ChatClient::from_config(config)
    }
}

impl ChatClient {
    pub fn builder() -> ChatClientConfigBuilder<((), (), (), ())> {
        ChatClientConfig::builder()
    }
}
