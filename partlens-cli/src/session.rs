// ABOUTME: A part identification session: initial request plus follow-up turns
// ABOUTME: Sends requests through the SDK client or, in debug mode, returns payload previews

use partlens_sdk::{ChatClient, EncodedImage, Message, PartlensError, RequestEnvelope, Result};
use serde_json::Value;

use crate::conversation::{debug_payload, initial_user_message, Conversation, FormField};

/// Model parameters shared by every turn of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSettings {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Answer(String),
    /// Debug mode: the payload that would have been sent
    Preview(Value),
}

#[derive(Debug)]
pub struct Session {
    client: Option<ChatClient>,
    endpoint: String,
    settings: RequestSettings,
    conversation: Conversation,
}

impl Session {
    /// Session that calls the API through `client`.
    pub fn connected(client: ChatClient, settings: RequestSettings, conversation: Conversation) -> Self {
        Self {
            endpoint: client.endpoint().to_string(),
            client: Some(client),
            settings,
            conversation,
        }
    }

    /// Session that only previews payloads. No API key is needed.
    pub fn preview(
        endpoint: impl Into<String>,
        settings: RequestSettings,
        conversation: Conversation,
    ) -> Self {
        Self {
            client: None,
            endpoint: endpoint.into(),
            settings,
            conversation,
        }
    }

    pub fn settings(&self) -> &RequestSettings {
        &self.settings
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub async fn start(
        &mut self,
        analysis: &str,
        fields: &[FormField],
        images: &[EncodedImage],
    ) -> Result<Reply> {
        let message = initial_user_message(analysis, fields, images);
        let image_files: Vec<String> = images.iter().map(|image| image.name.clone()).collect();
        self.exchange(message, &image_files).await
    }

    pub async fn follow_up(&mut self, text: &str) -> Result<Reply> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PartlensError::Validation(
                "Follow-up message is empty.".to_string(),
            ));
        }
        self.exchange(Message::user(text), &[]).await
    }

    /// Turns are recorded only once they succeed, so a failed call can be retried
    async fn exchange(&mut self, message: Message, image_files: &[String]) -> Result<Reply> {
        let envelope = RequestEnvelope::build(
            self.settings.model.as_str(),
            self.conversation.messages_with(&message),
            self.settings.temperature,
            self.settings.max_tokens,
        );

        let Some(client) = &self.client else {
            let preview = debug_payload(&self.endpoint, &envelope, image_files);
            self.conversation.push(message);
            return Ok(Reply::Preview(preview));
        };

        let result = client.send(&envelope).await?;
        self.conversation.push(message);
        self.conversation.push(Message::assistant(result.content.clone()));
        Ok(Reply::Answer(result.content))
    }
}
