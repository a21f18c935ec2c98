// ABOUTME: Chat message types and the provider-specific request envelope
// ABOUTME: Adapts temperature and token-limit parameters to the target model family

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::constants::REASONING_MODEL_PREFIXES;
use crate::media::EncodedImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    /// An image part, or `None` when the image has not been encoded yet.
    pub fn image(image: &EncodedImage) -> Option<Self> {
        image.data_uri.as_ref().map(|url| ContentPart::ImageUrl {
            image_url: ImageUrl { url: url.clone() },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Parts(parts),
        }
    }
}

/// Name of the generation-length parameter a model expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenLimitField {
    MaxTokens,
    MaxCompletionTokens,
}

impl TokenLimitField {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenLimitField::MaxTokens => "max_tokens",
            TokenLimitField::MaxCompletionTokens => "max_completion_tokens",
        }
    }
}

/// Request parameters a model family accepts, derived from its identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelCapabilities {
    pub token_limit_field: TokenLimitField,
    pub supports_temperature: bool,
}

impl ModelCapabilities {
    pub fn for_model(model: &str) -> Self {
        let model = model.to_lowercase();
        let reasoning = REASONING_MODEL_PREFIXES
            .iter()
            .any(|prefix| model.starts_with(prefix));

        if reasoning {
            Self {
                token_limit_field: TokenLimitField::MaxCompletionTokens,
                supports_temperature: false,
            }
        } else {
            Self {
                token_limit_field: TokenLimitField::MaxTokens,
                supports_temperature: true,
            }
        }
    }
}

/// The request body for one chat-completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEnvelope {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: Option<f64>,
    pub token_limit_field: TokenLimitField,
    pub token_limit_value: u32,
}

impl RequestEnvelope {
    /// Build an envelope, dropping `temperature` when the model rejects it.
    pub fn build(
        model: impl Into<String>,
        messages: Vec<Message>,
        temperature: f64,
        token_limit: u32,
    ) -> Self {
        let model = model.into();
        let capabilities = ModelCapabilities::for_model(&model);

        Self {
            temperature: capabilities.supports_temperature.then_some(temperature),
            token_limit_field: capabilities.token_limit_field,
            token_limit_value: token_limit,
            model,
            messages,
        }
    }
}

impl Serialize for RequestEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.temperature.is_some() { 4 } else { 3 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("model", &self.model)?;
        map.serialize_entry("messages", &self.messages)?;
        if let Some(temperature) = self.temperature {
            map.serialize_entry("temperature", &temperature)?;
        }
        map.serialize_entry(self.token_limit_field.as_str(), &self.token_limit_value)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_capabilities_by_prefix() {
        for model in ["gpt-5", "gpt-5-preview", "GPT-5-mini", "o1", "o1-mini", "O3-mini"] {
            let caps = ModelCapabilities::for_model(model);
            assert_eq!(caps.token_limit_field, TokenLimitField::MaxCompletionTokens, "{model}");
            assert!(!caps.supports_temperature, "{model}");
        }

        for model in ["gpt-4o", "gpt-4o-mini", "gpt-4-turbo", "gpt-3.5-turbo", ""] {
            let caps = ModelCapabilities::for_model(model);
            assert_eq!(caps.token_limit_field, TokenLimitField::MaxTokens, "{model}");
            assert!(caps.supports_temperature, "{model}");
        }
    }

    #[test]
    fn test_reasoning_model_envelope() {
        let envelope = RequestEnvelope::build("gpt-5-preview", vec![Message::user("hi")], 0.5, 512);
        let body = serde_json::to_value(&envelope).unwrap();

        assert_eq!(
            body,
            json!({
                "model": "gpt-5-preview",
                "messages": [{ "role": "user", "content": "hi" }],
                "max_completion_tokens": 512
            })
        );
        assert!(body.get("temperature").is_none());
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_chat_model_envelope() {
        let envelope = RequestEnvelope::build("gpt-4o", vec![Message::user("hi")], 0.5, 512);
        let body = serde_json::to_value(&envelope).unwrap();

        assert_eq!(body["temperature"], json!(0.5));
        assert_eq!(body["max_tokens"], json!(512));
        assert!(body.get("max_completion_tokens").is_none());
    }

    #[test]
    fn test_message_wire_shape() {
        let image = EncodedImage {
            index: 0,
            name: "gear.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
            data_uri: Some("data:image/jpeg;base64,AAAA".to_string()),
        };
        let message = Message::user_parts(vec![
            ContentPart::text("Identify this part"),
            ContentPart::image(&image).unwrap(),
        ]);

        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "role": "user",
                "content": [
                    { "type": "text", "text": "Identify this part" },
                    { "type": "image_url", "image_url": { "url": "data:image/jpeg;base64,AAAA" } }
                ]
            })
        );

        let staged = EncodedImage {
            data_uri: None,
            ..image
        };
        assert!(ContentPart::image(&staged).is_none());
    }

    #[test]
    fn test_message_roundtrip_through_history() {
        let history = vec![
            Message::system("persona"),
            Message::user("question"),
            Message::assistant("answer"),
        ];
        let text = serde_json::to_string(&history).unwrap();
        let parsed: Vec<Message> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, history);
    }
}
