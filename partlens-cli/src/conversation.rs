// ABOUTME: Prompt assembly and chat history for part identification sessions
// ABOUTME: Builds the initial multimodal message, follow-up turns and debug payload previews

use partlens_sdk::media::parse_data_uri;
use partlens_sdk::{ContentPart, EncodedImage, Message, RequestEnvelope};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::prompts;

/// One labelled piece of information about the part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub label: String,
    pub value: String,
}

impl FormField {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Analysis prompt followed by the provided fields as a markdown list.
pub fn initial_user_text(analysis: &str, fields: &[FormField]) -> String {
    let lines: Vec<String> = fields
        .iter()
        .map(|field| format!("- **{}:** {}", field.label, field.value))
        .collect();

    format!(
        "{}\n\n{}\n{}",
        analysis,
        prompts::PROVIDED_INFORMATION,
        lines.join("\n")
    )
}

/// The first user turn: text part, then one image part per encoded image.
pub fn initial_user_message(
    analysis: &str,
    fields: &[FormField],
    images: &[EncodedImage],
) -> Message {
    let mut parts = vec![ContentPart::text(initial_user_text(analysis, fields))];
    parts.extend(images.iter().filter_map(ContentPart::image));
    Message::user_parts(parts)
}

/// Chat state: the system persona plus user and assistant turns so far.
/// The persona is never stored in the history; it leads every request.
#[derive(Debug, Clone)]
pub struct Conversation {
    persona: String,
    history: Vec<Message>,
}

impl Conversation {
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
            history: Vec::new(),
        }
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn push(&mut self, message: Message) {
        self.history.push(message);
    }

    /// Messages for the next request
    pub fn messages(&self) -> Vec<Message> {
        std::iter::once(Message::system(self.persona.clone()))
            .chain(self.history.iter().cloned())
            .collect()
    }

    /// Messages for a request that adds `pending` without recording it yet
    pub fn messages_with(&self, pending: &Message) -> Vec<Message> {
        let mut messages = self.messages();
        messages.push(pending.clone());
        messages
    }
}

/// JSON preview of a request that will not be sent. Image data is replaced
/// by a short description so the preview stays readable.
pub fn debug_payload(endpoint: &str, envelope: &RequestEnvelope, image_files: &[String]) -> Value {
    let mut payload = serde_json::to_value(envelope).unwrap_or(Value::Null);
    if let Value::Object(ref mut map) = payload {
        if let Some(Value::Array(messages)) = map.get_mut("messages") {
            messages.iter_mut().for_each(elide_image_data);
        }
        map.insert("endpoint".to_string(), Value::String(endpoint.to_string()));
        if !image_files.is_empty() {
            map.insert(
                "image_files".to_string(),
                Value::Array(image_files.iter().cloned().map(Value::String).collect()),
            );
        }
    }
    payload
}

fn elide_image_data(message: &mut Value) {
    let Some(Value::Array(parts)) = message.get_mut("content") else {
        return;
    };

    for part in parts {
        if let Some(Value::String(url)) = part.pointer_mut("/image_url/url") {
            *url = describe_data_uri(url);
        }
    }
}

fn describe_data_uri(url: &str) -> String {
    match parse_data_uri(url) {
        Some((mime_type, payload)) => {
            format!("<{} image, {} base64 chars>", mime_type, payload.len())
        }
        None => url.to_string(),
    }
}
