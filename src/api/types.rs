//! Chat-completions wire types.
//!
//! Requests are typed structs that serialize to the OpenAI-compatible
//! shape. Responses are navigated as loose JSON in `client` because the
//! endpoint is whatever the user configured and providers differ in which
//! fields they bother to include.

use serde::Serialize;

/// Request body for `POST /chat/completions`.
#[derive(Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
}

#[derive(Serialize)]
pub(crate) struct Message {
    pub role: &'static str,
    pub content: MessageContent,
}

/// `content` is either a bare string or a part list (text plus image).
#[derive(Serialize)]
#[serde(untagged)]
pub(crate) enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type")]
pub(crate) enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
pub(crate) struct ImageUrl {
    pub url: String,
}

/// Outcome of a connectivity test, shaped for direct display in the
/// settings panel.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionReport {
    pub success: bool,
    pub message: String,
}
