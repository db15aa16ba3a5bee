//! HTTP client for the user-configured chat-completions endpoint.
//!
//! One request envelope serves all three operations: text recognition,
//! translation, and the settings-panel connection test. The endpoint is
//! whatever the user pointed us at, so response handling is deliberately
//! lenient: a well-formed reply missing the expected fields counts as
//! empty output, not an error. The connection test is the exception,
//! because there an empty `choices` array is exactly the broken behavior
//! the user asked us to check for.

use std::time::Duration;

use serde_json::Value;

use crate::capture::SourceImage;
use crate::error::{ApiError, Phase};
use crate::settings::{ApiConfig, OcrConfig, TranslateConfig};

use super::types::{ChatRequest, ConnectionReport, ContentPart, ImageUrl, Message, MessageContent};

/// Default instruction for the recognition call when no override is configured.
pub const DEFAULT_OCR_PROMPT: &str = "Identify all text in the image. \
    Return only the recognized text, with no commentary or formatting.";

/// Default instruction for the translate call.
pub fn default_translate_prompt(target_language: &str) -> String {
    format!(
        "Translate the following text into {}. Return only the translation, with no commentary.",
        target_language
    )
}

/// Output budget for recognition and translation responses.
const MAX_COMPLETION_TOKENS: u32 = 4096;

/// The connection test only needs a token or two back.
const PROBE_MAX_TOKENS: u32 = 10;

/// What the connection test sends.
const PROBE_MESSAGE: &str = "Hello, please respond with 'OK' if you can receive this message.";

/// Per-request deadline unless overridden with [`ChatClient::with_timeout`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for one OpenAI-compatible endpoint family.
///
/// Cheap to clone; all clones share the pooled HTTP connections.
#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl Default for ChatClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatClient {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("failed to build HTTP client");
        Self {
            http,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-request deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send the captured image for text recognition.
    ///
    /// An empty string is a valid result: it means the model saw no text
    /// (or the provider left `content` out entirely).
    pub async fn recognize_text(
        &self,
        image: &SourceImage,
        config: &OcrConfig,
    ) -> Result<String, ApiError> {
        let prompt = config.prompt_or(DEFAULT_OCR_PROMPT);
        let messages = vec![Message {
            role: "user",
            content: MessageContent::Parts(vec![
                ContentPart::Text {
                    text: prompt.to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image.to_data_url(),
                    },
                },
            ]),
        }];
        let body = self
            .send_chat_completion(config, Phase::Ocr, messages, MAX_COMPLETION_TOKENS)
            .await?;
        Ok(extract_content(&body))
    }

    /// Translate `text` into the configured target language.
    ///
    /// The instruction and the source text travel in a single user
    /// message. Empty input is sent as-is; callers that want to refuse it
    /// do so before calling.
    pub async fn translate_text(
        &self,
        text: &str,
        config: &TranslateConfig,
    ) -> Result<String, ApiError> {
        let default_prompt = default_translate_prompt(&config.target_language);
        let prompt = config.api.prompt_or(&default_prompt);
        let messages = vec![Message {
            role: "user",
            content: MessageContent::Text(format!("{}\n\n{}", prompt, text)),
        }];
        let body = self
            .send_chat_completion(&config.api, Phase::Translate, messages, MAX_COMPLETION_TOKENS)
            .await?;
        Ok(extract_content(&body))
    }

    /// Settings-panel connectivity test.
    ///
    /// Never errors: every failure mode folds into a report the panel can
    /// show as-is. Unlike the lenient calls above, a reply without any
    /// `choices` is a failure here.
    pub async fn test_connection(&self, config: &ApiConfig) -> ConnectionReport {
        let messages = vec![Message {
            role: "user",
            content: MessageContent::Text(PROBE_MESSAGE.to_string()),
        }];
        let body = match self
            .send_chat_completion(config, Phase::Probe, messages, PROBE_MAX_TOKENS)
            .await
        {
            Ok(body) => body,
            Err(e) => {
                log::warn!("[API] Connection test failed: {}", e);
                return ConnectionReport {
                    success: false,
                    message: format!("API connection failed: {}", e),
                };
            }
        };

        let has_choice = body
            .get("choices")
            .and_then(|c| c.as_array())
            .map(|choices| !choices.is_empty())
            .unwrap_or(false);
        if has_choice {
            log::info!(
                "[API] Connection test OK ({}, model {})",
                config.endpoint_base,
                config.model_name
            );
            ConnectionReport {
                success: true,
                message: "API connection test succeeded.".to_string(),
            }
        } else {
            ConnectionReport {
                success: false,
                message: "API returned an unexpected response format.".to_string(),
            }
        }
    }

    /// Shared request envelope: build the body, send it, check the status,
    /// parse the reply as JSON.
    async fn send_chat_completion(
        &self,
        config: &ApiConfig,
        phase: Phase,
        messages: Vec<Message>,
        max_tokens: u32,
    ) -> Result<Value, ApiError> {
        let url = format!(
            "{}/chat/completions",
            config.endpoint_base.trim_end_matches('/')
        );
        let request = ChatRequest {
            model: &config.model_name,
            messages,
            max_tokens,
        };

        log::info!(
            "[API] {} request to {} (model: {}, key: {} chars)",
            phase,
            url,
            config.model_name,
            config.api_key.len()
        );
        let start = std::time::Instant::now();

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", config.api_key))
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify(phase, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.classify(phase, e))?;

        if !status.is_success() {
            log::error!(
                "[API] {} returned {}: {}",
                phase,
                status,
                truncate(&body, 200)
            );
            return Err(ApiError::Status {
                phase,
                status,
                body: truncate(&body, 500).to_string(),
            });
        }

        log::info!(
            "[API] {} response in {}ms ({} bytes)",
            phase,
            start.elapsed().as_millis(),
            body.len()
        );

        serde_json::from_str(&body).map_err(|e| {
            log::error!("[API] {} response is not JSON: {}", phase, e);
            ApiError::Malformed {
                phase,
                detail: e.to_string(),
            }
        })
    }

    fn classify(&self, phase: Phase, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout {
                phase,
                secs: self.timeout.as_secs(),
            }
        } else {
            ApiError::Request { phase, source: e }
        }
    }
}

/// Pull `choices[0].message.content` out of a reply, tolerating providers
/// that omit any piece of it.
fn extract_content(body: &Value) -> String {
    body.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .unwrap_or_default()
        .to_string()
}

/// First `limit` bytes of a body, cut back to a char boundary so error
/// messages from non-ASCII providers never panic the logger.
fn truncate(body: &str, limit: usize) -> &str {
    if body.len() <= limit {
        return body;
    }
    let mut end = limit;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
