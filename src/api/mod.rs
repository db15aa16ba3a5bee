//! Outbound bridge to the configured chat-completions endpoint.
//!
//! `ChatClient` is the real HTTP implementation; the pipeline depends on
//! the `TextApi` trait so tests can substitute a scripted double.

mod client;
mod types;

pub use client::{default_translate_prompt, ChatClient, DEFAULT_OCR_PROMPT, DEFAULT_TIMEOUT};
pub use types::ConnectionReport;

use crate::capture::SourceImage;
use crate::error::ApiError;
use crate::settings::{OcrConfig, TranslateConfig};

/// The two calls the pipeline makes.
#[async_trait::async_trait]
pub trait TextApi: Send + Sync {
    async fn recognize_text(
        &self,
        image: &SourceImage,
        config: &OcrConfig,
    ) -> Result<String, ApiError>;

    async fn translate_text(
        &self,
        text: &str,
        config: &TranslateConfig,
    ) -> Result<String, ApiError>;
}

#[async_trait::async_trait]
impl TextApi for ChatClient {
    async fn recognize_text(
        &self,
        image: &SourceImage,
        config: &OcrConfig,
    ) -> Result<String, ApiError> {
        ChatClient::recognize_text(self, image, config).await
    }

    async fn translate_text(
        &self,
        text: &str,
        config: &TranslateConfig,
    ) -> Result<String, ApiError> {
        ChatClient::translate_text(self, text, config).await
    }
}
