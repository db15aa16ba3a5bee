//! Captured-region payload.
//!
//! The host does the actual screen capture and crop; this crate receives
//! the result as an already-encoded PNG. `SourceImage` keeps the base64
//! form because that is what the wire format wants, shared behind an
//! `Arc` so pipeline snapshots clone cheaply.

use base64::engine::general_purpose;
use base64::Engine as _;
use serde::{Serialize, Serializer};
use std::sync::Arc;

/// A captured screen region, held as base64-encoded PNG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    base64: Arc<str>,
}

impl SourceImage {
    /// Wrap an already base64-encoded PNG payload.
    pub fn from_base64(base64: impl Into<Arc<str>>) -> Self {
        Self {
            base64: base64.into(),
        }
    }

    /// Encode raw PNG bytes.
    pub fn from_png_bytes(png: &[u8]) -> Self {
        Self {
            base64: general_purpose::STANDARD.encode(png).into(),
        }
    }

    /// Encode a decoded image as PNG in memory, then to base64.
    pub fn from_image(image: &image::DynamicImage) -> Result<Self, image::ImageError> {
        let mut png_bytes = Vec::new();
        image.write_to(
            &mut std::io::Cursor::new(&mut png_bytes),
            image::ImageFormat::Png,
        )?;
        log::debug!("[CAPTURE] PNG encode: {} bytes", png_bytes.len());
        Ok(Self::from_png_bytes(&png_bytes))
    }

    pub fn as_base64(&self) -> &str {
        &self.base64
    }

    /// The `data:` URL form the chat-completions image part expects.
    pub fn to_data_url(&self) -> String {
        format!("data:image/png;base64,{}", self.base64)
    }

    pub fn is_empty(&self) -> bool {
        self.base64.is_empty()
    }
}

// Serializes as the bare base64 string, matching what the host's
// presentation layer renders into an <img> tag.
impl Serialize for SourceImage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.base64)
    }
}
