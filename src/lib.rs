//! Capture OCR and translation core.
//!
//! The headless engine behind a screenshot-translation tool: a captured
//! region goes to a user-configured OpenAI-compatible chat-completions
//! endpoint for text recognition, then (on demand or automatically) for
//! translation. The desktop shell owns windows, clipboard, and hotkeys;
//! this crate owns configuration, the API bridge, and per-capture state.
//!
//! Domains:
//!   - `settings`: the two persisted endpoint configs and their store
//!   - `api`: chat-completions client (recognize, translate, connection test)
//!   - `pipeline`: per-capture state machine, manual and automatic flows
//!   - `capture`: the base64 PNG payload handed in by the host

pub mod api;
pub mod capture;
pub mod error;
pub mod pipeline;
pub mod settings;

pub use api::{ChatClient, ConnectionReport, TextApi};
pub use capture::SourceImage;
pub use error::{ApiError, Phase, Refusal, SettingsError};
pub use pipeline::{CapturePipeline, PipelineSnapshot, PipelineStatus, RunOutcome};
pub use settings::{
    ApiConfig, ConfigKind, OcrConfig, SettingsStore, TranslateConfig, TARGET_LANGUAGES,
};
