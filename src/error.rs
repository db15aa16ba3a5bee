//! Failure taxonomy shared by the settings store, API client, and pipeline.
//!
//! Three tiers:
//! - `Refusal`: pre-flight rejections raised before any network traffic
//!   (unusable config, nothing to translate). Shown as transient notices
//!   and never retried automatically.
//! - `ApiError`: a request was actually attempted and failed, tagged with
//!   the phase so the result window can say which step broke.
//! - `SettingsError`: config save failures. Loads never fail.

use thiserror::Error;

use crate::settings::ConfigKind;

/// Which remote call a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Ocr,
    Translate,
    Probe,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Ocr => write!(f, "text recognition"),
            Phase::Translate => write!(f, "translation"),
            Phase::Probe => write!(f, "connection test"),
        }
    }
}

/// A chat-completions call that failed after being sent.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never completed: DNS, connect, TLS, or a broken body stream.
    #[error("{phase} request failed: {source}")]
    Request {
        phase: Phase,
        #[source]
        source: reqwest::Error,
    },

    /// The per-request deadline elapsed.
    #[error("{phase} timed out after {secs}s")]
    Timeout { phase: Phase, secs: u64 },

    /// The endpoint answered with a non-success status.
    #[error("{phase} failed with {status}: {body}")]
    Status {
        phase: Phase,
        status: reqwest::StatusCode,
        body: String,
    },

    /// The endpoint answered 2xx with a body that is not JSON.
    #[error("{phase} response was not valid JSON: {detail}")]
    Malformed { phase: Phase, detail: String },
}

impl ApiError {
    /// The phase this error was raised in.
    pub fn phase(&self) -> Phase {
        match self {
            ApiError::Request { phase, .. }
            | ApiError::Timeout { phase, .. }
            | ApiError::Status { phase, .. }
            | ApiError::Malformed { phase, .. } => *phase,
        }
    }
}

/// A request refused before any network call was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Refusal {
    /// Endpoint, key, or model is missing from the relevant config.
    #[error("configure the {0} API first")]
    ConfigurationMissing(ConfigKind),

    /// Manual translate was requested but no text has been recognized.
    #[error("no recognized text to translate yet")]
    NothingToTranslate,

    /// A re-run was requested before any capture arrived.
    #[error("no capture to work with yet")]
    NoCapture,
}

/// Config persistence failed on the save path.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to write {kind} config: {source}")]
    Io {
        kind: ConfigKind,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {kind} config: {source}")]
    Serialize {
        kind: ConfigKind,
        #[source]
        source: serde_json::Error,
    },
}
