//! API configuration records and their on-disk store.
//!
//! Two independent records, one for the OCR endpoint and one for the
//! translation endpoint, each persisted as a whole JSON file under the
//! platform config directory (`~/.config/snipglot` on Linux). Loads never
//! fail: a missing or corrupt file yields defaults, and fields absent from
//! a saved blob keep their default values. Saves replace the file
//! atomically so a crash mid-write can never leave a half-written record.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::SettingsError;

/// Target languages offered as presets by the settings panel.
/// The config field itself is free-form; this is only the menu.
pub const TARGET_LANGUAGES: [&str; 8] = [
    "English", "Chinese", "Japanese", "Korean", "French", "German", "Spanish", "Russian",
];

fn default_target_language() -> String {
    "English".to_string()
}

// ── Records ──────────────────────────────────────────────────────────

/// Connection settings for one OpenAI-compatible endpoint.
///
/// Serialized camelCase so the persisted JSON matches what the settings
/// panel reads and writes (`endpointBase`, `apiKey`, `modelName`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiConfig {
    /// Base URL without the `/chat/completions` suffix.
    pub endpoint_base: String,
    /// Bearer credential. Never logged.
    pub api_key: String,
    /// Model identifier, passed through to the endpoint verbatim.
    pub model_name: String,
    /// Replaces the built-in instruction when set and non-blank.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_override: Option<String>,
}

impl ApiConfig {
    /// A config can be sent to the network only when endpoint, key, and
    /// model are all present.
    pub fn is_usable(&self) -> bool {
        !self.endpoint_base.is_empty() && !self.api_key.is_empty() && !self.model_name.is_empty()
    }

    /// The instruction to send: the override when set and non-blank,
    /// otherwise `default_prompt`.
    pub(crate) fn prompt_or<'a>(&'a self, default_prompt: &'a str) -> &'a str {
        match &self.prompt_override {
            Some(p) if !p.trim().is_empty() => p,
            _ => default_prompt,
        }
    }
}

/// OCR endpoint settings. Same shape as the base record.
pub type OcrConfig = ApiConfig;

/// Translation endpoint settings: connection fields plus the target language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslateConfig {
    #[serde(flatten)]
    pub api: ApiConfig,
    pub target_language: String,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            target_language: default_target_language(),
        }
    }
}

// ── Store ────────────────────────────────────────────────────────────

/// Names the two persisted records, for file stems and user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKind {
    Ocr,
    Translate,
}

impl ConfigKind {
    fn file_stem(&self) -> &'static str {
        match self {
            ConfigKind::Ocr => "ocr_api_config",
            ConfigKind::Translate => "translate_api_config",
        }
    }
}

impl std::fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigKind::Ocr => write!(f, "OCR"),
            ConfigKind::Translate => write!(f, "translation"),
        }
    }
}

/// On-disk store for the two config records.
pub struct SettingsStore {
    dir: PathBuf,
}

impl SettingsStore {
    /// Store rooted at the platform config directory.
    pub fn open_default() -> Self {
        let dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("snipglot");
        Self { dir }
    }

    /// Store rooted at an explicit directory (tests, portable installs).
    pub fn open_at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, kind: ConfigKind) -> PathBuf {
        self.dir.join(format!("{}.json", kind.file_stem()))
    }

    /// Load the OCR record. Missing or unreadable files yield defaults.
    pub fn load_ocr(&self) -> OcrConfig {
        self.load(ConfigKind::Ocr)
    }

    /// Load the translation record. Missing or unreadable files yield defaults.
    pub fn load_translate(&self) -> TranslateConfig {
        self.load(ConfigKind::Translate)
    }

    /// Persist the OCR record, replacing the previous one wholesale.
    pub fn save_ocr(&self, config: &OcrConfig) -> Result<(), SettingsError> {
        self.save(ConfigKind::Ocr, config)
    }

    /// Persist the translation record, replacing the previous one wholesale.
    pub fn save_translate(&self, config: &TranslateConfig) -> Result<(), SettingsError> {
        self.save(ConfigKind::Translate, config)
    }

    fn load<T: DeserializeOwned + Default>(&self, kind: ConfigKind) -> T {
        let path = self.path_for(kind);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            // First run: nothing persisted yet.
            Err(e) if e.kind() == ErrorKind::NotFound => return T::default(),
            Err(e) => {
                log::warn!(
                    "[CONFIG] Unreadable {} config at {}: {} (using defaults)",
                    kind,
                    path.display(),
                    e
                );
                return T::default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            log::warn!(
                "[CONFIG] Corrupt {} config at {}: {} (using defaults)",
                kind,
                path.display(),
                e
            );
            T::default()
        })
    }

    fn save<T: Serialize>(&self, kind: ConfigKind, config: &T) -> Result<(), SettingsError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| SettingsError::Io { kind, source })?;
        let json = serde_json::to_string_pretty(config)
            .map_err(|source| SettingsError::Serialize { kind, source })?;
        let path = self.path_for(kind);
        atomic_write(&path, &json).map_err(|source| SettingsError::Io { kind, source })?;
        log::info!("[CONFIG] Saved {} config to {}", kind, path.display());
        Ok(())
    }
}

/// Write through a temp file in the same directory, then rename over the
/// target, so readers only ever see a complete record.
fn atomic_write(path: &Path, data: &str) -> std::io::Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    {
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(data.as_bytes())?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
