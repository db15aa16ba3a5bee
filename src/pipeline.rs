//! Per-capture recognition and translation state machine.
//!
//! One pipeline instance backs one result window. Every new capture (or
//! explicit re-run) starts a fresh run identified by a generation token;
//! async results are committed only while their token is still current,
//! so a late response from an abandoned run can never overwrite newer
//! state. Presentation subscribes to a watch channel and re-renders on
//! every published snapshot.
//!
//! Two flows share the machine:
//! - manual: `recognize` on capture arrival, `translate` when the user
//!   asks, `rerun_recognition` for the retry button
//! - automatic: `recognize_and_translate` chains both calls in one run

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::watch;

use crate::api::TextApi;
use crate::capture::SourceImage;
use crate::error::{ApiError, Refusal};
use crate::settings::{ConfigKind, OcrConfig, TranslateConfig};

/// Where the current run stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PipelineStatus {
    Idle,
    RecognizingText,
    TextRecognized,
    Translating,
    Complete,
    Failed,
}

/// Everything presentation needs to render the result window.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSnapshot {
    /// The capture this run is about. None until the first image arrives.
    pub image: Option<SourceImage>,
    pub status: PipelineStatus,
    pub recognized_text: String,
    pub translated_text: String,
    /// Set while a failure is the most recent event; cleared by the next
    /// transition away from it.
    pub error_detail: Option<String>,
    /// Raised when a translation lands, so the window flips to the
    /// translation view.
    pub show_translation: bool,
    /// Run token, monotonically increasing across runs of this pipeline.
    pub generation: u64,
}

impl PipelineSnapshot {
    fn initial() -> Self {
        Self {
            image: None,
            status: PipelineStatus::Idle,
            recognized_text: String::new(),
            translated_text: String::new(),
            error_detail: None,
            show_translation: false,
            generation: 0,
        }
    }
}

/// How a pipeline call ended, for the caller that triggered it.
///
/// The snapshot carries the durable state; this return value is the
/// transient notice for the interaction that caused it (toast material).
#[derive(Debug)]
pub enum RunOutcome {
    /// The run committed its terminal state.
    Done(PipelineStatus),
    /// Nothing was sent; the request failed a pre-flight check.
    Rejected(Refusal),
    /// A request was sent and failed; the snapshot reflects it.
    Failed(ApiError),
    /// A newer run took over while this one was in flight; its result
    /// was discarded.
    Superseded,
}

/// The state machine, generic over the API so tests can script it.
pub struct CapturePipeline<A> {
    api: A,
    tx: watch::Sender<PipelineSnapshot>,
    runs: AtomicU64,
}

impl<A: TextApi> CapturePipeline<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            tx: watch::Sender::new(PipelineSnapshot::initial()),
            runs: AtomicU64::new(0),
        }
    }

    /// Current state, cloned.
    pub fn snapshot(&self) -> PipelineSnapshot {
        self.tx.borrow().clone()
    }

    /// Subscribe to state updates. The receiver sees the current snapshot
    /// as its first value.
    pub fn subscribe(&self) -> watch::Receiver<PipelineSnapshot> {
        self.tx.subscribe()
    }

    // ── Manual flow ──────────────────────────────────────────────────

    /// A new capture arrived: install a fresh snapshot for it, then
    /// recognize its text.
    ///
    /// The fresh snapshot is installed even when the config turns out to
    /// be unusable, so the window always shows the new image rather than
    /// a stale result.
    pub async fn recognize(&self, image: SourceImage, config: &OcrConfig) -> RunOutcome {
        let generation = self.begin_run(Some(image.clone()));
        if !config.is_usable() {
            log::warn!("[PIPELINE] Run {}: OCR API not configured, refusing", generation);
            return RunOutcome::Rejected(Refusal::ConfigurationMissing(ConfigKind::Ocr));
        }
        self.run_recognition(generation, image, config).await
    }

    /// Re-run recognition on the current capture. Discards previous texts
    /// but keeps the image.
    ///
    /// Pre-flight refusals leave the snapshot untouched: the user keeps
    /// whatever result they had.
    pub async fn rerun_recognition(&self, config: &OcrConfig) -> RunOutcome {
        let image = match self.tx.borrow().image.clone() {
            Some(image) => image,
            None => return RunOutcome::Rejected(Refusal::NoCapture),
        };
        if !config.is_usable() {
            log::warn!("[PIPELINE] OCR API not configured, re-run refused");
            return RunOutcome::Rejected(Refusal::ConfigurationMissing(ConfigKind::Ocr));
        }
        let generation = self.begin_run(None);
        self.run_recognition(generation, image, config).await
    }

    /// Translate the recognized text on demand.
    ///
    /// Runs inside the current generation, so a new capture or re-run
    /// started meanwhile discards the result. A failure here keeps the
    /// recognized text and drops the status back to `TextRecognized`;
    /// only the translation leg is lost.
    pub async fn translate(&self, config: &TranslateConfig) -> RunOutcome {
        let (text, generation) = {
            let snap = self.tx.borrow();
            if snap.recognized_text.is_empty() {
                return RunOutcome::Rejected(Refusal::NothingToTranslate);
            }
            (snap.recognized_text.clone(), snap.generation)
        };
        if !config.api.is_usable() {
            log::warn!("[PIPELINE] Translation API not configured, translate refused");
            return RunOutcome::Rejected(Refusal::ConfigurationMissing(ConfigKind::Translate));
        }

        if !self.commit(generation, |snap| {
            snap.status = PipelineStatus::Translating;
            snap.error_detail = None;
        }) {
            return RunOutcome::Superseded;
        }
        log::info!(
            "[PIPELINE] Run {}: translating {} chars into {}",
            generation,
            text.len(),
            config.target_language
        );

        match self.api.translate_text(&text, config).await {
            Ok(translated) => {
                log::info!(
                    "[PIPELINE] Run {}: translation complete ({} chars)",
                    generation,
                    translated.len()
                );
                if self.commit(generation, |snap| {
                    snap.status = PipelineStatus::Complete;
                    snap.translated_text = translated;
                    snap.show_translation = true;
                }) {
                    RunOutcome::Done(PipelineStatus::Complete)
                } else {
                    RunOutcome::Superseded
                }
            }
            Err(e) => {
                log::error!("[PIPELINE] Run {}: {}", generation, e);
                let committed = self.commit(generation, |snap| {
                    snap.status = PipelineStatus::TextRecognized;
                    snap.error_detail = Some(e.to_string());
                });
                if committed {
                    RunOutcome::Failed(e)
                } else {
                    RunOutcome::Superseded
                }
            }
        }
    }

    // ── Automatic flow ───────────────────────────────────────────────

    /// Recognize then translate in a single run.
    ///
    /// Both configs are validated up front, OCR first, before anything is
    /// sent. The two legs share one failure state; recognized text
    /// obtained before a translation failure stays in the snapshot.
    pub async fn recognize_and_translate(
        &self,
        image: SourceImage,
        ocr_config: &OcrConfig,
        translate_config: &TranslateConfig,
    ) -> RunOutcome {
        let generation = self.begin_run(Some(image.clone()));
        if !ocr_config.is_usable() {
            log::warn!("[PIPELINE] Run {}: OCR API not configured, refusing", generation);
            return RunOutcome::Rejected(Refusal::ConfigurationMissing(ConfigKind::Ocr));
        }
        if !translate_config.api.is_usable() {
            log::warn!(
                "[PIPELINE] Run {}: translation API not configured, refusing",
                generation
            );
            return RunOutcome::Rejected(Refusal::ConfigurationMissing(ConfigKind::Translate));
        }

        if !self.commit(generation, |snap| {
            snap.status = PipelineStatus::RecognizingText;
        }) {
            return RunOutcome::Superseded;
        }
        log::info!("[PIPELINE] Run {}: recognizing text", generation);

        let text = match self.api.recognize_text(&image, ocr_config).await {
            Ok(text) => text,
            Err(e) => return self.fail(generation, e),
        };
        log::info!("[PIPELINE] Run {}: recognized {} chars", generation, text.len());

        // No stop at TextRecognized: commit the text and keep going. An
        // empty recognition result still gets sent; the API accepts it.
        if !self.commit(generation, |snap| {
            snap.status = PipelineStatus::Translating;
            snap.recognized_text = text.clone();
        }) {
            return RunOutcome::Superseded;
        }
        log::info!(
            "[PIPELINE] Run {}: translating into {}",
            generation,
            translate_config.target_language
        );

        match self.api.translate_text(&text, translate_config).await {
            Ok(translated) => {
                log::info!(
                    "[PIPELINE] Run {}: complete ({} chars translated)",
                    generation,
                    translated.len()
                );
                if self.commit(generation, |snap| {
                    snap.status = PipelineStatus::Complete;
                    snap.translated_text = translated;
                    snap.show_translation = true;
                }) {
                    RunOutcome::Done(PipelineStatus::Complete)
                } else {
                    RunOutcome::Superseded
                }
            }
            Err(e) => self.fail(generation, e),
        }
    }

    // ── Run mechanics ────────────────────────────────────────────────

    /// OCR leg shared by `recognize` and `rerun_recognition`.
    async fn run_recognition(
        &self,
        generation: u64,
        image: SourceImage,
        config: &OcrConfig,
    ) -> RunOutcome {
        if !self.commit(generation, |snap| {
            snap.status = PipelineStatus::RecognizingText;
        }) {
            return RunOutcome::Superseded;
        }
        log::info!("[PIPELINE] Run {}: recognizing text", generation);

        match self.api.recognize_text(&image, config).await {
            Ok(text) => {
                log::info!("[PIPELINE] Run {}: recognized {} chars", generation, text.len());
                if self.commit(generation, |snap| {
                    snap.status = PipelineStatus::TextRecognized;
                    snap.recognized_text = text;
                }) {
                    RunOutcome::Done(PipelineStatus::TextRecognized)
                } else {
                    RunOutcome::Superseded
                }
            }
            Err(e) => self.fail(generation, e),
        }
    }

    /// Install a fresh snapshot and claim a new generation. Any in-flight
    /// run is superseded from this point on. `None` keeps the current image.
    fn begin_run(&self, image: Option<SourceImage>) -> u64 {
        let generation = self.runs.fetch_add(1, Ordering::Relaxed) + 1;
        self.tx.send_modify(|snap| {
            if let Some(image) = image {
                snap.image = Some(image);
            }
            snap.status = PipelineStatus::Idle;
            snap.recognized_text.clear();
            snap.translated_text.clear();
            snap.error_detail = None;
            snap.show_translation = false;
            snap.generation = generation;
        });
        generation
    }

    /// Apply `update` to the snapshot iff `generation` is still current.
    /// Returns false when a newer run has taken over.
    fn commit(&self, generation: u64, update: impl FnOnce(&mut PipelineSnapshot)) -> bool {
        let mut applied = false;
        self.tx.send_if_modified(|snap| {
            if snap.generation != generation {
                return false;
            }
            update(snap);
            applied = true;
            true
        });
        applied
    }

    /// Commit a failure for `generation` and wrap it for the caller.
    fn fail(&self, generation: u64, error: ApiError) -> RunOutcome {
        log::error!("[PIPELINE] Run {}: {}", generation, error);
        let committed = self.commit(generation, |snap| {
            snap.status = PipelineStatus::Failed;
            snap.error_detail = Some(error.to_string());
        });
        if committed {
            RunOutcome::Failed(error)
        } else {
            RunOutcome::Superseded
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_snapshot_is_idle_and_empty() {
        let snap = PipelineSnapshot::initial();
        assert_eq!(snap.status, PipelineStatus::Idle);
        assert!(snap.image.is_none());
        assert!(snap.recognized_text.is_empty());
        assert!(snap.translated_text.is_empty());
        assert!(snap.error_detail.is_none());
        assert!(!snap.show_translation);
        assert_eq!(snap.generation, 0);
    }

    #[test]
    fn status_serializes_camel_case() {
        let json = serde_json::to_string(&PipelineStatus::RecognizingText).unwrap();
        assert_eq!(json, "\"recognizingText\"");
        let json = serde_json::to_string(&PipelineStatus::TextRecognized).unwrap();
        assert_eq!(json, "\"textRecognized\"");
    }

    #[test]
    fn snapshot_serializes_for_presentation() {
        let mut snap = PipelineSnapshot::initial();
        snap.image = Some(crate::capture::SourceImage::from_base64("QUJD"));
        snap.recognized_text = "Hello".to_string();
        let value = serde_json::to_value(&snap).unwrap();
        assert_eq!(value["image"], "QUJD");
        assert_eq!(value["status"], "idle");
        assert_eq!(value["recognizedText"], "Hello");
        assert_eq!(value["showTranslation"], false);
        assert_eq!(value["errorDetail"], serde_json::Value::Null);
    }
}
