//! What the crate writes to the log, checked end to end.
//!
//! The API key travels in the Authorization header and nowhere else;
//! log lines about a request report the key's length only. These tests
//! install a recording logger, drive every path that formats config
//! values, and scan what was emitted. The logger is process-global, so
//! this suite lives in its own binary.

use std::net::SocketAddr;
use std::sync::Mutex;

use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;

use snipglot::{ApiConfig, ChatClient, OcrConfig, SettingsStore, SourceImage, TranslateConfig};

// ── Recording logger ─────────────────────────────────────────────────

static RECORDS: Mutex<Vec<String>> = Mutex::new(Vec::new());

struct RecordingLogger;

impl log::Log for RecordingLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        RECORDS.lock().unwrap().push(format!(
            "{} {}: {}",
            record.level(),
            record.target(),
            record.args()
        ));
    }

    fn flush(&self) {}
}

static LOGGER: RecordingLogger = RecordingLogger;

fn install_recorder() {
    // Tests in this binary share the one global logger slot.
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(log::LevelFilter::Debug);
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Serve a canned reply on an ephemeral port.
async fn spawn_reply(status: StatusCode, body: &'static str) -> SocketAddr {
    let app = Router::new().route(
        "/chat/completions",
        post(move || async move { (status, body) }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

const SECRET: &str = "sk-secret-XYZ";

fn config_with_secret(addr: SocketAddr) -> ApiConfig {
    ApiConfig {
        endpoint_base: format!("http://{}", addr),
        api_key: SECRET.to_string(),
        model_name: "gpt-4o-mini".to_string(),
        prompt_override: None,
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[tokio::test]
async fn api_key_never_appears_in_log_output() {
    install_recorder();

    let ok = spawn_reply(
        StatusCode::OK,
        r#"{"choices": [{"message": {"content": "Hello"}}]}"#,
    )
    .await;
    let broken = spawn_reply(
        StatusCode::INTERNAL_SERVER_ERROR,
        r#"{"error": {"message": "overloaded"}}"#,
    )
    .await;

    // Success, HTTP failure, and the connection test each log request
    // and response details.
    let client = ChatClient::new();
    let image = SourceImage::from_png_bytes(b"\x89PNG\r\n\x1a\nfake");
    client
        .recognize_text(&image, &config_with_secret(ok))
        .await
        .unwrap();
    client
        .recognize_text(&image, &config_with_secret(broken))
        .await
        .unwrap_err();
    let translate = TranslateConfig {
        api: config_with_secret(ok),
        target_language: "German".to_string(),
    };
    client.translate_text("Hello", &translate).await.unwrap();
    client.test_connection(&config_with_secret(ok)).await;
    client.test_connection(&config_with_secret(broken)).await;

    // The store logs where it saved; the key goes to disk, not the log.
    let dir = tempfile::tempdir().unwrap();
    let store = SettingsStore::open_at(dir.path());
    store.save_ocr(&config_with_secret(ok)).unwrap();

    let records = RECORDS.lock().unwrap();
    assert!(!records.is_empty(), "recorder captured nothing");
    for line in records.iter() {
        assert!(!line.contains(SECRET), "key leaked into: {}", line);
    }
    let length_line = format!("key: {} chars", SECRET.len());
    assert!(
        records.iter().any(|line| line.contains(&length_line)),
        "expected the key-length line, got: {:#?}",
        *records
    );
}

#[test]
fn unreadable_config_load_warns_and_falls_back() {
    install_recorder();

    let dir = tempfile::tempdir().unwrap();
    let store = SettingsStore::open_at(dir.path());
    // A directory at the record's path fails the read with an error
    // other than NotFound, the case a plain missing file must not log.
    std::fs::create_dir_all(dir.path().join("ocr_api_config.json")).unwrap();

    assert_eq!(store.load_ocr(), OcrConfig::default());
    let records = RECORDS.lock().unwrap();
    assert!(
        records
            .iter()
            .any(|line| line.contains("Unreadable OCR config")),
        "expected a degraded-load warning, got: {:#?}",
        *records
    );
}
