//! Integration tests for file classification and extraction
//!
//! Covers the closed variant set, the never-fails contract, and the vision
//! path against a wiremock model endpoint.

use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

use courier_server::config::AgentConfig;
use courier_server::extract::{ERROR_PREFIX, Extractor, FileKind, VisionClient, classify};

// =============================================================================
// Classification
// =============================================================================

#[test]
fn test_classify_image_suffixes_case_insensitive() {
    for name in [
        "a.png", "b.jpg", "c.JPEG", "d.gif", "e.BMP", "f.webp",
    ] {
        assert_eq!(classify(name, ""), FileKind::Image, "failed for {name}");
    }
}

#[test]
fn test_classify_mime_overrides_suffix() {
    // A client lying about the suffix does not fool the classifier
    assert_eq!(classify("totally_a_song.mp3", "text/csv"), FileKind::Tabular);
    assert_eq!(classify("notes.csv", "application/pdf"), FileKind::Document);
}

#[test]
fn test_classify_unknown_is_unsupported() {
    assert_eq!(classify("program.exe", ""), FileKind::Unsupported);
    assert_eq!(classify("", ""), FileKind::Unsupported);
}

// =============================================================================
// Extraction Contract
// =============================================================================

#[tokio::test]
async fn test_csv_summary_structure() {
    let extractor = Extractor::default();
    let csv = b"city,population\nOslo,709037\nBergen,291940\n";
    let summary = extractor.extract("cities.csv", csv, "text/csv").await;

    assert!(summary.contains("Columns: 2, Rows: 2"));
    assert!(summary.contains("city (text): 2 non-empty"));
    assert!(summary.contains("population (integer)"));
}

#[tokio::test]
async fn test_unparsable_csv_never_panics() {
    let extractor = Extractor::default();
    let summary = extractor
        .extract("broken.csv", b"a,b\n1,2,3,4\n", "text/csv")
        .await;
    assert!(summary.starts_with(ERROR_PREFIX));
    assert!(summary.contains("CSV analysis failed"));
}

#[tokio::test]
async fn test_txt_passthrough_preserves_content() {
    let extractor = Extractor::default();
    let text = extractor
        .extract("hello.txt", "grüße aus oslo".as_bytes(), "text/plain")
        .await;
    assert_eq!(text, "grüße aus oslo");
}

#[tokio::test]
async fn test_unsupported_file_names_the_upload() {
    let extractor = Extractor::default();
    let text = extractor.extract("backup.tar.gz", &[0x1f, 0x8b], "").await;
    assert_eq!(text, "Unsupported file type: backup.tar.gz");
}

// =============================================================================
// Vision Path
// =============================================================================

fn vision_for(server: &MockServer) -> VisionClient {
    VisionClient::new(&AgentConfig {
        api_url: server.uri(),
        api_key: Some("test-key".to_string()),
        vision_model: "vision-model".to_string(),
        ..AgentConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_image_description_round_trip() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"content": "A red bicycle against a wall."}}]
        })))
        .mount(&server)
        .await;

    let extractor = Extractor::new(Some(vision_for(&server)));
    let description = extractor
        .extract("bike.jpg", &[0xff, 0xd8, 0xff], "image/jpeg")
        .await;

    assert_eq!(description, "A red bicycle against a wall.");

    // The image went out as a base64 data URL with its MIME type
    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let content = serde_json::to_string(&body["messages"][0]["content"]).unwrap();
    assert!(content.contains("data:image/jpeg;base64,"));
    assert_eq!(body["model"], "vision-model");
}

#[tokio::test]
async fn test_vision_failure_becomes_error_string() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model overloaded"))
        .mount(&server)
        .await;

    let extractor = Extractor::new(Some(vision_for(&server)));
    let text = extractor
        .extract("photo.png", &[0x89, 0x50], "image/png")
        .await;

    assert!(text.starts_with(ERROR_PREFIX));
    assert!(text.contains("image analysis failed"));
}
