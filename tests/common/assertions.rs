//! Assertion helpers for tests.

use axum::http::StatusCode;
use pretty_assertions::assert_eq;

use super::app::TestResponse;

/// Assert response has expected status code
pub fn assert_status(response: &TestResponse, expected: StatusCode) {
    assert_eq!(
        response.status,
        expected,
        "Expected status {}, got {}. Body: {}",
        expected,
        response.status,
        response.text()
    );
}

/// Assert response is OK (200)
pub fn assert_ok(response: &TestResponse) {
    assert_status(response, StatusCode::OK);
}

/// Assert response is a PDF download named `file_name`
pub fn assert_pdf(response: &TestResponse, file_name: &str) {
    assert_ok(response);
    assert!(
        response.is_pdf(),
        "Expected PDF, got {} bytes starting with {:?}",
        response.body.len(),
        &response.body[..8.min(response.body.len())]
    );
    assert_eq!(response.header("content-type"), Some("application/pdf"));
    assert_attachment(response, file_name);
}

/// Assert response is a TIFF download named `file_name`
pub fn assert_tiff(response: &TestResponse, file_name: &str) {
    assert_ok(response);
    assert!(
        response.is_tiff(),
        "Expected TIFF, got {} bytes starting with {:?}",
        response.body.len(),
        &response.body[..8.min(response.body.len())]
    );
    assert_eq!(response.header("content-type"), Some("image/tiff"));
    assert_attachment(response, file_name);
}

pub fn assert_attachment(response: &TestResponse, file_name: &str) {
    let expected = format!("attachment; filename=\"{file_name}\"");
    assert_eq!(
        response.header("content-disposition"),
        Some(expected.as_str())
    );
}

/// Assert a JSON error body with the given status
pub fn assert_json_error(response: &TestResponse, expected: StatusCode) {
    assert_status(response, expected);
    let json: serde_json::Value = response.json();
    assert_eq!(
        json["status"].as_u64(),
        Some(expected.as_u16() as u64),
        "Full response: {}",
        serde_json::to_string_pretty(&json).unwrap()
    );
    assert!(json["error"].is_string(), "missing error message: {json}");
}

/// Assert that `needle` occurs somewhere in `haystack`
pub fn assert_contains_bytes(haystack: &[u8], needle: &[u8]) {
    assert!(
        haystack.windows(needle.len()).any(|w| w == needle),
        "Expected to find {:?}",
        String::from_utf8_lossy(needle)
    );
}
