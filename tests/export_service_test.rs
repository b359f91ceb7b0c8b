//! Tests driving the export service directly, without HTTP.

mod common;

use cmyk_export::models::{AppConfig, ExportForm};
use cmyk_export::services::{ConversionError, ExportWarning, Upload};
use common::{fixtures, MockNormalizer, MockRasterizer, TestApp};
use pretty_assertions::assert_eq;

fn request(fields: &[(&str, &str)]) -> cmyk_export::models::ExportRequest {
    let mut form = ExportForm::default();
    for (name, value) in fields {
        form.set(name, value.to_string());
    }
    form.into_request(&AppConfig::default()).unwrap()
}

fn upload(file_name: &str, content_type: Option<&str>, bytes: Vec<u8>) -> Upload {
    Upload {
        bytes,
        content_type: content_type.map(str::to_string),
        file_name: Some(file_name.to_string()),
    }
}

#[tokio::test]
async fn test_pdf_response_metadata() {
    let app = TestApp::new();

    let exported = app
        .state
        .export_service
        .export(
            upload("pixels.png", Some("image/png"), fixtures::two_pixel_png()),
            &request(&[("name", "cover")]),
        )
        .await
        .unwrap();

    assert_eq!(exported.content_type, "application/pdf");
    assert_eq!(exported.file_name, "cover.pdf");
    assert!(exported.warnings.is_empty());
}

#[tokio::test]
async fn test_detects_kind_from_extension_only() {
    let app = TestApp::new();

    let exported = app
        .state
        .export_service
        .export(
            upload("drawing.svg", None, fixtures::HALF_GREEN_SVG.to_vec()),
            &request(&[]),
        )
        .await
        .unwrap();

    assert_eq!(app.rasterizer.calls().len(), 1);
    assert_eq!(app.normalizer.calls().len(), 1);
    assert!(exported.warnings.is_empty());
}

#[tokio::test]
async fn test_vector_fallback_warning_comes_first() {
    let app = TestApp::with_tools(MockRasterizer::not_installed(), MockNormalizer::succeeding());

    let exported = app
        .state
        .export_service
        .export(
            upload("drawing.svg", Some("image/svg+xml"), fixtures::HALF_GREEN_SVG.to_vec()),
            &request(&[("pdfStandard", "PDF/X-3:2003")]),
        )
        .await
        .unwrap();

    assert_eq!(exported.warnings.len(), 2, "{:?}", exported.warnings);
    assert!(matches!(exported.warnings[0], ExportWarning::VectorFallback(_)));
    assert!(matches!(
        exported.warnings[1],
        ExportWarning::Core(cmyk_pdf::ExportWarning::TransparencyFlattened { .. })
    ));
    assert!(exported.bytes.starts_with(b"%PDF-1.4\n"));
}

#[tokio::test]
async fn test_unknown_upload_kind() {
    let app = TestApp::new();

    let err = app
        .state
        .export_service
        .export(upload("archive.zip", None, vec![1, 2, 3]), &request(&[]))
        .await
        .unwrap_err();

    assert!(matches!(err, ConversionError::UnsupportedUpload(_)), "{err:?}");
}

#[tokio::test]
async fn test_tiff_without_profile_warns() {
    let app = TestApp::without_profiles();

    let exported = app
        .state
        .export_service
        .export(
            upload("a.png", Some("image/png"), fixtures::solid_png(3, 3, [255, 255, 255, 255])),
            &request(&[("format", "tiff")]),
        )
        .await
        .unwrap();

    assert_eq!(exported.content_type, "image/tiff");
    assert_eq!(exported.file_name, "export.tiff");
    assert_eq!(exported.warnings.len(), 1);
    assert!(matches!(
        exported.warnings[0],
        ExportWarning::Core(cmyk_pdf::ExportWarning::ProfileNotEmbedded { .. })
    ));
}

#[tokio::test]
async fn test_normalizer_profile_missing() {
    let app = TestApp::without_profiles();

    let err = app
        .state
        .export_service
        .export(
            upload("doc.pdf", Some("application/pdf"), b"%PDF-1.4\n%%EOF".to_vec()),
            &request(&[]),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ConversionError::Profile(_)), "{err:?}");
    assert!(app.normalizer.calls().is_empty());
}
