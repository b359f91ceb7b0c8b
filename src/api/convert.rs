use axum::{
    extract::{Multipart, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderName, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::{ApiError, ErrorResponse};
use crate::models::{AppConfig, ExportForm};
use crate::services::{ExportService, Upload};

/// Response header carrying one export warning each.
pub const WARNING_HEADER: HeaderName = HeaderName::from_static("x-export-warning");

/// Multipart field holding the uploaded file.
const FILE_FIELD: &str = "image";

/// Multipart form accepted by `/convert` (documentation only; the handler
/// reads the fields one by one).
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConvertForm {
    /// File to convert: PNG, JPEG, GIF, WebP, BMP, TIFF, SVG or PDF
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
    /// Output format: `pdf` (default) or `tiff`
    pub format: Option<String>,
    /// Base name of the downloaded file
    pub name: Option<String>,
    /// Resolution in dots per inch (default 96)
    pub dpi: Option<String>,
    /// Requested PDF version, e.g. `1.4`
    pub pdf_version: Option<String>,
    /// `none`, `PDF/X-1a:2001`, `PDF/X-3:2002`, `PDF/X-3:2003` or `PDF/X-4:2008`
    pub pdf_standard: Option<String>,
    /// `none`, `lzw` or `runlength`
    pub pdf_compression: Option<String>,
    /// ICC profile id, e.g. `coated_fogra39`
    pub pdf_color_profile: Option<String>,
    /// `none`, `lzw`, `deflate` or `packbits`
    pub tiff_compression: Option<String>,
    /// `none`, `fast`, `balanced`, `best`, `best-objects` or `best-type`
    pub tiff_antialias: Option<String>,
    /// TIFF resolution; defaults to `dpi`
    pub tiff_dpi: Option<String>,
    pub width_px: Option<String>,
    pub height_px: Option<String>,
}

/// Convert an upload into a print-ready CMYK PDF or TIFF
///
/// Raster uploads are converted in-process. SVG and PDF uploads go through
/// the external vector converters when producing PDF; for TIFF the first PDF
/// page is rendered by Ghostscript. Non-fatal problems are reported in
/// `X-Export-Warning` headers.
#[utoipa::path(
    post,
    path = "/convert",
    request_body(content = ConvertForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Converted document", content_type = "application/pdf"),
        (status = 400, description = "Invalid request or upload", body = ErrorResponse),
        (status = 413, description = "Upload too large", body = ErrorResponse),
        (status = 502, description = "External converter failed", body = ErrorResponse),
    ),
    tag = "Export"
)]
pub async fn handle_convert(
    State(config): State<Arc<AppConfig>>,
    State(service): State<Arc<ExportService>>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut form = ExportForm::default();
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == FILE_FIELD {
            let content_type = field.content_type().map(str::to_string);
            let file_name = field.file_name().map(str::to_string);
            let bytes = field.bytes().await?;
            tracing::debug!(
                file_name = ?file_name,
                content_type = ?content_type,
                bytes = bytes.len(),
                "Received upload"
            );
            upload = Some(Upload {
                bytes: bytes.to_vec(),
                content_type,
                file_name,
            });
        } else {
            form.set(&name, field.text().await?);
        }
    }

    let upload = upload.ok_or(ApiError::MissingFile)?;
    let request = form.into_request(&config)?;
    let exported = service.export(upload, &request).await?;

    let disposition = format!("attachment; filename=\"{}\"", exported.file_name);
    let mut response = (StatusCode::OK, exported.bytes).into_response();
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(exported.content_type));
    headers.insert(
        CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition).map_err(|e| ApiError::Internal(e.to_string()))?,
    );
    for warning in &exported.warnings {
        if let Ok(value) = HeaderValue::from_str(&header_text(&warning.to_string())) {
            headers.append(WARNING_HEADER, value);
        }
    }

    Ok(response)
}

/// Collapse control characters so tool output fits in a header value.
fn header_text(message: &str) -> String {
    message
        .chars()
        .map(|c| if c.is_control() || !c.is_ascii() { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
