use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cmyk_pdf::ErrorKind;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::RequestError;
use crate::services::{CollaboratorError, ConversionError};

/// JSON body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// HTTP status code
    pub status: u16,
    /// Human-readable error message
    pub error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No image file received")]
    MissingFile,

    #[error("Upload error: {message}")]
    Upload { status: StatusCode, message: String },

    #[error("Invalid request: {0}")]
    Request(#[from] RequestError),

    #[error("Conversion failed: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<axum::extract::multipart::MultipartError> for ApiError {
    fn from(e: axum::extract::multipart::MultipartError) -> Self {
        ApiError::Upload {
            status: e.status(),
            message: e.body_text(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("SVG parse error: {0}")]
    SvgParse(String),

    #[error("Image decode error: {0}")]
    ImageDecode(String),

    #[error("Unsupported dimensions: {width}x{height}")]
    UnsupportedDimensions { width: u32, height: u32 },

    #[error("Failed to allocate pixmap")]
    PixmapAllocation,

    #[error("TIFF encode error: {0}")]
    TiffEncode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// Whether the error stems from the uploaded content rather than the
    /// server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RenderError::SvgParse(_)
                | RenderError::ImageDecode(_)
                | RenderError::UnsupportedDimensions { .. }
        )
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingFile | ApiError::Request(_) => StatusCode::BAD_REQUEST,
            ApiError::Upload { status, .. } => *status,
            ApiError::Conversion(e) => match e {
                ConversionError::UnsupportedUpload(_) | ConversionError::Profile(_) => {
                    StatusCode::BAD_REQUEST
                }
                ConversionError::Export(e) => match e.kind() {
                    ErrorKind::Configuration | ErrorKind::Decode => StatusCode::BAD_REQUEST,
                },
                ConversionError::Render(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
                ConversionError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
                ConversionError::Collaborator(CollaboratorError::Io { .. }) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                ConversionError::Collaborator(_) => StatusCode::BAD_GATEWAY,
                ConversionError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Conversion(e) => e.to_string(),
            ApiError::Request(e) => e.to_string(),
            _ => self.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %message, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %message, "Request rejected");
        }

        let body = Json(ErrorResponse {
            status: status.as_u16(),
            error: message,
        });

        (status, body).into_response()
    }
}
