//! Error taxonomy for document export.

use thiserror::Error;

use crate::raster::RasterError;

/// Broad class of an [`ExportError`].
///
/// Configuration errors are caller mistakes detected before any output is
/// produced; decode errors mean the pixel input itself is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Decode,
}

/// Fatal export error. No document bytes are produced when one is returned.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Unsupported PDF standard: {0}")]
    UnsupportedStandard(String),

    #[error("Unsupported compression: {0}")]
    UnsupportedCompression(String),

    #[error("Invalid PDF version: {0}")]
    InvalidVersion(String),

    #[error("Invalid resolution: {0}")]
    InvalidResolution(String),

    #[error("ICC profile unavailable for {standard}: {reason}")]
    ProfileUnavailable { standard: String, reason: String },

    #[error("Invalid raster: {0}")]
    InvalidRaster(#[from] RasterError),
}

impl ExportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExportError::InvalidRaster(_) => ErrorKind::Decode,
            _ => ErrorKind::Configuration,
        }
    }
}
