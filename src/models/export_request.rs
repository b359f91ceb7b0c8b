//! Export request parsing and validation.
//!
//! Form fields arrive as loose strings; [`ExportForm::into_request`] turns
//! them into a typed [`ExportRequest`] or a [`RequestError`] naming the
//! offending field.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use cmyk_pdf::{CompressionMode, ExportError, PdfExportOptions, PdfStandard, PdfVersion};
use regex::Regex;
use thiserror::Error;

use super::AppConfig;

/// Color profile used when the request does not name one.
pub const DEFAULT_PROFILE_ID: &str = "coated_fogra39";
const FALLBACK_NAME: &str = "export";

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Invalid value for {field}: {value}")]
    InvalidField { field: &'static str, value: String },

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Unsupported TIFF compression: {0}")]
    UnsupportedTiffCompression(String),

    #[error("Unsupported antialias mode: {0}")]
    UnsupportedAntialias(String),

    #[error(transparent)]
    Export(#[from] ExportError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Pdf,
    Tiff,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Tiff => "tiff",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Tiff => "image/tiff",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "pdf" => Ok(ExportFormat::Pdf),
            "tiff" | "tif" => Ok(ExportFormat::Tiff),
            _ => Err(RequestError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Compression for TIFF strips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TiffCompression {
    #[default]
    None,
    Lzw,
    Deflate,
    PackBits,
}

impl FromStr for TiffCompression {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(TiffCompression::None),
            "lzw" => Ok(TiffCompression::Lzw),
            "deflate" | "zip" => Ok(TiffCompression::Deflate),
            "packbits" => Ok(TiffCompression::PackBits),
            _ => Err(RequestError::UnsupportedTiffCompression(s.to_string())),
        }
    }
}

/// Edge smoothing applied to raster TIFF output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Antialias {
    #[default]
    None,
    /// 3x3 box blur
    Fast,
    /// 3x3 Gaussian
    Balanced,
    /// 5x5 Gaussian, two passes
    Best,
    /// 2x Lanczos supersample, suited to shapes
    BestObjects,
    /// Unsharp mask, suited to text
    BestType,
}

impl FromStr for Antialias {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Antialias::None),
            "fast" => Ok(Antialias::Fast),
            "balanced" => Ok(Antialias::Balanced),
            "best" => Ok(Antialias::Best),
            "best-objects" | "best_objects" => Ok(Antialias::BestObjects),
            "best-type" | "best_type" => Ok(Antialias::BestType),
            _ => Err(RequestError::UnsupportedAntialias(s.to_string())),
        }
    }
}

impl fmt::Display for Antialias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Antialias::None => "none",
            Antialias::Fast => "fast",
            Antialias::Balanced => "balanced",
            Antialias::Best => "best",
            Antialias::BestObjects => "best-objects",
            Antialias::BestType => "best-type",
        })
    }
}

/// What the uploaded file is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Svg,
    Pdf,
    Raster,
}

impl UploadKind {
    /// Classify an upload by content type, then by file extension.
    pub fn detect(content_type: Option<&str>, file_name: Option<&str>) -> Option<Self> {
        let mime = content_type.unwrap_or_default().to_ascii_lowercase();
        if mime.contains("svg") {
            return Some(UploadKind::Svg);
        }
        if mime == "application/pdf" {
            return Some(UploadKind::Pdf);
        }
        if mime.starts_with("image/") {
            return Some(UploadKind::Raster);
        }

        let extension = file_name
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase())?;
        match extension.as_str() {
            "svg" => Some(UploadKind::Svg),
            "pdf" => Some(UploadKind::Pdf),
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp" | "tif" | "tiff" => {
                Some(UploadKind::Raster)
            }
            _ => None,
        }
    }
}

/// TIFF-specific settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TiffOptions {
    pub compression: TiffCompression,
    pub antialias: Antialias,
    pub dpi: f64,
}

/// A validated export request.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub format: ExportFormat,
    /// Sanitized base name for the download
    pub name: String,
    pub pdf: PdfExportOptions,
    pub profile_id: String,
    pub tiff: TiffOptions,
    pub width_px: Option<u32>,
    pub height_px: Option<u32>,
}

impl ExportRequest {
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.format.extension())
    }
}

/// Raw form fields as sent by the client.
#[derive(Debug, Clone, Default)]
pub struct ExportForm {
    pub format: Option<String>,
    pub name: Option<String>,
    pub dpi: Option<String>,
    pub pdf_version: Option<String>,
    pub pdf_standard: Option<String>,
    pub pdf_compression: Option<String>,
    pub pdf_color_profile: Option<String>,
    pub tiff_compression: Option<String>,
    pub tiff_antialias: Option<String>,
    pub tiff_dpi: Option<String>,
    pub width_px: Option<String>,
    pub height_px: Option<String>,
}

impl ExportForm {
    /// Store a multipart text field. Unknown names are ignored.
    pub fn set(&mut self, field: &str, value: String) {
        let slot = match field {
            "format" => &mut self.format,
            "name" => &mut self.name,
            "dpi" => &mut self.dpi,
            "pdfVersion" => &mut self.pdf_version,
            "pdfStandard" => &mut self.pdf_standard,
            "pdfCompression" => &mut self.pdf_compression,
            "pdfColorProfile" => &mut self.pdf_color_profile,
            "tiffCompression" => &mut self.tiff_compression,
            "tiffAntialias" => &mut self.tiff_antialias,
            "tiffDpi" | "tiffPpi" => &mut self.tiff_dpi,
            "widthPx" => &mut self.width_px,
            "heightPx" => &mut self.height_px,
            _ => return,
        };
        *slot = Some(value);
    }

    pub fn into_request(self, config: &AppConfig) -> Result<ExportRequest, RequestError> {
        let format: ExportFormat = self.format.as_deref().unwrap_or_default().parse()?;
        let dpi = parse_positive("dpi", self.dpi.as_deref())?.unwrap_or(config.default_dpi);
        let tiff_dpi = parse_positive("tiffDpi", self.tiff_dpi.as_deref())?.unwrap_or(dpi);

        let version = match non_empty(self.pdf_version.as_deref()) {
            Some(v) => v.parse::<PdfVersion>()?,
            None => PdfVersion::default(),
        };
        let standard: PdfStandard = self.pdf_standard.as_deref().unwrap_or_default().parse()?;
        let compression: CompressionMode =
            self.pdf_compression.as_deref().unwrap_or_default().parse()?;

        let pdf = PdfExportOptions::new()
            .version(version)
            .standard(standard)
            .compression(compression)
            .dpi(dpi)
            .embed_profile(config.embed_profile);

        Ok(ExportRequest {
            format,
            name: sanitize_name(self.name.as_deref().unwrap_or_default()),
            pdf,
            profile_id: non_empty(self.pdf_color_profile.as_deref())
                .unwrap_or(DEFAULT_PROFILE_ID)
                .to_string(),
            tiff: TiffOptions {
                compression: self.tiff_compression.as_deref().unwrap_or_default().parse()?,
                antialias: self.tiff_antialias.as_deref().unwrap_or_default().parse()?,
                dpi: tiff_dpi,
            },
            width_px: parse_dimension("widthPx", self.width_px.as_deref())?,
            height_px: parse_dimension("heightPx", self.height_px.as_deref())?,
        })
    }
}

/// Replace every run of characters outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize_name(raw: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let unsafe_runs =
        UNSAFE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9_\-]+").expect("pattern is valid"));

    let cleaned = unsafe_runs.replace_all(raw.trim(), "_");
    if cleaned.is_empty() || cleaned == "_" {
        FALLBACK_NAME.to_string()
    } else {
        cleaned.into_owned()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_positive(field: &'static str, value: Option<&str>) -> Result<Option<f64>, RequestError> {
    let Some(raw) = non_empty(value) else {
        return Ok(None);
    };
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(Some(v)),
        _ => Err(RequestError::InvalidField {
            field,
            value: raw.to_string(),
        }),
    }
}

fn parse_dimension(field: &'static str, value: Option<&str>) -> Result<Option<u32>, RequestError> {
    let Some(raw) = non_empty(value) else {
        return Ok(None);
    };
    match raw.parse::<u32>() {
        Ok(v) if v > 0 => Ok(Some(v)),
        _ => Err(RequestError::InvalidField {
            field,
            value: raw.to_string(),
        }),
    }
}
