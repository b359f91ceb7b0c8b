//! In-process stand-ins for the external converters.

use async_trait::async_trait;
use cmyk_export::services::{CollaboratorError, ColorNormalizer, PdfPageRenderer, SvgRasterizer};
use cmyk_pdf::{PdfStandard, PdfVersion};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Trailer appended by [`MockNormalizer`] to every document it returns.
pub const NORMALIZED_MARKER: &[u8] = b"\n% normalized to CMYK";

/// Vector PDF returned by a succeeding [`MockRasterizer`].
pub const VECTOR_PDF: &[u8] = b"%PDF-1.5\n% vector stand-in\n%%EOF";

pub struct MockRasterizer {
    fail_with: Option<String>,
    calls: Mutex<Vec<(Option<u32>, Option<u32>)>>,
}

impl MockRasterizer {
    pub fn succeeding() -> Self {
        Self {
            fail_with: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Behave like a missing `rsvg-convert` binary.
    pub fn not_installed() -> Self {
        Self {
            fail_with: Some("rsvg-convert".to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Requested sizes, one entry per call.
    pub fn calls(&self) -> Vec<(Option<u32>, Option<u32>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SvgRasterizer for MockRasterizer {
    async fn svg_to_pdf(
        &self,
        _svg: Vec<u8>,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<Vec<u8>, CollaboratorError> {
        self.calls.lock().unwrap().push((width, height));
        match &self.fail_with {
            Some(tool) => Err(CollaboratorError::NotInstalled { tool: tool.clone() }),
            None => Ok(VECTOR_PDF.to_vec()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeCall {
    pub input: Vec<u8>,
    pub version: PdfVersion,
    pub standard: PdfStandard,
    pub profile_path: PathBuf,
}

pub struct MockNormalizer {
    exit_failure: bool,
    calls: Mutex<Vec<NormalizeCall>>,
}

impl MockNormalizer {
    pub fn succeeding() -> Self {
        Self {
            exit_failure: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Behave like Ghostscript exiting with an error.
    pub fn failing() -> Self {
        Self {
            exit_failure: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<NormalizeCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ColorNormalizer for MockNormalizer {
    async fn normalize(
        &self,
        pdf: Vec<u8>,
        version: PdfVersion,
        standard: PdfStandard,
        profile_path: &Path,
    ) -> Result<Vec<u8>, CollaboratorError> {
        self.calls.lock().unwrap().push(NormalizeCall {
            input: pdf.clone(),
            version,
            standard,
            profile_path: profile_path.to_path_buf(),
        });

        if self.exit_failure {
            return Err(CollaboratorError::Failed {
                tool: "gs".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "Unrecoverable error".to_string(),
            });
        }

        let mut out = pdf;
        out.extend_from_slice(NORMALIZED_MARKER);
        Ok(out)
    }
}

/// Stands in for Ghostscript's page rendering: returns a fixed PNG.
pub struct MockPageRenderer {
    page: Option<Vec<u8>>,
    calls: Mutex<Vec<f64>>,
}

impl MockPageRenderer {
    /// Render every page as `png`.
    pub fn returning(png: Vec<u8>) -> Self {
        Self {
            page: Some(png),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Behave like a missing `gs` binary.
    pub fn not_installed() -> Self {
        Self {
            page: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Requested resolutions, one entry per call.
    pub fn calls(&self) -> Vec<f64> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PdfPageRenderer for MockPageRenderer {
    async fn render_first_page(
        &self,
        _pdf: Vec<u8>,
        dpi: f64,
    ) -> Result<Vec<u8>, CollaboratorError> {
        self.calls.lock().unwrap().push(dpi);
        self.page
            .clone()
            .ok_or_else(|| CollaboratorError::NotInstalled {
                tool: "gs".to_string(),
            })
    }
}
