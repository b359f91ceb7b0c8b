//! Upload-to-document orchestration.
//!
//! Picks the conversion path for an upload, runs CPU-bound stages on the
//! blocking pool and collects non-fatal warnings for the response.

use std::fmt;
use std::sync::Arc;

use cmyk_pdf::{export_pdf, ExportError, IccProfile, RasterImage};
use image::imageops::FilterType;
use image::RgbaImage;
use thiserror::Error;

use crate::error::RenderError;
use crate::models::{AppConfig, ExportFormat, ExportRequest, PdfLimits, UploadKind};
use crate::rendering::tiff::clamp_to_limits;
use crate::rendering::{decode_raster, resize_to, target_size, SvgRenderer, TiffExporter};
use crate::services::external::{CollaboratorError, ColorNormalizer, PdfPageRenderer, SvgRasterizer};
use crate::services::profiles::{ProfileRegistry, ProfileUnavailable};

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Unsupported upload: {0}")]
    UnsupportedUpload(String),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error(transparent)]
    Profile(#[from] ProfileUnavailable),

    #[error("Export task failed: {0}")]
    Task(String),
}

/// Non-fatal condition reported alongside a finished export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportWarning {
    /// Raised by the PDF builder.
    Core(cmyk_pdf::ExportWarning),
    AntialiasSkipped(String),
    /// The SVG could not be converted as vectors and was rasterized instead.
    VectorFallback(String),
}

impl fmt::Display for ExportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportWarning::Core(warning) => write!(f, "{warning}"),
            ExportWarning::AntialiasSkipped(reason) => write!(f, "antialiasing skipped: {reason}"),
            ExportWarning::VectorFallback(reason) => {
                write!(f, "vector conversion failed, SVG was rasterized: {reason}")
            }
        }
    }
}

impl From<cmyk_pdf::ExportWarning> for ExportWarning {
    fn from(warning: cmyk_pdf::ExportWarning) -> Self {
        ExportWarning::Core(warning)
    }
}

/// An uploaded file as received from the client.
#[derive(Debug, Clone, Default)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

#[derive(Debug)]
pub struct ExportResponse {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub file_name: String,
    pub warnings: Vec<ExportWarning>,
}

type Converted = (Vec<u8>, Vec<ExportWarning>);

pub struct ExportService {
    config: Arc<AppConfig>,
    profiles: Arc<ProfileRegistry>,
    svg_renderer: Arc<SvgRenderer>,
    rasterizer: Arc<dyn SvgRasterizer>,
    normalizer: Arc<dyn ColorNormalizer>,
    page_renderer: Arc<dyn PdfPageRenderer>,
}

impl ExportService {
    pub fn new(
        config: Arc<AppConfig>,
        profiles: Arc<ProfileRegistry>,
        svg_renderer: Arc<SvgRenderer>,
        rasterizer: Arc<dyn SvgRasterizer>,
        normalizer: Arc<dyn ColorNormalizer>,
        page_renderer: Arc<dyn PdfPageRenderer>,
    ) -> Self {
        Self {
            config,
            profiles,
            svg_renderer,
            rasterizer,
            normalizer,
            page_renderer,
        }
    }

    pub async fn export(
        &self,
        upload: Upload,
        request: &ExportRequest,
    ) -> Result<ExportResponse, ConversionError> {
        let kind = UploadKind::detect(upload.content_type.as_deref(), upload.file_name.as_deref())
            .ok_or_else(|| {
                ConversionError::UnsupportedUpload(format!(
                    "{} ({})",
                    upload.file_name.as_deref().unwrap_or("unnamed"),
                    upload.content_type.as_deref().unwrap_or("no content type"),
                ))
            })?;

        tracing::info!(
            kind = ?kind,
            format = %request.format,
            bytes = upload.bytes.len(),
            name = %request.name,
            "Starting export"
        );
        let started = std::time::Instant::now();

        let (bytes, warnings) = match request.format {
            ExportFormat::Pdf => self.to_pdf(kind, upload.bytes, request).await?,
            ExportFormat::Tiff => self.to_tiff(kind, upload.bytes, request).await?,
        };

        for warning in &warnings {
            tracing::warn!(%warning, "Export degraded");
        }
        tracing::info!(
            format = %request.format,
            bytes = bytes.len(),
            warnings = warnings.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Export finished"
        );

        Ok(ExportResponse {
            bytes,
            content_type: request.format.content_type(),
            file_name: request.file_name(),
            warnings,
        })
    }

    async fn to_pdf(
        &self,
        kind: UploadKind,
        bytes: Vec<u8>,
        request: &ExportRequest,
    ) -> Result<Converted, ConversionError> {
        match kind {
            UploadKind::Pdf => {
                let pdf = self.normalize(bytes, request).await?;
                Ok((pdf, Vec::new()))
            }
            UploadKind::Svg => {
                let converted = self
                    .rasterizer
                    .svg_to_pdf(bytes.clone(), request.width_px, request.height_px)
                    .await;
                match converted {
                    Ok(pdf) => {
                        let pdf = self.normalize(pdf, request).await?;
                        Ok((pdf, Vec::new()))
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Vector conversion failed, rasterizing SVG");
                        let (width, height) = (request.width_px, request.height_px);
                        let limits = self.config.pdf;
                        let image = self
                            .render_svg(bytes, move |w, h| {
                                pdf_raster_size(w, h, width, height, limits)
                            })
                            .await?;
                        let (pdf, mut warnings) = self.raster_pdf(image, request).await?;
                        warnings.insert(0, ExportWarning::VectorFallback(e.to_string()));
                        Ok((pdf, warnings))
                    }
                }
            }
            UploadKind::Raster => {
                let (width, height) = (request.width_px, request.height_px);
                let limits = self.config.pdf;
                let image = blocking(move || {
                    let image = decode_raster(&bytes)?;
                    let (w, h) =
                        pdf_raster_size(image.width(), image.height(), width, height, limits)?;
                    Ok::<_, RenderError>(resize_to(image, Some(w), Some(h), FilterType::Lanczos3))
                })
                .await??;
                self.raster_pdf(image, request).await
            }
        }
    }

    async fn to_tiff(
        &self,
        kind: UploadKind,
        bytes: Vec<u8>,
        request: &ExportRequest,
    ) -> Result<Converted, ConversionError> {
        let image = match kind {
            UploadKind::Pdf => {
                let png = self
                    .page_renderer
                    .render_first_page(bytes, request.tiff.dpi)
                    .await?;
                tracing::debug!(bytes = png.len(), dpi = request.tiff.dpi, "Rendered PDF page");
                blocking(move || decode_raster(&png)).await??
            }
            UploadKind::Svg => {
                let (width, height) = (request.width_px, request.height_px);
                let limits = self.config.tiff;
                self.render_svg(bytes, move |w, h| {
                    let (w, h) = target_size(w, h, width, height);
                    Ok(clamp_to_limits(w, h, limits))
                })
                .await?
            }
            UploadKind::Raster => blocking(move || decode_raster(&bytes)).await??,
        };

        let mut warnings = Vec::new();
        let profile = match self.profiles.get(&request.profile_id) {
            Ok(found) => Some(found.profile.clone()),
            Err(e) => {
                warnings.push(ExportWarning::Core(
                    cmyk_pdf::ExportWarning::ProfileNotEmbedded {
                        reason: e.reason,
                    },
                ));
                None
            }
        };

        let exporter = TiffExporter::new(self.config.tiff);
        let (width, height, options) = (request.width_px, request.height_px, request.tiff);
        let output = blocking(move || {
            exporter.export(image, width, height, &options, profile.as_ref())
        })
        .await??;

        if let Some(reason) = output.antialias_skipped {
            warnings.push(ExportWarning::AntialiasSkipped(reason));
        }
        Ok((output.bytes, warnings))
    }

    async fn render_svg<F>(&self, svg: Vec<u8>, size: F) -> Result<RgbaImage, ConversionError>
    where
        F: FnOnce(u32, u32) -> Result<(u32, u32), RenderError> + Send + 'static,
    {
        let renderer = self.svg_renderer.clone();
        let image = blocking(move || renderer.render(&svg, size)).await??;
        Ok(image)
    }

    async fn raster_pdf(
        &self,
        image: RgbaImage,
        request: &ExportRequest,
    ) -> Result<Converted, ConversionError> {
        let profile = self.builder_profile(request)?;
        let options = request.pdf.clone();

        let output = blocking(move || {
            let raster = RasterImage::from_rgba(image.width(), image.height(), image.as_raw())?;
            export_pdf(&raster, &options, profile.as_ref())
        })
        .await??;

        tracing::debug!(
            version = %output.version,
            objects = output.object_count,
            "Built raster PDF"
        );
        let warnings = output.warnings.into_iter().map(ExportWarning::from).collect();
        Ok((output.bytes, warnings))
    }

    /// Profile for the PDF builder.
    ///
    /// A missing profile is fatal under a PDF/X standard. Without one the
    /// builder falls back to DeviceCMYK and reports it.
    fn builder_profile(&self, request: &ExportRequest) -> Result<Option<IccProfile>, ExportError> {
        let standard = request.pdf.requested_standard();
        match self.profiles.get(&request.profile_id) {
            Ok(found) => Ok(Some(found.profile.clone())),
            Err(e) if !standard.is_none() => Err(ExportError::ProfileUnavailable {
                standard: standard.name().to_string(),
                reason: e.reason,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Exporting without ICC profile");
                Ok(None)
            }
        }
    }

    async fn normalize(
        &self,
        pdf: Vec<u8>,
        request: &ExportRequest,
    ) -> Result<Vec<u8>, ConversionError> {
        let path = self.profiles.get(&request.profile_id)?.path.clone();
        let normalized = self
            .normalizer
            .normalize(
                pdf,
                request.pdf.requested_version(),
                request.pdf.requested_standard(),
                &path,
            )
            .await?;
        Ok(normalized)
    }
}

/// Output size for a PDF raster, refused when it exceeds `limits`.
fn pdf_raster_size(
    src_w: u32,
    src_h: u32,
    width: Option<u32>,
    height: Option<u32>,
    limits: PdfLimits,
) -> Result<(u32, u32), RenderError> {
    let (w, h) = target_size(src_w, src_h, width, height);
    if !limits.allows(w, h) {
        tracing::warn!(
            width = w,
            height = h,
            max_dimension = limits.max_dimension,
            max_total_pixels = limits.max_total_pixels,
            "Refusing oversized PDF raster"
        );
        return Err(RenderError::UnsupportedDimensions {
            width: w,
            height: h,
        });
    }
    Ok((w, h))
}

/// Run CPU-bound work on the blocking pool.
async fn blocking<T, F>(work: F) -> Result<T, ConversionError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ConversionError::Task(e.to_string()))
}
