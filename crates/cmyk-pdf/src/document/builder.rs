//! PdfDocumentBuilder -- assembles the single-page object graph.
//!
//! Object ids are fixed for the five objects every document has and
//! allocated in one declared order for the optional ones:
//!
//! | id      | object                                   |
//! |---------|------------------------------------------|
//! | 1       | Catalog                                  |
//! | 2       | Pages                                    |
//! | 3       | Page                                     |
//! | 4       | Content stream                           |
//! | 5       | Image XObject                            |
//! | next    | ICC profile stream (if embedded)         |
//! | next    | OutputIntent (PDF/X only)                |
//! | next    | Info (PDF/X only)                        |
//! | next    | Soft mask (if transparency is kept)      |

use super::syntax::{literal, points, reference, Dictionary};
use super::writer::{write_document, PdfObject};
use crate::standard::{self, ResolvedStandard};
use crate::{
    CompressionMode, ExportError, ExportWarning, IccProfile, PdfStandard, PdfVersion, RasterImage,
};

const CATALOG_ID: u32 = 1;
const PAGES_ID: u32 = 2;
const PAGE_ID: u32 = 3;
const CONTENT_ID: u32 = 4;
const IMAGE_ID: u32 = 5;

const PRODUCER: &str = "CMYK Export Server";
const ICC_REGISTRY: &str = "http://www.color.org";

/// Default output resolution when the caller has none.
pub const DEFAULT_DPI: f64 = 96.0;

/// Per-export settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfExportOptions {
    version: PdfVersion,
    standard: PdfStandard,
    compression: CompressionMode,
    dpi: f64,
    embed_profile: bool,
}

impl Default for PdfExportOptions {
    fn default() -> Self {
        Self {
            version: PdfVersion::default(),
            standard: PdfStandard::None,
            compression: CompressionMode::None,
            dpi: DEFAULT_DPI,
            embed_profile: true,
        }
    }
}

impl PdfExportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requested file version; a standard or kept transparency may raise it.
    #[inline]
    pub fn version(mut self, version: PdfVersion) -> Self {
        self.version = version;
        self
    }

    #[inline]
    pub fn standard(mut self, standard: PdfStandard) -> Self {
        self.standard = standard;
        self
    }

    #[inline]
    pub fn compression(mut self, compression: CompressionMode) -> Self {
        self.compression = compression;
        self
    }

    /// Pixels per inch used to size the page. Values below 1 are raised to 1.
    #[inline]
    pub fn dpi(mut self, dpi: f64) -> Self {
        self.dpi = dpi;
        self
    }

    /// Tag the image with the ICC profile even without a PDF/X standard.
    ///
    /// On by default. PDF/X exports always embed the profile.
    #[inline]
    pub fn embed_profile(mut self, embed: bool) -> Self {
        self.embed_profile = embed;
        self
    }

    pub fn requested_version(&self) -> PdfVersion {
        self.version
    }

    pub fn requested_standard(&self) -> PdfStandard {
        self.standard
    }

    pub fn requested_compression(&self) -> CompressionMode {
        self.compression
    }
}

/// A finished document.
#[derive(Debug, Clone)]
pub struct PdfOutput {
    pub bytes: Vec<u8>,
    pub version: PdfVersion,
    pub object_count: usize,
    pub warnings: Vec<ExportWarning>,
}

/// Builds one single-page PDF around a [`RasterImage`].
///
/// ```
/// use cmyk_pdf::{PdfDocumentBuilder, PdfExportOptions, RasterImage};
///
/// let image = RasterImage::from_rgba(1, 1, &[255, 255, 255, 255]).unwrap();
/// let options = PdfExportOptions::new().embed_profile(false);
/// let output = PdfDocumentBuilder::new(&image, &options).build().unwrap();
///
/// assert_eq!(output.object_count, 5);
/// ```
pub struct PdfDocumentBuilder<'a> {
    image: &'a RasterImage,
    options: &'a PdfExportOptions,
    profile: Option<&'a IccProfile>,
}

impl<'a> PdfDocumentBuilder<'a> {
    pub fn new(image: &'a RasterImage, options: &'a PdfExportOptions) -> Self {
        Self {
            image,
            options,
            profile: None,
        }
    }

    /// Output profile to embed. Required when a PDF/X standard is requested.
    #[inline]
    pub fn profile(mut self, profile: Option<&'a IccProfile>) -> Self {
        self.profile = profile;
        self
    }

    pub fn build(&self) -> Result<PdfOutput, ExportError> {
        let dpi = effective_dpi(self.options.dpi)?;
        let ResolvedStandard {
            standard,
            version,
            conformance,
            keep_soft_mask,
            mut warnings,
        } = standard::resolve(
            self.options.standard,
            self.options.version,
            self.image.has_transparency(),
        );

        let profile = match (standard.is_none(), self.profile) {
            (false, None) => {
                return Err(ExportError::ProfileUnavailable {
                    standard: standard.name().to_string(),
                    reason: "no ICC profile supplied".to_string(),
                })
            }
            (false, Some(profile)) => Some(profile),
            (true, profile) if self.options.embed_profile => {
                if profile.is_none() {
                    warnings.push(ExportWarning::ProfileNotEmbedded {
                        reason: "no ICC profile supplied".to_string(),
                    });
                }
                profile
            }
            (true, _) => None,
        };

        let mut ids = IdAllocator::new(IMAGE_ID + 1);
        let icc_id = ids.next_if(profile.is_some());
        let output_intent_id = ids.next_if(conformance.is_some());
        let info_id = ids.next_if(conformance.is_some());
        let smask_id = ids.next_if(keep_soft_mask);

        let width = self.image.width();
        let height = self.image.height();
        let width_pt = points(f64::from(width) / dpi * 72.0);
        let height_pt = points(f64::from(height) / dpi * 72.0);
        let compression = self.options.compression;

        let mut objects = Vec::with_capacity(9);

        objects.push(PdfObject::dictionary(
            CATALOG_ID,
            Dictionary::new()
                .with("Type", "/Catalog")
                .with("Pages", reference(PAGES_ID))
                .with_opt("Trapped", output_intent_id.map(|_| "false"))
                .with_opt(
                    "OutputIntents",
                    output_intent_id.map(|id| format!("[{}]", reference(id))),
                ),
        ));

        objects.push(PdfObject::dictionary(
            PAGES_ID,
            Dictionary::new()
                .with("Type", "/Pages")
                .with("Count", "1")
                .with("Kids", format!("[{}]", reference(PAGE_ID))),
        ));

        objects.push(PdfObject::dictionary(
            PAGE_ID,
            Dictionary::new()
                .with("Type", "/Page")
                .with("Parent", reference(PAGES_ID))
                .with("MediaBox", format!("[0 0 {width_pt} {height_pt}]"))
                .with("Contents", reference(CONTENT_ID))
                .with(
                    "Resources",
                    format!(
                        "<< /ProcSet [/PDF /ImageC] /XObject << /Im0 {} >> >>",
                        reference(IMAGE_ID)
                    ),
                ),
        ));

        let content = format!("q\n{width_pt} 0 0 {height_pt} 0 0 cm\n/Im0 Do\nQ\n");
        objects.push(PdfObject::stream(
            CONTENT_ID,
            Dictionary::new(),
            content.into_bytes(),
        ));

        let color_space = match icc_id {
            Some(id) => format!("[/ICCBased {}]", reference(id)),
            None => "/DeviceCMYK".to_string(),
        };
        objects.push(PdfObject::stream(
            IMAGE_ID,
            with_filter(
                image_dictionary(width, height, color_space)
                    .with_opt("SMask", smask_id.map(reference)),
                compression,
            ),
            compression.encode(self.image.cmyk()),
        ));

        if let (Some(id), Some(profile)) = (icc_id, profile) {
            objects.push(PdfObject::stream(
                id,
                Dictionary::new()
                    .with("N", "4")
                    .with("Alternate", "/DeviceCMYK"),
                profile.data().to_vec(),
            ));
        }

        if let (Some(id), Some(icc_id), Some(profile)) = (output_intent_id, icc_id, profile) {
            objects.push(PdfObject::dictionary(
                id,
                Dictionary::new()
                    .with("Type", "/OutputIntent")
                    .with("S", "/GTS_PDFX")
                    .with(
                        "OutputConditionIdentifier",
                        literal(profile.output_condition_identifier()),
                    )
                    .with("OutputCondition", literal(profile.output_condition()))
                    .with("Info", literal(profile.name()))
                    .with("RegistryName", literal(ICC_REGISTRY))
                    .with("DestOutputProfile", reference(icc_id)),
            ));
        }

        if let (Some(id), Some(conformance)) = (info_id, conformance) {
            objects.push(PdfObject::dictionary(
                id,
                Dictionary::new()
                    .with("Producer", literal(PRODUCER))
                    .with("Creator", literal(PRODUCER))
                    .with("GTS_PDFXVersion", literal(conformance.version_tag))
                    .with("GTS_PDFXConformance", literal(conformance.conformance_tag)),
            ));
        }

        if let Some(id) = smask_id {
            objects.push(PdfObject::stream(
                id,
                with_filter(
                    image_dictionary(width, height, "/DeviceGray").with("Decode", "[0 1]"),
                    compression,
                ),
                compression.encode(self.image.alpha()),
            ));
        }

        debug_assert_eq!(objects.len() as u32, ids.allocated());
        let written = write_document(version, &objects, CATALOG_ID, info_id);

        tracing::debug!(
            width,
            height,
            version = %version,
            standard = %standard,
            compression = %compression,
            objects = objects.len(),
            bytes = written.bytes.len(),
            "Built PDF document"
        );

        Ok(PdfOutput {
            bytes: written.bytes,
            version,
            object_count: objects.len(),
            warnings,
        })
    }
}

/// Build a PDF for `image` in one call.
pub fn export_pdf(
    image: &RasterImage,
    options: &PdfExportOptions,
    profile: Option<&IccProfile>,
) -> Result<PdfOutput, ExportError> {
    PdfDocumentBuilder::new(image, options)
        .profile(profile)
        .build()
}

fn effective_dpi(dpi: f64) -> Result<f64, ExportError> {
    if !dpi.is_finite() || dpi <= 0.0 {
        return Err(ExportError::InvalidResolution(dpi.to_string()));
    }
    Ok(dpi.max(1.0))
}

fn image_dictionary(width: u32, height: u32, color_space: impl Into<String>) -> Dictionary {
    Dictionary::new()
        .with("Type", "/XObject")
        .with("Subtype", "/Image")
        .with("Width", width.to_string())
        .with("Height", height.to_string())
        .with("BitsPerComponent", "8")
        .with("ColorSpace", color_space)
}

fn with_filter(dict: Dictionary, compression: CompressionMode) -> Dictionary {
    dict.with_opt("Filter", compression.filter_name())
        .with_opt("DecodeParms", compression.decode_parms())
}

/// Hands out object ids in call order.
struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    fn new(first: u32) -> Self {
        Self { next: first }
    }

    fn next_if(&mut self, present: bool) -> Option<u32> {
        present.then(|| {
            let id = self.next;
            self.next += 1;
            id
        })
    }

    fn allocated(&self) -> u32 {
        self.next - 1
    }
}
