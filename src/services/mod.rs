pub mod export_service;
pub mod external;
pub mod profiles;

pub use export_service::{ConversionError, ExportResponse, ExportService, ExportWarning, Upload};
pub use external::{
    CollaboratorError, ColorNormalizer, Ghostscript, PdfPageRenderer, RsvgConvert, SvgRasterizer,
};
pub use profiles::{LoadedProfile, ProfileRegistry, ProfileUnavailable, KNOWN_PROFILES};
