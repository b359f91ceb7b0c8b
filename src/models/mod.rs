pub mod config;
pub mod export_request;

pub use config::{AppConfig, PdfLimits, TiffLimits, ToolsConfig};
pub use export_request::{
    sanitize_name, Antialias, ExportForm, ExportFormat, ExportRequest, RequestError,
    TiffCompression, TiffOptions, UploadKind, DEFAULT_PROFILE_ID,
};
