use std::fmt;

/// Non-fatal degradation reported alongside a successful export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportWarning {
    /// The image had transparency but the standard forbids it; the soft
    /// mask was dropped.
    TransparencyFlattened { standard: &'static str },

    /// No standard was requested and the ICC profile could not be used, so
    /// the image falls back to `/DeviceCMYK`.
    ProfileNotEmbedded { reason: String },
}

impl fmt::Display for ExportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportWarning::TransparencyFlattened { standard } => write!(
                f,
                "transparency flattened: {standard} does not allow soft masks"
            ),
            ExportWarning::ProfileNotEmbedded { reason } => {
                write!(f, "ICC profile not embedded, using DeviceCMYK: {reason}")
            }
        }
    }
}
