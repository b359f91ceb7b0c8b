//! PDF versions and PDF/X conformance levels.
//!
//! A [`PdfStandard`] pins a minimum file version and the identifying
//! `GTS_PDFX*` strings that go into the document info dictionary. The
//! [`resolve`] step folds the requested version, the standard and the image's
//! transparency into the final decisions the document builder needs.

use std::fmt;
use std::str::FromStr;

use crate::{ExportError, ExportWarning};

/// `major.minor` file format version, ordered numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PdfVersion {
    major: u8,
    minor: u8,
}

impl PdfVersion {
    pub const V1_3: PdfVersion = PdfVersion::new(1, 3);
    pub const V1_4: PdfVersion = PdfVersion::new(1, 4);
    pub const V1_6: PdfVersion = PdfVersion::new(1, 6);

    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

impl Default for PdfVersion {
    fn default() -> Self {
        PdfVersion::V1_4
    }
}

impl fmt::Display for PdfVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for PdfVersion {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ExportError::InvalidVersion(s.to_string());
        let trimmed = s.trim();
        let (major, minor) = trimmed.split_once('.').unwrap_or((trimmed, "0"));
        let major: u8 = major.parse().map_err(|_| invalid())?;
        let minor: u8 = minor.parse().map_err(|_| invalid())?;
        if major == 0 {
            return Err(invalid());
        }
        Ok(PdfVersion::new(major, minor))
    }
}

/// Identifying strings written to `/Info` for a PDF/X export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conformance {
    /// `/GTS_PDFXVersion`
    pub version_tag: &'static str,
    /// `/GTS_PDFXConformance`
    pub conformance_tag: &'static str,
}

/// Named conformance level, or none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PdfStandard {
    #[default]
    None,
    X1a2001,
    X3_2002,
    X3_2003,
    X4_2008,
}

impl PdfStandard {
    pub const ALL: [PdfStandard; 5] = [
        PdfStandard::None,
        PdfStandard::X1a2001,
        PdfStandard::X3_2002,
        PdfStandard::X3_2003,
        PdfStandard::X4_2008,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PdfStandard::None => "none",
            PdfStandard::X1a2001 => "PDF/X-1a:2001",
            PdfStandard::X3_2002 => "PDF/X-3:2002",
            PdfStandard::X3_2003 => "PDF/X-3:2003",
            PdfStandard::X4_2008 => "PDF/X-4:2008",
        }
    }

    pub fn is_none(self) -> bool {
        self == PdfStandard::None
    }

    pub fn minimum_version(self) -> Option<PdfVersion> {
        match self {
            PdfStandard::None => None,
            PdfStandard::X1a2001 | PdfStandard::X3_2002 | PdfStandard::X3_2003 => {
                Some(PdfVersion::V1_3)
            }
            PdfStandard::X4_2008 => Some(PdfVersion::V1_6),
        }
    }

    pub fn conformance(self) -> Option<Conformance> {
        let (version_tag, conformance_tag) = match self {
            PdfStandard::None => return None,
            PdfStandard::X1a2001 => ("PDF/X-1:2001", "PDF/X-1a:2001"),
            PdfStandard::X3_2002 => ("PDF/X-3:2002", "PDF/X-3:2002"),
            PdfStandard::X3_2003 => ("PDF/X-3:2003", "PDF/X-3:2003"),
            PdfStandard::X4_2008 => ("PDF/X-4", "PDF/X-4:2008"),
        };
        Some(Conformance {
            version_tag,
            conformance_tag,
        })
    }

    /// PDF/X-1a and PDF/X-3 predate transparency in the format.
    pub fn allows_transparency(self) -> bool {
        matches!(self, PdfStandard::None | PdfStandard::X4_2008)
    }

    pub fn effective_version(self, requested: PdfVersion) -> PdfVersion {
        self.minimum_version()
            .map_or(requested, |minimum| requested.max(minimum))
    }
}

impl fmt::Display for PdfStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PdfStandard {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        if wanted.is_empty() {
            return Ok(PdfStandard::None);
        }
        PdfStandard::ALL
            .into_iter()
            .find(|standard| standard.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ExportError::UnsupportedStandard(s.to_string()))
    }
}

/// Everything the document builder needs to know about versioning and
/// conformance for one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStandard {
    pub standard: PdfStandard,
    pub version: PdfVersion,
    pub conformance: Option<Conformance>,
    /// Whether the alpha plane is written as an `/SMask`.
    pub keep_soft_mask: bool,
    pub warnings: Vec<ExportWarning>,
}

/// Resolve the effective version and transparency handling.
///
/// The version is the maximum of the request, the standard's floor and,
/// when a soft mask is kept, 1.4.
pub fn resolve(
    standard: PdfStandard,
    requested: PdfVersion,
    has_transparency: bool,
) -> ResolvedStandard {
    let mut version = standard.effective_version(requested);
    let mut warnings = Vec::new();

    let keep_soft_mask = has_transparency && standard.allows_transparency();
    if has_transparency && !keep_soft_mask {
        tracing::warn!(standard = %standard, "Flattening transparency");
        warnings.push(ExportWarning::TransparencyFlattened {
            standard: standard.name(),
        });
    }
    if keep_soft_mask {
        version = version.max(PdfVersion::V1_4);
    }

    ResolvedStandard {
        standard,
        version,
        conformance: standard.conformance(),
        keep_soft_mask,
        warnings,
    }
}
