use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration, from an optional YAML file plus environment
/// overrides.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Directory holding the ICC profile files
    #[serde(default = "default_profiles_dir")]
    pub profiles_dir: PathBuf,

    /// Resolution used when a request does not name one
    #[serde(default = "default_dpi")]
    pub default_dpi: f64,

    /// Upper bound for a multipart upload body
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Tag PDF images with the ICC profile even without a PDF/X standard
    #[serde(default = "default_embed_profile")]
    pub embed_profile: bool,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub tiff: TiffLimits,

    #[serde(default)]
    pub pdf: PdfLimits,
}

/// External programs the export service shells out to.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ToolsConfig {
    #[serde(default = "default_ghostscript")]
    pub ghostscript: PathBuf,

    #[serde(default = "default_rsvg_convert")]
    pub rsvg_convert: PathBuf,
}

/// Size limits for raster TIFF output.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct TiffLimits {
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,

    #[serde(default = "default_max_total_pixels")]
    pub max_total_pixels: u64,
}

/// Largest raster the PDF paths will resample or rasterize to. Larger
/// requests are rejected rather than scaled.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct PdfLimits {
    #[serde(default = "default_pdf_max_dimension")]
    pub max_dimension: u32,

    #[serde(default = "default_pdf_max_total_pixels")]
    pub max_total_pixels: u64,
}

impl PdfLimits {
    pub fn allows(&self, width: u32, height: u32) -> bool {
        width <= self.max_dimension
            && height <= self.max_dimension
            && u64::from(width) * u64::from(height) <= self.max_total_pixels
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_profiles_dir() -> PathBuf {
    PathBuf::from("profiles")
}

fn default_dpi() -> f64 {
    cmyk_pdf::document::DEFAULT_DPI
}

fn default_max_upload_bytes() -> usize {
    200 * 1024 * 1024
}

fn default_embed_profile() -> bool {
    true
}

fn default_ghostscript() -> PathBuf {
    PathBuf::from("gs")
}

fn default_rsvg_convert() -> PathBuf {
    PathBuf::from("rsvg-convert")
}

fn default_max_dimension() -> u32 {
    6000
}

fn default_max_total_pixels() -> u64 {
    36_000_000
}

fn default_pdf_max_dimension() -> u32 {
    14_400
}

fn default_pdf_max_total_pixels() -> u64 {
    64_000_000
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ghostscript: default_ghostscript(),
            rsvg_convert: default_rsvg_convert(),
        }
    }
}

impl Default for TiffLimits {
    fn default() -> Self {
        Self {
            max_dimension: default_max_dimension(),
            max_total_pixels: default_max_total_pixels(),
        }
    }
}

impl Default for PdfLimits {
    fn default() -> Self {
        Self {
            max_dimension: default_pdf_max_dimension(),
            max_total_pixels: default_pdf_max_total_pixels(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            profiles_dir: default_profiles_dir(),
            default_dpi: default_dpi(),
            max_upload_bytes: default_max_upload_bytes(),
            embed_profile: default_embed_profile(),
            tools: ToolsConfig::default(),
            tiff: TiffLimits::default(),
            pdf: PdfLimits::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `CONFIG_FILE` (if set) and apply environment
    /// overrides.
    pub fn from_env() -> Self {
        let config_file = std::env::var("CONFIG_FILE").ok().map(PathBuf::from);
        let config = match config_file {
            Some(path) => Self::load_from_file(&path),
            None => Self::default(),
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    /// Load configuration from a YAML file, falling back to defaults.
    pub fn load_from_file(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str::<Self>(&content) {
                Ok(config) => {
                    tracing::info!(
                        path = %path.display(),
                        profiles_dir = %config.profiles_dir.display(),
                        "Loaded configuration"
                    );
                    config
                }
                Err(e) => {
                    tracing::warn!(
                        %e,
                        path = %path.display(),
                        "Failed to parse config, using defaults"
                    );
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(%e, path = %path.display(), "Failed to read config, using defaults");
                Self::default()
            }
        }
    }

    /// Apply `BIND_ADDR`, `PROFILES_DIR`, `GS_BIN` and `RSVG_CONVERT_BIN`.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(addr) = lookup("BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(dir) = lookup("PROFILES_DIR") {
            self.profiles_dir = PathBuf::from(dir);
        }
        if let Some(gs) = lookup("GS_BIN") {
            self.tools.ghostscript = PathBuf::from(gs);
        }
        if let Some(rsvg) = lookup("RSVG_CONVERT_BIN") {
            self.tools.rsvg_convert = PathBuf::from(rsvg);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.bind_addr, "0.0.0.0:3001");
        assert_eq!(config.default_dpi, 96.0);
        assert_eq!(config.max_upload_bytes, 200 * 1024 * 1024);
        assert_eq!(config.tiff.max_dimension, 6000);
        assert_eq!(config.tiff.max_total_pixels, 36_000_000);
        assert_eq!(config.pdf.max_dimension, 14_400);
        assert!(config.embed_profile);
    }

    #[test]
    fn test_pdf_limits_allows() {
        let limits = PdfLimits {
            max_dimension: 100,
            max_total_pixels: 5000,
        };
        assert!(limits.allows(100, 50));
        assert!(!limits.allows(101, 1));
        assert!(!limits.allows(1, 101));
        assert!(!limits.allows(100, 51));
        assert!(!PdfLimits::default().allows(u32::MAX, u32::MAX));
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
profiles_dir: /opt/icc
tools:
  ghostscript: /usr/local/bin/gs
tiff:
  max_dimension: 4000
pdf:
  max_total_pixels: 1000000
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.profiles_dir, PathBuf::from("/opt/icc"));
        assert_eq!(config.tools.ghostscript, PathBuf::from("/usr/local/bin/gs"));
        assert_eq!(config.tools.rsvg_convert, PathBuf::from("rsvg-convert"));
        assert_eq!(config.tiff.max_dimension, 4000);
        assert_eq!(config.tiff.max_total_pixels, 36_000_000);
        assert_eq!(config.pdf.max_dimension, 14_400);
        assert_eq!(config.pdf.max_total_pixels, 1_000_000);
        assert_eq!(config.bind_addr, "0.0.0.0:3001");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [("BIND_ADDR", "127.0.0.1:9000"), ("GS_BIN", "gswin64c")]
            .into_iter()
            .collect();
        let config =
            AppConfig::default().with_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.tools.ghostscript, PathBuf::from("gswin64c"));
        assert_eq!(config.profiles_dir, PathBuf::from("profiles"));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = AppConfig::load_from_file(Path::new("/nonexistent/config.yaml"));
        assert_eq!(config, AppConfig::default());
    }
}
