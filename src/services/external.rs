//! External converters the export service shells out to.
//!
//! `rsvg-convert` turns SVG into vector PDF. Ghostscript rewrites a PDF
//! into DeviceCMYK and renders PDF pages to PNG for raster output. Every call
//! runs in a scratch directory that is removed when it returns.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use cmyk_pdf::{PdfStandard, PdfVersion};
use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("{tool} is not installed or not on PATH")]
    NotInstalled { tool: String },

    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("{tool} I/O error: {source}")]
    Io {
        tool: String,
        #[source]
        source: std::io::Error,
    },
}

/// Converts SVG documents into vector PDF.
#[async_trait]
pub trait SvgRasterizer: Send + Sync {
    async fn svg_to_pdf(
        &self,
        svg: Vec<u8>,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<Vec<u8>, CollaboratorError>;
}

/// Rewrites a PDF so every color is DeviceCMYK under the given profile.
#[async_trait]
pub trait ColorNormalizer: Send + Sync {
    async fn normalize(
        &self,
        pdf: Vec<u8>,
        version: PdfVersion,
        standard: PdfStandard,
        profile_path: &Path,
    ) -> Result<Vec<u8>, CollaboratorError>;
}

/// Renders the first page of a PDF to an RGBA PNG.
#[async_trait]
pub trait PdfPageRenderer: Send + Sync {
    async fn render_first_page(
        &self,
        pdf: Vec<u8>,
        dpi: f64,
    ) -> Result<Vec<u8>, CollaboratorError>;
}

/// [`SvgRasterizer`] backed by the `rsvg-convert` binary.
pub struct RsvgConvert {
    program: PathBuf,
}

impl RsvgConvert {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl SvgRasterizer for RsvgConvert {
    async fn svg_to_pdf(
        &self,
        svg: Vec<u8>,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<Vec<u8>, CollaboratorError> {
        let scratch = Scratch::new(&self.program)?;
        let input = scratch.write("input.svg", &svg).await?;
        let output = scratch.path("output.pdf");

        let args = rsvg_args(&input, &output, width, height);
        run(&self.program, &args).await?;
        scratch.read(&output).await
    }
}

/// Ghostscript: [`ColorNormalizer`] through the `pdfwrite` device and
/// [`PdfPageRenderer`] through `pngalpha`.
pub struct Ghostscript {
    program: PathBuf,
}

impl Ghostscript {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl ColorNormalizer for Ghostscript {
    async fn normalize(
        &self,
        pdf: Vec<u8>,
        version: PdfVersion,
        standard: PdfStandard,
        profile_path: &Path,
    ) -> Result<Vec<u8>, CollaboratorError> {
        let scratch = Scratch::new(&self.program)?;
        let input = scratch.write("input.pdf", &pdf).await?;
        let output = scratch.path("output.pdf");

        let version = standard.effective_version(version);
        let args = ghostscript_args(&input, &output, version, profile_path);
        run(&self.program, &args).await?;
        scratch.read(&output).await
    }
}

#[async_trait]
impl PdfPageRenderer for Ghostscript {
    async fn render_first_page(
        &self,
        pdf: Vec<u8>,
        dpi: f64,
    ) -> Result<Vec<u8>, CollaboratorError> {
        let scratch = Scratch::new(&self.program)?;
        let input = scratch.write("input.pdf", &pdf).await?;
        let output = scratch.path("page.png");

        let args = ghostscript_page_args(&input, &output, dpi);
        run(&self.program, &args).await?;
        scratch.read(&output).await
    }
}

/// `rsvg-convert [-h H] [-w W] -f pdf -o <output> <input>`
pub fn rsvg_args(
    input: &Path,
    output: &Path,
    width: Option<u32>,
    height: Option<u32>,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();
    if let Some(h) = height.filter(|&h| h > 0) {
        args.extend(["-h".into(), h.to_string().into()]);
    }
    if let Some(w) = width.filter(|&w| w > 0) {
        args.extend(["-w".into(), w.to_string().into()]);
    }
    args.extend(["-f".into(), "pdf".into(), "-o".into()]);
    args.push(output.into());
    args.push(input.into());
    args
}

pub fn ghostscript_args(
    input: &Path,
    output: &Path,
    version: PdfVersion,
    profile_path: &Path,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-dSAFER",
        "-dBATCH",
        "-dNOPAUSE",
        "-dNOPROMPT",
        "-sDEVICE=pdfwrite",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();

    args.push(format!("-dCompatibilityLevel={version}").into());
    args.extend(
        [
            "-dProcessColorModel=/DeviceCMYK",
            "-sColorConversionStrategy=CMYK",
            "-sColorConversionStrategyForImages=CMYK",
            "-dOverrideICC",
            "-dUseCIEColor",
        ]
        .into_iter()
        .map(OsString::from),
    );
    args.push(prefixed("-sOutputICCProfile=", profile_path));
    args.push(prefixed("-sOutputFile=", output));
    args.push(input.into());
    args
}

/// Render page 1 with an alpha channel at `dpi`.
pub fn ghostscript_page_args(input: &Path, output: &Path, dpi: f64) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-dSAFER",
        "-dBATCH",
        "-dNOPAUSE",
        "-dNOPROMPT",
        "-sDEVICE=pngalpha",
        "-dFirstPage=1",
        "-dLastPage=1",
        "-dTextAlphaBits=4",
        "-dGraphicsAlphaBits=4",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();

    args.push(format!("-r{dpi}").into());
    args.push(prefixed("-sOutputFile=", output));
    args.push(input.into());
    args
}

fn prefixed(flag: &str, path: &Path) -> OsString {
    let mut arg = OsString::from(flag);
    arg.push(path);
    arg
}

fn tool_name(program: &Path) -> String {
    program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string())
}

async fn run(program: &Path, args: &[OsString]) -> Result<(), CollaboratorError> {
    let tool = tool_name(program);
    tracing::debug!(tool = %tool, args = ?args, "Running external converter");

    let started = std::time::Instant::now();
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CollaboratorError::NotInstalled { tool: tool.clone() },
            _ => CollaboratorError::Io {
                tool: tool.clone(),
                source: e,
            },
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(CollaboratorError::Failed {
            tool,
            status: output.status.to_string(),
            stderr,
        });
    }

    tracing::debug!(
        tool = %tool,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "External converter finished"
    );
    Ok(())
}

/// Temporary working directory for one converter call.
struct Scratch {
    tool: String,
    dir: TempDir,
}

impl Scratch {
    fn new(program: &Path) -> Result<Self, CollaboratorError> {
        let tool = tool_name(program);
        let dir = tempfile::Builder::new()
            .prefix("cmyk-export-")
            .tempdir()
            .map_err(|source| CollaboratorError::Io {
                tool: tool.clone(),
                source,
            })?;
        Ok(Self { tool, dir })
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    async fn write(&self, name: &str, data: &[u8]) -> Result<PathBuf, CollaboratorError> {
        let path = self.path(name);
        tokio::fs::write(&path, data)
            .await
            .map_err(|source| self.io(source))?;
        Ok(path)
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>, CollaboratorError> {
        tokio::fs::read(path).await.map_err(|source| self.io(source))
    }

    fn io(&self, source: std::io::Error) -> CollaboratorError {
        CollaboratorError::Io {
            tool: self.tool.clone(),
            source,
        }
    }
}
