//! cmyk-pdf: print-ready CMYK documents from raster pixels
//!
//! This library converts RGBA pixels into CMYK plus a separate alpha plane and
//! assembles a single-page PDF around them, byte for byte: object graph,
//! cross-reference table, trailer and the two standard stream filters
//! (`/LZWDecode`, `/RunLengthDecode`). It performs no I/O; callers hand in
//! pixels and an ICC profile and get document bytes back.
//!
//! # Quick Start
//!
//! ```
//! use cmyk_pdf::{CompressionMode, PdfExportOptions, RasterImage, export_pdf};
//!
//! let rgba = [255, 0, 0, 255, 0, 255, 0, 128];
//! let image = RasterImage::from_rgba(2, 1, &rgba).unwrap();
//!
//! let options = PdfExportOptions::new()
//!     .compression(CompressionMode::Lzw)
//!     .embed_profile(false);
//! let output = export_pdf(&image, &options, None).unwrap();
//!
//! assert!(output.bytes.starts_with(b"%PDF-1.4\n"));
//! ```
//!
//! # Pipeline
//!
//! ```text
//! RGBA pixels
//!     |
//!     v
//! RasterImage             (color::rgba_to_cmyk, alpha plane split off)
//!     |
//!     v
//! ResolvedStandard        (standard::resolve: version floor, PDF/X tags,
//!     |                    transparency policy)
//!     v
//! PdfDocumentBuilder      (object ids in declared order, codec applied to
//!     |                    image and soft-mask streams)
//!     v
//! document::write         (header, objects, xref, trailer)
//! ```
//!
//! # Conformance
//!
//! [`PdfStandard`] knows the PDF/X levels the exporter can tag: PDF/X-1a:2001,
//! PDF/X-3:2002, PDF/X-3:2003 and PDF/X-4:2008. Every PDF/X export embeds the
//! ICC profile and an `/OutputIntent`; only PDF/X-4 keeps a soft mask; the
//! others flatten and report [`ExportWarning::TransparencyFlattened`].

pub mod codec;
pub mod color;
pub mod document;
mod error;
pub mod profile;
pub mod raster;
pub mod standard;
mod warning;


pub use codec::CompressionMode;
pub use document::{export_pdf, PdfDocumentBuilder, PdfExportOptions, PdfOutput};
pub use error::{ErrorKind, ExportError};
pub use profile::{IccProfile, ProfileError};
pub use raster::{RasterError, RasterImage};
pub use standard::{PdfStandard, PdfVersion, ResolvedStandard};
pub use warning::ExportWarning;
