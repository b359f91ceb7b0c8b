//! Single-page PDF assembly.
//!
//! [`PdfDocumentBuilder`] decides which objects a document needs and fills
//! them in; [`writer`] turns the finished object list into bytes with a
//! correct cross-reference table.

mod builder;
pub mod syntax;
pub mod writer;

pub use builder::{export_pdf, PdfDocumentBuilder, PdfExportOptions, PdfOutput, DEFAULT_DPI};
