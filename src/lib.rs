//! CMYK Export
//!
//! HTTP service that turns raster, SVG and PDF uploads into print-ready
//! CMYK PDF and TIFF files. This library exposes modules for integration
//! testing.

pub mod api;
pub mod error;
pub mod models;
pub mod rendering;
pub mod server;
pub mod services;
