//! Color conversion
//!
//! Pixel-wise RGBA to CMYK plus alpha. Every pixel is independent, so whole
//! buffers are converted in parallel.
//!
//! ```
//! use cmyk_pdf::color::rgba_to_cmyk;
//!
//! let planes = rgba_to_cmyk(&[0, 0, 0, 255]);
//! assert_eq!(planes.cmyk, vec![0, 0, 0, 255]);
//! assert_eq!(planes.alpha, vec![255]);
//! ```

mod cmyk;

pub use cmyk::{rgba_to_cmyk, Cmyk, CmykPlanes};
