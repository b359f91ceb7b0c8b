//! Validated CMYK raster with a separate alpha plane.

use thiserror::Error;

use crate::color::{rgba_to_cmyk, CmykPlanes};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RasterError {
    #[error("Image dimensions must be positive, got {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },

    #[error("Image dimensions {width}x{height} overflow the address space")]
    TooLarge { width: u32, height: u32 },

    #[error("Expected {expected} bytes of {plane} data, got {actual}")]
    BufferLength {
        plane: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// One decoded image ready for document assembly.
///
/// Immutable once built; the CMYK buffer holds `width * height * 4` bytes and
/// the alpha buffer `width * height` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    cmyk: Vec<u8>,
    alpha: Vec<u8>,
    has_transparency: bool,
}

impl RasterImage {
    /// Convert straight (non-premultiplied) RGBA pixels.
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<Self, RasterError> {
        let pixels = pixel_count(width, height)?;
        check_len("RGBA", pixels * 4, rgba.len())?;

        let CmykPlanes {
            cmyk,
            alpha,
            has_transparency,
        } = rgba_to_cmyk(rgba);

        Ok(Self {
            width,
            height,
            cmyk,
            alpha,
            has_transparency,
        })
    }

    /// Wrap planes that were converted elsewhere.
    pub fn from_planes(
        width: u32,
        height: u32,
        cmyk: Vec<u8>,
        alpha: Vec<u8>,
    ) -> Result<Self, RasterError> {
        let pixels = pixel_count(width, height)?;
        check_len("CMYK", pixels * 4, cmyk.len())?;
        check_len("alpha", pixels, alpha.len())?;
        let has_transparency = alpha.iter().any(|&a| a < 255);

        Ok(Self {
            width,
            height,
            cmyk,
            alpha,
            has_transparency,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn cmyk(&self) -> &[u8] {
        &self.cmyk
    }

    #[inline]
    pub fn alpha(&self) -> &[u8] {
        &self.alpha
    }

    #[inline]
    pub fn has_transparency(&self) -> bool {
        self.has_transparency
    }
}

fn pixel_count(width: u32, height: u32) -> Result<usize, RasterError> {
    if width == 0 || height == 0 {
        return Err(RasterError::ZeroDimension { width, height });
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4).map(|_| n))
        .ok_or(RasterError::TooLarge { width, height })
}

fn check_len(plane: &'static str, expected: usize, actual: usize) -> Result<(), RasterError> {
    if expected == actual {
        Ok(())
    } else {
        Err(RasterError::BufferLength {
            plane,
            expected,
            actual,
        })
    }
}
