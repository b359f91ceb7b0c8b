//! Device-independent RGB to CMYK conversion.
//!
//! The conversion is the naive undercolor-removal formula: black takes the
//! darkest share of the pixel and the chromatic inks cover what remains.
//! No ICC transform is involved; the profile only travels with the output
//! so that downstream RIPs interpret the numbers correctly.

use rayon::prelude::*;

/// A CMYK pixel with 8-bit ink coverage per channel (0 = no ink).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cmyk {
    pub c: u8,
    pub m: u8,
    pub y: u8,
    pub k: u8,
}

impl Cmyk {
    pub const WHITE: Cmyk = Cmyk::new(0, 0, 0, 0);

    #[inline]
    pub const fn new(c: u8, m: u8, y: u8, k: u8) -> Self {
        Self { c, m, y, k }
    }

    /// Convert one 8-bit RGB triple.
    ///
    /// ```
    /// use cmyk_pdf::color::Cmyk;
    ///
    /// assert_eq!(Cmyk::from_rgb(255, 0, 0), Cmyk::new(0, 255, 255, 0));
    /// assert_eq!(Cmyk::from_rgb(0, 0, 0), Cmyk::new(0, 0, 0, 255));
    /// ```
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        let r = f64::from(r) / 255.0;
        let g = f64::from(g) / 255.0;
        let b = f64::from(b) / 255.0;

        let k = 1.0 - r.max(g).max(b);
        if k >= 1.0 {
            return Cmyk::new(0, 0, 0, 255);
        }

        let ink = |channel: f64| to_byte((1.0 - channel - k) / (1.0 - k));
        Cmyk::new(ink(r), ink(g), ink(b), to_byte(k))
    }

    #[inline]
    pub fn to_array(self) -> [u8; 4] {
        [self.c, self.m, self.y, self.k]
    }
}

#[inline]
fn to_byte(value: f64) -> u8 {
    // Float noise can land a hair below zero for neutral grays.
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Result of converting a whole RGBA buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmykPlanes {
    /// Interleaved CMYK, 4 bytes per pixel.
    pub cmyk: Vec<u8>,
    /// Alpha, 1 byte per pixel, copied unchanged.
    pub alpha: Vec<u8>,
    /// True iff any alpha byte is below 255.
    pub has_transparency: bool,
}

/// Convert interleaved RGBA bytes into CMYK and alpha planes.
///
/// Trailing bytes that do not form a whole pixel are ignored; callers
/// validate buffer lengths beforehand (see [`crate::RasterImage`]).
pub fn rgba_to_cmyk(rgba: &[u8]) -> CmykPlanes {
    let pixels = rgba.len() / 4;
    let mut cmyk = vec![0u8; pixels * 4];
    let mut alpha = vec![0u8; pixels];

    cmyk.par_chunks_exact_mut(4)
        .zip(alpha.par_iter_mut())
        .zip(rgba.par_chunks_exact(4))
        .for_each(|((dst, a), src)| {
            dst.copy_from_slice(&Cmyk::from_rgb(src[0], src[1], src[2]).to_array());
            *a = src[3];
        });

    let has_transparency = alpha.par_iter().any(|&a| a < 255);

    CmykPlanes {
        cmyk,
        alpha,
        has_transparency,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_white_is_no_ink() {
        assert_eq!(Cmyk::from_rgb(255, 255, 255), Cmyk::WHITE);
    }

    #[test]
    fn test_black_is_pure_k() {
        assert_eq!(Cmyk::from_rgb(0, 0, 0), Cmyk::new(0, 0, 0, 255));
    }

    #[test]
    fn test_primaries() {
        assert_eq!(Cmyk::from_rgb(255, 0, 0), Cmyk::new(0, 255, 255, 0));
        assert_eq!(Cmyk::from_rgb(0, 255, 0), Cmyk::new(255, 0, 255, 0));
        assert_eq!(Cmyk::from_rgb(0, 0, 255), Cmyk::new(255, 255, 0, 0));
    }

    #[test]
    fn test_neutral_gray_uses_only_black() {
        for v in [1u8, 64, 128, 200, 254] {
            let cmyk = Cmyk::from_rgb(v, v, v);
            assert_eq!((cmyk.c, cmyk.m, cmyk.y), (0, 0, 0), "gray {v}");
            assert_eq!(cmyk.k, 255 - v, "gray {v}");
        }
    }

    #[test]
    fn test_k_tracks_brightest_channel() {
        for (r, g, b) in [(10, 200, 30), (250, 3, 77), (0, 0, 1), (128, 127, 126)] {
            let max = f64::from(r.max(g).max(b)) / 255.0;
            let expected = ((1.0 - max) * 255.0).round() as u8;
            assert_eq!(Cmyk::from_rgb(r, g, b).k, expected);
        }
    }

    #[test]
    fn test_planes_split_alpha_and_flag_transparency() {
        let rgba = [255, 0, 0, 255, 0, 255, 0, 128];
        let planes = rgba_to_cmyk(&rgba);
        assert_eq!(planes.cmyk, vec![0, 255, 255, 0, 255, 0, 255, 0]);
        assert_eq!(planes.alpha, vec![255, 128]);
        assert!(planes.has_transparency);
    }

    #[test]
    fn test_opaque_planes_not_flagged() {
        let planes = rgba_to_cmyk(&[1, 2, 3, 255, 4, 5, 6, 255]);
        assert!(!planes.has_transparency);
    }

    #[test]
    fn test_empty_buffer() {
        let planes = rgba_to_cmyk(&[]);
        assert!(planes.cmyk.is_empty());
        assert!(planes.alpha.is_empty());
        assert!(!planes.has_transparency);
    }
}
