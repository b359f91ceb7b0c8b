//! Raster CMYK TIFF export.
//!
//! Pipeline: target size, size limits, resample, antialias, flatten over
//! white, RGB to CMYK, encode with resolution tags and the embedded ICC
//! profile.

use std::borrow::Cow;
use std::io::Cursor;

use cmyk_pdf::color::rgba_to_cmyk;
use cmyk_pdf::IccProfile;
use image::imageops::FilterType;
use image::RgbaImage;
use tiff::encoder::compression::{Compression, Deflate, Lzw, Packbits, Uncompressed};
use tiff::encoder::{colortype, Rational, TiffEncoder, TiffValue};
use tiff::tags::{ResolutionUnit, Tag, Type};

use crate::error::RenderError;
use crate::models::{TiffCompression, TiffLimits, TiffOptions};
use crate::rendering::{antialias, decode::resize_to};

/// TIFF tag carrying an embedded ICC profile.
const ICC_PROFILE_TAG: u16 = 34675;

pub struct TiffOutput {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Present when antialiasing had to be skipped.
    pub antialias_skipped: Option<String>,
}

/// Turns RGBA rasters into print-ready CMYK TIFF files.
pub struct TiffExporter {
    limits: TiffLimits,
}

impl TiffExporter {
    pub fn new(limits: TiffLimits) -> Self {
        Self { limits }
    }

    pub fn export(
        &self,
        image: RgbaImage,
        width: Option<u32>,
        height: Option<u32>,
        options: &TiffOptions,
        profile: Option<&IccProfile>,
    ) -> Result<TiffOutput, RenderError> {
        let (src_w, src_h) = image.dimensions();
        let (want_w, want_h) = super::target_size(src_w, src_h, width, height);
        let (out_w, out_h) = clamp_to_limits(want_w, want_h, self.limits);
        if (out_w, out_h) != (want_w, want_h) {
            tracing::info!(
                requested_width = want_w,
                requested_height = want_h,
                width = out_w,
                height = out_h,
                "Scaled TIFF down to size limits"
            );
        }

        let image = resize_to(image, Some(out_w), Some(out_h), FilterType::CatmullRom);
        let smoothed = antialias::apply(image, options.antialias, self.limits);
        let mut image = smoothed.image;

        flatten_on_white(&mut image);
        let cmyk = rgba_to_cmyk(image.as_raw()).cmyk;

        let icc = profile.map(IccProfile::data);
        let (dpi, data) = (options.dpi, cmyk.as_slice());
        let bytes = match options.compression {
            TiffCompression::None => encode(data, out_w, out_h, dpi, icc, Uncompressed::default()),
            TiffCompression::Lzw => encode(data, out_w, out_h, dpi, icc, Lzw::default()),
            TiffCompression::Deflate => encode(data, out_w, out_h, dpi, icc, Deflate::default()),
            TiffCompression::PackBits => encode(data, out_w, out_h, dpi, icc, Packbits::default()),
        }
        .map_err(|e| RenderError::TiffEncode(e.to_string()))?;

        tracing::info!(
            width = out_w,
            height = out_h,
            dpi = options.dpi,
            compression = ?options.compression,
            icc = icc.is_some(),
            bytes = bytes.len(),
            "Encoded CMYK TIFF"
        );

        Ok(TiffOutput {
            bytes,
            width: out_w,
            height: out_h,
            antialias_skipped: smoothed.skipped,
        })
    }
}

/// Scale `(width, height)` down uniformly until it fits `limits`.
pub fn clamp_to_limits(width: u32, height: u32, limits: TiffLimits) -> (u32, u32) {
    let w = f64::from(width);
    let h = f64::from(height);
    let max = f64::from(limits.max_dimension);

    let scale = (max / w)
        .min(max / h)
        .min((limits.max_total_pixels as f64 / (w * h)).sqrt())
        .min(1.0);
    if scale >= 1.0 {
        return (width, height);
    }

    let scaled_w = ((w * scale).floor() as u32).max(1);
    let scaled_h = ((h * scale).floor() as u32).max(1);
    (scaled_w, scaled_h)
}

/// Composite every pixel over opaque white.
fn flatten_on_white(image: &mut RgbaImage) {
    for pixel in image.pixels_mut() {
        let alpha = u32::from(pixel.0[3]);
        if alpha == 255 {
            continue;
        }
        for channel in &mut pixel.0[..3] {
            *channel = ((u32::from(*channel) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        }
        pixel.0[3] = 255;
    }
}

fn encode<C: Compression>(
    cmyk: &[u8],
    width: u32,
    height: u32,
    dpi: f64,
    icc: Option<&[u8]>,
    compression: C,
) -> tiff::TiffResult<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut out)?;
        let mut image =
            encoder.new_image_with_compression::<colortype::CMYK8, _>(width, height, compression)?;
        image.resolution(ResolutionUnit::Inch, dpi_rational(dpi));
        if let Some(icc) = icc {
            image.encoder().write_tag(Tag::Unknown(ICC_PROFILE_TAG), IccBlob(icc))?;
        }
        image.write_data(cmyk)?;
    }
    Ok(out.into_inner())
}

/// Profile bytes, stored as UNDEFINED rather than BYTE.
struct IccBlob<'a>(&'a [u8]);

impl TiffValue for IccBlob<'_> {
    const BYTE_LEN: u8 = 1;
    const FIELD_TYPE: Type = Type::UNDEFINED;

    fn count(&self) -> usize {
        self.0.len()
    }

    fn data(&self) -> Cow<[u8]> {
        Cow::Borrowed(self.0)
    }
}

/// Resolution as a rational with two decimal places of precision.
fn dpi_rational(dpi: f64) -> Rational {
    let n = (dpi * 100.0).round().max(1.0) as u32;
    let d = 100;
    let g = gcd(n, d);
    Rational { n: n / g, d: d / g }
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Antialias;
    use cmyk_pdf::profile::synthetic_header;
    use image::Rgba;
    use tiff::decoder::{Decoder, DecodingResult};
    use tiff::ColorType;

    fn options(compression: TiffCompression) -> TiffOptions {
        TiffOptions {
            compression,
            antialias: Antialias::None,
            dpi: 300.0,
        }
    }

    fn decode(bytes: &[u8]) -> (u32, u32, ColorType, Vec<u8>) {
        let mut decoder = Decoder::new(Cursor::new(bytes)).unwrap();
        let (w, h) = decoder.dimensions().unwrap();
        let color = decoder.colortype().unwrap();
        let DecodingResult::U8(data) = decoder.read_image().unwrap() else {
            panic!("expected 8-bit samples");
        };
        (w, h, color, data)
    }

    /// Field type of `tag` in the first IFD of a classic TIFF.
    fn field_type(bytes: &[u8], tag: u16) -> Option<u16> {
        let little = &bytes[..2] == b"II";
        let u16_at = |at: usize| {
            let raw = [bytes[at], bytes[at + 1]];
            if little {
                u16::from_le_bytes(raw)
            } else {
                u16::from_be_bytes(raw)
            }
        };
        let raw: [u8; 4] = bytes[4..8].try_into().unwrap();
        let ifd = if little {
            u32::from_le_bytes(raw)
        } else {
            u32::from_be_bytes(raw)
        } as usize;

        let entries = usize::from(u16_at(ifd));
        (0..entries)
            .map(|i| ifd + 2 + i * 12)
            .find(|&entry| u16_at(entry) == tag)
            .map(|entry| u16_at(entry + 2))
    }

    #[test]
    fn test_clamp_to_limits() {
        let limits = TiffLimits::default();
        assert_eq!(clamp_to_limits(1000, 500, limits), (1000, 500));
        assert_eq!(clamp_to_limits(12000, 3000, limits), (6000, 1500));
        // 7000x7000 is over both limits; total pixels wins.
        let (w, h) = clamp_to_limits(7000, 7000, limits);
        assert!((5999..=6000).contains(&w));
        assert_eq!(w, h);
        let (w, h) = clamp_to_limits(5999, 5999, limits);
        assert!(u64::from(w) * u64::from(h) <= 36_000_000);
        assert_eq!(w, h);
    }

    #[test]
    fn test_flatten_on_white() {
        let mut image = RgbaImage::from_vec(2, 1, vec![0, 0, 0, 0, 0, 0, 0, 128]).unwrap();
        flatten_on_white(&mut image);
        assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(image.get_pixel(1, 0).0, [127, 127, 127, 255]);
    }

    #[test]
    fn test_dpi_rational() {
        let r = dpi_rational(300.0);
        assert_eq!((r.n, r.d), (300, 1));
        let r = dpi_rational(72.5);
        assert_eq!((r.n, r.d), (145, 2));
    }

    #[test]
    fn test_export_writes_cmyk_samples() {
        let image = RgbaImage::from_pixel(4, 3, Rgba([255, 0, 0, 255]));
        for compression in [
            TiffCompression::None,
            TiffCompression::Lzw,
            TiffCompression::Deflate,
            TiffCompression::PackBits,
        ] {
            let output = TiffExporter::new(TiffLimits::default())
                .export(image.clone(), None, None, &options(compression), None)
                .unwrap();
            let (w, h, color, data) = decode(&output.bytes);
            assert_eq!((w, h), (4, 3), "{compression:?}");
            assert_eq!(color, ColorType::CMYK(8), "{compression:?}");
            assert_eq!(&data[..4], &[0, 255, 255, 0], "{compression:?}");
            assert_eq!(data.len(), 4 * 3 * 4);
        }
    }

    #[test]
    fn test_export_embeds_icc_profile() {
        let profile = cmyk_pdf::IccProfile::new("p", "Test", synthetic_header(300)).unwrap();
        let image = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        let output = TiffExporter::new(TiffLimits::default())
            .export(image, None, None, &options(TiffCompression::None), Some(&profile))
            .unwrap();
        assert!(output
            .bytes
            .windows(profile.data().len())
            .any(|w| w == profile.data()));
        assert_eq!(
            field_type(&output.bytes, ICC_PROFILE_TAG),
            Some(Type::UNDEFINED.to_u16())
        );
    }

    #[test]
    fn test_export_resizes_and_flattens() {
        let image = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 0]));
        let output = TiffExporter::new(TiffLimits::default())
            .export(image, Some(5), None, &options(TiffCompression::Lzw), None)
            .unwrap();
        let (w, h, _, data) = decode(&output.bytes);
        assert_eq!((w, h), (5, 5));
        assert!(data.iter().all(|&b| b == 0), "transparent flattens to paper white");
    }

    #[test]
    fn test_export_scales_to_limits() {
        let limits = TiffLimits {
            max_dimension: 8,
            max_total_pixels: 1000,
        };
        let image = RgbaImage::from_pixel(16, 4, Rgba([255, 255, 255, 255]));
        let output = TiffExporter::new(limits)
            .export(image, None, None, &options(TiffCompression::None), None)
            .unwrap();
        assert_eq!((output.width, output.height), (8, 2));
    }
}
