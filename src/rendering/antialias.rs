//! Edge smoothing for raster TIFF output.
//!
//! The blur modes convolve every channel, alpha included, and leave a border
//! as wide as the kernel radius untouched.

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::models::{Antialias, TiffLimits};

struct Kernel {
    size: usize,
    weights: &'static [f32],
    divisor: f32,
}

const BOX_3X3: Kernel = Kernel {
    size: 3,
    weights: &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
    divisor: 9.0,
};

const GAUSSIAN_3X3: Kernel = Kernel {
    size: 3,
    weights: &[1.0, 2.0, 1.0, 2.0, 4.0, 2.0, 1.0, 2.0, 1.0],
    divisor: 16.0,
};

#[rustfmt::skip]
const GAUSSIAN_5X5: Kernel = Kernel {
    size: 5,
    weights: &[
        1.0,  4.0,  7.0,  4.0, 1.0,
        4.0, 16.0, 26.0, 16.0, 4.0,
        7.0, 26.0, 41.0, 26.0, 7.0,
        4.0, 16.0, 26.0, 16.0, 4.0,
        1.0,  4.0,  7.0,  4.0, 1.0,
    ],
    divisor: 273.0,
};

/// Result of [`apply`]: the image, plus the reason if smoothing was skipped.
pub struct Antialiased {
    pub image: RgbaImage,
    pub skipped: Option<String>,
}

/// Smooth `image` according to `mode`.
///
/// Supersampling is skipped, not failed, when the doubled image would
/// exceed `limits`.
pub fn apply(image: RgbaImage, mode: Antialias, limits: TiffLimits) -> Antialiased {
    let image = match mode {
        Antialias::None => image,
        Antialias::Fast => convolve(&image, &BOX_3X3),
        Antialias::Balanced => convolve(&image, &GAUSSIAN_3X3),
        Antialias::Best => convolve(&convolve(&image, &GAUSSIAN_5X5), &GAUSSIAN_5X5),
        Antialias::BestObjects => {
            let (w, h) = image.dimensions();
            let (big_w, big_h) = (w.saturating_mul(2), h.saturating_mul(2));
            if big_w > limits.max_dimension
                || big_h > limits.max_dimension
                || u64::from(big_w) * u64::from(big_h) > limits.max_total_pixels
            {
                let reason = format!("supersampling {w}x{h} would exceed TIFF size limits");
                tracing::warn!(mode = %mode, %reason, "Antialiasing skipped");
                return Antialiased {
                    image,
                    skipped: Some(reason),
                };
            }
            let big = imageops::resize(&image, big_w, big_h, FilterType::Lanczos3);
            imageops::resize(&big, w, h, FilterType::Lanczos3)
        }
        Antialias::BestType => imageops::unsharpen(&image, 1.0, 2),
    };

    tracing::debug!(mode = %mode, "Applied antialiasing");
    Antialiased {
        image,
        skipped: None,
    }
}

fn convolve(src: &RgbaImage, kernel: &Kernel) -> RgbaImage {
    let (width, height) = (src.width() as usize, src.height() as usize);
    let radius = kernel.size / 2;
    let mut out = src.clone();
    if width <= 2 * radius || height <= 2 * radius {
        return out;
    }

    let input = src.as_raw();
    let output: &mut [u8] = &mut out;
    let stride = width * 4;

    for y in radius..height - radius {
        for x in radius..width - radius {
            let mut acc = [0f32; 4];
            for ky in 0..kernel.size {
                let row = (y + ky - radius) * stride;
                for kx in 0..kernel.size {
                    let weight = kernel.weights[ky * kernel.size + kx];
                    let at = row + (x + kx - radius) * 4;
                    for (c, sum) in acc.iter_mut().enumerate() {
                        *sum += f32::from(input[at + c]) * weight;
                    }
                }
            }
            let at = y * stride + x * 4;
            for (c, sum) in acc.iter().enumerate() {
                output[at + c] = (sum / kernel.divisor).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    out
}
