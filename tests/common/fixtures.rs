//! Test fixtures and constants.

use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::Path;

use cmyk_export::services::KNOWN_PROFILES;

/// A 2x1 PNG: opaque red, half-transparent blue.
pub fn two_pixel_png() -> Vec<u8> {
    let mut image = RgbaImage::new(2, 1);
    image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
    image.put_pixel(1, 0, Rgba([0, 0, 255, 128]));
    encode(&image, ImageFormat::Png)
}

/// An opaque PNG of a single color.
pub fn solid_png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    encode(&RgbaImage::from_pixel(width, height, Rgba(color)), ImageFormat::Png)
}

pub fn solid_jpeg(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb([0, 0, 0]));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Jpeg).unwrap();
    out.into_inner()
}

fn encode(image: &RgbaImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, format).unwrap();
    out.into_inner()
}

/// 40x20 SVG: left half green, right half transparent.
pub const HALF_GREEN_SVG: &[u8] = br##"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20" viewBox="0 0 40 20">
  <rect x="0" y="0" width="20" height="20" fill="#00ff00"/>
</svg>"##;

/// Write a header-only CMYK profile for every known profile id.
pub fn write_profiles(dir: &Path) {
    for descriptor in &KNOWN_PROFILES {
        write_profile(dir, descriptor.file_name);
    }
}

pub fn write_profile(dir: &Path, file_name: &str) {
    std::fs::write(dir.join(file_name), cmyk_pdf::profile::synthetic_header(512)).unwrap();
}
