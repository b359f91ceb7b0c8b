pub mod antialias;
pub mod decode;
pub mod svg;
pub mod tiff;

pub use decode::{decode_raster, resize_to};
pub use svg::SvgRenderer;
pub use tiff::{TiffExporter, TiffOutput};

/// Output size for a `src_w` x `src_h` source.
///
/// Both dimensions given: used as-is. One given: the other follows the
/// source aspect ratio, rounded and at least 1. None: the source size.
pub fn target_size(src_w: u32, src_h: u32, width: Option<u32>, height: Option<u32>) -> (u32, u32) {
    let scaled = |value: u32, num: u32, den: u32| -> u32 {
        let v = (f64::from(value) * f64::from(num) / f64::from(den.max(1))).round();
        (v as u32).max(1)
    };

    match (width, height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, scaled(w, src_h, src_w)),
        (None, Some(h)) => (scaled(h, src_w, src_h), h),
        (None, None) => (src_w, src_h),
    }
}
