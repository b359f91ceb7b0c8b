use image::imageops::FilterType;
use image::RgbaImage;

use crate::error::RenderError;
use crate::rendering::target_size;

/// Decode PNG, JPEG, GIF, WebP, BMP or TIFF bytes to straight-alpha RGBA.
pub fn decode_raster(bytes: &[u8]) -> Result<RgbaImage, RenderError> {
    let image =
        image::load_from_memory(bytes).map_err(|e| RenderError::ImageDecode(e.to_string()))?;
    tracing::debug!(
        width = image.width(),
        height = image.height(),
        color = ?image.color(),
        "Decoded raster upload"
    );
    Ok(image.to_rgba8())
}

/// Resample to the requested size, if it differs from the current one.
pub fn resize_to(
    image: RgbaImage,
    width: Option<u32>,
    height: Option<u32>,
    filter: FilterType,
) -> RgbaImage {
    let (w, h) = target_size(image.width(), image.height(), width, height);
    if (w, h) == image.dimensions() {
        return image;
    }
    tracing::debug!(
        from_width = image.width(),
        from_height = image.height(),
        width = w,
        height = h,
        "Resizing raster"
    );
    image::imageops::resize(&image, w, h, filter)
}
