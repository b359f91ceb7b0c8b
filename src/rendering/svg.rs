use resvg::tiny_skia::Pixmap;
use resvg::usvg::{self, fontdb, Transform};
use std::sync::Arc;

use crate::error::RenderError;
use image::RgbaImage;

/// In-process SVG rasterizer.
///
/// Used for TIFF output and as the fallback when the external vector
/// converter is unavailable.
pub struct SvgRenderer {
    fontdb: Arc<fontdb::Database>,
}

impl SvgRenderer {
    /// Create a renderer backed by the system fonts.
    pub fn new() -> Self {
        let mut fontdb = fontdb::Database::new();
        fontdb.load_system_fonts();
        tracing::info!(font_count = fontdb.len(), "Loaded fonts for SVG rendering");

        Self {
            fontdb: Arc::new(fontdb),
        }
    }

    /// Rasterize `svg_data` to straight-alpha RGBA.
    ///
    /// `size` maps the SVG's intrinsic pixel size to the output size and may
    /// refuse it. The drawing is scaled to fit the output and centered; the
    /// background stays transparent.
    pub fn render<F>(&self, svg_data: &[u8], size: F) -> Result<RgbaImage, RenderError>
    where
        F: FnOnce(u32, u32) -> Result<(u32, u32), RenderError>,
    {
        let options = usvg::Options {
            fontdb: self.fontdb.clone(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_data(svg_data, &options)
            .map_err(|e| RenderError::SvgParse(e.to_string()))?;

        let svg_size = tree.size();
        let intrinsic_w = svg_size.width().ceil().max(1.0) as u32;
        let intrinsic_h = svg_size.height().ceil().max(1.0) as u32;
        let (out_w, out_h) = size(intrinsic_w, intrinsic_h)?;

        let scale_x = out_w as f32 / svg_size.width();
        let scale_y = out_h as f32 / svg_size.height();
        let scale = scale_x.min(scale_y);
        let offset_x = (out_w as f32 - svg_size.width() * scale) / 2.0;
        let offset_y = (out_h as f32 - svg_size.height() * scale) / 2.0;

        let mut pixmap = Pixmap::new(out_w, out_h).ok_or(RenderError::UnsupportedDimensions {
            width: out_w,
            height: out_h,
        })?;

        let transform = Transform::from_scale(scale, scale).post_translate(offset_x, offset_y);
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        tracing::debug!(width = out_w, height = out_h, "Rasterized SVG");
        pixmap_to_rgba(&pixmap)
    }
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// tiny-skia stores premultiplied alpha; the color pipeline wants straight.
fn pixmap_to_rgba(pixmap: &Pixmap) -> Result<RgbaImage, RenderError> {
    let data: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|pixel| {
            let c = pixel.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), data).ok_or(RenderError::PixmapAllocation)
}
