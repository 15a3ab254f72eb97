// THEORY:
// The `overlay` module is the presentation edge of the engine. It paints a
// `DensityGrid` into an RGBA image that can be laid over the analysed photo.
//
// Key architectural principles:
// 1.  **Grid Space to Image Space**: The grid always spans `cols * cell_size` by
//     `rows * cell_size` pixels, which can be slightly larger than the photo and
//     much smaller or larger than the display. Cells are scaled so that the whole
//     grid maps onto the requested output size.
// 2.  **Tier Colouring**: Every cell with weight is filled with the colour of its
//     `DensityTier`; empty cells stay fully transparent.
// 3.  **Emphasis**: Dense cells get a thin translucent red outline.
// 4.  **Smoothing**: A blurred copy of the cell layer is composited over itself so
//     the heatmap reads as a soft field instead of hard blocks.

use crate::core_modules::density_grid::DensityGrid;
use crate::core_modules::density_tier::classify_density;
use crate::core_modules::error::DensityError;
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageEncoder, Pixel, Rgba, RgbaImage};
use std::path::Path;

/// Tunables for overlay rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    /// Gaussian blur sigma in output pixels; `0.0` disables smoothing.
    pub blur_sigma: f32,
    /// Cells at or above this density are outlined.
    pub outline_threshold: f64,
    pub outline_color: Rgba<u8>,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            blur_sigma: 8.0,
            outline_threshold: 3.0,
            outline_color: Rgba([255, 0, 0, 77]),
        }
    }
}

/// Paints `grid` into a transparent `width` x `height` image.
pub fn render_overlay(
    grid: &DensityGrid,
    width: u32,
    height: u32,
    style: &OverlayStyle,
) -> Result<RgbaImage, DensityError> {
    if width == 0 || height == 0 {
        return Err(DensityError::InvalidGeometry {
            width,
            height,
            cell_size: grid.geometry().cell_size(),
        });
    }

    let cell = grid.geometry().cell_size() as f64;
    let scale_x = width as f64 / (grid.cols() as f64 * cell);
    let scale_y = height as f64 / (grid.rows() as f64 * cell);
    let mut overlay = RgbaImage::new(width, height);

    for (row, col, density) in grid.iter_cells() {
        if density <= 0.0 {
            continue;
        }

        let x0 = ((col as f64 * cell * scale_x).floor() as u32).min(width);
        let x1 = (((col + 1) as f64 * cell * scale_x).floor() as u32).min(width);
        let y0 = ((row as f64 * cell * scale_y).floor() as u32).min(height);
        let y1 = (((row + 1) as f64 * cell * scale_y).floor() as u32).min(height);
        if x1 <= x0 || y1 <= y0 {
            continue;
        }

        let fill = classify_density(density).color();
        for y in y0..y1 {
            for x in x0..x1 {
                overlay.put_pixel(x, y, fill);
            }
        }

        if density >= style.outline_threshold {
            stroke_rect(&mut overlay, (x0, y0, x1, y1), style.outline_color);
        }
    }

    if style.blur_sigma > 0.0 {
        let blurred = imageops::blur(&overlay, style.blur_sigma);
        imageops::overlay(&mut overlay, &blurred, 0, 0);
    }

    Ok(overlay)
}

/// Alpha-composites `overlay` onto `base`, resizing the overlay if the sizes differ.
pub fn blend_overlay(base: &mut RgbaImage, overlay: &RgbaImage) {
    if base.dimensions() == overlay.dimensions() {
        imageops::overlay(base, overlay, 0, 0);
    } else {
        let resized = imageops::resize(overlay, base.width(), base.height(), FilterType::Triangle);
        imageops::overlay(base, &resized, 0, 0);
    }
}

/// Renders the heatmap for `grid` over a copy of `image`.
pub fn render_onto(
    image: &DynamicImage,
    grid: &DensityGrid,
    style: &OverlayStyle,
) -> Result<RgbaImage, DensityError> {
    let mut base = image.to_rgba8();
    let overlay = render_overlay(grid, base.width(), base.height(), style)?;
    blend_overlay(&mut base, &overlay);
    Ok(base)
}

/// Writes an RGBA image as PNG.
pub fn save_png(image: &RgbaImage, path: impl AsRef<Path>) -> Result<(), DensityError> {
    write_png(image, path.as_ref())?;
    Ok(())
}

fn write_png(image: &RgbaImage, path: &Path) -> Result<(), image::ImageError> {
    let output = std::fs::File::create(path)?;
    let encoder = PngEncoder::new(output);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )
}

/// Blends a one pixel border along the inside of `(x0, y0, x1, y1)`.
fn stroke_rect(image: &mut RgbaImage, (x0, y0, x1, y1): (u32, u32, u32, u32), color: Rgba<u8>) {
    let mut blend_at = |x: u32, y: u32| {
        image.get_pixel_mut(x, y).blend(&color);
    };
    for x in x0..x1 {
        blend_at(x, y0);
        if y1 - 1 != y0 {
            blend_at(x, y1 - 1);
        }
    }
    for y in (y0 + 1)..y1.saturating_sub(1) {
        blend_at(x0, y);
        if x1 - 1 != x0 {
            blend_at(x1 - 1, y);
        }
    }
}
