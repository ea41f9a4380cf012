//! PNG figures for checking masks and fitted shading

use crate::correction::model::GradientModel;
use crate::io::configuration::{
    CONTRAST_HIGH_PERCENTILE, CONTRAST_LOW_PERCENTILE, GRADIENT_ARROW_SCALE, MARKER_RADIUS,
    PANEL_GAP,
};
use crate::io::error::{CorrectionError, Result, WithPath, invalid_input};
use crate::math::percentile::auto_contrast;
use crate::spatial::mask::Mask;
use image::{Rgb, RgbImage};
use log::info;
use ndarray::Array2;
use std::path::Path;

const RED: Rgb<u8> = Rgb([230, 40, 40]);
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Render a grid as grayscale after percentile contrast stretching
pub fn grayscale_panel(values: &Array2<f64>) -> RgbImage {
    let (rows, cols) = values.dim();
    let samples: Vec<f64> = values.iter().copied().collect();
    let scaled = auto_contrast(&samples, CONTRAST_LOW_PERCENTILE, CONTRAST_HIGH_PERCENTILE);

    let mut img = RgbImage::new(cols as u32, rows as u32);
    for (index, &level) in scaled.iter().enumerate() {
        let (row, col) = (index / cols.max(1), index % cols.max(1));
        let gray = (level * 255.0).round().clamp(0.0, 255.0) as u8;
        img.put_pixel(col as u32, row as u32, Rgb([gray, gray, gray]));
    }
    img
}

fn put_checked(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && x < i64::from(img.width()) && y < i64::from(img.height()) {
        img.put_pixel(x as u32, y as u32, color);
    }
}

/// Draw a `+` marker centred on `(x, y)`
pub fn draw_marker(img: &mut RgbImage, x: f64, y: f64, color: Rgb<u8>) {
    let (cx, cy) = (x.round() as i64, y.round() as i64);
    for offset in -MARKER_RADIUS..=MARKER_RADIUS {
        for thickness in 0..=1 {
            put_checked(img, cx + offset, cy + thickness, color);
            put_checked(img, cx + thickness, cy + offset, color);
        }
    }
}

/// Draw a straight segment between two points
pub fn draw_line(img: &mut RgbImage, from: (f64, f64), to: (f64, f64), color: Rgb<u8>) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
    for step in 0..=steps {
        let t = step as f64 / steps as f64;
        let x = dx.mul_add(t, from.0).round() as i64;
        let y = dy.mul_add(t, from.1).round() as i64;
        put_checked(img, x, y, color);
    }
}

/// Draw an arrow from `origin` along `(dx, dy)` with a two-stroke head
pub fn draw_arrow(img: &mut RgbImage, origin: (f64, f64), dx: f64, dy: f64, color: Rgb<u8>) {
    let tip = (origin.0 + dx, origin.1 + dy);
    draw_line(img, origin, tip, color);

    let length = dx.hypot(dy);
    if length < f64::EPSILON {
        return;
    }
    let head = (length * 0.2).clamp(3.0, 8.0);
    let angle = dy.atan2(dx);
    for wing in [angle + 2.6, angle - 2.6] {
        let end = (head.mul_add(wing.cos(), tip.0), head.mul_add(wing.sin(), tip.1));
        draw_line(img, tip, end, color);
    }
}

/// Outline the mask boundary: in-region pixels with a 4-neighbour outside
pub fn draw_contour(img: &mut RgbImage, mask: &Mask, color: Rgb<u8>) {
    for (row, col) in mask.iter_region() {
        let boundary = row == 0
            || col == 0
            || !mask.contains(row - 1, col)
            || !mask.contains(row + 1, col)
            || !mask.contains(row, col - 1)
            || !mask.contains(row, col + 1);
        if boundary {
            put_checked(img, col as i64, row as i64, color);
        }
    }
}

/// Place panels side by side on a white background
pub fn compose_panels(panels: &[RgbImage]) -> RgbImage {
    let gaps = PANEL_GAP * panels.len().saturating_sub(1) as u32;
    let width = panels.iter().map(RgbImage::width).sum::<u32>() + gaps;
    let height = panels.iter().map(RgbImage::height).max().unwrap_or(0);

    let mut canvas = RgbImage::from_pixel(width, height, BACKGROUND);
    let mut offset = 0;
    for panel in panels {
        for (x, y, pixel) in panel.enumerate_pixels() {
            canvas.put_pixel(offset + x, y, *pixel);
        }
        offset += panel.width() + PANEL_GAP;
    }
    canvas
}

fn save_png(img: &RgbImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_path(parent, "create directory")?;
    }

    img.save(path).map_err(|e| CorrectionError::ImageExport {
        path: path.to_path_buf(),
        source: e,
    })?;
    info!("Figure saved to '{}'", path.display());
    Ok(())
}

/// Three-panel figure: image, mask and bias map, each marked at the model
/// center, with the gradient drawn as an arrow on the bias map
///
/// # Errors
///
/// Returns an error if the grids differ in shape or the PNG cannot be written
pub fn render_fit_figure(
    image: &Array2<f64>,
    mask: &Mask,
    bias_map: &Array2<f64>,
    model: &GradientModel,
    path: &Path,
) -> Result<()> {
    if image.dim() != mask.dim() || image.dim() != bias_map.dim() {
        return Err(invalid_input(&"figure panels must share one shape"));
    }

    let center = model.center();
    let (x, y) = (center.x, center.y);

    let mut image_panel = grayscale_panel(image);
    draw_marker(&mut image_panel, x, y, RED);

    let mut mask_panel = grayscale_panel(&mask.to_values());
    draw_marker(&mut mask_panel, x, y, RED);

    let mut bias_panel = grayscale_panel(bias_map);
    draw_marker(&mut bias_panel, x, y, RED);
    draw_arrow(
        &mut bias_panel,
        (x, y),
        model.gradient_x * GRADIENT_ARROW_SCALE,
        model.gradient_y * GRADIENT_ARROW_SCALE,
        RED,
    );

    save_png(&compose_panels(&[image_panel, mask_panel, bias_panel]), path)
}

/// Image with the mask boundary drawn in red
///
/// # Errors
///
/// Returns an error if the grids differ in shape or the PNG cannot be written
pub fn render_mask_overlay(image: &Array2<f64>, mask: &Mask, path: &Path) -> Result<()> {
    if image.dim() != mask.dim() {
        return Err(invalid_input(&"overlay mask must match the image shape"));
    }

    let mut panel = grayscale_panel(image);
    draw_contour(&mut panel, mask, RED);
    save_png(&panel, path)
}
