use image::{RgbaImage, imageops::FilterType};

use crate::{
    composite::{paste_over, rotate_expand},
    error::{RenderError, RenderResult},
    model::OverlaySpec,
};

/// Composites `overlay` onto `base` per its placement, consuming the base
/// and returning the composited buffer.
///
/// Order is fixed: scale, rotate with canvas expansion, then alpha-paste with
/// the overlay's center at `(center_x, center_y)` of the base. Pixels landing
/// off-canvas are clipped, never an error.
pub fn composite_overlay(
    base: RgbaImage,
    overlay: &RgbaImage,
    spec: &OverlaySpec,
) -> RenderResult<RgbaImage> {
    let mut base = base;
    let (bw, bh) = base.dimensions();

    let scaled = scale_overlay(overlay, spec.scale)?;
    let rotated = if spec.angle == 0.0 {
        scaled
    } else {
        rotate_expand(scaled, spec.angle)?
    };

    let left = (spec.center_x * bw as f32).round() as i64 - i64::from(rotated.width()) / 2;
    let top = (spec.center_y * bh as f32).round() as i64 - i64::from(rotated.height()) / 2;
    paste_over(&mut base, &rotated, left, top);
    Ok(base)
}

/// Target dimensions of an overlay after scaling, for pre-render validation.
pub fn scaled_dimensions(overlay: &RgbaImage, scale: f32) -> RenderResult<(u32, u32)> {
    let w = (overlay.width() as f64 * f64::from(scale)).round();
    let h = (overlay.height() as f64 * f64::from(scale)).round();
    if !w.is_finite() || !h.is_finite() || w > f64::from(i32::MAX) || h > f64::from(i32::MAX) {
        return Err(RenderError::geometry_overflow(format!(
            "overlay {}x{} at scale {} is unrepresentable",
            overlay.width(),
            overlay.height(),
            scale
        )));
    }
    Ok(((w as u32).max(1), (h as u32).max(1)))
}

fn scale_overlay(overlay: &RgbaImage, scale: f32) -> RenderResult<RgbaImage> {
    if (scale - 1.0).abs() < f32::EPSILON {
        return Ok(overlay.clone());
    }
    let (w, h) = scaled_dimensions(overlay, scale)?;
    Ok(image::imageops::resize(overlay, w, h, FilterType::Lanczos3))
}
