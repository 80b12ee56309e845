use image::RgbaImage;

use crate::error::{RenderError, RenderResult};

pub type Rgba8 = [u8; 4];

/// Straight-alpha source-over blend.
pub fn over(dst: Rgba8, src: Rgba8) -> Rgba8 {
    let sa = u32::from(src[3]);
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }

    let da = u32::from(dst[3]);
    let inv = 255 - sa;
    let weighted_da = mul_div255(da, inv);
    let oa = sa + weighted_da;
    if oa == 0 {
        return [0, 0, 0, 0];
    }

    let mut out = [0u8; 4];
    out[3] = oa as u8;
    for i in 0..3 {
        let sc = u32::from(src[i]) * sa;
        let dc = u32::from(dst[i]) * weighted_da;
        out[i] = ((sc + dc + oa / 2) / oa) as u8;
    }
    out
}

/// Blends `color` onto one pixel, ignoring out-of-bounds coordinates.
pub fn blend_pixel(img: &mut RgbaImage, x: i64, y: i64, color: Rgba8) {
    if x < 0 || y < 0 || x >= i64::from(img.width()) || y >= i64::from(img.height()) {
        return;
    }
    let px = img.get_pixel_mut(x as u32, y as u32);
    px.0 = over(px.0, color);
}

/// Alpha-composites `src` onto `base` with its top-left corner at
/// `(left, top)`. Pixels landing outside `base` are silently clipped;
/// partial off-canvas placement is an accepted outcome, never an error.
pub fn paste_over(base: &mut RgbaImage, src: &RgbaImage, left: i64, top: i64) {
    let (bw, bh) = (i64::from(base.width()), i64::from(base.height()));
    let (sw, sh) = (i64::from(src.width()), i64::from(src.height()));

    let x0 = left.max(0);
    let y0 = top.max(0);
    let x1 = (left + sw).min(bw);
    let y1 = (top + sh).min(bh);

    for y in y0..y1 {
        for x in x0..x1 {
            let sp = src.get_pixel((x - left) as u32, (y - top) as u32).0;
            if sp[3] == 0 {
                continue;
            }
            let dp = base.get_pixel_mut(x as u32, y as u32);
            dp.0 = over(dp.0, sp);
        }
    }
}

/// Blends `color` over an axis-aligned rectangle, clipped to the image.
pub fn fill_rect_over(img: &mut RgbaImage, left: i64, top: i64, w: u32, h: u32, color: Rgba8) {
    for y in top..top + i64::from(h) {
        for x in left..left + i64::from(w) {
            blend_pixel(img, x, y, color);
        }
    }
}

/// Rotates `src` counter-clockwise by `degrees` into a new buffer expanded so
/// no corner is clipped; uncovered pixels are fully transparent. Consumes the
/// source buffer; the output is a fresh allocation.
///
/// Sampling is alpha-weighted bilinear so transparent neighborhoods never
/// bleed dark fringes into the rotated edge.
pub fn rotate_expand(src: RgbaImage, degrees: f32) -> RenderResult<RgbaImage> {
    let (w, h) = src.dimensions();
    let theta = degrees.to_radians();
    let (mut sin, mut cos) = theta.sin_cos();
    // Snap near-zero components so right-angle rotations keep exact dims.
    if sin.abs() < 1e-6 {
        sin = 0.0;
    }
    if cos.abs() < 1e-6 {
        cos = 0.0;
    }

    let fw = w as f32;
    let fh = h as f32;
    let out_w = (fw * cos.abs() + fh * sin.abs()).ceil();
    let out_h = (fw * sin.abs() + fh * cos.abs()).ceil();
    if !out_w.is_finite() || !out_h.is_finite() || out_w > i32::MAX as f32 || out_h > i32::MAX as f32
    {
        return Err(RenderError::geometry_overflow(format!(
            "rotated bounds of {w}x{h} at {degrees} degrees are unrepresentable"
        )));
    }
    let out_w = (out_w as u32).max(1);
    let out_h = (out_h as u32).max(1);

    if sin == 0.0 && cos == 1.0 {
        return Ok(src);
    }

    let cx_src = fw / 2.0;
    let cy_src = fh / 2.0;
    let cx_out = out_w as f32 / 2.0;
    let cy_out = out_h as f32 / 2.0;

    let mut out = RgbaImage::new(out_w, out_h);
    for y in 0..out_h {
        for x in 0..out_w {
            let dx = x as f32 + 0.5 - cx_out;
            let dy = y as f32 + 0.5 - cy_out;
            // Inverse rotation (transpose), image y-axis pointing down.
            let sx = cos * dx - sin * dy + cx_src - 0.5;
            let sy = sin * dx + cos * dy + cy_src - 0.5;
            let px = sample_bilinear(&src, sx, sy);
            if px[3] != 0 {
                out.put_pixel(x, y, image::Rgba(px));
            }
        }
    }
    Ok(out)
}

fn sample_bilinear(src: &RgbaImage, x: f32, y: f32) -> Rgba8 {
    let (w, h) = (src.width() as i64, src.height() as i64);
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let x0 = x0 as i64;
    let y0 = y0 as i64;

    let mut acc = [0.0f32; 4];
    for (ix, iy, wgt) in [
        (x0, y0, (1.0 - fx) * (1.0 - fy)),
        (x0 + 1, y0, fx * (1.0 - fy)),
        (x0, y0 + 1, (1.0 - fx) * fy),
        (x0 + 1, y0 + 1, fx * fy),
    ] {
        if wgt == 0.0 || ix < 0 || iy < 0 || ix >= w || iy >= h {
            continue;
        }
        let p = src.get_pixel(ix as u32, iy as u32).0;
        let a = p[3] as f32 * wgt;
        acc[3] += a;
        for i in 0..3 {
            acc[i] += p[i] as f32 * a;
        }
    }

    if acc[3] <= 0.0 {
        return [0, 0, 0, 0];
    }
    let mut out = [0u8; 4];
    out[3] = (acc[3].round() as i64).clamp(0, 255) as u8;
    for i in 0..3 {
        out[i] = ((acc[i] / acc[3]).round() as i64).clamp(0, 255) as u8;
    }
    out
}

fn mul_div255(x: u32, y: u32) -> u32 {
    (x * y + 127) / 255
}
