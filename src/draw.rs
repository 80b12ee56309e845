use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont, point};
use image::RgbaImage;

use crate::{
    composite::{Rgba8, blend_pixel, paste_over, rotate_expand},
    error::RenderResult,
    fonts::line_width,
    model::HAlign,
};

/// Outline color for the stroke passes.
pub const STROKE_COLOR: Rgba8 = [0, 0, 0, 255];

/// Stroke thickness in pixels for a given font size.
fn stroke_width(size: u32) -> i64 {
    i64::from((size / 30).max(1))
}

/// Draws pre-wrapped lines into the box at `(left, top)`–`(box_w, box_h)`.
///
/// Lines are distributed evenly over the box height, each centered within its
/// vertical slot, and aligned horizontally per `align`. Every glyph gets a
/// stroke pass (offset in the 8 surrounding directions) before the fill pass;
/// the ordering guarantees fill pixels are never overwritten by stroke
/// pixels.
///
/// A non-zero `angle` renders to an offscreen transparent layer first, then
/// rotates and pastes that layer centered on the box. Rotating already-drawn
/// base pixels would drag the background through the resampling filter.
#[allow(clippy::too_many_arguments)]
pub fn draw_text_box(
    img: &mut RgbaImage,
    font: &FontArc,
    size: u32,
    lines: &[String],
    color: Rgba8,
    align: HAlign,
    left: i64,
    top: i64,
    box_w: u32,
    box_h: u32,
    angle: f32,
) -> RenderResult<()> {
    if angle != 0.0 {
        let mut layer = RgbaImage::new(box_w.max(1), box_h.max(1));
        draw_lines(&mut layer, font, size, lines, color, align, 0, 0, box_w, box_h);
        let rotated = rotate_expand(layer, angle)?;
        let cx = left + i64::from(box_w) / 2;
        let cy = top + i64::from(box_h) / 2;
        paste_over(
            img,
            &rotated,
            cx - i64::from(rotated.width()) / 2,
            cy - i64::from(rotated.height()) / 2,
        );
        return Ok(());
    }

    draw_lines(img, font, size, lines, color, align, left, top, box_w, box_h);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn draw_lines(
    img: &mut RgbaImage,
    font: &FontArc,
    size: u32,
    lines: &[String],
    color: Rgba8,
    align: HAlign,
    left: i64,
    top: i64,
    box_w: u32,
    box_h: u32,
) {
    if lines.is_empty() {
        return;
    }
    let scaled = font.as_scaled(PxScale::from(size as f32));
    let ascent = scaled.ascent();
    let glyph_h = ascent - scaled.descent();
    let slot = box_h as f32 / lines.len() as f32;

    let positions: Vec<(f32, f32)> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let lw = line_width(font, size, line);
            let x = match align {
                HAlign::Left => left as f32,
                HAlign::Center => left as f32 + (i64::from(box_w) - i64::from(lw)) as f32 / 2.0,
                HAlign::Right => left as f32 + (i64::from(box_w) - i64::from(lw)) as f32,
            };
            let line_top = top as f32 + i as f32 * slot + (slot - glyph_h) / 2.0;
            (x, line_top + ascent)
        })
        .collect();

    let sw = stroke_width(size);
    let offsets = [
        (-sw, -sw),
        (0, -sw),
        (sw, -sw),
        (-sw, 0),
        (sw, 0),
        (-sw, sw),
        (0, sw),
        (sw, sw),
    ];
    for (dx, dy) in offsets {
        for (line, &(x, baseline)) in lines.iter().zip(&positions) {
            draw_line(
                img,
                font,
                size,
                line,
                x + dx as f32,
                baseline + dy as f32,
                STROKE_COLOR,
            );
        }
    }
    for (line, &(x, baseline)) in lines.iter().zip(&positions) {
        draw_line(img, font, size, line, x, baseline, color);
    }
}

/// One fill pass of a single line; shared with the watermark stamper.
pub(crate) fn draw_line(
    img: &mut RgbaImage,
    font: &FontArc,
    size: u32,
    text: &str,
    origin_x: f32,
    baseline_y: f32,
    color: Rgba8,
) {
    let scale = PxScale::from(size as f32);
    let scaled = font.as_scaled(scale);
    let mut caret = origin_x;
    let mut prev: Option<GlyphId> = None;

    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = prev {
            caret += scaled.kern(prev, id);
        }
        let glyph = id.with_scale_and_position(scale, point(caret, baseline_y));
        caret += scaled.h_advance(id);
        prev = Some(id);

        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            let gx0 = bounds.min.x as i64;
            let gy0 = bounds.min.y as i64;
            outlined.draw(|x, y, coverage| {
                let alpha = (coverage.clamp(0.0, 1.0) * f32::from(color[3])).round() as u8;
                if alpha == 0 {
                    return;
                }
                blend_pixel(
                    img,
                    gx0 + i64::from(x),
                    gy0 + i64::from(y),
                    [color[0], color[1], color[2], alpha],
                );
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::FontCatalog;

    fn font() -> FontArc {
        FontCatalog::with_default().resolve(None).unwrap().0
    }

    fn opaque_pixels(img: &RgbaImage) -> usize {
        img.pixels().filter(|p| p.0[3] > 0).count()
    }

    #[test]
    fn drawing_text_marks_pixels() {
        let font = font();
        let mut img = RgbaImage::new(200, 60);
        draw_text_box(
            &mut img,
            &font,
            30,
            &["HELLO".to_string()],
            [255, 255, 255, 255],
            HAlign::Center,
            0,
            0,
            200,
            60,
            0.0,
        )
        .unwrap();
        assert!(opaque_pixels(&img) > 0);
    }

    #[test]
    fn fill_and_stroke_are_both_present() {
        let font = font();
        let mut img = RgbaImage::new(200, 60);
        draw_text_box(
            &mut img,
            &font,
            40,
            &["O".to_string()],
            [255, 255, 255, 255],
            HAlign::Center,
            0,
            0,
            200,
            60,
            0.0,
        )
        .unwrap();
        let has_white = img.pixels().any(|p| p.0 == [255, 255, 255, 255]);
        let has_dark = img
            .pixels()
            .any(|p| p.0[3] == 255 && p.0[0] < 50 && p.0[1] < 50 && p.0[2] < 50);
        assert!(has_white, "fill pass missing");
        assert!(has_dark, "stroke pass missing");
    }

    #[test]
    fn empty_line_draws_nothing() {
        let font = font();
        let mut img = RgbaImage::new(100, 40);
        draw_text_box(
            &mut img,
            &font,
            20,
            &[String::new()],
            [255, 255, 255, 255],
            HAlign::Center,
            0,
            0,
            100,
            40,
            0.0,
        )
        .unwrap();
        assert_eq!(opaque_pixels(&img), 0);
    }

    #[test]
    fn rotated_text_lands_near_the_box_center() {
        let font = font();
        let mut straight = RgbaImage::new(200, 200);
        let mut rotated = RgbaImage::new(200, 200);
        let lines = vec!["ABC".to_string()];
        draw_text_box(
            &mut straight,
            &font,
            24,
            &lines,
            [255, 0, 0, 255],
            HAlign::Center,
            50,
            80,
            100,
            40,
            0.0,
        )
        .unwrap();
        draw_text_box(
            &mut rotated,
            &font,
            24,
            &lines,
            [255, 0, 0, 255],
            HAlign::Center,
            50,
            80,
            100,
            40,
            30.0,
        )
        .unwrap();
        assert!(opaque_pixels(&rotated) > 0);
        // A rotated draw must not be pixel-identical to the straight one.
        assert_ne!(straight, rotated);
    }

    #[test]
    fn two_lines_occupy_upper_and_lower_halves() {
        let font = font();
        let mut img = RgbaImage::new(200, 100);
        draw_text_box(
            &mut img,
            &font,
            20,
            &["AAA".to_string(), "BBB".to_string()],
            [255, 255, 255, 255],
            HAlign::Center,
            0,
            0,
            200,
            100,
            0.0,
        )
        .unwrap();
        let top_half = img
            .enumerate_pixels()
            .filter(|(_, y, p)| *y < 50 && p.0[3] > 0)
            .count();
        let bottom_half = img
            .enumerate_pixels()
            .filter(|(_, y, p)| *y >= 50 && p.0[3] > 0)
            .count();
        assert!(top_half > 0);
        assert!(bottom_half > 0);
    }
}
