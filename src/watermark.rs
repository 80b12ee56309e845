use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::RgbaImage;

use crate::{
    composite::{Rgba8, fill_rect_over},
    draw::draw_line,
    fonts::line_width,
};

/// Height of the translucent caption band.
pub const BAND_HEIGHT: u32 = 16;

const CAPTION_SIZE: u32 = 11;
const BAND_COLOR: Rgba8 = [0, 0, 0, 128];
const CAPTION_COLOR: Rgba8 = [255, 255, 255, 160];
const MARGIN: i64 = 4;

/// Stamps a translucent caption band across the bottom of the raster.
///
/// Runs after all text and overlay compositing; on animations the caller
/// applies it identically to every frame. An empty caption is a no-op, as is
/// a raster too short to hold the band.
pub fn stamp(img: &mut RgbaImage, caption: &str, font: &FontArc) {
    if caption.is_empty() {
        return;
    }
    let (w, h) = img.dimensions();
    if h < BAND_HEIGHT {
        return;
    }

    let band_top = i64::from(h - BAND_HEIGHT);
    fill_rect_over(img, 0, band_top, w, BAND_HEIGHT, BAND_COLOR);

    let scaled = font.as_scaled(PxScale::from(CAPTION_SIZE as f32));
    let text_w = line_width(font, CAPTION_SIZE, caption);
    let x = (i64::from(w) - i64::from(text_w) - MARGIN).max(MARGIN) as f32;
    let glyph_h = scaled.ascent() - scaled.descent();
    let baseline = band_top as f32 + (BAND_HEIGHT as f32 - glyph_h) / 2.0 + scaled.ascent();
    draw_line(img, font, CAPTION_SIZE, caption, x, baseline, CAPTION_COLOR);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::FontCatalog;

    fn font() -> FontArc {
        FontCatalog::with_default().resolve(None).unwrap().0
    }

    #[test]
    fn empty_caption_leaves_raster_untouched() {
        let font = font();
        let mut img = RgbaImage::from_pixel(64, 64, image::Rgba([7, 7, 7, 255]));
        let before = img.clone();
        stamp(&mut img, "", &font);
        assert_eq!(img, before);
    }

    #[test]
    fn caption_darkens_the_bottom_band_only() {
        let font = font();
        let mut img = RgbaImage::from_pixel(64, 64, image::Rgba([200, 200, 200, 255]));
        stamp(&mut img, "memeforge", &font);

        // Band pixels are blended darker.
        let in_band = img.get_pixel(2, 63).0;
        assert!(in_band[0] < 200);
        // Above the band nothing changed.
        assert_eq!(img.get_pixel(2, 40).0, [200, 200, 200, 255]);
    }

    #[test]
    fn too_short_raster_is_skipped() {
        let font = font();
        let mut img = RgbaImage::from_pixel(64, 8, image::Rgba([1, 2, 3, 255]));
        let before = img.clone();
        stamp(&mut img, "tiny", &font);
        assert_eq!(img, before);
    }
}
