use ab_glyph::FontArc;

use crate::{
    fonts::{line_height, line_width},
    model::MAX_FONT_SIZE,
    wrap::wrap_text,
};

/// Solver result: the chosen size and the wrapping computed at that size, so
/// the renderer never re-wraps (and can never disagree with the solver).
#[derive(Clone, Debug)]
pub struct FittedText {
    pub size: u32,
    pub lines: Vec<String>,
}

/// Largest integer size in `[floor, MAX_FONT_SIZE]` at which `text` wraps
/// into lines that all fit `box_w` and whose stacked height fits `box_h`.
///
/// Fit is monotone in size, so a binary search over the candidate range
/// suffices. When even `floor` does not fit, `floor` is returned anyway and
/// the rendered text visually overflows; overflow is an accepted outcome,
/// never an error. All comparisons are on whole pixels, keeping the result
/// identical across calls and platforms.
pub fn solve_font_size(
    font: &FontArc,
    text: &str,
    box_w: u32,
    box_h: u32,
    floor: u32,
) -> FittedText {
    let floor = floor.clamp(1, MAX_FONT_SIZE);
    let mut lo = floor;
    let mut hi = MAX_FONT_SIZE;

    if !fits(font, text, box_w, box_h, floor) {
        return FittedText {
            size: floor,
            lines: wrap_text(font, floor, text, box_w),
        };
    }

    while lo < hi {
        let mid = lo + (hi - lo).div_ceil(2);
        if fits(font, text, box_w, box_h, mid) {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }

    FittedText {
        size: lo,
        lines: wrap_text(font, lo, text, box_w),
    }
}

fn fits(font: &FontArc, text: &str, box_w: u32, box_h: u32, size: u32) -> bool {
    let lines = wrap_text(font, size, text, box_w);
    let count = lines.len() as u64;
    if count * u64::from(line_height(font, size)) > u64::from(box_h) {
        return false;
    }
    lines.iter().all(|line| line_width(font, size, line) <= box_w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::FontCatalog;

    fn font() -> FontArc {
        FontCatalog::with_default().resolve(None).unwrap().0
    }

    #[test]
    fn chosen_size_fits_the_box() {
        let font = font();
        let fitted = solve_font_size(&font, "HELLO WORLD", 200, 60, 7);
        assert!(fitted.size >= 7);
        let total = fitted.lines.len() as u32 * line_height(&font, fitted.size);
        assert!(total <= 60);
        for line in &fitted.lines {
            assert!(line_width(&font, fitted.size, line) <= 200);
        }
    }

    #[test]
    fn one_size_larger_would_not_fit() {
        let font = font();
        let fitted = solve_font_size(&font, "HELLO WORLD", 200, 60, 7);
        assert!(fitted.size < MAX_FONT_SIZE);
        assert!(!fits(&font, "HELLO WORLD", 200, 60, fitted.size + 1));
    }

    #[test]
    fn result_is_deterministic() {
        let font = font();
        let a = solve_font_size(&font, "HELLO WORLD", 200, 60, 7);
        let b = solve_font_size(&font, "HELLO WORLD", 200, 60, 7);
        assert_eq!(a.size, b.size);
        assert_eq!(a.lines, b.lines);
    }

    #[test]
    fn floor_is_returned_when_nothing_fits() {
        let font = font();
        let fitted = solve_font_size(&font, "this text cannot possibly fit", 10, 4, 7);
        assert_eq!(fitted.size, 7);
        assert!(!fitted.lines.is_empty());
    }

    #[test]
    fn short_text_in_a_huge_box_hits_the_ceiling() {
        let font = font();
        let fitted = solve_font_size(&font, "a", 100_000, 100_000, 7);
        assert_eq!(fitted.size, MAX_FONT_SIZE);
    }

    #[test]
    fn empty_text_still_yields_a_line() {
        let font = font();
        let fitted = solve_font_size(&font, "", 200, 60, 7);
        assert_eq!(fitted.lines, vec![String::new()]);
    }
}
