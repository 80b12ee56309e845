use ab_glyph::FontArc;

use crate::fonts::line_width;

/// Greedy whitespace wrap: tokens accumulate onto the current line while the
/// line still fits `max_width` at `size`; the token that would overflow
/// starts a new line.
///
/// A single token wider than `max_width` is never character-split; it sits
/// alone on its own line and the caller accepts the horizontal overflow.
/// Empty input yields one empty line, never zero lines, so vertical layout
/// downstream always has a stable line count.
///
/// Any case/style transform must be applied by the caller before wrapping so
/// measurements reflect the glyphs actually drawn.
pub fn wrap_text(font: &FontArc, size: u32, text: &str, max_width: u32) -> Vec<String> {
    let mut tokens = text.split_whitespace();
    let Some(first) = tokens.next() else {
        return vec![String::new()];
    };

    let mut lines = Vec::new();
    let mut current = first.to_string();
    for token in tokens {
        let candidate = format!("{current} {token}");
        if line_width(font, size, &candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(current);
            current = token.to_string();
        }
    }
    lines.push(current);
    lines
}
