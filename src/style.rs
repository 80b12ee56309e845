/// Case transform applied to caption text before measurement and wrapping.
///
/// The set is closed: templates can only name one of these, so dispatch is a
/// plain match over pure string transforms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStyle {
    #[default]
    None,
    Upper,
    Lower,
    Title,
    Capitalize,
    Mocking,
}

impl TextStyle {
    /// Applies the transform. Runs before wrapping so that width measurements
    /// see the glyphs that will actually be drawn.
    pub fn apply(self, text: &str) -> String {
        match self {
            TextStyle::None => text.to_string(),
            TextStyle::Upper => text.to_uppercase(),
            TextStyle::Lower => text.to_lowercase(),
            TextStyle::Title => title_case(text),
            TextStyle::Capitalize => capitalize(text),
            TextStyle::Mocking => mocking_case(text),
        }
    }
}

fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if ch.is_whitespace() {
            at_word_start = true;
            out.push(ch);
        } else if at_word_start {
            at_word_start = false;
            out.extend(ch.to_uppercase());
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => {
            let mut out: String = first.to_uppercase().collect();
            out.extend(chars.flat_map(|c| c.to_lowercase()));
            out
        }
    }
}

/// Alternating case, counting only alphabetic characters so punctuation does
/// not break the rhythm. Starts lowercase: "mocking" -> "mOcKiNg".
fn mocking_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut upper = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if upper {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            upper = !upper;
        } else {
            out.push(ch);
        }
    }
    out
}
