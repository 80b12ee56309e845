use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, OnceLock, RwLock},
};

use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont};

use crate::error::{RenderError, RenderResult};

/// Family name of the bundled fallback font.
pub const DEFAULT_FONT_FAMILY: &str = "DejaVu Sans";

static BUNDLED_FONT: &[u8] = include_bytes!("../assets/fonts/DejaVuSans-Bold.ttf");

#[derive(Clone)]
enum FontSource {
    Bytes(Arc<Vec<u8>>),
    File(PathBuf),
}

/// Process-wide font cache keyed by family name.
///
/// Font parsing is expensive relative to a render, and the set of families is
/// small and fixed, so entries are populated lazily and never evicted. Each
/// key carries its own `OnceLock` so concurrent renders loading unrelated
/// families never serialize on one another; population happens at most once
/// per key.
pub struct FontCatalog {
    default_family: String,
    sources: RwLock<HashMap<String, FontSource>>,
    loaded: RwLock<HashMap<String, Arc<OnceLock<Option<FontArc>>>>>,
}

impl FontCatalog {
    /// A catalog holding only the bundled default family.
    pub fn with_default() -> Self {
        let catalog = Self::empty(DEFAULT_FONT_FAMILY);
        catalog.register_bytes(DEFAULT_FONT_FAMILY, BUNDLED_FONT.to_vec());
        catalog
    }

    /// A catalog with no sources; `default_family` must be registered before
    /// the first resolve or every lookup fails with `FontUnavailable`.
    pub fn empty(default_family: impl Into<String>) -> Self {
        Self {
            default_family: default_family.into(),
            sources: RwLock::new(HashMap::new()),
            loaded: RwLock::new(HashMap::new()),
        }
    }

    pub fn default_family(&self) -> &str {
        &self.default_family
    }

    pub fn register_bytes(&self, family: impl Into<String>, bytes: Vec<u8>) {
        self.sources
            .write()
            .expect("font source registry poisoned")
            .insert(family.into(), FontSource::Bytes(Arc::new(bytes)));
    }

    pub fn register_file(&self, family: impl Into<String>, path: impl Into<PathBuf>) {
        self.sources
            .write()
            .expect("font source registry poisoned")
            .insert(family.into(), FontSource::File(path.into()));
    }

    /// Registers every `.ttf`/`.otf` under `dir`, keyed by file stem.
    pub fn register_dir(&self, dir: &Path) -> RenderResult<usize> {
        use anyhow::Context as _;
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("read font directory '{}'", dir.display()))?;
        let mut count = 0;
        for entry in entries {
            let path = entry
                .with_context(|| format!("list font directory '{}'", dir.display()))?
                .path();
            let is_font = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("otf"));
            if !is_font {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                self.register_file(stem.to_string(), path.clone());
                count += 1;
            }
        }
        Ok(count)
    }

    /// Looks up `family`, falling back to the default family when the request
    /// names a family with no usable source. The boolean is true when the
    /// fallback fired; only a missing default family is an error.
    pub fn resolve(&self, family: Option<&str>) -> RenderResult<(FontArc, bool)> {
        if let Some(name) = family
            && name != self.default_family
        {
            if let Some(font) = self.load(name) {
                return Ok((font, false));
            }
            tracing::warn!(family = name, "font unavailable, using default family");
            let font = self.load(&self.default_family).ok_or_else(|| {
                RenderError::font_unavailable(format!(
                    "neither '{}' nor default '{}' is registered",
                    name, self.default_family
                ))
            })?;
            return Ok((font, true));
        }
        let font = self.load(&self.default_family).ok_or_else(|| {
            RenderError::font_unavailable(format!(
                "default family '{}' is not registered",
                self.default_family
            ))
        })?;
        Ok((font, false))
    }

    fn load(&self, family: &str) -> Option<FontArc> {
        let cell = {
            let mut loaded = self.loaded.write().expect("font cache poisoned");
            loaded.entry(family.to_string()).or_default().clone()
        };
        // Parsing runs outside the map lock; the per-key cell guarantees
        // at-most-once population.
        cell.get_or_init(|| {
            let source = self
                .sources
                .read()
                .expect("font source registry poisoned")
                .get(family)
                .cloned()?;
            let bytes = match source {
                FontSource::Bytes(b) => b.as_ref().clone(),
                FontSource::File(path) => match std::fs::read(&path) {
                    Ok(b) => b,
                    Err(err) => {
                        tracing::warn!(family, path = %path.display(), %err, "font file unreadable");
                        return None;
                    }
                },
            };
            match FontArc::try_from_vec(bytes) {
                Ok(font) => Some(font),
                Err(err) => {
                    tracing::warn!(family, %err, "font bytes failed to parse");
                    None
                }
            }
        })
        .clone()
    }
}

/// Height of one text line at `size`, in whole pixels.
pub fn line_height(font: &FontArc, size: u32) -> u32 {
    let scaled = font.as_scaled(PxScale::from(size as f32));
    (scaled.ascent() - scaled.descent()).ceil() as u32
}

/// Advance width of `text` at `size`, in whole pixels. Integer results keep
/// the solver's fit comparisons exact and platform-stable.
pub fn line_width(font: &FontArc, size: u32, text: &str) -> u32 {
    let scaled = font.as_scaled(PxScale::from(size as f32));
    let mut width = 0.0f32;
    let mut prev: Option<GlyphId> = None;
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = prev {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        prev = Some(id);
    }
    width.ceil() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_family_resolves_without_fallback() {
        let catalog = FontCatalog::with_default();
        let (_, fell_back) = catalog.resolve(None).unwrap();
        assert!(!fell_back);
        let (_, fell_back) = catalog.resolve(Some(DEFAULT_FONT_FAMILY)).unwrap();
        assert!(!fell_back);
    }

    #[test]
    fn unknown_family_falls_back_to_default() {
        let catalog = FontCatalog::with_default();
        let (_, fell_back) = catalog.resolve(Some("Comic Sans MS")).unwrap();
        assert!(fell_back);
    }

    #[test]
    fn empty_catalog_reports_font_unavailable() {
        let catalog = FontCatalog::empty("Nonexistent");
        let err = catalog.resolve(None).unwrap_err();
        assert!(matches!(err, RenderError::FontUnavailable(_)));
    }

    #[test]
    fn garbage_bytes_fall_back_instead_of_failing() {
        let catalog = FontCatalog::with_default();
        catalog.register_bytes("Broken", vec![0u8; 16]);
        let (_, fell_back) = catalog.resolve(Some("Broken")).unwrap();
        assert!(fell_back);
    }

    #[test]
    fn width_grows_with_size_and_length() {
        let catalog = FontCatalog::with_default();
        let (font, _) = catalog.resolve(None).unwrap();
        assert_eq!(line_width(&font, 20, ""), 0);
        let short = line_width(&font, 20, "hi");
        let long = line_width(&font, 20, "hello world");
        assert!(short < long);
        assert!(line_width(&font, 40, "hi") > short);
        assert!(line_height(&font, 40) > line_height(&font, 20));
    }

    #[test]
    fn measurements_are_deterministic() {
        let catalog = FontCatalog::with_default();
        let (font, _) = catalog.resolve(None).unwrap();
        let a = line_width(&font, 33, "HELLO WORLD");
        let b = line_width(&font, 33, "HELLO WORLD");
        assert_eq!(a, b);
    }
}
