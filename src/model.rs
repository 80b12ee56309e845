use image::RgbaImage;

use crate::{
    error::{RenderError, RenderResult},
    style::TextStyle,
};

/// Upper bound the font-size solver will ever try.
pub const MAX_FONT_SIZE: u32 = 500;

/// Horizontal placement of each wrapped line within its text box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Output container for the encoded render.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl OutputFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Gif => "image/gif",
            OutputFormat::Webp => "image/webp",
        }
    }

    /// Maps a file extension to a supported format. Anything outside the
    /// allow-list is rejected by the caller as `UnsupportedFormat`.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(OutputFormat::Png),
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            "gif" => Some(OutputFormat::Gif),
            "webp" => Some(OutputFormat::Webp),
            _ => None,
        }
    }
}

/// Caps a caller supplies per render; the core treats them as fixed inputs.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct Limits {
    /// Hard cap on `width * height` of any raster at a stage boundary.
    pub max_pixels: u64,
    /// Animations longer than this are truncated, never an error.
    pub max_frames: usize,
    /// Animations shorter than this are rendered as-is, never padded.
    pub min_frames: usize,
    /// Floor for the font-size solver; below it overflow is accepted.
    pub min_font_size: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_pixels: 8_000_000,
            max_frames: 40,
            min_frames: 8,
            min_font_size: 7,
        }
    }
}

impl Limits {
    pub fn validate(&self) -> RenderResult<()> {
        if self.max_pixels == 0 {
            return Err(RenderError::input_too_large("max_pixels must be > 0"));
        }
        if self.max_frames == 0 {
            return Err(RenderError::input_too_large("max_frames must be > 0"));
        }
        if self.min_font_size == 0 || self.min_font_size > MAX_FONT_SIZE {
            return Err(RenderError::input_too_large(format!(
                "min_font_size must be in 1..={MAX_FONT_SIZE}"
            )));
        }
        Ok(())
    }

    /// Stage-boundary pixel check; violations are hard failures, not resizes.
    pub fn check_pixels(&self, width: u32, height: u32, stage: &str) -> RenderResult<()> {
        let pixels = u64::from(width) * u64::from(height);
        if pixels > self.max_pixels {
            return Err(RenderError::input_too_large(format!(
                "{stage}: {width}x{height} = {pixels} pixels exceeds cap of {}",
                self.max_pixels
            )));
        }
        Ok(())
    }
}

/// One text slot of a template: where the caption goes, how it looks, and
/// during which part of an animation it is visible.
///
/// Positions and sizes are fractions of the background dimensions so the same
/// template works at any resolution. Built once from template configuration
/// and immutable for the duration of a render.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TextSpec {
    #[serde(default)]
    pub style: TextStyle,
    /// Fill color as straight-alpha RGBA.
    #[serde(default = "default_fill")]
    pub color: [u8; 4],
    /// Font family looked up in the catalog; falls back to the default family.
    #[serde(default)]
    pub font_family: Option<String>,
    /// Top-left corner of the box, each in [0, 1] of the image dimensions.
    pub anchor_x: f32,
    pub anchor_y: f32,
    /// Box extent as a fraction of the image dimensions, each in (0, 1].
    pub scale_x: f32,
    pub scale_y: f32,
    /// Rotation in degrees, counter-clockwise.
    #[serde(default)]
    pub angle: f32,
    #[serde(default)]
    pub align: HAlign,
    /// Visibility window over the animation, as fractions of the frame count.
    #[serde(default)]
    pub start: f32,
    #[serde(default = "default_stop")]
    pub stop: f32,
}

fn default_fill() -> [u8; 4] {
    [0xff, 0xff, 0xff, 0xff]
}

fn default_stop() -> f32 {
    1.0
}

impl TextSpec {
    /// A full-visibility, centered spec covering the given fractional box.
    pub fn boxed(anchor_x: f32, anchor_y: f32, scale_x: f32, scale_y: f32) -> Self {
        Self {
            style: TextStyle::default(),
            color: default_fill(),
            font_family: None,
            anchor_x,
            anchor_y,
            scale_x,
            scale_y,
            angle: 0.0,
            align: HAlign::default(),
            start: 0.0,
            stop: 1.0,
        }
    }

    pub fn validate(&self) -> RenderResult<()> {
        let unit = |v: f32| (0.0..=1.0).contains(&v);
        if !unit(self.anchor_x) || !unit(self.anchor_y) {
            return Err(RenderError::geometry_overflow(format!(
                "text anchor ({}, {}) must lie in [0, 1]",
                self.anchor_x, self.anchor_y
            )));
        }
        if !(self.scale_x > 0.0 && self.scale_x <= 1.0)
            || !(self.scale_y > 0.0 && self.scale_y <= 1.0)
        {
            return Err(RenderError::geometry_overflow(format!(
                "text box scale ({}, {}) must lie in (0, 1]",
                self.scale_x, self.scale_y
            )));
        }
        if !unit(self.start) || !unit(self.stop) || self.start > self.stop {
            return Err(RenderError::geometry_overflow(format!(
                "visibility window [{}, {}] must satisfy 0 <= start <= stop <= 1",
                self.start, self.stop
            )));
        }
        Ok(())
    }

    /// Whether this spec is drawn at normalized animation position `p`.
    pub fn visible_at(&self, p: f32) -> bool {
        self.start <= p && p <= self.stop
    }
}

/// Placement of a secondary image composited onto the background.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct OverlaySpec {
    /// Center of the pasted overlay, each in [0, 1] of the base dimensions.
    pub center_x: f32,
    pub center_y: f32,
    /// Rotation in degrees, counter-clockwise.
    #[serde(default)]
    pub angle: f32,
    /// Scale factor relative to the overlay's own native size.
    #[serde(default = "default_scale")]
    pub scale: f32,
}

fn default_scale() -> f32 {
    1.0
}

impl OverlaySpec {
    pub fn validate(&self) -> RenderResult<()> {
        if !(0.0..=1.0).contains(&self.center_x) || !(0.0..=1.0).contains(&self.center_y) {
            return Err(RenderError::geometry_overflow(format!(
                "overlay center ({}, {}) must lie in [0, 1]",
                self.center_x, self.center_y
            )));
        }
        if !(self.scale > 0.0) || !self.scale.is_finite() {
            return Err(RenderError::geometry_overflow(format!(
                "overlay scale {} must be positive and finite",
                self.scale
            )));
        }
        Ok(())
    }
}

/// One frame of an animated background with its source delay.
#[derive(Clone, Debug)]
pub struct Frame {
    pub image: RgbaImage,
    pub delay_ms: u32,
}

/// Fallback inter-frame delay when the source provides none.
pub const DEFAULT_FRAME_DELAY_MS: u32 = 100;

impl Frame {
    pub fn new(image: RgbaImage, delay_ms: u32) -> Self {
        let delay_ms = if delay_ms == 0 {
            DEFAULT_FRAME_DELAY_MS
        } else {
            delay_ms
        };
        Self { image, delay_ms }
    }
}

/// The raster(s) everything is drawn onto. Owned by the pipeline for the
/// duration of a render; each stage consumes and produces owned buffers.
#[derive(Clone, Debug)]
pub enum Background {
    Still(RgbaImage),
    Animation(Vec<Frame>),
}

impl Background {
    /// Dimensions of the first raster; text boxes are solved against these.
    pub fn dimensions(&self) -> RenderResult<(u32, u32)> {
        match self {
            Background::Still(img) => Ok(img.dimensions()),
            Background::Animation(frames) => frames
                .first()
                .map(|f| f.image.dimensions())
                .ok_or_else(|| RenderError::unsupported_format("animation has zero frames")),
        }
    }

    pub fn frame_count(&self) -> usize {
        match self {
            Background::Still(_) => 1,
            Background::Animation(frames) => frames.len(),
        }
    }
}

/// Everything the engine needs for one render. Consumed exactly once.
#[derive(Clone, Debug)]
pub struct RenderRequest {
    pub background: Background,
    pub texts: Vec<(TextSpec, String)>,
    pub overlays: Vec<(OverlaySpec, RgbaImage)>,
    /// `None` disables the watermark band entirely.
    pub watermark: Option<String>,
    pub format: OutputFormat,
}

/// Encoded result plus per-slot diagnostics for the caller's fingerprinting.
#[derive(Clone, Debug)]
pub struct RenderOutput {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    /// Resolved font size per text slot, in request order.
    pub font_sizes: Vec<u32>,
    /// True when a lossy policy fired (frame truncation, font fallback).
    pub degraded: bool,
}
