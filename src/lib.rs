//! Meme image composition: fits caption text into template-defined boxes,
//! draws it with a stroke outline, composites overlay images, and serializes
//! still or animated output.
//!
//! The engine is a pure, synchronous transform from in-memory rasters and
//! placement specs to encoded bytes; it performs no network or template I/O.
//! See [`pipeline::render`] for the single entry point.

#![forbid(unsafe_code)]

pub mod composite;
pub mod decode;
pub mod draw;
pub mod encode;
pub mod error;
pub mod fit;
pub mod fonts;
pub mod model;
pub mod overlay;
pub mod pipeline;
pub mod style;
pub mod watermark;
pub mod wrap;

pub use decode::{decode_background, decode_overlay};
pub use error::{RenderError, RenderResult};
pub use fonts::{DEFAULT_FONT_FAMILY, FontCatalog};
pub use model::{
    Background, Frame, HAlign, Limits, OutputFormat, OverlaySpec, RenderOutput, RenderRequest,
    TextSpec,
};
pub use pipeline::{compose, render};
pub use style::TextStyle;
