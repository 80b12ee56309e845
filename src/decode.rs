use std::io::Cursor;

use image::{AnimationDecoder, ImageFormat, ImageReader, RgbaImage, codecs::gif::GifDecoder};

use crate::{
    error::{RenderError, RenderResult},
    model::{Background, Frame, Limits},
};

/// Decodes an in-memory background into owned raster frames.
///
/// Dimensions are checked against the pixel cap before any full-size buffer
/// is allocated, and animated sources stop decoding at the frame cap, so an
/// adversarial input cannot make this stage balloon. Formats outside the
/// allow-list (PNG/JPEG/GIF/WebP) are rejected up front.
pub fn decode_background(bytes: &[u8], limits: &Limits) -> RenderResult<Background> {
    let format = image::guess_format(bytes)
        .map_err(|_| RenderError::unsupported_format("unrecognized image container"))?;

    match format {
        ImageFormat::Gif => decode_animation(bytes, limits),
        ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP => {
            Ok(Background::Still(decode_still(bytes, limits, "background")?))
        }
        other => Err(RenderError::unsupported_format(format!(
            "{other:?} is not an accepted background format"
        ))),
    }
}

/// Decodes a still overlay image (any allow-listed format; animation frames
/// beyond the first are ignored for overlays).
pub fn decode_overlay(bytes: &[u8], limits: &Limits) -> RenderResult<RgbaImage> {
    match decode_background(bytes, limits)? {
        Background::Still(img) => Ok(img),
        Background::Animation(mut frames) => Ok(frames.remove(0).image),
    }
}

fn decode_still(bytes: &[u8], limits: &Limits, stage: &str) -> RenderResult<RgbaImage> {
    use anyhow::Context as _;
    let (w, h) = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("sniff image header")?
        .into_dimensions()
        .context("read image dimensions")?;
    limits.check_pixels(w, h, stage)?;

    let img = image::load_from_memory(bytes)
        .map_err(|err| RenderError::unsupported_format(format!("{stage} decode: {err}")))?;
    Ok(img.to_rgba8())
}

fn decode_animation(bytes: &[u8], limits: &Limits) -> RenderResult<Background> {
    let decoder = GifDecoder::new(Cursor::new(bytes))
        .map_err(|err| RenderError::unsupported_format(format!("gif header: {err}")))?;
    {
        use image::ImageDecoder as _;
        let (w, h) = decoder.dimensions();
        limits.check_pixels(w, h, "animated background")?;
    }

    let mut frames = Vec::new();
    let mut truncated = false;
    for frame in decoder.into_frames() {
        if frames.len() >= limits.max_frames {
            truncated = true;
            break;
        }
        let frame = frame
            .map_err(|err| RenderError::unsupported_format(format!("gif frame decode: {err}")))?;
        let (numer, denom) = frame.delay().numer_denom_ms();
        let delay_ms = if denom == 0 { 0 } else { numer / denom };
        frames.push(Frame::new(frame.into_buffer(), delay_ms));
    }
    if truncated {
        tracing::warn!(cap = limits.max_frames, "animation truncated at frame cap");
    }
    if frames.is_empty() {
        return Err(RenderError::unsupported_format("gif contains no frames"));
    }
    Ok(Background::Animation(frames))
}
