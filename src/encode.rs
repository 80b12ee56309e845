use std::io::Cursor;

use image::{
    Delay, DynamicImage, ImageFormat, RgbaImage,
    codecs::gif::{GifEncoder, Repeat},
};

use crate::{
    error::{RenderError, RenderResult},
    model::{Frame, Limits, OutputFormat},
};

/// Serializes rendered frames into the requested container.
///
/// GIF output keeps every frame with its source delay; the encoder
/// re-quantizes to a 256-color palette, and the banding that may introduce is
/// accepted. The other formats are single-image containers and take the first
/// frame. Either a complete byte buffer comes back or an error does; nothing
/// partial is ever returned.
pub fn encode(frames: &[Frame], format: OutputFormat, limits: &Limits) -> RenderResult<Vec<u8>> {
    let first = frames
        .first()
        .ok_or_else(|| RenderError::encoding_failure("no frames to encode"))?;
    for frame in frames {
        let (w, h) = frame.image.dimensions();
        limits.check_pixels(w, h, "output encoding")?;
    }

    match format {
        OutputFormat::Gif => encode_gif(frames),
        OutputFormat::Png => encode_still(&first.image, ImageFormat::Png, false),
        OutputFormat::Jpeg => encode_still(&first.image, ImageFormat::Jpeg, true),
        OutputFormat::Webp => encode_still(&first.image, ImageFormat::WebP, false),
    }
}

fn encode_still(img: &RgbaImage, format: ImageFormat, flatten: bool) -> RenderResult<Vec<u8>> {
    // JPEG has no alpha channel.
    let dyn_img = if flatten {
        DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(img.clone()).to_rgb8())
    } else {
        DynamicImage::ImageRgba8(img.clone())
    };
    let mut out = Cursor::new(Vec::new());
    dyn_img
        .write_to(&mut out, format)
        .map_err(|err| RenderError::encoding_failure(format!("{format:?} serialization: {err}")))?;
    Ok(out.into_inner())
}

fn encode_gif(frames: &[Frame]) -> RenderResult<Vec<u8>> {
    let mut out = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut out, 10);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|err| RenderError::encoding_failure(format!("gif header: {err}")))?;
        for frame in frames {
            let delay = Delay::from_numer_denom_ms(frame.delay_ms, 1);
            let gif_frame = image::Frame::from_parts(frame.image.clone(), 0, 0, delay);
            encoder
                .encode_frame(gif_frame)
                .map_err(|err| RenderError::encoding_failure(format!("gif frame: {err}")))?;
        }
    }
    Ok(out)
}
