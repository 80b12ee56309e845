use ab_glyph::FontArc;

use crate::{
    draw::draw_text_box,
    encode,
    error::RenderResult,
    fit::{FittedText, solve_font_size},
    fonts::FontCatalog,
    model::{
        Background, DEFAULT_FRAME_DELAY_MS, Frame, Limits, RenderOutput, RenderRequest, TextSpec,
    },
    overlay::{composite_overlay, scaled_dimensions},
    watermark,
};

/// A text slot with its layout fully solved against the background
/// dimensions. Solving happens once per slot, before any frame is touched,
/// so every frame of an animation draws the identical wrapping and size.
struct PlacedText {
    spec: TextSpec,
    font: FontArc,
    fitted: FittedText,
    left: i64,
    top: i64,
    box_w: u32,
    box_h: u32,
}

/// Renders a request to encoded bytes.
///
/// This is the single entry point of the engine: validation runs before any
/// pixel work, every frame is composed (overlays, then visible text slots,
/// then the watermark band), and the result is serialized in one piece.
#[tracing::instrument(skip_all, fields(format = ?request.format, frames = request.background.frame_count()))]
pub fn render(
    request: RenderRequest,
    catalog: &FontCatalog,
    limits: &Limits,
) -> RenderResult<RenderOutput> {
    let format = request.format;
    let (frames, font_sizes, degraded) = compose(request, catalog, limits)?;
    let bytes = encode::encode(&frames, format, limits)?;
    Ok(RenderOutput {
        bytes,
        content_type: format.content_type(),
        font_sizes,
        degraded,
    })
}

/// Composes the request into finished raster frames without encoding them.
///
/// Returns the frames, the resolved font size per text slot, and whether a
/// lossy policy fired (frame truncation or font fallback).
pub fn compose(
    request: RenderRequest,
    catalog: &FontCatalog,
    limits: &Limits,
) -> RenderResult<(Vec<Frame>, Vec<u32>, bool)> {
    limits.validate()?;

    let RenderRequest {
        background,
        texts,
        overlays,
        watermark,
        format: _,
    } = request;

    for (spec, _) in &texts {
        spec.validate()?;
    }
    for (spec, _) in &overlays {
        spec.validate()?;
    }

    let (width, height) = background.dimensions()?;
    match &background {
        Background::Still(img) => {
            limits.check_pixels(img.width(), img.height(), "background")?;
        }
        Background::Animation(frames) => {
            for frame in frames {
                limits.check_pixels(frame.image.width(), frame.image.height(), "background frame")?;
            }
        }
    }
    for (spec, img) in &overlays {
        limits.check_pixels(img.width(), img.height(), "overlay")?;
        let (sw, sh) = scaled_dimensions(img, spec.scale)?;
        limits.check_pixels(sw, sh, "scaled overlay")?;
    }

    let mut degraded = false;

    let mut frames: Vec<Frame> = match background {
        Background::Still(img) => vec![Frame::new(img, DEFAULT_FRAME_DELAY_MS)],
        Background::Animation(frames) => frames,
    };
    if frames.len() > limits.max_frames {
        tracing::warn!(
            frames = frames.len(),
            cap = limits.max_frames,
            "dropping frames past the cap"
        );
        frames.truncate(limits.max_frames);
        degraded = true;
    }
    if frames.len() < limits.min_frames {
        // Short animations render as-is; frames are never synthesized.
        tracing::debug!(frames = frames.len(), floor = limits.min_frames, "below frame floor");
    }

    let (watermark_font, _) = catalog.resolve(None)?;
    let mut placed = Vec::with_capacity(texts.len());
    let mut font_sizes = Vec::with_capacity(texts.len());
    for (spec, text) in &texts {
        let (font, fell_back) = catalog.resolve(spec.font_family.as_deref())?;
        degraded |= fell_back;

        let styled = spec.style.apply(text);
        let box_w = ((spec.scale_x * width as f32).round() as u32).max(1);
        let box_h = ((spec.scale_y * height as f32).round() as u32).max(1);
        let fitted = solve_font_size(&font, &styled, box_w, box_h, limits.min_font_size);
        font_sizes.push(fitted.size);
        placed.push(PlacedText {
            spec: spec.clone(),
            font,
            fitted,
            left: (spec.anchor_x * width as f32).round() as i64,
            top: (spec.anchor_y * height as f32).round() as i64,
            box_w,
            box_h,
        });
    }

    let total = frames.len();
    let mut rendered = Vec::with_capacity(total);
    for (i, frame) in frames.into_iter().enumerate() {
        let p = if total > 1 {
            i as f32 / (total - 1) as f32
        } else {
            0.0
        };

        let mut img = frame.image;
        for (spec, overlay) in &overlays {
            img = composite_overlay(img, overlay, spec)?;
        }
        for pt in &placed {
            if !pt.spec.visible_at(p) {
                continue;
            }
            draw_text_box(
                &mut img,
                &pt.font,
                pt.fitted.size,
                &pt.fitted.lines,
                pt.spec.color,
                pt.spec.align,
                pt.left,
                pt.top,
                pt.box_w,
                pt.box_h,
                pt.spec.angle,
            )?;
        }
        if let Some(caption) = &watermark {
            watermark::stamp(&mut img, caption, &watermark_font);
        }
        rendered.push(Frame {
            image: img,
            delay_ms: frame.delay_ms,
        });
    }

    Ok((rendered, font_sizes, degraded))
}
