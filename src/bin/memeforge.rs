use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;

use memeforge::{
    FontCatalog, Limits, OutputFormat, RenderRequest, TextSpec, TextStyle, decode_background,
    decode_overlay, render,
};

#[derive(Parser, Debug)]
#[command(name = "memeforge", version)]
struct Cli {
    /// Background template image (PNG/JPEG/GIF/WebP).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output path; format is taken from the extension.
    #[arg(long)]
    out: PathBuf,

    /// Caption for the top text box.
    #[arg(long)]
    top: Option<String>,

    /// Caption for the bottom text box.
    #[arg(long)]
    bottom: Option<String>,

    /// Overlay image composited at the center of the background.
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Watermark caption; omit to disable the band.
    #[arg(long)]
    watermark: Option<String>,

    /// Directory of extra .ttf/.otf fonts, keyed by file stem.
    #[arg(long)]
    font_dir: Option<PathBuf>,

    /// Font family for the captions (defaults to the bundled family).
    #[arg(long)]
    font: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let format = cli
        .out
        .extension()
        .and_then(|e| e.to_str())
        .and_then(OutputFormat::from_extension)
        .with_context(|| format!("unsupported output extension on '{}'", cli.out.display()))?;

    let catalog = FontCatalog::with_default();
    if let Some(dir) = &cli.font_dir {
        let count = catalog.register_dir(dir)?;
        eprintln!("registered {count} fonts from {}", dir.display());
    }

    let limits = Limits::default();
    let bytes = std::fs::read(&cli.in_path)
        .with_context(|| format!("read background '{}'", cli.in_path.display()))?;
    let background = decode_background(&bytes, &limits)?;

    let mut texts = Vec::new();
    if let Some(caption) = cli.top {
        let mut spec = TextSpec::boxed(0.05, 0.05, 0.9, 0.3);
        spec.style = TextStyle::Upper;
        spec.font_family = cli.font.clone();
        texts.push((spec, caption));
    }
    if let Some(caption) = cli.bottom {
        let mut spec = TextSpec::boxed(0.05, 0.65, 0.9, 0.3);
        spec.style = TextStyle::Upper;
        spec.font_family = cli.font.clone();
        texts.push((spec, caption));
    }

    let mut overlays = Vec::new();
    if let Some(path) = &cli.overlay {
        let overlay_bytes =
            std::fs::read(path).with_context(|| format!("read overlay '{}'", path.display()))?;
        let overlay = decode_overlay(&overlay_bytes, &limits)?;
        overlays.push((
            memeforge::OverlaySpec {
                center_x: 0.5,
                center_y: 0.5,
                angle: 0.0,
                scale: 1.0,
            },
            overlay,
        ));
    }

    let request = RenderRequest {
        background,
        texts,
        overlays,
        watermark: cli.watermark,
        format,
    };
    let output = render(request, &catalog, &limits)?;

    std::fs::write(&cli.out, &output.bytes)
        .with_context(|| format!("write output '{}'", cli.out.display()))?;
    eprintln!(
        "wrote {} bytes ({}) font sizes {:?}{}",
        output.bytes.len(),
        output.content_type,
        output.font_sizes,
        if output.degraded { " [degraded]" } else { "" }
    );
    Ok(())
}
