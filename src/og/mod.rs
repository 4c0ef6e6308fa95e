//! Build-time Open Graph image generation.
//!
//! # Data Flow
//! ```text
//! src/lib/ascii-art.ts ──▶ ascii.rs (extract literal, split lines)
//! static/fonts/*.ttf   ──▶ fonts.rs (FontRegistry)
//!                            │
//!                            ▼
//!                      layout.rs (positions) ──▶ canvas.rs (draw) ──▶ PNG
//! ```
//!
//! # Design Decisions
//! - Fail fast: a missing asset, font or unwritable output aborts the run
//! - Every color, size and position is a constant, so identical inputs
//!   produce byte-identical PNGs

pub mod ascii;
pub mod canvas;
pub mod fonts;
pub mod layout;
pub mod types;

use std::fs;
use std::path::{Path, PathBuf};

use tiny_skia::Color;

use crate::config::OgImageConfig;

pub use canvas::Canvas;
pub use fonts::{FontFace, FontRegistry};
pub use types::OgError;

/// Standard OG image size.
pub const WIDTH: u32 = 1200;
pub const HEIGHT: u32 = 630;

const ART_BLUE: u32 = 0x2d4a8a;
const ART_MAROON: u32 = 0x800020;

/// Text drawn on the left half of the image.
#[derive(Debug, Clone, Copy)]
struct LabelStyle {
    px: f32,
    color: u32,
    stroke_width: f32,
}

const TITLE: LabelStyle = LabelStyle {
    px: 110.0,
    color: 0x1a1a1a,
    stroke_width: 4.0,
};

const SUBTITLE: LabelStyle = LabelStyle {
    px: 48.0,
    color: 0x6b6b6b,
    stroke_width: 2.0,
};

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
}

/// Read the inputs under `root`, draw the image and write the PNG.
pub fn generate(config: &OgImageConfig, root: &Path) -> Result<GeneratedImage, OgError> {
    let art_path = root.join(&config.ascii_art_path);
    let source = fs::read_to_string(&art_path).map_err(|source| OgError::Io {
        path: art_path.clone(),
        source,
    })?;
    let art = ascii::extract_ascii_art(&source)
        .ok_or_else(|| OgError::AsciiArtNotFound { path: art_path.clone() })?;

    let fonts = FontRegistry::load(root, config)?;
    let png = render(art, &fonts, &config.title, &config.subtitle)?;

    let path = root.join(&config.output_path);
    fs::write(&path, &png).map_err(|source| OgError::Io {
        path: path.clone(),
        source,
    })?;

    Ok(GeneratedImage {
        path,
        width: WIDTH,
        height: HEIGHT,
        bytes: png.len(),
    })
}

/// Draw the image and return the encoded PNG.
pub fn render(
    art: &str,
    fonts: &FontRegistry,
    title: &str,
    subtitle: &str,
) -> Result<Vec<u8>, OgError> {
    let mut canvas = Canvas::new(WIDTH, HEIGHT)?;
    canvas.fill(Color::WHITE);

    draw_ascii_art(&mut canvas, &fonts.mono, art);

    let [title_at, subtitle_at] = layout::label_origins((WIDTH, HEIGHT));
    draw_label(&mut canvas, &fonts.display, title, title_at, TITLE);
    draw_label(&mut canvas, &fonts.display, subtitle, subtitle_at, SUBTITLE);

    canvas.encode_png()
}

fn draw_ascii_art(canvas: &mut Canvas, mono: &FontFace, art: &str) {
    let lines = ascii::art_lines(art);
    let block = layout::ascii_block(&lines, (canvas.width(), canvas.height()), |line| {
        mono.measure(line, layout::ASCII_FONT_PX)
    });

    let stops = [
        canvas::rgb(ART_BLUE),
        canvas::rgb(ART_MAROON),
        canvas::rgb(ART_BLUE),
    ];
    for line in &block {
        let shader = canvas::horizontal_gradient(line.x, line.width, &stops);
        canvas.fill_text(mono, layout::ASCII_FONT_PX, line.text, (line.x, line.baseline), shader);
    }

    tracing::debug!(lines = block.len(), "ASCII art drawn");
}

/// Top-aligned label, stroked then filled for extra weight.
fn draw_label(
    canvas: &mut Canvas,
    face: &FontFace,
    text: &str,
    (x, top): (f32, f32),
    style: LabelStyle,
) {
    let color = canvas::rgb(style.color);
    let baseline = top + face.ascent(style.px);

    canvas.stroke_text(face, style.px, text, (x, baseline), color, style.stroke_width);
    canvas.fill_text(face, style.px, text, (x, baseline), tiny_skia::Shader::SolidColor(color));
}
