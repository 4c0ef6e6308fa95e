//! Raster surface for the OG image.

use tiny_skia::{
    Color, FillRule, GradientStop, LinearGradient, Paint, Pixmap, Point, Shader, SpreadMode,
    Stroke, Transform,
};

use crate::og::fonts::FontFace;
use crate::og::types::OgError;

/// Opaque color from `0xRRGGBB`.
pub fn rgb(hex: u32) -> Color {
    Color::from_rgba8((hex >> 16) as u8, (hex >> 8) as u8, hex as u8, 255)
}

/// Horizontal gradient spanning `[x, x + width]` with evenly spaced stops.
///
/// Degenerate spans fall back to the first color.
pub fn horizontal_gradient(x: f32, width: f32, colors: &[Color]) -> Shader<'static> {
    let fallback = colors.first().copied().unwrap_or(Color::BLACK);
    if colors.len() < 2 {
        return Shader::SolidColor(fallback);
    }

    let last = (colors.len() - 1) as f32;
    let stops = colors
        .iter()
        .enumerate()
        .map(|(i, c)| GradientStop::new(i as f32 / last, *c))
        .collect();

    LinearGradient::new(
        Point::from_xy(x, 0.0),
        Point::from_xy(x + width, 0.0),
        stops,
        SpreadMode::Pad,
        Transform::identity(),
    )
    .unwrap_or(Shader::SolidColor(fallback))
}

/// A fixed-size RGBA canvas drawn with anti-aliased paths.
pub struct Canvas {
    pixmap: Pixmap,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Result<Self, OgError> {
        Pixmap::new(width, height)
            .map(|pixmap| Self { pixmap })
            .ok_or(OgError::Canvas { width, height })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn fill(&mut self, color: Color) {
        self.pixmap.fill(color);
    }

    /// Fill `text` with its alphabetic baseline at (x, baseline).
    pub fn fill_text(
        &mut self,
        face: &FontFace,
        px: f32,
        text: &str,
        (x, baseline): (f32, f32),
        shader: Shader<'_>,
    ) {
        let Some(path) = face.text_path(text, px, x, baseline) else {
            return;
        };
        let paint = Paint {
            shader,
            anti_alias: true,
            ..Paint::default()
        };
        self.pixmap
            .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }

    /// Stroke the outline of `text` with its alphabetic baseline at (x, baseline).
    pub fn stroke_text(
        &mut self,
        face: &FontFace,
        px: f32,
        text: &str,
        (x, baseline): (f32, f32),
        color: Color,
        width: f32,
    ) {
        let Some(path) = face.text_path(text, px, x, baseline) else {
            return;
        };
        let paint = Paint {
            shader: Shader::SolidColor(color),
            anti_alias: true,
            ..Paint::default()
        };
        let stroke = Stroke {
            width,
            miter_limit: 10.0,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    /// Fill an axis-aligned rectangle.
    #[cfg(test)]
    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, shader: Shader<'_>) {
        let Some(rect) = tiny_skia::Rect::from_xywh(x, y, width, height) else {
            return;
        };
        let paint = Paint {
            shader,
            anti_alias: true,
            ..Paint::default()
        };
        self.pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    }

    /// Unpremultiplied RGBA of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, OgError> {
        self.pixmap
            .encode_png()
            .map_err(|e| OgError::Encode(e.to_string()))
    }
}
