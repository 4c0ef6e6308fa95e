//! Font loading, measurement and glyph outlines.
//!
//! Sizes are CSS pixels per em, the unit a 2D canvas `font` string uses.
//! Outlines are emitted as `tiny_skia` paths so text can be filled with a
//! gradient and stroked like any other shape.

use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontVec, GlyphId, OutlineCurve, VariableFont};
use tiny_skia::{Path as SkPath, PathBuilder};

use crate::config::OgImageConfig;
use crate::og::types::OgError;

/// Weight applied to the variable display face.
pub const DISPLAY_WEIGHT: f32 = 900.0;

/// A single loaded font file.
pub struct FontFace {
    path: PathBuf,
    font: FontVec,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace").field("path", &self.path).finish()
    }
}

impl FontFace {
    /// Read and parse a font file.
    pub fn load(path: &Path) -> Result<Self, OgError> {
        let data = fs::read(path).map_err(|source| OgError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(path, data)
    }

    /// Parse font data; `path` is only used for diagnostics.
    pub fn from_bytes(path: &Path, data: Vec<u8>) -> Result<Self, OgError> {
        let font = FontVec::try_from_vec(data).map_err(|_| OgError::InvalidFont {
            path: path.to_path_buf(),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            font,
        })
    }

    /// Pin the `wght` axis. Static fonts ignore this.
    pub fn with_weight(mut self, weight: f32) -> Self {
        if !self.font.set_variation(b"wght", weight) {
            tracing::debug!(path = ?self.path, "Font has no wght axis");
        }
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn scale(&self, px: f32) -> f32 {
        px / self.font.units_per_em().unwrap_or(1000.0)
    }

    /// Distance from the baseline to the top of the em box.
    pub fn ascent(&self, px: f32) -> f32 {
        self.font.ascent_unscaled() * self.scale(px)
    }

    /// Advance width of `text` including kerning.
    pub fn measure(&self, text: &str, px: f32) -> f32 {
        let (_, advance) = self.layout(text);
        advance * self.scale(px)
    }

    /// Outline of `text` with its alphabetic baseline starting at (x, baseline).
    ///
    /// Returns `None` when the text has no visible glyphs.
    pub fn text_path(&self, text: &str, px: f32, x: f32, baseline: f32) -> Option<SkPath> {
        let scale = self.scale(px);
        let mut builder = PathBuilder::new();

        for (id, origin) in self.layout(text).0 {
            if let Some(outline) = self.font.outline(id) {
                append_outline(&mut builder, &outline.curves, |p| {
                    (x + (origin + p.x) * scale, baseline - p.y * scale)
                });
            }
        }

        builder.finish()
    }

    /// Glyphs with their pen origins, plus the total advance, in font units.
    fn layout(&self, text: &str) -> (Vec<(GlyphId, f32)>, f32) {
        let mut glyphs = Vec::with_capacity(text.len());
        let mut pen = 0.0;
        let mut previous: Option<GlyphId> = None;

        for c in text.chars() {
            let id = self.font.glyph_id(c);
            if let Some(prev) = previous {
                pen += self.font.kern_unscaled(prev, id);
            }
            glyphs.push((id, pen));
            pen += self.font.h_advance_unscaled(id);
            previous = Some(id);
        }
        (glyphs, pen)
    }
}

fn append_outline(
    builder: &mut PathBuilder,
    curves: &[OutlineCurve],
    to_canvas: impl Fn(ab_glyph::Point) -> (f32, f32),
) {
    let mut cursor: Option<(f32, f32)> = None;

    for curve in curves {
        let start = match curve {
            OutlineCurve::Line(p0, _)
            | OutlineCurve::Quad(p0, _, _)
            | OutlineCurve::Cubic(p0, _, _, _) => to_canvas(*p0),
        };
        if cursor != Some(start) {
            if cursor.is_some() {
                builder.close();
            }
            builder.move_to(start.0, start.1);
        }

        let end = match curve {
            OutlineCurve::Line(_, p1) => {
                let p1 = to_canvas(*p1);
                builder.line_to(p1.0, p1.1);
                p1
            }
            OutlineCurve::Quad(_, c, p2) => {
                let (c, p2) = (to_canvas(*c), to_canvas(*p2));
                builder.quad_to(c.0, c.1, p2.0, p2.1);
                p2
            }
            OutlineCurve::Cubic(_, c1, c2, p3) => {
                let (c1, c2, p3) = (to_canvas(*c1), to_canvas(*c2), to_canvas(*p3));
                builder.cubic_to(c1.0, c1.1, c2.0, c2.1, p3.0, p3.1);
                p3
            }
        };
        cursor = Some(end);
    }

    if cursor.is_some() {
        builder.close();
    }
}

/// The three faces the OG image registers.
#[derive(Debug)]
pub struct FontRegistry {
    /// Monospace face for the ASCII art.
    pub mono: FontFace,
    /// Thin display face. Registered with the others but not drawn.
    pub thin: FontFace,
    /// Variable display face, pinned to [`DISPLAY_WEIGHT`].
    pub display: FontFace,
}

impl FontRegistry {
    /// Load every face; the first missing or unparseable file aborts.
    pub fn load(root: &Path, config: &OgImageConfig) -> Result<Self, OgError> {
        let mono = FontFace::load(&root.join(&config.mono_font_path))?;
        let thin = FontFace::load(&root.join(&config.thin_font_path))?;
        let display_face =
            FontFace::load(&root.join(&config.display_font_path))?.with_weight(DISPLAY_WEIGHT);

        tracing::debug!(
            mono_font = ?mono.path(),
            thin_font = ?thin.path(),
            display_font = ?display_face.path(),
            "Fonts registered"
        );

        Ok(Self {
            mono,
            thin,
            display: display_face,
        })
    }
}
