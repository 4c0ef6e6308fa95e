//! Geometry of the OG image. Pure arithmetic, no drawing.

/// Em size of the ASCII art, in pixels.
pub const ASCII_FONT_PX: f32 = 7.0;

/// Line advance as a multiple of the em size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.15;

/// Horizontal origin of the art block, as a fraction of canvas width.
pub const ASCII_ORIGIN_X: f32 = 0.55;

/// Left edge and top of the title, as fractions of the canvas.
pub const LABEL_ORIGIN: (f32, f32) = (0.08, 0.35);

/// Vertical offset of the subtitle below the title's top edge.
pub const SUBTITLE_OFFSET: f32 = 130.0;

/// One positioned line of ASCII art.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtLine<'a> {
    pub text: &'a str,
    pub x: f32,
    /// Alphabetic baseline.
    pub baseline: f32,
    /// Measured advance width; the gradient spans exactly this.
    pub width: f32,
}

/// Line advance of the ASCII art.
pub fn line_height() -> f32 {
    ASCII_FONT_PX * LINE_HEIGHT_FACTOR
}

/// Position each line so the block is vertically centred on the canvas.
pub fn ascii_block<'a>(
    lines: &[&'a str],
    (canvas_width, canvas_height): (u32, u32),
    measure: impl Fn(&str) -> f32,
) -> Vec<ArtLine<'a>> {
    let x = canvas_width as f32 * ASCII_ORIGIN_X;
    let start = canvas_height as f32 * 0.5 - (lines.len() as f32 * line_height()) / 2.0;

    lines
        .iter()
        .enumerate()
        .map(|(i, &text)| ArtLine {
            text,
            x,
            baseline: start + i as f32 * line_height(),
            width: measure(text),
        })
        .collect()
}

/// Top-left corner of the title and subtitle.
pub fn label_origins((canvas_width, canvas_height): (u32, u32)) -> [(f32, f32); 2] {
    let x = canvas_width as f32 * LABEL_ORIGIN.0;
    let y = canvas_height as f32 * LABEL_ORIGIN.1;
    [(x, y), (x, y + SUBTITLE_OFFSET)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_three_lines_are_centred() {
        let lines = ["###", "#", "#####"];
        let block = ascii_block(&lines, (1200, 630), |s| s.len() as f32 * 4.2);

        assert_eq!(block.len(), 3);
        assert!(block.iter().all(|l| close(l.x, 660.0)));
        // 315 - (3 * 8.05) / 2
        assert!(close(block[0].baseline, 302.925));
        assert!(close(block[1].baseline, 310.975));
        assert!(close(block[2].baseline, 319.025));
        assert!(close(block[2].width, 21.0));
    }

    #[test]
    fn test_empty_art_yields_no_lines() {
        assert!(ascii_block(&[], (1200, 630), |_| 0.0).is_empty());
    }

    #[test]
    fn test_label_origins() {
        let [title, subtitle] = label_origins((1200, 630));
        assert!(close(title.0, 96.0) && close(title.1, 220.5));
        assert!(close(subtitle.0, 96.0) && close(subtitle.1, 350.5));
    }
}
