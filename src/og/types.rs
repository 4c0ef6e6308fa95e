//! Error definitions for OG image generation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort an OG image run. None of them are retried.
#[derive(Debug, Error)]
pub enum OgError {
    /// An input or output file could not be read or written.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The asset has no `export const asciiArt = `...`;` literal.
    #[error("Could not extract ASCII art from {}", path.display())]
    AsciiArtNotFound { path: PathBuf },

    /// A font file is not a parseable TrueType/OpenType font.
    #[error("Invalid font file: {}", path.display())]
    InvalidFont { path: PathBuf },

    /// The raster surface could not be allocated.
    #[error("Cannot allocate a {width}x{height} canvas")]
    Canvas { width: u32, height: u32 },

    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    Encode(String),
}
