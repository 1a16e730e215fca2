//! Font resolution for comparison labels
//!
//! Fonts are tried in order; the first one that loads wins. When none does,
//! text is drawn with a small built-in bitmap face so an export never fails
//! over a missing font.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use rusttype::{Font, Scale};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

/// Preferred label font, relative to the static directory.
pub const PREFERRED_FONT: &str = "fonts/NB-Architekt-R-Regular.otf";
/// System font tried when the preferred one is unavailable.
pub const FALLBACK_FONT: &str = "/Library/Fonts/Arial.ttf";

/// One way of obtaining a font.
#[derive(Debug, Clone, PartialEq)]
pub enum FontSource {
    /// TrueType/OpenType file on disk.
    File(PathBuf),
    /// Font data already in memory.
    Bytes(Vec<u8>),
}

impl FontSource {
    /// Loads and parses the font.
    pub fn load(&self) -> Result<Font<'static>> {
        let (data, origin) = match self {
            Self::File(path) => (std::fs::read(path)?, path.display().to_string()),
            Self::Bytes(data) => (data.clone(), "<memory>".to_string()),
        };
        Font::try_from_vec(data)
            .ok_or_else(|| AppError::Format(format!("unparsable font: {}", origin)))
    }
}

/// Ordered list of font sources ending in the built-in bitmap renderer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontChain {
    sources: Vec<FontSource>,
}

impl FontChain {
    /// Chain over `sources`, tried front to back.
    pub fn new(sources: Vec<FontSource>) -> Self {
        Self { sources }
    }

    /// The standard chain: the bundled font under `static_dir`, then the system fallback.
    pub fn standard(static_dir: &Path) -> Self {
        Self::new(vec![
            FontSource::File(static_dir.join(PREFERRED_FONT)),
            FontSource::File(PathBuf::from(FALLBACK_FONT)),
        ])
    }

    /// First loadable font, or [`TextRenderer::Plain`].
    pub fn resolve(&self) -> TextRenderer {
        for source in &self.sources {
            match source.load() {
                Ok(font) => {
                    log::debug!("Loaded font {:?}", source_name(source));
                    return TextRenderer::Styled(font);
                }
                Err(e) => log::warn!("Could not load font {}: {}", source_name(source), e),
            }
        }
        log::warn!("No font available, using built-in bitmap glyphs");
        TextRenderer::Plain
    }
}

fn source_name(source: &FontSource) -> String {
    match source {
        FontSource::File(path) => path.display().to_string(),
        FontSource::Bytes(data) => format!("<{} bytes>", data.len()),
    }
}

/// Draws text onto a canvas with whichever face was resolved.
#[derive(Clone)]
pub enum TextRenderer {
    /// Vector font rendering.
    Styled(Font<'static>),
    /// Built-in 5x7 bitmap glyphs.
    Plain,
}

impl fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Styled(_) => f.write_str("TextRenderer::Styled"),
            Self::Plain => f.write_str("TextRenderer::Plain"),
        }
    }
}

impl TextRenderer {
    /// Width and height of `text` at `px` pixels.
    pub fn measure(&self, text: &str, px: f32) -> (u32, u32) {
        match self {
            Self::Styled(font) => {
                let (w, h) = text_size(Scale::uniform(px), font, text);
                (w.max(0) as u32, h.max(0) as u32)
            }
            Self::Plain => {
                let cell = plain_cell(px);
                let chars = text.chars().count() as u32;
                let width = (chars * (GLYPH_WIDTH + 1) * cell).saturating_sub(cell);
                (width, GLYPH_HEIGHT * cell)
            }
        }
    }

    /// Draws `text` with its top-left corner at (`x`, `y`).
    pub fn draw(&self, canvas: &mut RgbaImage, text: &str, x: i32, y: i32, px: f32, color: Rgba<u8>) {
        match self {
            Self::Styled(font) => draw_text_mut(canvas, color, x, y, Scale::uniform(px), font, text),
            Self::Plain => {
                let cell = plain_cell(px);
                let advance = ((GLYPH_WIDTH + 1) * cell) as i32;
                for (i, c) in text.chars().enumerate() {
                    let gx = x + i as i32 * advance;
                    for (row, bits) in glyph(c).iter().enumerate() {
                        for col in 0..GLYPH_WIDTH {
                            if bits & (0x10 >> col) != 0 {
                                let rect = Rect::at(gx + (col * cell) as i32, y + (row as u32 * cell) as i32)
                                    .of_size(cell, cell);
                                draw_filled_rect_mut(canvas, rect, color);
                            }
                        }
                    }
                }
            }
        }
    }

    /// Whether a real font was loaded.
    pub fn is_styled(&self) -> bool {
        matches!(self, Self::Styled(_))
    }
}

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;

// Size of one bitmap dot so that glyphs roughly match a vector font of `px`.
fn plain_cell(px: f32) -> u32 {
    (px / 10.0).round().max(1.0) as u32
}

// Rows top to bottom, bit 4 is the leftmost column. Lowercase is drawn as uppercase.
fn glyph(c: char) -> [u8; 7] {
    match c.to_ascii_uppercase() {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        ' ' => [0x00; 7],
        _ => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fonts_fall_back_to_plain() {
        let chain = FontChain::new(vec![
            FontSource::File(PathBuf::from("/nonexistent/font.otf")),
            FontSource::Bytes(b"not a font".to_vec()),
        ]);
        assert!(!chain.resolve().is_styled());
        assert!(!FontChain::default().resolve().is_styled());
    }

    #[test]
    fn test_first_loadable_font_wins() {
        let chain = FontChain::new(vec![
            FontSource::File(PathBuf::from("/nonexistent/font.ttf")),
            FontSource::Bytes(include_bytes!("../../tests/fixtures/DejaVuSans.ttf").to_vec()),
        ]);
        let text = chain.resolve();
        assert!(text.is_styled());

        let (w, h) = text.measure("SSIM: 0.812", 40.0);
        assert!(w > 0 && h > 0);
        assert_ne!((w, h), TextRenderer::Plain.measure("SSIM: 0.812", 40.0));
    }

    #[test]
    fn test_plain_measure() {
        // 40px -> 4px dots; 3 glyphs of 6 dots minus trailing spacing.
        assert_eq!(TextRenderer::Plain.measure("0.8", 40.0), (68, 28));
        assert_eq!(TextRenderer::Plain.measure("", 40.0), (0, 28));
    }

    #[test]
    fn test_plain_draw_marks_pixels() {
        let mut canvas = RgbaImage::new(40, 20);
        let red = Rgba([255, 0, 0, 255]);
        TextRenderer::Plain.draw(&mut canvas, "I", 0, 0, 10.0, red);
        // Top row of 'I' covers columns 1..=3.
        assert_eq!(*canvas.get_pixel(1, 0), red);
        assert_eq!(*canvas.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_plain_draw_clips_outside_canvas() {
        let mut canvas = RgbaImage::new(4, 4);
        TextRenderer::Plain.draw(&mut canvas, "WIDE TEXT", -3, 2, 16.0, Rgba([1, 2, 3, 255]));
    }
}
