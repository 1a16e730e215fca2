//! Comparison renderer: composes an anchor and its neighbors into one PNG

use image::{imageops, DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::core::fonts::{FontChain, TextRenderer};
use crate::error::{AppError, Result};
use crate::models::export::ComparisonEntry;
use crate::utils::is_safe_relative;

/// Layout and color settings of a comparison image.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    /// Edge length of each card.
    pub thumb_size: u32,
    /// Space around and between cards.
    pub padding: u32,
    /// Label font size in pixels.
    pub label_px: u32,
    /// Score font size in pixels.
    pub score_px: u32,
    /// Extra space below the score line.
    pub footer_gap: u32,
    /// Card corner radius.
    pub corner_radius: u32,
    /// Inset of the logo inside its card.
    pub logo_margin: u32,
    /// Canvas background.
    pub background: Rgba<u8>,
    /// Card fill.
    pub card: Rgba<u8>,
    /// Anchor label color.
    pub label_color: Rgba<u8>,
    /// Neighbor label and score color.
    pub accent_color: Rgba<u8>,
    /// Most cards one image may hold, anchor included.
    pub max_logos: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            thumb_size: 256,
            padding: 48,
            label_px: 32,
            score_px: 40,
            footer_gap: 20,
            corner_radius: 32,
            logo_margin: 16,
            background: Rgba([17, 17, 17, 255]),
            card: Rgba([255, 255, 255, 255]),
            label_color: Rgba([255, 255, 255, 255]),
            accent_color: Rgba([255, 92, 26, 255]),
            max_logos: 32,
        }
    }
}

impl RenderSettings {
    /// Canvas dimensions for `n` cards.
    ///
    /// # Errors
    ///
    /// [`AppError::InvalidInput`] if `n` exceeds `max_logos` or the size overflows `u32`.
    pub fn canvas_size(&self, n: usize) -> Result<(u32, u32)> {
        if n > self.max_logos {
            return Err(AppError::InvalidInput(format!(
                "{} logos requested, at most {} fit in one comparison",
                n, self.max_logos
            )));
        }
        let too_large = || AppError::InvalidInput(format!("comparison of {} logos is too large", n));
        let cards = u32::try_from(n).map_err(|_| too_large())?;

        let width = cards
            .checked_mul(self.thumb_size)
            .zip(cards.checked_add(1).and_then(|gaps| gaps.checked_mul(self.padding)))
            .and_then(|(thumbs, gaps)| thumbs.checked_add(gaps))
            .ok_or_else(too_large)?;
        let height = self
            .padding
            .checked_mul(3)
            .and_then(|h| h.checked_add(self.thumb_size))
            .and_then(|h| h.checked_add(self.label_px))
            .and_then(|h| h.checked_add(self.score_px))
            .and_then(|h| h.checked_add(self.footer_gap))
            .ok_or_else(too_large)?;
        Ok((width, height))
    }
}

/// Candidate directories for export images: the image root itself, then the
/// set A source directory, then the legacy `logos/` tree.
pub fn default_search_dirs(image_root: &Path) -> Vec<PathBuf> {
    vec![
        image_root.to_path_buf(),
        image_root.join("pngs_A_inkscape_512"),
        image_root.join("logos"),
    ]
}

/// Renders comparison images.
#[derive(Debug, Clone)]
pub struct ComparisonRenderer {
    settings: RenderSettings,
    search_dirs: Vec<PathBuf>,
    text: TextRenderer,
}

impl ComparisonRenderer {
    /// Renderer resolving images against `search_dirs` and text through `fonts`.
    pub fn new(settings: RenderSettings, search_dirs: Vec<PathBuf>, fonts: &FontChain) -> Self {
        Self {
            settings,
            search_dirs,
            text: fonts.resolve(),
        }
    }

    /// First existing candidate for `filename`.
    pub fn resolve_image(&self, filename: &str) -> Option<PathBuf> {
        if !is_safe_relative(filename) {
            return None;
        }
        self.search_dirs
            .iter()
            .map(|dir| dir.join(filename))
            .find(|path| path.is_file())
    }

    // Missing or undecodable images become a transparent placeholder.
    fn load_thumbnail(&self, filename: &str) -> RgbaImage {
        let size = self.settings.thumb_size;
        let Some(path) = self.resolve_image(filename) else {
            log::warn!("Logo file not found: {}", filename);
            return RgbaImage::new(size, size);
        };
        log::debug!("Logo {} resolved to {}", filename, path.display());
        match image::open(&path) {
            Ok(img) => imageops::resize(&img.to_rgba8(), size, size, imageops::FilterType::Lanczos3),
            Err(e) => {
                log::warn!("Failed to load image {}: {}", path.display(), e);
                RgbaImage::new(size, size)
            }
        }
    }

    /// Composes `entries` left to right onto a new canvas.
    ///
    /// # Errors
    ///
    /// Fails if the entries do not fit on one canvas (see [`RenderSettings::canvas_size`]).
    pub fn compose(&self, entries: &[ComparisonEntry]) -> Result<RgbaImage> {
        let s = &self.settings;
        let (width, height) = s.canvas_size(entries.len())?;
        let mut canvas = RgbaImage::from_pixel(width, height, s.background);

        let logo_box = s.thumb_size.saturating_sub(2 * s.logo_margin).max(1);
        for (i, entry) in entries.iter().enumerate() {
            let x = s.padding + i as u32 * (s.thumb_size + s.padding);
            let y = s.padding;

            draw_rounded_rect_mut(&mut canvas, x, y, s.thumb_size, s.corner_radius, s.card);

            let thumb = self.load_thumbnail(&entry.filename);
            let logo = imageops::resize(&thumb, logo_box, logo_box, imageops::FilterType::Lanczos3);
            imageops::overlay(
                &mut canvas,
                &logo,
                (x + s.logo_margin) as i64,
                (y + s.logo_margin) as i64,
            );

            let label_color = if entry.is_anchor() {
                s.label_color
            } else {
                s.accent_color
            };
            let label_y = y + s.thumb_size + 8;
            self.draw_centered(&mut canvas, &entry.label, x, label_y, s.label_px, label_color);

            if let Some(score) = entry.score {
                let text = format_score(score);
                let score_y = y + s.thumb_size + s.label_px + 18;
                self.draw_centered(&mut canvas, &text, x, score_y, s.score_px, s.accent_color);
            }
        }
        Ok(canvas)
    }

    fn draw_centered(&self, canvas: &mut RgbaImage, text: &str, card_x: u32, y: u32, px: u32, color: Rgba<u8>) {
        let (w, _) = self.text.measure(text, px as f32);
        let x = card_x as i32 + (self.settings.thumb_size as i32 - w as i32) / 2;
        self.text.draw(canvas, text, x, y as i32, px as f32, color);
    }

    /// Composes `entries` and encodes the result as PNG.
    ///
    /// # Errors
    ///
    /// Fails if there are too many entries or PNG encoding fails. Missing
    /// images and fonts never fail a render.
    pub fn render_png(&self, entries: &[ComparisonEntry]) -> Result<Vec<u8>> {
        let canvas = self.compose(entries)?;
        let rgb = DynamicImage::ImageRgba8(canvas).into_rgb8();
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(rgb).write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)?;
        Ok(buf)
    }
}

/// Score line drawn under a neighbor card.
pub fn format_score(score: f64) -> String {
    format!("SSIM: {:.3}", score)
}

fn draw_rounded_rect_mut(canvas: &mut RgbaImage, x: u32, y: u32, size: u32, radius: u32, color: Rgba<u8>) {
    let r = radius.min(size / 2);
    let (xi, yi, ri) = (x as i32, y as i32, r as i32);
    let far = size as i32 - 1 - ri;

    if size > 2 * r {
        draw_filled_rect_mut(canvas, Rect::at(xi + ri, yi).of_size(size - 2 * r, size), color);
        draw_filled_rect_mut(canvas, Rect::at(xi, yi + ri).of_size(size, size - 2 * r), color);
    }
    for (cx, cy) in [(ri, ri), (far, ri), (ri, far), (far, far)] {
        draw_filled_circle_mut(canvas, (xi + cx, yi + cy), ri, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer(dirs: Vec<PathBuf>) -> ComparisonRenderer {
        ComparisonRenderer::new(RenderSettings::default(), dirs, &FontChain::default())
    }

    #[test]
    fn test_canvas_size() {
        let s = RenderSettings::default();
        assert_eq!(s.canvas_size(1).unwrap(), (256 + 2 * 48, 256 + 3 * 48 + 32 + 40 + 20));
        assert_eq!(s.canvas_size(3).unwrap().0, 3 * 256 + 4 * 48);
        assert_eq!(s.canvas_size(s.max_logos).unwrap().0, 32 * 256 + 33 * 48);
    }

    #[test]
    fn test_canvas_size_rejects_too_many_logos() {
        let s = RenderSettings::default();
        assert!(matches!(s.canvas_size(s.max_logos + 1), Err(AppError::InvalidInput(_))));
        assert!(matches!(s.canvas_size(20_000_000), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_canvas_size_overflow_is_an_error() {
        let s = RenderSettings {
            thumb_size: u32::MAX / 2,
            max_logos: usize::MAX,
            ..RenderSettings::default()
        };
        assert!(matches!(s.canvas_size(3), Err(AppError::InvalidInput(_))));
        assert!(matches!(s.canvas_size(usize::MAX), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(0.812), "SSIM: 0.812");
        assert_eq!(format_score(1.0), "SSIM: 1.000");
    }

    #[test]
    fn test_rounded_card_corners_stay_background() {
        let s = RenderSettings::default();
        let image = renderer(vec![]).compose(&[ComparisonEntry::anchor("missing.png")]).unwrap();
        let (x, y) = (s.padding, s.padding);
        assert_eq!(*image.get_pixel(x, y), s.background);
        assert_eq!(*image.get_pixel(x + s.thumb_size / 2, y + s.thumb_size / 2), s.card);
        assert_eq!(*image.get_pixel(x + s.thumb_size / 2, y), s.card);
    }

    #[test]
    fn test_unsafe_names_do_not_resolve() {
        let r = renderer(vec![PathBuf::from(".")]);
        assert!(r.resolve_image("../secret.png").is_none());
        assert!(r.resolve_image("/etc/passwd").is_none());
    }

    #[test]
    fn test_render_png_encodes() {
        let bytes = renderer(vec![]).render_png(&[ComparisonEntry::anchor("x.png")]).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), 352);
    }
}
