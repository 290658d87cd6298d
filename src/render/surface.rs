//! Software drawing surface
//!
//! An RGBA pixel buffer with a translatable origin, the way a 2D canvas
//! context behaves. All draw calls take coordinates relative to the
//! current origin.

use image::imageops::{self, FilterType};
use image::{Pixel, Rgba, RgbaImage};

use super::projection::Point;

/// Colour used to outline sections when bounds drawing is enabled
pub const SECTION_BOUNDS_COLOR: Rgba<u8> = Rgba([0xff, 0x00, 0xf6, 0xff]);

/// An off-screen RGBA surface
#[derive(Clone)]
pub struct Surface {
    image: RgbaImage,
    /// Current origin translation in pixels
    origin: Point,
    /// Use bilinear filtering when scaling images
    smoothing: bool,
}

impl Surface {
    /// Create a transparent surface
    pub fn new(width: u32, height: u32, smoothing: bool) -> Self {
        Self {
            image: RgbaImage::new(width.max(1), height.max(1)),
            origin: Point::ZERO,
            smoothing,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn smoothing(&self) -> bool {
        self.smoothing
    }

    pub fn set_smoothing(&mut self, smoothing: bool) {
        self.smoothing = smoothing;
    }

    /// Current origin translation
    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Move the origin permanently
    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.origin.x += dx;
        self.origin.y += dy;
    }

    /// Run `f` with the origin moved by `(dx, dy)`, restoring it afterwards
    pub fn with_translation<R>(&mut self, dx: f32, dy: f32, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.origin;
        self.translate(dx, dy);
        let result = f(self);
        self.origin = saved;
        result
    }

    /// Reset every pixel to transparent
    pub fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    /// Blit `src` scaled to `width` x `height` with its top-left corner at
    /// `(x, y)` relative to the origin. Pixels are alpha-blended.
    pub fn draw_image(&mut self, src: &RgbaImage, x: f32, y: f32, width: f32, height: f32) {
        let w = width.round().max(1.0) as u32;
        let h = height.round().max(1.0) as u32;
        let px = (self.origin.x + x).round() as i64;
        let py = (self.origin.y + y).round() as i64;

        if src.dimensions() == (w, h) {
            imageops::overlay(&mut self.image, src, px, py);
        } else {
            let filter = if self.smoothing { FilterType::Triangle } else { FilterType::Nearest };
            let scaled = imageops::resize(src, w, h, filter);
            imageops::overlay(&mut self.image, &scaled, px, py);
        }
    }

    /// Fill an axis-aligned rectangle, blending with what is underneath
    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba<u8>) {
        let Some((x0, y0, x1, y1)) = self.clip_span(x, y, width, height) else {
            return;
        };

        for py in y0..y1 {
            for px in x0..x1 {
                self.image.get_pixel_mut(px, py).blend(&color);
            }
        }
    }

    /// Fill the diamond inscribed in the given rectangle
    pub fn fill_diamond(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba<u8>) {
        let Some((x0, y0, x1, y1)) = self.clip_span(x, y, width, height) else {
            return;
        };

        let cx = self.origin.x + x + width / 2.0;
        let cy = self.origin.y + y + height / 2.0;
        let half_w = width / 2.0;
        let half_h = height / 2.0;

        for py in y0..y1 {
            for px in x0..x1 {
                // Sample at pixel centre
                let dx = ((px as f32 + 0.5) - cx).abs() / half_w;
                let dy = ((py as f32 + 0.5) - cy).abs() / half_h;
                if dx + dy <= 1.0 {
                    self.image.get_pixel_mut(px, py).blend(&color);
                }
            }
        }
    }

    /// Outline a rectangle with a one pixel line
    pub fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba<u8>) {
        self.fill_rect(x, y, width, 1.0, color);
        self.fill_rect(x, y + height - 1.0, width, 1.0, color);
        self.fill_rect(x, y + 1.0, 1.0, height - 2.0, color);
        self.fill_rect(x + width - 1.0, y + 1.0, 1.0, height - 2.0, color);
    }

    /// Pixel at absolute image coordinates (origin is ignored)
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        if x < self.width() && y < self.height() {
            Some(*self.image.get_pixel(x, y))
        } else {
            None
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Translate a local rectangle to absolute pixel bounds clipped to the image.
    /// Returns `None` when nothing of it is on the surface.
    fn clip_span(&self, x: f32, y: f32, width: f32, height: f32) -> Option<(u32, u32, u32, u32)> {
        if width <= 0.0 || height <= 0.0 {
            return None;
        }

        let left = (self.origin.x + x).round() as i64;
        let top = (self.origin.y + y).round() as i64;
        let right = left + width.round() as i64;
        let bottom = top + height.round() as i64;

        let x0 = left.max(0);
        let y0 = top.max(0);
        let x1 = right.min(self.width() as i64);
        let y1 = bottom.min(self.height() as i64);

        if x0 >= x1 || y0 >= y1 {
            return None;
        }

        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    #[test]
    fn test_fill_rect_respects_origin() {
        let mut surface = Surface::new(8, 8, false);
        surface.translate(2.0, 3.0);
        surface.fill_rect(0.0, 0.0, 2.0, 2.0, RED);

        assert_eq!(surface.pixel(2, 3), Some(RED));
        assert_eq!(surface.pixel(3, 4), Some(RED));
        assert_eq!(surface.pixel(1, 3).map(|p| p[3]), Some(0));
        assert_eq!(surface.pixel(4, 3).map(|p| p[3]), Some(0));
    }

    #[test]
    fn test_with_translation_restores_origin() {
        let mut surface = Surface::new(4, 4, false);
        surface.translate(1.0, 1.0);
        surface.with_translation(5.0, -2.0, |s| {
            assert_eq!(s.origin(), Point::new(6.0, -1.0));
        });
        assert_eq!(surface.origin(), Point::new(1.0, 1.0));
    }

    #[test]
    fn test_fill_rect_clips_to_surface() {
        let mut surface = Surface::new(4, 4, false);
        surface.fill_rect(-10.0, -10.0, 12.0, 12.0, RED);
        assert_eq!(surface.pixel(0, 0), Some(RED));
        assert_eq!(surface.pixel(1, 1), Some(RED));
        assert_eq!(surface.pixel(2, 2).map(|p| p[3]), Some(0));

        // Entirely off-surface is a no-op
        surface.fill_rect(100.0, 100.0, 4.0, 4.0, RED);
    }

    #[test]
    fn test_draw_image_scales_to_target() {
        let src = RgbaImage::from_pixel(2, 2, RED);
        let mut surface = Surface::new(8, 8, false);
        surface.draw_image(&src, 0.0, 0.0, 4.0, 4.0);

        assert_eq!(surface.pixel(3, 3), Some(RED));
        assert_eq!(surface.pixel(4, 4).map(|p| p[3]), Some(0));
    }

    #[test]
    fn test_stroke_rect_leaves_interior() {
        let mut surface = Surface::new(6, 6, false);
        surface.stroke_rect(0.0, 0.0, 6.0, 6.0, SECTION_BOUNDS_COLOR);

        assert_eq!(surface.pixel(0, 0), Some(SECTION_BOUNDS_COLOR));
        assert_eq!(surface.pixel(5, 5), Some(SECTION_BOUNDS_COLOR));
        assert_eq!(surface.pixel(0, 3), Some(SECTION_BOUNDS_COLOR));
        assert_eq!(surface.pixel(3, 3).map(|p| p[3]), Some(0));
    }

    #[test]
    fn test_fill_diamond_skips_corners() {
        let mut surface = Surface::new(10, 10, false);
        surface.fill_diamond(0.0, 0.0, 10.0, 10.0, RED);

        assert_eq!(surface.pixel(5, 5), Some(RED));
        assert_eq!(surface.pixel(0, 0).map(|p| p[3]), Some(0));
        assert_eq!(surface.pixel(9, 9).map(|p| p[3]), Some(0));
    }
}
