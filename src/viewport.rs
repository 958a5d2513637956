//! # Viewport
//!
//! The size of the browser window (or desktop window) the planet fills, in logical
//! pixels, along with the device pixel ratio reported by the platform.

/// Device pixel ratios above this are clamped before sizing the drawing buffer.
pub const MAX_PIXEL_RATIO: f32 = 2.0;

/// Logical viewport size plus the device pixel ratio.
///
/// # Fields
/// - `width`, `height`: logical (CSS) pixels.
/// - `pixel_ratio`: physical pixels per logical pixel, as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub pixel_ratio: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1.0,
            height: 1.0,
            pixel_ratio: 1.0,
        }
    }
}

impl Viewport {
    pub fn new(width: f32, height: f32, pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            pixel_ratio,
        }
    }

    /// Builds a viewport from a physical size and the platform scale factor.
    pub fn from_physical(width: u32, height: u32, scale_factor: f64) -> Self {
        let scale = if scale_factor > 0.0 { scale_factor as f32 } else { 1.0 };
        Self {
            width: width as f32 / scale,
            height: height as f32 / scale,
            pixel_ratio: scale,
        }
    }

    /// Width over height. Falls back to `1.0` when either side is zero, negative or not
    /// finite, so the camera never receives an infinite or NaN aspect.
    pub fn aspect(&self) -> f32 {
        let valid = |side: f32| side.is_finite() && side > 0.0;
        if valid(self.width) && valid(self.height) {
            self.width / self.height
        } else {
            1.0
        }
    }

    /// The device pixel ratio clamped to [`MAX_PIXEL_RATIO`].
    pub fn effective_pixel_ratio(&self) -> f32 {
        self.pixel_ratio.clamp(f32::MIN_POSITIVE, MAX_PIXEL_RATIO)
    }

    /// Physical size of the drawing buffer: logical size times the clamped pixel ratio,
    /// never smaller than 1x1.
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        let ratio = self.effective_pixel_ratio();
        let width = (self.width * ratio).round().max(1.0) as u32;
        let height = (self.height * ratio).round().max(1.0) as u32;
        (width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_ratio_is_capped_at_two() {
        let viewport = Viewport::new(1280.0, 720.0, 3.0);
        assert_eq!(viewport.effective_pixel_ratio(), 2.0);
        assert_eq!(viewport.drawing_buffer_size(), (2560, 1440));

        let low = Viewport::new(1280.0, 720.0, 1.5);
        assert_eq!(low.effective_pixel_ratio(), 1.5);
        assert_eq!(low.drawing_buffer_size(), (1920, 1080));
    }

    #[test]
    fn aspect_survives_zero_height() {
        let viewport = Viewport::new(800.0, 0.0, 1.0);
        assert!(viewport.aspect().is_finite());
        assert_eq!(viewport.drawing_buffer_size(), (800, 1));
    }

    #[test]
    fn aspect_is_exact_below_one_pixel() {
        assert_eq!(Viewport::new(0.5, 1.0, 1.0).aspect(), 0.5);
        assert_eq!(Viewport::new(3.0, 0.25, 1.0).aspect(), 12.0);

        let tiny = Viewport::from_physical(1, 2, 2.0);
        assert_eq!(tiny.width, 0.5);
        assert_eq!(tiny.aspect(), 0.5);
        assert_eq!(tiny.drawing_buffer_size(), (1, 2));
    }

    #[test]
    fn aspect_falls_back_for_degenerate_sizes() {
        assert_eq!(Viewport::new(800.0, 0.0, 1.0).aspect(), 1.0);
        assert_eq!(Viewport::new(0.0, 600.0, 1.0).aspect(), 1.0);
        assert_eq!(Viewport::new(f32::NAN, 600.0, 1.0).aspect(), 1.0);
    }

    #[test]
    fn physical_size_converts_to_logical() {
        let viewport = Viewport::from_physical(2000, 1000, 2.0);
        assert_eq!(viewport.width, 1000.0);
        assert_eq!(viewport.height, 500.0);
        assert_eq!(viewport.pixel_ratio, 2.0);
        assert_eq!(viewport.aspect(), 2.0);
    }
}
