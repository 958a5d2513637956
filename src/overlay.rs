//! # Hero Overlay
//!
//! The hero text that sits over the planet and dissolves as the page scrolls. It is painted
//! with `egui` onto a foreground layer after the 3D passes, and is not interactive.
//!
//! The scroll timeline drives three style values: opacity, blur radius and scale. `egui` has
//! no blur filter, so blur is approximated by painting faint copies of the text on a ring of
//! offsets around its real position; the wider the ring, the softer the text looks.

use crate::config::OverlayContent;

/// Animated style of the overlay.
///
/// # Fields
/// - `opacity`: `0` hides the overlay, `1` is fully opaque.
/// - `blur_px`: blur radius in logical pixels.
/// - `scale`: uniform scale around the overlay's center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub opacity: f32,
    pub blur_px: f32,
    pub scale: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            blur_px: 0.0,
            scale: 1.0,
        }
    }
}

impl OverlayStyle {
    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0 && self.scale > 0.0
    }
}

/// Number of copies painted around the text when blurred.
const GHOST_COUNT: usize = 8;

/// Offsets and alpha weights of the copies that make up one blurred glyph run.
///
/// Without blur this is a single copy at the origin with full weight. With blur, the center
/// copy and every ring copy share the alpha so the total coverage stays about the same.
pub fn ghost_offsets(blur_px: f32) -> Vec<(egui::Vec2, f32)> {
    if blur_px <= 0.5 {
        return vec![(egui::Vec2::ZERO, 1.0)];
    }

    let weight = 1.0 / (GHOST_COUNT + 1) as f32;
    let mut offsets = Vec::with_capacity(GHOST_COUNT + 1);
    offsets.push((egui::Vec2::ZERO, weight));
    for i in 0..GHOST_COUNT {
        let angle = i as f32 / GHOST_COUNT as f32 * std::f32::consts::TAU;
        offsets.push((egui::vec2(angle.cos(), angle.sin()) * blur_px * 0.5, weight));
    }
    offsets
}

/// Paints the overlay for this frame.
pub fn show(ctx: &egui::Context, style: &OverlayStyle, content: &OverlayContent) {
    if !style.is_visible() {
        return;
    }

    let screen = ctx.screen_rect();
    let painter = ctx.layer_painter(egui::LayerId::new(
        egui::Order::Foreground,
        egui::Id::new("hero_overlay"),
    ));

    let wrap_width = (screen.width() * 0.8).min(720.0) * style.scale;
    let lines = [
        (content.eyebrow.as_str(), 14.0, 0.75),
        (content.title.as_str(), 48.0, 1.0),
        (content.body.as_str(), 18.0, 0.85),
    ];

    // Lay out every line first so the block can be centered as a whole.
    let galleys: Vec<_> = lines
        .iter()
        .filter(|(text, _, _)| !text.is_empty())
        .map(|(text, size, alpha)| {
            let galley = painter.layout(
                text.to_string(),
                egui::FontId::proportional(size * style.scale),
                egui::Color32::WHITE,
                wrap_width,
            );
            (galley, *alpha)
        })
        .collect();

    let spacing = 16.0 * style.scale;
    let block_height: f32 = galleys.iter().map(|(galley, _)| galley.size().y).sum::<f32>()
        + spacing * galleys.len().saturating_sub(1) as f32;

    let mut y = screen.center().y - block_height * 0.5 - screen.height() * 0.15;
    let ghosts = ghost_offsets(style.blur_px);

    for (galley, alpha) in galleys {
        let origin = egui::pos2(screen.center().x - galley.size().x * 0.5, y);
        for (offset, weight) in &ghosts {
            let color = egui::Color32::WHITE.gamma_multiply(style.opacity * alpha * weight);
            painter.galley_with_override_text_color(origin + *offset, galley.clone(), color);
        }
        y += galley.size().y + spacing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sharp_text_is_painted_once() {
        assert_eq!(ghost_offsets(0.0), vec![(egui::Vec2::ZERO, 1.0)]);
    }

    #[test]
    fn blurred_text_spreads_its_alpha() {
        let ghosts = ghost_offsets(12.0);
        assert_eq!(ghosts.len(), GHOST_COUNT + 1);

        let total: f32 = ghosts.iter().map(|(_, weight)| weight).sum();
        assert!((total - 1.0).abs() < 1e-5);

        for (offset, _) in &ghosts[1..] {
            assert!((offset.length() - 6.0).abs() < 1e-4);
        }
    }

    #[test]
    fn invisible_styles_skip_painting() {
        let ctx = egui::Context::default();
        let style = OverlayStyle {
            opacity: 0.0,
            ..OverlayStyle::default()
        };
        assert!(!style.is_visible());

        let output = ctx.run(egui::RawInput::default(), |ctx| {
            show(ctx, &style, &OverlayContent::default());
        });
        assert!(output.shapes.is_empty());
    }

    #[test]
    fn visible_overlay_paints_shapes() {
        let ctx = egui::Context::default();
        let output = ctx.run(egui::RawInput::default(), |ctx| {
            show(ctx, &OverlayStyle::default(), &OverlayContent::default());
        });
        assert!(!output.shapes.is_empty());
    }
}
