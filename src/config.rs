//! # Configuration
//!
//! `PlanetConfig` gathers every tunable of the planet: asset locations, camera framing,
//! mesh parameters, lighting colors, the scroll timeline targets, ticker lag smoothing and
//! the hero overlay copy. Every section is `#[serde(default)]`, so a RON file only needs to
//! name the values it changes:
//!
//! ```ron
//! (
//!     earth: (rotation_step: 0.004),
//!     scroll: (breakpoint: 900.0),
//! )
//! ```
//!
//! On desktop the binary reads the file named by the `PLANET_CONFIG` environment variable.
//! On the web the defaults are used.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Top-level planet configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlanetConfig {
    /// CSS selector of the canvas the planet mounts on (web only).
    pub canvas_selector: String,
    /// CSS selector of the hero section whose scroll drives the timeline (web only).
    pub hero_selector: String,
    /// Texture locations.
    pub assets: AssetConfig,
    /// Initial camera framing.
    pub camera: CameraConfig,
    /// Earth and atmosphere meshes.
    pub earth: EarthConfig,
    /// Sun direction and atmosphere colors.
    pub lighting: LightingConfig,
    /// Scroll timeline.
    pub scroll: ScrollConfig,
    /// Frame ticker.
    pub ticker: TickerConfig,
    /// Hero overlay copy.
    pub overlay: OverlayContent,
}

impl Default for PlanetConfig {
    fn default() -> Self {
        Self {
            canvas_selector: "canvas.planet-3D".to_string(),
            hero_selector: "section.hero-main".to_string(),
            assets: AssetConfig::default(),
            camera: CameraConfig::default(),
            earth: EarthConfig::default(),
            lighting: LightingConfig::default(),
            scroll: ScrollConfig::default(),
            ticker: TickerConfig::default(),
            overlay: OverlayContent::default(),
        }
    }
}

impl PlanetConfig {
    /// Parses a configuration from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        ron::from_str(text).map_err(ConfigError::Parse)
    }

    /// Reads and parses a RON configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        Self::from_ron_str(&text)
    }
}

/// Texture asset locations, resolved against `root`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory (desktop) or URL prefix (web) the texture paths are relative to.
    pub root: String,
    /// Day albedo texture.
    pub day: String,
    /// Night emissive texture.
    pub night: String,
    /// Packed specular (R) + clouds (G) mask.
    pub specular_clouds: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        let root = concat!(env!("CARGO_MANIFEST_DIR"), "/public").to_string();
        #[cfg(target_arch = "wasm32")]
        let root = ".".to_string();

        Self {
            root,
            day: "earth/day.jpg".to_string(),
            night: "earth/night.jpg".to_string(),
            specular_clouds: "earth/specularClouds.jpg".to_string(),
        }
    }
}

impl AssetConfig {
    /// Joins `relative` onto the asset root with exactly one separator.
    pub fn resolve(&self, relative: &str) -> String {
        let root = self.root.trim_end_matches('/');
        let relative = relative.trim_start_matches("./").trim_start_matches('/');
        if root.is_empty() {
            relative.to_string()
        } else {
            format!("{root}/{relative}")
        }
    }
}

/// Perspective camera parameters.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Initial position in world space.
    pub position: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 15.0,
            near: 0.1,
            far: 10_000.0,
            position: [0.0, 0.1, 19.0],
        }
    }
}

/// Earth sphere and atmosphere shell parameters.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct EarthConfig {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
    /// Radians added to the Earth's Y rotation on every tick.
    pub rotation_step: f32,
    /// Uniform scale of the atmosphere shell relative to the Earth.
    pub atmosphere_scale: f32,
    /// Opacity multiplier of the atmosphere glow.
    pub atmosphere_opacity: f32,
}

impl Default for EarthConfig {
    fn default() -> Self {
        Self {
            radius: 2.0,
            width_segments: 64,
            height_segments: 64,
            rotation_step: 0.002,
            atmosphere_scale: 1.13,
            atmosphere_opacity: 1.0,
        }
    }
}

/// Sun placement and atmosphere colors.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LightingConfig {
    /// Polar angle of the sun, measured from +Y.
    pub sun_phi: f32,
    /// Azimuthal angle of the sun, measured around +Y from +Z.
    pub sun_theta: f32,
    /// Atmosphere color on the lit side, as `0xRRGGBB`.
    pub atmosphere_day_color: u32,
    /// Atmosphere color along the terminator, as `0xRRGGBB`.
    pub atmosphere_twilight_color: u32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            sun_phi: std::f32::consts::FRAC_PI_2,
            sun_theta: -std::f32::consts::FRAC_PI_2,
            atmosphere_day_color: 0x87ceeb,
            atmosphere_twilight_color: 0xff6b9d,
        }
    }
}

/// Scroll timeline targets.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScrollConfig {
    /// Viewports narrower than this (logical pixels) use the narrow camera target.
    pub breakpoint: f32,
    /// Length of the pinned scroll range, in viewport heights.
    pub pin_viewports: f32,
    /// Hold the hero section on screen while the range plays.
    pub pin: bool,
    /// Final camera position on wide layouts.
    pub wide_camera_target: [f32; 3],
    /// Final camera position on narrow layouts.
    pub narrow_camera_target: [f32; 3],
    /// Final overlay opacity.
    pub overlay_opacity: f32,
    /// Final overlay blur radius in logical pixels.
    pub overlay_blur: f32,
    /// Final overlay scale.
    pub overlay_scale: f32,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            breakpoint: 768.0,
            pin_viewports: 1.0,
            pin: true,
            wide_camera_target: [0.0, -1.2, 30.0],
            narrow_camera_target: [0.0, -0.6, 42.0],
            overlay_opacity: 0.0,
            overlay_blur: 12.0,
            overlay_scale: 0.85,
        }
    }
}

/// Ticker lag smoothing. A zero threshold disables smoothing, which is the default: every
/// tick then reports the real gap since the previous one.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TickerConfig {
    pub lag_threshold_ms: u64,
    pub adjusted_lag_ms: u64,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            lag_threshold_ms: 0,
            adjusted_lag_ms: 33,
        }
    }
}

/// Text shown over the planet in the hero section.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct OverlayContent {
    pub eyebrow: String,
    pub title: String,
    pub body: String,
}

impl Default for OverlayContent {
    fn default() -> Self {
        Self {
            eyebrow: "Interactive Experience".to_string(),
            title: "Welcome To The New World".to_string(),
            body: "A cinematic 3D planet, designed for teams building practical AI systems \
                   that improve business performance."
                .to_string(),
        }
    }
}

/// Converts `0xRRGGBB` into linear `[r, g, b]` components in `0..=1`.
///
/// Hex colors are sRGB-encoded. The shaders mix them with texture samples that the GPU has
/// already decoded to linear, so they are decoded here too.
pub fn rgb_from_hex(hex: u32) -> [f32; 3] {
    [hex >> 16, hex >> 8, hex].map(|channel| srgb_to_linear((channel & 0xff) as f32 / 255.0))
}

/// The sRGB transfer function, inverted.
pub fn srgb_to_linear(encoded: f32) -> f32 {
    if encoded <= 0.04045 {
        encoded / 12.92
    } else {
        ((encoded + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_ron_keeps_defaults() {
        let config = PlanetConfig::from_ron_str(
            "(earth: (rotation_step: 0.004), scroll: (breakpoint: 900.0))",
        )
        .unwrap();

        assert_eq!(config.earth.rotation_step, 0.004);
        assert_eq!(config.earth.radius, 2.0);
        assert_eq!(config.scroll.breakpoint, 900.0);
        assert_eq!(config.camera, CameraConfig::default());
        assert_eq!(config.canvas_selector, "canvas.planet-3D");
        assert_eq!(config.hero_selector, "section.hero-main");
        assert!(config.scroll.pin);
    }

    #[test]
    fn hex_colors_parse() {
        let config = PlanetConfig::from_ron_str("(lighting: (atmosphere_day_color: 0x00ff00))")
            .unwrap();
        assert_eq!(rgb_from_hex(config.lighting.atmosphere_day_color), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn srgb_decoding_darkens_midtones() {
        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert_eq!(srgb_to_linear(1.0), 1.0);
        assert!((srgb_to_linear(0.5) - 0.214).abs() < 1e-3);
        assert!((srgb_to_linear(0.02) - 0.02 / 12.92).abs() < 1e-7);
    }

    #[test]
    fn malformed_ron_is_a_parse_error() {
        let err = PlanetConfig::from_ron_str("(earth: (radius: \"big\"))").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = PlanetConfig::load(Path::new("/nonexistent/planet.ron")).unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
    }

    #[test]
    fn asset_paths_join_with_one_separator() {
        let assets = AssetConfig {
            root: "public/".to_string(),
            ..AssetConfig::default()
        };
        assert_eq!(assets.resolve("./earth/day.jpg"), "public/earth/day.jpg");
        assert_eq!(assets.resolve("/earth/day.jpg"), "public/earth/day.jpg");

        let bare = AssetConfig {
            root: String::new(),
            ..AssetConfig::default()
        };
        assert_eq!(bare.resolve("earth/day.jpg"), "earth/day.jpg");
    }
}
