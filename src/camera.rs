//! # Perspective Camera
//!
//! The single camera of the planet scene. It never rotates: it sits at `position` and looks
//! straight down −Z, so the view matrix is a pure translation. The scroll timeline moves the
//! position and the resize handler updates the aspect ratio.

use nalgebra_glm as glm;

use crate::config::CameraConfig;

/// A right-handed perspective camera with a 0..1 depth range (the `wgpu` convention).
///
/// # Fields
/// - `fov_degrees`: vertical field of view.
/// - `aspect`: viewport width over height.
/// - `near`, `far`: clip planes.
/// - `position`: eye position in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: glm::Vec3,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default(), 1.0)
    }
}

impl PerspectiveCamera {
    pub fn from_config(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            fov_degrees: config.fov_degrees,
            aspect,
            near: config.near,
            far: config.far,
            position: glm::Vec3::from(config.position),
        }
    }

    /// Sets the aspect ratio. Non-finite or non-positive values are ignored.
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    pub fn projection_matrix(&self) -> glm::Mat4 {
        glm::perspective_rh_zo(
            self.aspect,
            self.fov_degrees.to_radians(),
            self.near,
            self.far,
        )
    }

    pub fn view_matrix(&self) -> glm::Mat4 {
        glm::translation(&-self.position)
    }

    /// Projection times view, ready for the camera uniform.
    pub fn view_projection(&self) -> glm::Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_frame_the_planet() {
        let camera = PerspectiveCamera::default();
        assert_eq!(camera.fov_degrees, 15.0);
        assert_eq!(camera.near, 0.1);
        assert_eq!(camera.far, 10_000.0);
        assert_eq!(camera.position, glm::vec3(0.0, 0.1, 19.0));
    }

    #[test]
    fn invalid_aspect_is_ignored() {
        let mut camera = PerspectiveCamera::default();
        camera.set_aspect(1.5);
        camera.set_aspect(f32::NAN);
        camera.set_aspect(0.0);
        assert_eq!(camera.aspect, 1.5);
    }

    #[test]
    fn origin_projects_to_screen_center() {
        let mut camera = PerspectiveCamera::default();
        camera.position = glm::vec3(0.0, 0.0, 19.0);
        camera.set_aspect(16.0 / 9.0);

        let clip = camera.view_projection() * glm::vec4(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.xyz() / clip.w;
        assert!(ndc.x.abs() < 1e-6);
        assert!(ndc.y.abs() < 1e-6);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }
}
