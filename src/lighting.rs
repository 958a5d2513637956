//! # Shared Lighting
//!
//! The sun direction and the two atmosphere colors are read by both the Earth and the
//! Atmosphere materials. Instead of keeping two copies in sync, a single [`Lighting`] value
//! lives behind a [`SharedLighting`] handle and each material holds a clone of that handle.
//! Writing through one clone is visible through every other clone, and the renderer uploads
//! it into one GPU buffer that both pipelines bind.

use std::cell::RefCell;
use std::rc::Rc;

use nalgebra_glm as glm;

use crate::config::{rgb_from_hex, LightingConfig};
use crate::uniform_buffer::LightingUniform;

/// Lighting parameters shared by both planet materials.
#[derive(Debug, Clone, PartialEq)]
pub struct Lighting {
    /// Unit vector pointing from the planet towards the sun.
    pub sun_direction: glm::Vec3,
    pub atmosphere_day_color: glm::Vec3,
    pub atmosphere_twilight_color: glm::Vec3,
}

impl Lighting {
    pub fn from_config(config: &LightingConfig) -> Self {
        Self {
            sun_direction: sun_from_spherical(1.0, config.sun_phi, config.sun_theta),
            atmosphere_day_color: glm::Vec3::from(rgb_from_hex(config.atmosphere_day_color)),
            atmosphere_twilight_color: glm::Vec3::from(rgb_from_hex(
                config.atmosphere_twilight_color,
            )),
        }
    }
}

impl Default for Lighting {
    fn default() -> Self {
        Self::from_config(&LightingConfig::default())
    }
}

/// A cloneable handle to one [`Lighting`] value.
#[derive(Debug, Clone, Default)]
pub struct SharedLighting(Rc<RefCell<Lighting>>);

impl SharedLighting {
    pub fn new(lighting: Lighting) -> Self {
        Self(Rc::new(RefCell::new(lighting)))
    }

    /// Sets the sun direction. The vector is normalized; a zero vector is ignored.
    pub fn set_sun_direction(&self, direction: glm::Vec3) {
        if glm::length(&direction) > f32::EPSILON {
            self.0.borrow_mut().sun_direction = glm::normalize(&direction);
        }
    }

    pub fn set_atmosphere_colors(&self, day: glm::Vec3, twilight: glm::Vec3) {
        let mut lighting = self.0.borrow_mut();
        lighting.atmosphere_day_color = day;
        lighting.atmosphere_twilight_color = twilight;
    }

    pub fn sun_direction(&self) -> glm::Vec3 {
        self.0.borrow().sun_direction
    }

    pub fn get(&self) -> Lighting {
        self.0.borrow().clone()
    }

    /// The GPU representation of the current value.
    pub fn uniform(&self) -> LightingUniform {
        LightingUniform::from(&*self.0.borrow())
    }

    /// Whether both handles point at the same value.
    pub fn ptr_eq(&self, other: &SharedLighting) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Converts spherical coordinates into a cartesian vector.
///
/// `phi` is the polar angle measured from +Y and `theta` the azimuth around +Y measured
/// from +Z, the same convention three-dimensional web scenes use:
///
/// ```text
/// x = r · sin(phi) · sin(theta)
/// y = r · cos(phi)
/// z = r · sin(phi) · cos(theta)
/// ```
pub fn sun_from_spherical(radius: f32, phi: f32, theta: f32) -> glm::Vec3 {
    let sin_phi_radius = phi.sin() * radius;
    glm::vec3(
        sin_phi_radius * theta.sin(),
        phi.cos() * radius,
        sin_phi_radius * theta.cos(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sun_points_down_negative_x() {
        let sun = Lighting::default().sun_direction;
        assert!((sun - glm::vec3(-1.0, 0.0, 0.0)).norm() < 1e-6);
    }

    #[test]
    fn write_through_one_clone_is_seen_by_the_other() {
        let earth = SharedLighting::new(Lighting::default());
        let atmosphere = earth.clone();

        earth.set_sun_direction(glm::vec3(0.0, 0.0, 5.0));
        assert_eq!(atmosphere.sun_direction(), glm::vec3(0.0, 0.0, 1.0));
        assert!(earth.ptr_eq(&atmosphere));
        assert_eq!(earth.uniform(), atmosphere.uniform());
    }

    #[test]
    fn zero_sun_direction_is_ignored() {
        let lighting = SharedLighting::default();
        let before = lighting.sun_direction();
        lighting.set_sun_direction(glm::Vec3::zeros());
        assert_eq!(lighting.sun_direction(), before);
    }

    #[test]
    fn atmosphere_colors_come_from_hex() {
        use crate::config::srgb_to_linear;

        let lighting = Lighting::default();
        let linear = |r: f32, g: f32, b: f32| {
            glm::vec3(r, g, b).map(|channel| srgb_to_linear(channel / 255.0))
        };
        assert!((lighting.atmosphere_day_color - linear(135.0, 206.0, 235.0)).norm() < 1e-6);
        assert!((lighting.atmosphere_twilight_color - linear(255.0, 107.0, 157.0)).norm() < 1e-6);
        assert_eq!(lighting.atmosphere_twilight_color.x, 1.0);
    }
}
