//! # Uniform Buffers
//!
//! Plain-old-data structs that are copied byte-for-byte into GPU uniform buffers. Each one
//! mirrors a `struct` declared in the WGSL shaders, so field order and padding matter.
//!
//! ## Layout
//!
//! WGSL aligns `vec3<f32>` to 16 bytes. Rather than inserting manual padding fields, every
//! vector here is stored as `[f32; 4]` and the shaders read `.xyz`. Matrices are
//! `nalgebra_glm::Mat4`, which is column-major just like WGSL's `mat4x4<f32>`.
//!
//! | Struct            | Bind group | Read by                         |
//! |-------------------|------------|---------------------------------|
//! | [`CameraUniform`]   | 0          | both pipelines, vertex + fragment |
//! | [`LightingUniform`] | 1          | both pipelines, fragment        |
//! | [`MeshUniform`]     | 2          | one per mesh, vertex + fragment |
//!
//! All three derive `bytemuck::Pod` and `bytemuck::Zeroable` so they can be handed to
//! `Queue::write_buffer` through `bytemuck::cast_slice`.

use nalgebra_glm as glm;

use crate::camera::PerspectiveCamera;
use crate::lighting::Lighting;

/// Camera matrices and eye position.
///
/// # Fields
/// - `view_projection`: projection times view.
/// - `position`: eye position in `xyz`; `w` unused. The fragment stages use it to build the
///   view direction for the fresnel and specular terms.
#[repr(C)]
#[derive(Default, Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_projection: glm::Mat4,
    pub position: [f32; 4],
}

impl From<&PerspectiveCamera> for CameraUniform {
    fn from(camera: &PerspectiveCamera) -> Self {
        Self {
            view_projection: camera.view_projection(),
            position: [camera.position.x, camera.position.y, camera.position.z, 1.0],
        }
    }
}

/// Sun direction and atmosphere colors, shared by both pipelines.
#[repr(C)]
#[derive(Default, Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightingUniform {
    pub sun_direction: [f32; 4],
    pub atmosphere_day_color: [f32; 4],
    pub atmosphere_twilight_color: [f32; 4],
}

impl From<&Lighting> for LightingUniform {
    fn from(lighting: &Lighting) -> Self {
        let extend = |v: &glm::Vec3| [v.x, v.y, v.z, 0.0];
        Self {
            sun_direction: extend(&lighting.sun_direction),
            atmosphere_day_color: extend(&lighting.atmosphere_day_color),
            atmosphere_twilight_color: extend(&lighting.atmosphere_twilight_color),
        }
    }
}

/// Per-mesh model matrix and material parameters.
///
/// # Fields
/// - `model`: object-to-world transform (Y rotation and uniform scale).
/// - `params`: `x` is the material opacity; the rest is reserved.
#[repr(C)]
#[derive(Default, Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshUniform {
    pub model: glm::Mat4,
    pub params: [f32; 4],
}

impl MeshUniform {
    pub fn new(model: glm::Mat4, opacity: f32) -> Self {
        Self {
            model,
            params: [opacity, 0.0, 0.0, 0.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 80);
        assert_eq!(std::mem::size_of::<LightingUniform>(), 48);
        assert_eq!(std::mem::size_of::<MeshUniform>(), 80);
    }

    #[test]
    fn camera_uniform_carries_eye_position() {
        let camera = PerspectiveCamera::default();
        let uniform = CameraUniform::from(&camera);
        assert_eq!(uniform.position, [0.0, 0.1, 19.0, 1.0]);
        assert_eq!(uniform.view_projection, camera.view_projection());
    }
}
