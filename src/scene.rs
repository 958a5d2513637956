//! # Scene Graph
//!
//! The planet scene holds one [`PerspectiveCamera`] and one [`Group`]
//! holding two meshes.
//!
//! - **Earth**: a UV sphere shaded by the [`EarthMaterial`]. It is the only object that moves;
//!   the render loop spins it around its Y axis.
//! - **Atmosphere**: the same sphere scaled up, rendered from the inside (back faces only)
//!   with the [`AtmosphereMaterial`] to produce a soft glow around the rim.
//!
//! Both materials hold clones of one [`SharedLighting`], so the sun direction set once at
//! build time is seen by both shaders.
//!
//! The scene graph is plain data. It holds no GPU handles, which is what lets the lifecycle
//! and timeline logic be exercised in tests without a device. The renderer reads it every
//! frame and uploads what it needs.
//!
//! ## Example
//!
//! ```rust
//! use planet_core::{PlanetConfig, Scene, Viewport};
//!
//! let config = PlanetConfig::default();
//! let mut scene = Scene::planet(&config, &Viewport::new(1280.0, 720.0, 1.0));
//! scene.rotate_earth(config.earth.rotation_step);
//! assert_eq!(scene.mesh_count(), 2);
//! ```

use nalgebra_glm as glm;

use crate::camera::PerspectiveCamera;
use crate::config::PlanetConfig;
use crate::lighting::{Lighting, SharedLighting};
use crate::material::{AtmosphereMaterial, EarthMaterial, EarthTextures, Material};
use crate::vertex::SphereGeometry;
use crate::viewport::Viewport;

/// Identifies what a mesh is, independent of its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshKind {
    Earth,
    Atmosphere,
}

/// A sphere with a material and a transform.
///
/// # Fields
/// - `rotation`: Euler angles in radians, applied in X, Y, Z order.
/// - `scale`: uniform scale.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,
    pub kind: MeshKind,
    pub geometry: SphereGeometry,
    pub material: Material,
    pub rotation: glm::Vec3,
    pub scale: f32,
}

impl Mesh {
    /// Object-to-world matrix: rotation followed by scale.
    pub fn model_matrix(&self) -> glm::Mat4 {
        let mut model = glm::Mat4::identity();
        model = glm::rotate_z(&model, self.rotation.z);
        model = glm::rotate_y(&model, self.rotation.y);
        model = glm::rotate_x(&model, self.rotation.x);
        glm::scale(&model, &glm::vec3(self.scale, self.scale, self.scale))
    }
}

/// An ordered collection of meshes. Draw order follows insertion order.
#[derive(Debug, Clone, Default)]
pub struct Group {
    pub meshes: Vec<Mesh>,
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub camera: PerspectiveCamera,
    pub group: Group,
}

impl Scene {
    /// Builds the Earth and its atmosphere for the given viewport.
    pub fn planet(config: &PlanetConfig, viewport: &Viewport) -> Self {
        let camera = PerspectiveCamera::from_config(&config.camera, viewport.aspect());
        let lighting = SharedLighting::new(Lighting::from_config(&config.lighting));
        let geometry = SphereGeometry::new(
            config.earth.radius,
            config.earth.width_segments,
            config.earth.height_segments,
        );

        let earth = Mesh {
            name: "earth".to_string(),
            kind: MeshKind::Earth,
            geometry,
            material: Material::Earth(EarthMaterial {
                lighting: lighting.clone(),
                textures: EarthTextures::from_assets(&config.assets),
            }),
            rotation: glm::Vec3::zeros(),
            scale: 1.0,
        };

        let atmosphere = Mesh {
            name: "atmosphere".to_string(),
            kind: MeshKind::Atmosphere,
            geometry,
            material: Material::Atmosphere(AtmosphereMaterial {
                lighting,
                opacity: config.earth.atmosphere_opacity,
            }),
            rotation: glm::Vec3::zeros(),
            scale: config.earth.atmosphere_scale,
        };

        Self {
            camera,
            group: Group {
                meshes: vec![earth, atmosphere],
            },
        }
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.group.meshes
    }

    pub fn mesh_count(&self) -> usize {
        self.group.meshes.len()
    }

    pub fn mesh(&self, kind: MeshKind) -> Option<&Mesh> {
        self.group.meshes.iter().find(|mesh| mesh.kind == kind)
    }

    pub fn earth(&self) -> Option<&Mesh> {
        self.mesh(MeshKind::Earth)
    }

    pub fn atmosphere(&self) -> Option<&Mesh> {
        self.mesh(MeshKind::Atmosphere)
    }

    /// The lighting handle shared by the materials, if the scene has any meshes.
    pub fn lighting(&self) -> Option<&SharedLighting> {
        self.group.meshes.first().map(|mesh| mesh.material.lighting())
    }

    /// Adds `step` radians to the Earth's Y rotation, wrapped into `[0, 2π)`.
    pub fn rotate_earth(&mut self, step: f32) {
        if let Some(earth) = self
            .group
            .meshes
            .iter_mut()
            .find(|mesh| mesh.kind == MeshKind::Earth)
        {
            earth.rotation.y = (earth.rotation.y + step).rem_euclid(std::f32::consts::TAU);
        }
    }
}
