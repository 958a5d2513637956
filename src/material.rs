//! # Materials
//!
//! CPU-side description of how each planet mesh is shaded. A material does not own GPU
//! objects; the renderer reads it when building pipelines and uploading uniforms.

use crate::config::AssetConfig;
use crate::lighting::SharedLighting;

/// Which faces of a mesh are rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Front,
    Back,
}

impl Side {
    /// The `wgpu` cull mode that keeps only this side.
    pub fn cull_mode(self) -> wgpu::Face {
        match self {
            Side::Front => wgpu::Face::Back,
            Side::Back => wgpu::Face::Front,
        }
    }
}

/// Resolved texture locations for the Earth material.
#[derive(Debug, Clone, PartialEq)]
pub struct EarthTextures {
    pub day: String,
    pub night: String,
    pub specular_clouds: String,
}

impl EarthTextures {
    pub fn from_assets(assets: &AssetConfig) -> Self {
        Self {
            day: assets.resolve(&assets.day),
            night: assets.resolve(&assets.night),
            specular_clouds: assets.resolve(&assets.specular_clouds),
        }
    }
}

/// Day/night blending surface with clouds, specular highlights and a fresnel rim.
#[derive(Debug, Clone)]
pub struct EarthMaterial {
    pub lighting: SharedLighting,
    pub textures: EarthTextures,
}

/// Translucent glow drawn on the inside of a slightly larger shell.
#[derive(Debug, Clone)]
pub struct AtmosphereMaterial {
    pub lighting: SharedLighting,
    pub opacity: f32,
}

#[derive(Debug, Clone)]
pub enum Material {
    Earth(EarthMaterial),
    Atmosphere(AtmosphereMaterial),
}

impl Material {
    pub fn lighting(&self) -> &SharedLighting {
        match self {
            Material::Earth(earth) => &earth.lighting,
            Material::Atmosphere(atmosphere) => &atmosphere.lighting,
        }
    }

    pub fn side(&self) -> Side {
        match self {
            Material::Earth(_) => Side::Front,
            Material::Atmosphere(_) => Side::Back,
        }
    }

    /// Whether fragments write to the depth buffer.
    pub fn depth_write(&self) -> bool {
        matches!(self, Material::Earth(_))
    }

    pub fn opacity(&self) -> f32 {
        match self {
            Material::Earth(_) => 1.0,
            Material::Atmosphere(atmosphere) => atmosphere.opacity,
        }
    }
}
