//! # Vertex and Sphere Geometry
//!
//! Defines the [`Vertex`] layout shared by the Earth and Atmosphere pipelines, and
//! [`SphereGeometry`], the UV sphere both meshes are built from.
//!
//! ## Vertex Layout
//!
//! Each vertex carries three attributes, matching the `VertexInput` struct of both shaders:
//!
//! | Location | Field      | Format      |
//! |----------|------------|-------------|
//! | 0        | `position` | `Float32x3` |
//! | 1        | `normal`   | `Float32x3` |
//! | 2        | `uv`       | `Float32x2` |
//!
//! ## Sphere Construction
//!
//! The sphere is a grid of `(width_segments + 1) × (height_segments + 1)` vertices. Column
//! `ix` maps to the azimuth `phi = ix / width_segments · 2π` and row `iy` to the polar angle
//! `theta = iy / height_segments · π`, starting at the north pole. The seam column is
//! duplicated so the texture wraps without a visible stitch. The poles emit a single
//! triangle per quad instead of two, since the other one would be degenerate.
//!
//! Texture coordinates follow the `wgpu` convention (origin at the top-left), so row 0
//! samples the top of the equirectangular Earth maps.

/// One vertex of the planet meshes.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn vertex_attributes() -> Vec<wgpu::VertexAttribute> {
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2].to_vec()
    }

    /// Builds the vertex buffer layout for a pipeline from the given attributes.
    pub fn description(attributes: &[wgpu::VertexAttribute]) -> wgpu::VertexBufferLayout {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes,
        }
    }
}

/// Parameters of a UV sphere centered on the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereGeometry {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
}

impl Default for SphereGeometry {
    fn default() -> Self {
        Self {
            radius: 2.0,
            width_segments: 64,
            height_segments: 64,
        }
    }
}

/// Vertices and triangle indices of a built sphere.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl SphereGeometry {
    /// Creates sphere parameters, clamping segment counts to the minimum that still
    /// encloses a volume (3 around, 2 top to bottom).
    pub fn new(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        Self {
            radius,
            width_segments: width_segments.max(3),
            height_segments: height_segments.max(2),
        }
    }

    pub fn vertex_count(&self) -> usize {
        ((self.width_segments + 1) * (self.height_segments + 1)) as usize
    }

    /// Two triangles per quad, minus one per quad in each polar row.
    pub fn index_count(&self) -> usize {
        (6 * self.width_segments * (self.height_segments - 1)) as usize
    }

    pub fn build(&self) -> MeshData {
        let columns = self.width_segments;
        let rows = self.height_segments;

        let mut vertices = Vec::with_capacity(self.vertex_count());
        for iy in 0..=rows {
            let v = iy as f32 / rows as f32;
            let theta = v * std::f32::consts::PI;

            for ix in 0..=columns {
                let u = ix as f32 / columns as f32;
                let phi = u * std::f32::consts::TAU;

                let normal = [
                    -phi.cos() * theta.sin(),
                    theta.cos(),
                    phi.sin() * theta.sin(),
                ];
                vertices.push(Vertex {
                    position: normal.map(|n| n * self.radius),
                    normal,
                    uv: [u, v],
                });
            }
        }

        // Vertex index of grid cell (ix, iy).
        let at = |ix: u32, iy: u32| iy * (columns + 1) + ix;

        let mut indices = Vec::with_capacity(self.index_count());
        for iy in 0..rows {
            for ix in 0..columns {
                let a = at(ix + 1, iy);
                let b = at(ix, iy);
                let c = at(ix, iy + 1);
                let d = at(ix + 1, iy + 1);

                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != rows - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        MeshData { vertices, indices }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra_glm as glm;

    #[test]
    fn counts_match_the_grid() {
        let sphere = SphereGeometry::default();
        let mesh = sphere.build();
        assert_eq!(mesh.vertices.len(), 65 * 65);
        assert_eq!(mesh.indices.len(), sphere.index_count());
        assert_eq!(mesh.indices.len(), 6 * 64 * 63);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
    }

    #[test]
    fn vertices_lie_on_the_sphere() {
        let mesh = SphereGeometry::new(2.0, 16, 8).build();
        for vertex in &mesh.vertices {
            let position = glm::Vec3::from(vertex.position);
            let normal = glm::Vec3::from(vertex.normal);
            assert!((position.norm() - 2.0).abs() < 1e-5);
            assert!((normal.norm() - 1.0).abs() < 1e-5);
        }
        assert!((mesh.vertices[0].position[1] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn triangles_face_outwards() {
        let mesh = SphereGeometry::new(1.0, 12, 6).build();
        for triangle in mesh.indices.chunks(3) {
            let [a, b, c] = [0, 1, 2].map(|k| glm::Vec3::from(mesh.vertices[triangle[k] as usize].position));
            let face_normal = glm::cross(&(b - a), &(c - a));
            let centroid = (a + b + c) / 3.0;
            assert!(glm::dot(&face_normal, &centroid) > 0.0);
        }
    }

    #[test]
    fn segment_counts_are_clamped() {
        let sphere = SphereGeometry::new(1.0, 0, 0);
        assert_eq!(sphere.width_segments, 3);
        assert_eq!(sphere.height_segments, 2);
        assert_eq!(sphere.build().indices.len(), sphere.index_count());
    }
}
