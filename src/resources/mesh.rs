//! Sphere geometry

use crate::backend::traits::*;
use crate::backend::types::*;
use glam::{Vec2, Vec3};
use std::f32::consts::PI;

/// A mesh with vertex and index data
#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub name: String,
}

impl Mesh {
    pub fn new(name: &str) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            name: name.to_string(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get vertex data as bytes
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Get index data as bytes
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// UV sphere of radius 1 centered at the origin, counter-clockwise seen from outside.
    ///
    /// `segments` and `rings` are raised to the smallest values that still
    /// enclose a volume (3 and 2).
    pub fn sphere(segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let mut mesh = Mesh::new("sphere");

        let segment_angle = 2.0 * PI / segments as f32;
        let ring_angle = PI / rings as f32;

        for ring in 0..=rings {
            let phi = ring as f32 * ring_angle;
            let y = phi.cos();
            let ring_radius = phi.sin();

            for segment in 0..=segments {
                let theta = segment as f32 * segment_angle;
                let position = Vec3::new(ring_radius * theta.cos(), y, ring_radius * theta.sin());

                mesh.vertices.push(Vertex {
                    position,
                    normal: position.normalize_or_zero(),
                    uv: Vec2::new(
                        segment as f32 / segments as f32,
                        ring as f32 / rings as f32,
                    ),
                });
            }
        }

        for ring in 0..rings {
            for segment in 0..segments {
                let current = ring * (segments + 1) + segment;
                let below = current + segments + 1;

                mesh.indices.extend_from_slice(&[
                    current,
                    current + 1,
                    below,
                    current + 1,
                    below + 1,
                    below,
                ]);
            }
        }

        mesh
    }
}

/// Mesh buffers living on the GPU
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpuMesh {
    pub vertex_buffer: BufferHandle,
    pub index_buffer: BufferHandle,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn upload<B: GraphicsBackend + ?Sized>(backend: &mut B, mesh: &Mesh) -> BackendResult<Self> {
        let vertex_buffer = backend.create_buffer_init(
            &BufferDescriptor {
                label: Some(format!("{} vertices", mesh.name)),
                size: mesh.vertex_bytes().len() as u64,
                usage: BufferUsage::VERTEX,
            },
            mesh.vertex_bytes(),
        )?;

        let index_buffer = backend.create_buffer_init(
            &BufferDescriptor {
                label: Some(format!("{} indices", mesh.name)),
                size: mesh.index_bytes().len() as u64,
                usage: BufferUsage::INDEX,
            },
            mesh.index_bytes(),
        )?;

        log::debug!(
            "Uploaded mesh '{}': {} vertices, {} triangles",
            mesh.name,
            mesh.vertex_count(),
            mesh.triangle_count()
        );

        Ok(Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count() as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn sphere_counts() {
        let mesh = Mesh::sphere(8, 4);
        assert_eq!(mesh.vertex_count(), 9 * 5);
        assert_eq!(mesh.triangle_count(), 8 * 4 * 2);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertex_count()));
    }

    #[test]
    fn vertices_lie_on_unit_sphere() {
        for vertex in Mesh::sphere(16, 12).vertices {
            assert_abs_diff_eq!(vertex.position.length(), 1.0, epsilon = 1e-5);
            assert_abs_diff_eq!(vertex.normal.dot(vertex.position), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn triangles_face_outward() {
        let mesh = Mesh::sphere(16, 12);
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| mesh.vertices[i as usize].position);
            let normal = (b - a).cross(c - a);
            if normal.length() < 1e-6 {
                // Collapsed triangle at a pole.
                continue;
            }
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) > 0.0);
        }
    }

    #[test]
    fn degenerate_resolution_is_raised() {
        let mesh = Mesh::sphere(0, 0);
        assert_eq!(mesh.triangle_count(), 3 * 2 * 2);
    }
}
