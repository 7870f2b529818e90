//! Geometry node kinds (spec §4.7 "Geometry", §6.3 "Geometry").
//!
//! A generic mesh is tightly packed interleaved vertices — 9 floats each
//! (position xyz + pad w, texcoord uv, normal xyz) — plus a `u16` index
//! array and a primitive topology. `Quad`/`Triangle` derive their
//! [`MeshData`] on `init` from their constructor parameters; `Shape`/
//! `ShapePrimitive` take it directly as caller-supplied data.

use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Topology {
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

/// One interleaved vertex: position (xyz + pad w), texcoord (uv), normal (xyz).
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Vertex {
    pub position: [f32; 4],
    pub texcoord: [f32; 2],
    pub normal: [f32; 3],
}

#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
    pub topology: Topology,
}

#[derive(Debug, Clone)]
pub struct Quad {
    pub corner: [f32; 3],
    pub width: [f32; 3],
    pub height: [f32; 3],
    pub mesh: MeshData,
}

impl Quad {
    #[must_use]
    pub fn new(corner: [f32; 3], width: [f32; 3], height: [f32; 3]) -> Self {
        Self { corner, width, height, mesh: MeshData::default() }
    }

    /// Builds the four-vertex, six-index mesh covering
    /// `corner → corner+w → corner+h → corner+h+w` (spec §4.7).
    pub fn derive_mesh(&mut self) {
        let c = Vec3::from(self.corner);
        let w = Vec3::from(self.width);
        let h = Vec3::from(self.height);
        let normal = w.cross(h).normalize_or_zero();
        let corners = [c, c + w, c + h, c + h + w];
        let uvs = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let vertices = corners
            .iter()
            .zip(uvs)
            .map(|(p, uv)| Vertex {
                position: [p.x, p.y, p.z, 1.0],
                texcoord: uv,
                normal: normal.to_array(),
            })
            .collect();
        self.mesh = MeshData {
            vertices,
            indices: vec![0, 1, 2, 1, 3, 2],
            topology: Topology::Triangles,
        };
    }
}

#[derive(Debug, Clone)]
pub struct Triangle {
    pub e0: [f32; 3],
    pub e1: [f32; 3],
    pub e2: [f32; 3],
    pub uv0: [f32; 2],
    pub uv1: [f32; 2],
    pub uv2: [f32; 2],
    pub mesh: MeshData,
}

impl Triangle {
    #[must_use]
    pub fn new(e0: [f32; 3], e1: [f32; 3], e2: [f32; 3], uv0: [f32; 2], uv1: [f32; 2], uv2: [f32; 2]) -> Self {
        Self { e0, e1, e2, uv0, uv1, uv2, mesh: MeshData::default() }
    }

    /// Builds the three-vertex mesh with a computed face normal — the unit
    /// cross product of two edge vectors (spec §4.7).
    pub fn derive_mesh(&mut self) {
        let p0 = Vec3::from(self.e0);
        let p1 = Vec3::from(self.e1);
        let p2 = Vec3::from(self.e2);
        let normal = (p1 - p0).cross(p2 - p0).normalize_or_zero().to_array();
        let vertices = vec![
            Vertex { position: [p0.x, p0.y, p0.z, 1.0], texcoord: self.uv0, normal },
            Vertex { position: [p1.x, p1.y, p1.z, 1.0], texcoord: self.uv1, normal },
            Vertex { position: [p2.x, p2.y, p2.z, 1.0], texcoord: self.uv2, normal },
        ];
        self.mesh = MeshData { vertices, indices: vec![0, 1, 2], topology: Topology::Triangles };
    }
}

/// A single caller-supplied primitive: raw vertex/index arrays with an
/// explicit topology, used when neither `Quad` nor `Triangle` fits.
#[derive(Debug, Clone, Default)]
pub struct ShapePrimitive {
    pub mesh: MeshData,
}

/// A generic mesh assembled directly from caller data (e.g. loaded off-crate
/// and handed in already interleaved).
#[derive(Debug, Clone, Default)]
pub struct Shape {
    pub mesh: MeshData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_has_four_vertices_and_two_triangles() {
        let mut quad = Quad::new([-0.5, -0.5, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        quad.derive_mesh();
        assert_eq!(quad.mesh.vertices.len(), 4);
        assert_eq!(quad.mesh.indices.len(), 6);
        assert_eq!(quad.mesh.vertices[3].position, [0.5, 0.5, 0.0, 1.0]);
    }

    #[test]
    fn triangle_normal_is_unit_length() {
        let mut tri = Triangle::new([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0; 2], [0.0; 2], [0.0; 2]);
        tri.derive_mesh();
        let n = Vec3::from(tri.mesh.vertices[0].normal);
        assert!((n.length() - 1.0).abs() < 1e-6);
    }
}
