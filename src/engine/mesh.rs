use nalgebra::{Matrix4, Point3};
use thiserror::Error;

use crate::engine::bounds::Aabb;

/// Floats per vertex: position (3), color (3), texcoord (2).
pub const VERTEX_STRIDE: usize = 8;

/// Index buffers are `u16` (WebGL1 without extensions).
pub const MAX_VERTICES: usize = u16::MAX as usize + 1;

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("glTF import failed: {0}")]
    Import(#[from] gltf::Error),
    #[error("primitive in mesh {0} has no positions")]
    MissingPositions(usize),
    #[error("model has no geometry")]
    Empty,
    #[error("model needs {0} vertices, more than 16-bit indices can address")]
    TooManyVertices(usize),
}

pub struct Mesh {
    pub vertices: Vec<f32>,
    pub indices: Vec<u16>,
}

impl Mesh {
    pub fn cube(size: f32, r: f32, g: f32, b: f32) -> Self {
        let s = size / 2.0;
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        let mut add_face = |
            x1: f32, y1: f32, z1: f32,
            x2: f32, y2: f32, z2: f32,
            x3: f32, y3: f32, z3: f32,
            x4: f32, y4: f32, z4: f32,
            brightness: f32
        | {
            let base = (vertices.len() / VERTEX_STRIDE) as u16;
            let br = r * brightness;
            let bg = g * brightness;
            let bb = b * brightness;

            vertices.extend_from_slice(&[
                x1, y1, z1, br, bg, bb, 0.0, 0.0,
                x2, y2, z2, br, bg, bb, 1.0, 0.0,
                x3, y3, z3, br, bg, bb, 1.0, 1.0,
                x4, y4, z4, br, bg, bb, 0.0, 1.0,
            ]);

            indices.extend_from_slice(&[
                base, base + 1, base + 2,
                base, base + 2, base + 3,
            ]);
        };

        add_face(-s, -s, s, s, -s, s, s, s, s, -s, s, s, 0.9);
        add_face(s, -s, -s, -s, -s, -s, -s, s, -s, s, s, -s, 0.7);
        add_face(-s, s, s, s, s, s, s, s, -s, -s, s, -s, 1.1);
        add_face(-s, -s, -s, s, -s, -s, s, -s, s, -s, -s, s, 0.4);
        add_face(s, -s, s, s, -s, -s, s, s, -s, s, s, s, 0.8);
        add_face(-s, -s, -s, -s, -s, s, -s, s, s, -s, s, -s, 0.6);

        Mesh { vertices, indices }
    }

    /// Unit plane lying on XZ, facing up. Texture coordinates run to `repeat`
    /// so a wrapped texture tiles across it.
    pub fn plane(repeat_u: f32, repeat_v: f32) -> Self {
        let vertices = vec![
            -0.5, 0.0, 0.5, 1.0, 1.0, 1.0, 0.0, 0.0,
            0.5, 0.0, 0.5, 1.0, 1.0, 1.0, repeat_u, 0.0,
            0.5, 0.0, -0.5, 1.0, 1.0, 1.0, repeat_u, repeat_v,
            -0.5, 0.0, -0.5, 1.0, 1.0, 1.0, 0.0, repeat_v,
        ];
        let indices = vec![0, 1, 2, 0, 2, 3];
        Mesh { vertices, indices }
    }

    /// Flatten the default scene (or the first one) into a single mesh,
    /// baking each node's accumulated transform into its vertices.
    pub fn from_gltf(bytes: &[u8]) -> Result<Self, MeshError> {
        let (document, buffers, _) = gltf::import_slice(bytes)?;

        let mut mesh = Mesh { vertices: Vec::new(), indices: Vec::new() };
        match document.default_scene().or_else(|| document.scenes().next()) {
            Some(scene) => {
                for node in scene.nodes() {
                    mesh.append_node(&node, &Matrix4::identity(), &buffers)?;
                }
            }
            None => {
                for gltf_mesh in document.meshes() {
                    mesh.append_mesh(&gltf_mesh, &Matrix4::identity(), &buffers)?;
                }
            }
        }

        if mesh.vertices.is_empty() {
            return Err(MeshError::Empty);
        }
        Ok(mesh)
    }

    fn append_node(
        &mut self,
        node: &gltf::Node,
        parent: &Matrix4<f32>,
        buffers: &[gltf::buffer::Data],
    ) -> Result<(), MeshError> {
        let transform = parent * Matrix4::from(node.transform().matrix());
        if let Some(gltf_mesh) = node.mesh() {
            self.append_mesh(&gltf_mesh, &transform, buffers)?;
        }
        for child in node.children() {
            self.append_node(&child, &transform, buffers)?;
        }
        Ok(())
    }

    fn append_mesh(
        &mut self,
        gltf_mesh: &gltf::Mesh,
        transform: &Matrix4<f32>,
        buffers: &[gltf::buffer::Data],
    ) -> Result<(), MeshError> {
        for primitive in gltf_mesh.primitives() {
            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .ok_or(MeshError::MissingPositions(gltf_mesh.index()))?
                .collect();
            let colors: Vec<[f32; 3]> = if let Some(iter) = reader.read_colors(0) {
                iter.into_rgb_f32().collect()
            } else {
                vec![[1.0, 1.0, 1.0]; positions.len()]
            };
            let tex_coords: Vec<[f32; 2]> = if let Some(iter) = reader.read_tex_coords(0) {
                iter.into_f32().collect()
            } else {
                vec![[0.0, 0.0]; positions.len()]
            };

            let base_index = self.vertices.len() / VERTEX_STRIDE;
            let vertex_count = base_index + positions.len();
            if vertex_count > MAX_VERTICES {
                return Err(MeshError::TooManyVertices(vertex_count));
            }

            for ((pos, color), uv) in positions.iter().zip(colors.iter()).zip(tex_coords.iter()) {
                let p = transform.transform_point(&Point3::from(*pos));
                self.vertices.extend_from_slice(&[
                    p.x, p.y, p.z,
                    color[0], color[1], color[2],
                    uv[0], uv[1],
                ]);
            }

            if let Some(iter) = reader.read_indices() {
                for index in iter.into_u32() {
                    let index = base_index + index as usize;
                    let index = u16::try_from(index).map_err(|_| MeshError::TooManyVertices(index + 1))?;
                    self.indices.push(index);
                }
            }
        }
        Ok(())
    }

    /// Replace every vertex color, keeping positions and texcoords.
    pub fn tint(&mut self, r: f32, g: f32, b: f32) {
        for vertex in self.vertices.chunks_exact_mut(VERTEX_STRIDE) {
            vertex[3] = r;
            vertex[4] = g;
            vertex[5] = b;
        }
    }

    /// Local-space bounds of the mesh, or `None` if it has no vertices.
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(
            self.vertices
                .chunks_exact(VERTEX_STRIDE)
                .map(|v| Point3::new(v[0], v[1], v[2])),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_layout() {
        let cube = Mesh::cube(2.0, 1.0, 0.0, 0.0);
        assert_eq!(cube.vertices.len(), 24 * VERTEX_STRIDE);
        assert_eq!(cube.indices.len(), 36);
    }

    #[test]
    fn test_cube_bounds() {
        let bounds = Mesh::cube(2.0, 1.0, 1.0, 1.0).bounds().unwrap();
        assert_eq!(bounds.min, Point3::new(-1.0, -1.0, -1.0));
        assert_eq!(bounds.max, Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_tint_overwrites_colors() {
        let mut plane = Mesh::plane(10.0, 10.0);
        plane.tint(0.0, 0.4, 0.0);
        for v in plane.vertices.chunks_exact(VERTEX_STRIDE) {
            assert_eq!(&v[3..6], &[0.0, 0.4, 0.0]);
        }
    }

    #[test]
    fn test_invalid_gltf_is_an_error() {
        assert!(matches!(Mesh::from_gltf(b"not a model"), Err(MeshError::Import(_))));
    }

    fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
        let mut json = json.as_bytes().to_vec();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }
        let mut bin = bin.to_vec();
        while bin.len() % 4 != 0 {
            bin.push(0);
        }
        let total = 12 + 8 + json.len() + 8 + bin.len();
        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(b"glTF");
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(json.len() as u32).to_le_bytes());
        out.extend_from_slice(b"JSON");
        out.extend_from_slice(&json);
        out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        out.extend_from_slice(b"BIN\0");
        out.extend_from_slice(&bin);
        out
    }

    fn triangle_bin() -> Vec<u8> {
        [[-1.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
            .iter()
            .flatten()
            .flat_map(|f| f.to_le_bytes())
            .collect()
    }

    #[test]
    fn test_gltf_applies_node_transforms() {
        let json = r#"{
            "asset": {"version": "2.0"},
            "scene": 0,
            "scenes": [{"nodes": [0]}],
            "nodes": [
                {"translation": [0.0, 3.0, 0.0], "children": [1]},
                {"mesh": 0, "scale": [2.0, 2.0, 2.0]}
            ],
            "meshes": [{"primitives": [{"attributes": {"POSITION": 0}}]}],
            "buffers": [{"byteLength": 36}],
            "bufferViews": [{"buffer": 0, "byteOffset": 0, "byteLength": 36}],
            "accessors": [{
                "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                "min": [-1.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
            }]
        }"#;
        let mesh = Mesh::from_gltf(&glb(json, &triangle_bin())).unwrap();
        let bounds = mesh.bounds().unwrap();
        assert_eq!(bounds.min, Point3::new(-2.0, 3.0, 0.0));
        assert_eq!(bounds.max, Point3::new(2.0, 5.0, 0.0));
    }

    #[test]
    fn test_gltf_over_index_range_is_rejected() {
        let count = 70_000usize;
        let mut bin = vec![0u8; count * 12];
        for index in [0u32, 1, 69_999] {
            bin.extend_from_slice(&index.to_le_bytes());
        }
        let json = format!(
            r#"{{
                "asset": {{"version": "2.0"}},
                "scene": 0,
                "scenes": [{{"nodes": [0]}}],
                "nodes": [{{"mesh": 0}}],
                "meshes": [{{"primitives": [{{"attributes": {{"POSITION": 0}}, "indices": 1}}]}}],
                "buffers": [{{"byteLength": {total}}}],
                "bufferViews": [
                    {{"buffer": 0, "byteOffset": 0, "byteLength": {positions}}},
                    {{"buffer": 0, "byteOffset": {positions}, "byteLength": 12}}
                ],
                "accessors": [
                    {{"bufferView": 0, "componentType": 5126, "count": {count}, "type": "VEC3",
                      "min": [0.0, 0.0, 0.0], "max": [0.0, 0.0, 0.0]}},
                    {{"bufferView": 1, "componentType": 5125, "count": 3, "type": "SCALAR"}}
                ]
            }}"#,
            total = bin.len(),
            positions = count * 12,
            count = count,
        );
        assert!(matches!(
            Mesh::from_gltf(&glb(&json, &bin)),
            Err(MeshError::TooManyVertices(70_000))
        ));
    }
}
