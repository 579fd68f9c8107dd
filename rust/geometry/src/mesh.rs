// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh data structures

use crate::error::{Error, Result};
use nalgebra::{Point3, Vector3};

/// Triangle mesh with flat buffers, ready to hand to a host scene
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Vertex positions (x, y, z)
    pub positions: Vec<f32>,
    /// Vertex normals (nx, ny, nz)
    pub normals: Vec<f32>,
    /// Triangle indices (i0, i1, i2)
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Create a mesh with capacity
    pub fn with_capacity(vertex_count: usize, index_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count * 3),
            normals: Vec::with_capacity(vertex_count * 3),
            indices: Vec::with_capacity(index_count),
        }
    }

    /// Wrap host-supplied buffers.
    ///
    /// Without an index buffer the vertices are taken to be grouped in runs of
    /// three, one triangle per run. Normals are recomputed per face.
    pub fn from_buffers(positions: Vec<f32>, indices: Option<Vec<u32>>) -> Result<Self> {
        if positions.len() % 3 != 0 {
            return Err(Error::InvalidMesh(format!(
                "position buffer length {} is not a multiple of 3",
                positions.len()
            )));
        }
        let vertex_count = positions.len() / 3;

        let indices = match indices {
            Some(indices) => indices,
            None => {
                if vertex_count % 3 != 0 {
                    return Err(Error::InvalidMesh(format!(
                        "{} unindexed vertices do not form whole triangles",
                        vertex_count
                    )));
                }
                (0..vertex_count as u32).collect()
            }
        };

        if indices.len() % 3 != 0 {
            return Err(Error::InvalidMesh(format!(
                "index buffer length {} is not a multiple of 3",
                indices.len()
            )));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(Error::InvalidMesh(format!(
                "index {} out of range for {} vertices",
                bad, vertex_count
            )));
        }

        let mut mesh = Self {
            positions,
            normals: Vec::new(),
            indices,
        };
        calculate_normals(&mut mesh);
        Ok(mesh)
    }

    /// Add a vertex with normal
    #[inline]
    pub fn add_vertex(&mut self, position: Point3<f64>, normal: Vector3<f64>) {
        self.positions.push(position.x as f32);
        self.positions.push(position.y as f32);
        self.positions.push(position.z as f32);

        self.normals.push(normal.x as f32);
        self.normals.push(normal.y as f32);
        self.normals.push(normal.z as f32);
    }

    /// Add a triangle
    #[inline]
    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.indices.push(i0);
        self.indices.push(i1);
        self.indices.push(i2);
    }

    /// Add an unshared triangle: three fresh vertices carrying the face normal,
    /// indexed `[n, n + 1, n + 2]`
    #[inline]
    pub fn add_flat_triangle(&mut self, v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) {
        let normal = face_normal(&v0, &v1, &v2);
        let base = self.vertex_count() as u32;

        self.add_vertex(v0, normal);
        self.add_vertex(v1, normal);
        self.add_vertex(v2, normal);
        self.add_triangle(base, base + 1, base + 2);
    }

    /// Merge another mesh into this one
    #[inline]
    pub fn merge(&mut self, other: &Mesh) {
        if other.is_empty() {
            return;
        }

        let vertex_offset = (self.positions.len() / 3) as u32;

        self.positions.reserve(other.positions.len());
        self.normals.reserve(other.normals.len());
        self.indices.reserve(other.indices.len());

        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.indices
            .extend(other.indices.iter().map(|&i| i + vertex_offset));
    }

    /// Move every vertex by `offset`
    pub fn translate(&mut self, offset: Vector3<f64>) {
        for chunk in self.positions.chunks_exact_mut(3) {
            chunk[0] = (chunk[0] as f64 + offset.x) as f32;
            chunk[1] = (chunk[1] as f64 + offset.y) as f32;
            chunk[2] = (chunk[2] as f64 + offset.z) as f32;
        }
    }

    /// Get vertex count
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Get triangle count
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if mesh is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Vertex position in f64, `None` when out of range
    #[inline]
    pub fn vertex(&self, index: u32) -> Option<Point3<f64>> {
        let i = index as usize * 3;
        let chunk = self.positions.get(i..i + 3)?;
        Some(Point3::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64))
    }

    /// Iterate triangles as vertex triples. Triangles referencing missing
    /// vertices are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = [Point3<f64>; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(move |tri| {
            Some([self.vertex(tri[0])?, self.vertex(tri[1])?, self.vertex(tri[2])?])
        })
    }

    /// Calculate bounds (min, max)
    #[inline]
    pub fn bounds(&self) -> (Point3<f32>, Point3<f32>) {
        if self.is_empty() {
            return (Point3::origin(), Point3::origin());
        }

        let mut min = Point3::new(f32::MAX, f32::MAX, f32::MAX);
        let mut max = Point3::new(f32::MIN, f32::MIN, f32::MIN);

        self.positions.chunks_exact(3).for_each(|chunk| {
            let (x, y, z) = (chunk[0], chunk[1], chunk[2]);
            min.x = min.x.min(x);
            min.y = min.y.min(y);
            min.z = min.z.min(z);
            max.x = max.x.max(x);
            max.y = max.y.max(y);
            max.z = max.z.max(z);
        });

        (min, max)
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

/// Unit normal of a triangle from its winding; zero for degenerate faces
#[inline]
pub fn face_normal(v0: &Point3<f64>, v1: &Point3<f64>, v2: &Point3<f64>) -> Vector3<f64> {
    (v1 - v0)
        .cross(&(v2 - v0))
        .try_normalize(1e-12)
        .unwrap_or_else(Vector3::zeros)
}

/// Recompute smooth per-vertex normals from face windings
pub fn calculate_normals(mesh: &mut Mesh) {
    let vertex_count = mesh.vertex_count();
    let mut normals = vec![Vector3::<f64>::zeros(); vertex_count];

    for tri in mesh.indices.chunks_exact(3) {
        let (Some(v0), Some(v1), Some(v2)) = (mesh.vertex(tri[0]), mesh.vertex(tri[1]), mesh.vertex(tri[2])) else {
            continue;
        };

        // Area-weighted accumulation
        let normal = (v1 - v0).cross(&(v2 - v0));
        normals[tri[0] as usize] += normal;
        normals[tri[1] as usize] += normal;
        normals[tri[2] as usize] += normal;
    }

    mesh.normals.clear();
    mesh.normals.reserve(vertex_count * 3);
    for n in normals {
        let n = n.try_normalize(1e-12).unwrap_or_else(Vector3::zeros);
        mesh.normals.push(n.x as f32);
        mesh.normals.push(n.y as f32);
        mesh.normals.push(n.z as f32);
    }
}
