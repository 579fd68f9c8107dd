// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Base contour extraction
//!
//! Slices a triangle mesh with a horizontal plane just above its lowest point
//! and turns each closed cross-section loop into a convex footprint. Objects
//! made of several bodies produce one footprint per body touching the bed.
//!
//! The mesh does not need to be watertight. Open meshes produce open chains,
//! which are still hulled as long as they yield at least 3 points.

use crate::mesh::Mesh;
use crate::polygon::{convex_hull, Polygon2D};
use nalgebra::{Point2, Point3};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Default slice height above the lowest point of the mesh
pub const DEFAULT_BASE_HEIGHT: f64 = 0.2;

/// Default tolerance for welding segment endpoints
pub const DEFAULT_WELD_TOLERANCE: f64 = 1e-5;

/// Vertices closer than this to the plane count as lying on it
const PLANE_EPSILON: f64 = 1e-9;

/// Extracts convex base footprints from a mesh
#[derive(Debug, Clone, Copy)]
pub struct BaseContourExtractor {
    /// Slice height above the mesh minimum Y
    pub height: f64,
    /// Endpoint matching tolerance used when chaining segments
    pub tolerance: f64,
}

impl Default for BaseContourExtractor {
    fn default() -> Self {
        Self {
            height: DEFAULT_BASE_HEIGHT,
            tolerance: DEFAULT_WELD_TOLERANCE,
        }
    }
}

impl BaseContourExtractor {
    /// Extractor slicing `height` above the lowest vertex
    pub fn new(height: f64) -> Self {
        Self {
            height,
            ..Self::default()
        }
    }

    /// One convex hull per disjoint cross-section contour.
    ///
    /// Returns an empty list when the plane misses the mesh or no contour
    /// yields a valid hull; callers fall back to a coarser outline.
    pub fn extract(&self, mesh: &Mesh) -> Vec<Polygon2D> {
        let Some(plane_y) = self.plane_height(mesh) else {
            return Vec::new();
        };

        section_contours(mesh, plane_y, self.tolerance)
            .iter()
            .filter(|contour| contour.len() >= 3)
            .filter_map(|contour| convex_hull(contour).ok())
            .collect()
    }

    /// World Y of the cutting plane, `None` for an empty mesh
    pub fn plane_height(&self, mesh: &Mesh) -> Option<f64> {
        let min_y = mesh
            .positions
            .chunks_exact(3)
            .map(|chunk| chunk[1] as f64)
            .fold(None, |acc: Option<f64>, y| Some(acc.map_or(y, |m| m.min(y))))?;
        Some(min_y + self.height)
    }
}

/// Cross-section of a mesh at `plane_y`, as discrete contours projected to
/// the (x, z) plane.
///
/// Every triangle straddling the plane contributes one segment; segments are
/// chained by welding endpoints within `tolerance`. Faces lying in the plane
/// are gathered into a single extra contour; when there are any, triangles
/// touching the plane only along an edge add no segment.
pub fn section_contours(mesh: &Mesh, plane_y: f64, tolerance: f64) -> Vec<Vec<Point2<f64>>> {
    let mut welder = PointWelder::new(tolerance.max(f64::EPSILON));
    let mut segments: Vec<(usize, usize)> = Vec::new();
    let mut edge_segments: Vec<usize> = Vec::new();
    let mut planar_points: Vec<Point2<f64>> = Vec::new();

    for tri in mesh.triangles() {
        let d = [tri[0].y - plane_y, tri[1].y - plane_y, tri[2].y - plane_y];
        let on_plane = d.iter().filter(|v| v.abs() < PLANE_EPSILON).count();

        if on_plane == 3 {
            planar_points.extend(tri.iter().map(project));
            continue;
        }

        let crossings = triangle_crossings(&tri, &d);
        if crossings.len() != 2 {
            continue;
        }

        let a = welder.insert(crossings[0]);
        let b = welder.insert(crossings[1]);
        if a != b {
            if on_plane == 2 {
                edge_segments.push(segments.len());
            }
            segments.push((a, b));
        }
    }

    if planar_points.len() >= 3 {
        for &s in edge_segments.iter().rev() {
            segments.swap_remove(s);
        }
    }

    let mut contours: Vec<Vec<Point2<f64>>> = chain_segments(&segments, welder.points.len())
        .into_iter()
        .map(|chain| chain.into_iter().map(|i| welder.points[i]).collect())
        .collect();

    if planar_points.len() >= 3 {
        contours.push(planar_points);
    }

    contours
}

/// Drop the vertical axis
#[inline]
fn project(p: &Point3<f64>) -> Point2<f64> {
    Point2::new(p.x, p.z)
}

/// Points where the triangle's edges meet the plane (at most 3 before
/// deduplication, 2 for a straddling triangle)
fn triangle_crossings(tri: &[Point3<f64>; 3], d: &[f64; 3]) -> SmallVec<[Point2<f64>; 3]> {
    let mut crossings: SmallVec<[Point2<f64>; 3]> = SmallVec::new();

    let mut push = |p: Point2<f64>| {
        if !crossings.iter().any(|q| (q - p).norm() < PLANE_EPSILON) {
            crossings.push(p);
        }
    };

    for (i, j) in [(0usize, 1usize), (1, 2), (2, 0)] {
        let (a, b) = (&tri[i], &tri[j]);
        let (d_a, d_b) = (d[i], d[j]);

        if d_a.abs() < PLANE_EPSILON {
            push(project(a));
        }
        if d_a.abs() >= PLANE_EPSILON && d_b.abs() >= PLANE_EPSILON && d_a * d_b < 0.0 {
            let t = d_a / (d_a - d_b);
            push(project(&(a + (b - a) * t)));
        }
    }

    crossings
}

/// Walk segments into polylines. Each chain is extended forward from a seed
/// segment, then backward from the seed's start when it did not close.
fn chain_segments(segments: &[(usize, usize)], node_count: usize) -> Vec<Vec<usize>> {
    let mut incident: Vec<SmallVec<[usize; 2]>> = vec![SmallVec::new(); node_count];
    for (s, &(a, b)) in segments.iter().enumerate() {
        incident[a].push(s);
        incident[b].push(s);
    }

    let mut used = vec![false; segments.len()];
    let mut chains = Vec::new();

    for seed in 0..segments.len() {
        if used[seed] {
            continue;
        }
        used[seed] = true;
        let (start, next) = segments[seed];

        let mut forward = vec![start, next];
        walk(segments, &incident, &mut used, &mut forward);

        let closed = forward.len() > 2 && forward.first() == forward.last();
        if closed {
            forward.pop();
            chains.push(forward);
            continue;
        }

        let mut backward = vec![start];
        walk(segments, &incident, &mut used, &mut backward);
        backward.reverse();
        backward.pop();
        backward.extend(forward);
        chains.push(backward);
    }

    chains
}

/// Follow unused segments from the chain's tail until stuck or back at the head
fn walk(
    segments: &[(usize, usize)],
    incident: &[SmallVec<[usize; 2]>],
    used: &mut [bool],
    chain: &mut Vec<usize>,
) {
    loop {
        let Some(&tail) = chain.last() else {
            return;
        };
        if chain.len() > 2 && tail == chain[0] {
            return;
        }

        let Some(&s) = incident[tail].iter().find(|&&s| !used[s]) else {
            return;
        };
        used[s] = true;

        let (a, b) = segments[s];
        chain.push(if a == tail { b } else { a });
    }
}

/// Grid-hashed point welding: points within `tolerance` share an id
struct PointWelder {
    cell_size: f64,
    grid: FxHashMap<(i64, i64), SmallVec<[usize; 2]>>,
    points: Vec<Point2<f64>>,
}

impl PointWelder {
    fn new(tolerance: f64) -> Self {
        Self {
            cell_size: tolerance,
            grid: FxHashMap::default(),
            points: Vec::new(),
        }
    }

    fn insert(&mut self, p: Point2<f64>) -> usize {
        let (cx, cy) = self.cell_coords(&p);
        let tol_sq = self.cell_size * self.cell_size;

        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(ids) = self.grid.get(&(cx + dx, cy + dy)) {
                    if let Some(&id) = ids.iter().find(|&&id| (self.points[id] - p).norm_squared() <= tol_sq) {
                        return id;
                    }
                }
            }
        }

        let id = self.points.len();
        self.points.push(p);
        self.grid.entry((cx, cy)).or_default().push(id);
        id
    }

    #[inline]
    fn cell_coords(&self, p: &Point2<f64>) -> (i64, i64) {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Axis-aligned closed box, 12 triangles, outward winding
    pub(crate) fn box_mesh(min: [f64; 3], max: [f64; 3]) -> Mesh {
        let c = |x: usize, y: usize, z: usize| {
            Point3::new(
                if x == 0 { min[0] } else { max[0] },
                if y == 0 { min[1] } else { max[1] },
                if z == 0 { min[2] } else { max[2] },
            )
        };
        let quads = [
            [c(0, 0, 0), c(1, 0, 0), c(1, 0, 1), c(0, 0, 1)], // bottom
            [c(0, 1, 0), c(0, 1, 1), c(1, 1, 1), c(1, 1, 0)], // top
            [c(0, 0, 0), c(0, 1, 0), c(1, 1, 0), c(1, 0, 0)], // front
            [c(0, 0, 1), c(1, 0, 1), c(1, 1, 1), c(0, 1, 1)], // back
            [c(0, 0, 0), c(0, 0, 1), c(0, 1, 1), c(0, 1, 0)], // left
            [c(1, 0, 0), c(1, 1, 0), c(1, 1, 1), c(1, 0, 1)], // right
        ];

        let mut mesh = Mesh::new();
        for q in quads {
            mesh.add_flat_triangle(q[0], q[1], q[2]);
            mesh.add_flat_triangle(q[0], q[2], q[3]);
        }
        mesh
    }

    #[test]
    fn test_box_yields_single_rectangle() {
        let mesh = box_mesh([-10.0, 0.0, -5.0], [10.0, 8.0, 5.0]);
        let contours = BaseContourExtractor::default().extract(&mesh);

        assert_eq!(contours.len(), 1);
        let expected = Polygon2D::from_xz(&[[-10.0, -5.0], [10.0, -5.0], [10.0, 5.0], [-10.0, 5.0]]);
        assert!(contours[0].approx_eq(&expected, 1e-5));
    }

    #[test]
    fn test_two_bodies_yield_two_contours() {
        let mut mesh = box_mesh([-20.0, 0.0, -5.0], [-10.0, 4.0, 5.0]);
        mesh.merge(&box_mesh([10.0, 0.0, -5.0], [20.0, 4.0, 5.0]));

        let contours = BaseContourExtractor::default().extract(&mesh);
        assert_eq!(contours.len(), 2);
        for contour in &contours {
            assert_eq!(contour.len(), 4);
            assert!((contour.signed_area() - 100.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_slice_above_mesh_is_empty() {
        let mesh = box_mesh([0.0, 0.0, 0.0], [1.0, 0.1, 1.0]);
        assert!(BaseContourExtractor::new(0.2).extract(&mesh).is_empty());
        assert!(BaseContourExtractor::default().extract(&Mesh::new()).is_empty());
    }

    #[test]
    fn test_plane_through_face_is_one_contour() {
        let mesh = box_mesh([0.0, 0.0, 0.0], [4.0, 2.0, 3.0]);
        let contours = BaseContourExtractor::new(0.0).extract(&mesh);

        assert_eq!(contours.len(), 1);
        let expected = Polygon2D::from_xz(&[[0.0, 0.0], [4.0, 0.0], [4.0, 3.0], [0.0, 3.0]]);
        assert!(contours.iter().all(|c| c.approx_eq(&expected, 1e-5)));
    }

    #[test]
    fn test_open_mesh_still_produces_contour() {
        let full = box_mesh([0.0, 0.0, 0.0], [6.0, 2.0, 6.0]);
        // Drop the left wall: the section becomes an open chain
        let mut open = Mesh::new();
        for (i, tri) in full.triangles().enumerate() {
            if i != 8 && i != 9 {
                open.add_flat_triangle(tri[0], tri[1], tri[2]);
            }
        }

        let contours = section_contours(&open, 0.2, DEFAULT_WELD_TOLERANCE);
        assert_eq!(contours.len(), 1);
        assert!(contours[0].len() >= 4);

        let hulls = BaseContourExtractor::default().extract(&open);
        assert_eq!(hulls.len(), 1);
        assert!((hulls[0].signed_area() - 36.0).abs() < 1e-3);
    }

    #[test]
    fn test_welder_merges_close_points() {
        let mut welder = PointWelder::new(1e-5);
        let a = welder.insert(Point2::new(1.0, 1.0));
        let b = welder.insert(Point2::new(1.0 + 5e-6, 1.0));
        let c = welder.insert(Point2::new(1.1, 1.0));

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
