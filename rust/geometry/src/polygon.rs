// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D polygon primitives for base footprints
//!
//! Footprints live in the horizontal world plane. A [`Point2`] stores the world
//! X coordinate in `x` and the world Z coordinate in `y`; the vertical world
//! axis (Y) is dropped when a contour is projected onto the bed.

use crate::error::{Error, Result};
use nalgebra::Point2;
use std::cmp::Ordering;

/// Default tolerance for polygon comparison (absolute and relative)
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Epsilon used to reject duplicate and collinear hull points
const EPSILON_2D: f64 = 1e-9;

/// Minimum area threshold - polygons smaller than this are considered degenerate
const MIN_AREA_THRESHOLD: f64 = 1e-10;

/// Ordered boundary of a footprint in the (x, z) plane
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon2D {
    pub points: Vec<Point2<f64>>,
}

impl Polygon2D {
    /// Create a polygon from its boundary points (no deduplication)
    pub fn new(points: Vec<Point2<f64>>) -> Self {
        Self { points }
    }

    /// Create a polygon from `[x, z]` pairs
    pub fn from_xz(coords: &[[f64; 2]]) -> Self {
        Self {
            points: coords.iter().map(|c| Point2::new(c[0], c[1])).collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// At least 3 points enclosing a non-zero area
    pub fn is_valid(&self) -> bool {
        self.points.len() >= 3 && self.signed_area().abs() > MIN_AREA_THRESHOLD
    }

    /// Signed area (shoelace). Positive = counter-clockwise
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }

        let mut area = 0.0;
        for i in 0..n {
            let j = (i + 1) % n;
            area += self.points[i].x * self.points[j].y;
            area -= self.points[j].x * self.points[i].y;
        }

        area * 0.5
    }

    /// Axis-aligned bounds (min, max)
    pub fn bounds(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        let first = *self.points.first()?;
        let mut min = first;
        let mut max = first;

        for p in self.points.iter().skip(1) {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }

        Some((min, max))
    }

    /// Order-independent comparison, see [`polygons_equal`]
    pub fn approx_eq(&self, other: &Polygon2D, tolerance: f64) -> bool {
        polygons_equal(Some(self), Some(other), tolerance)
    }
}

impl From<Vec<Point2<f64>>> for Polygon2D {
    fn from(points: Vec<Point2<f64>>) -> Self {
        Self::new(points)
    }
}

/// Convex hull of a 2D point set (Andrew's monotone chain)
///
/// The hull is returned counter-clockwise, starting at the lowest-x point, with
/// collinear boundary points removed.
///
/// # Errors
/// `InsufficientGeometry` when fewer than 3 distinct points are supplied or
/// all points are collinear.
pub fn convex_hull(points: &[Point2<f64>]) -> Result<Polygon2D> {
    let mut sorted: Vec<Point2<f64>> = points
        .iter()
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .copied()
        .collect();
    sorted.sort_by(lexicographic);
    sorted.dedup_by(|a, b| (*a - *b).norm() < EPSILON_2D);

    if sorted.len() < 3 {
        return Err(Error::InsufficientGeometry(format!(
            "convex hull needs at least 3 distinct points, got {}",
            sorted.len()
        )));
    }

    let mut lower: Vec<Point2<f64>> = Vec::with_capacity(sorted.len());
    for &p in &sorted {
        while lower.len() >= 2 && cross(&lower[lower.len() - 2], &lower[lower.len() - 1], &p) <= EPSILON_2D {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<Point2<f64>> = Vec::with_capacity(sorted.len());
    for &p in sorted.iter().rev() {
        while upper.len() >= 2 && cross(&upper[upper.len() - 2], &upper[upper.len() - 1], &p) <= EPSILON_2D {
            upper.pop();
        }
        upper.push(p);
    }

    // Last point of each chain is the first point of the other
    lower.pop();
    upper.pop();
    lower.extend(upper);

    if lower.len() < 3 {
        return Err(Error::InsufficientGeometry(
            "all points are collinear".to_string(),
        ));
    }

    Ok(Polygon2D::new(lower))
}

/// Convex hull of the union of both point sets
///
/// Used as a containment test: when `union_convex_hull(a, b)` equals `a`
/// within tolerance, every point of `b` lies inside `a`.
pub fn union_convex_hull(a: &Polygon2D, b: &Polygon2D) -> Result<Polygon2D> {
    let mut points = Vec::with_capacity(a.len() + b.len());
    points.extend_from_slice(&a.points);
    points.extend_from_slice(&b.points);
    convex_hull(&points)
}

/// Order-independent point-set comparison
///
/// The x and y coordinates of each polygon are sorted as independent columns
/// and compared elementwise with `|p - q| <= tolerance + tolerance * |q|`.
/// Vertices sharing a coordinate stay paired under sub-tolerance noise.
/// Different point counts are never equal; two absent polygons are equal.
pub fn polygons_equal(a: Option<&Polygon2D>, b: Option<&Polygon2D>, tolerance: f64) -> bool {
    let (a, b) = match (a, b) {
        (None, None) => return true,
        (Some(a), Some(b)) => (a, b),
        _ => return false,
    };

    if a.len() != b.len() {
        return false;
    }

    columns_close(a, b, |p| p.x, tolerance) && columns_close(a, b, |p| p.y, tolerance)
}

/// Compare one coordinate column of both polygons after sorting it
fn columns_close(
    a: &Polygon2D,
    b: &Polygon2D,
    coord: impl Fn(&Point2<f64>) -> f64,
    tolerance: f64,
) -> bool {
    let mut column_a: Vec<f64> = a.points.iter().map(&coord).collect();
    let mut column_b: Vec<f64> = b.points.iter().map(&coord).collect();
    column_a.sort_by(f64::total_cmp);
    column_b.sort_by(f64::total_cmp);

    column_a
        .iter()
        .zip(column_b.iter())
        .all(|(&p, &q)| is_close(p, q, tolerance))
}

#[inline]
fn is_close(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance + tolerance * b.abs()
}

#[inline]
fn lexicographic(a: &Point2<f64>, b: &Point2<f64>) -> Ordering {
    a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y))
}

/// Z component of (b - a) x (c - a); positive for a left turn
#[inline]
fn cross(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(half: f64) -> Polygon2D {
        Polygon2D::from_xz(&[[-half, -half], [half, -half], [half, half], [-half, half]])
    }

    fn circle(radius: f64, segments: usize) -> Polygon2D {
        let points = (0..segments)
            .map(|i| {
                let angle = 2.0 * std::f64::consts::PI * (i as f64) / (segments as f64);
                Point2::new(radius * angle.cos(), radius * angle.sin())
            })
            .collect();
        Polygon2D::new(points)
    }

    #[test]
    fn test_hull_drops_interior_points() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.5, 0.5), // Interior point
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];

        let hull = convex_hull(&points).unwrap();
        assert_eq!(hull.len(), 4);
        assert!(hull.signed_area() > 0.0, "hull should be counter-clockwise");
    }

    #[test]
    fn test_hull_drops_collinear_edge_points() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(5.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ];

        let hull = convex_hull(&points).unwrap();
        assert_eq!(hull.len(), 4);
        assert!((hull.signed_area() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_hull_rejects_degenerate_input() {
        let two = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)];
        assert!(matches!(convex_hull(&two), Err(Error::InsufficientGeometry(_))));

        let duplicates = vec![Point2::new(1.0, 1.0); 5];
        assert!(convex_hull(&duplicates).is_err());

        let collinear: Vec<_> = (0..6).map(|i| Point2::new(i as f64, 2.0 * i as f64)).collect();
        assert!(convex_hull(&collinear).is_err());
    }

    #[test]
    fn test_union_of_contained_square_is_outer() {
        let outer = square(10.0);
        let inner = square(2.0);

        let union = union_convex_hull(&outer, &inner).unwrap();
        assert!(union.approx_eq(&outer, DEFAULT_TOLERANCE));
        assert!(!union.approx_eq(&inner, DEFAULT_TOLERANCE));
    }

    #[test]
    fn test_union_of_contained_circle_is_outer() {
        let outer = circle(10.0, 32);
        let inner = circle(4.0, 24);

        let union = union_convex_hull(&inner, &outer).unwrap();
        assert!(union.approx_eq(&outer, DEFAULT_TOLERANCE));
    }

    #[test]
    fn test_union_of_overlapping_squares_matches_neither() {
        let a = square(5.0);
        let b = Polygon2D::from_xz(&[[3.0, -5.0], [13.0, -5.0], [13.0, 5.0], [3.0, 5.0]]);

        let union = union_convex_hull(&a, &b).unwrap();
        assert!(!union.approx_eq(&a, DEFAULT_TOLERANCE));
        assert!(!union.approx_eq(&b, DEFAULT_TOLERANCE));
        assert_eq!(union.len(), 4);
    }

    #[test]
    fn test_polygons_equal_ignores_point_order() {
        let a = square(3.0);
        let mut rotated = a.points.clone();
        rotated.rotate_left(2);
        rotated.reverse();
        let b = Polygon2D::new(rotated);

        assert!(polygons_equal(Some(&a), Some(&b), DEFAULT_TOLERANCE));
        assert!(polygons_equal(Some(&b), Some(&a), DEFAULT_TOLERANCE));
        assert!(polygons_equal(Some(&a), Some(&a), DEFAULT_TOLERANCE));
    }

    #[test]
    fn test_polygons_equal_tolerates_noise() {
        let a = square(3.0);
        let noisy = Polygon2D::new(
            a.points.iter().map(|p| Point2::new(p.x + 5e-7, p.y - 5e-7)).collect(),
        );
        assert!(a.approx_eq(&noisy, DEFAULT_TOLERANCE));

        let shifted = Polygon2D::new(a.points.iter().map(|p| Point2::new(p.x + 1e-3, p.y)).collect());
        assert!(!a.approx_eq(&shifted, DEFAULT_TOLERANCE));
    }

    #[test]
    fn test_polygons_equal_tolerates_per_vertex_noise() {
        let a = square(3.0);
        // Opposite nudges swap the sort order of the two vertices at x = -3
        let mut points = a.points.clone();
        points[0].x += 5e-7;
        points[3].x -= 5e-7;
        let noisy = Polygon2D::new(points);

        assert!(polygons_equal(Some(&a), Some(&noisy), DEFAULT_TOLERANCE));
        assert!(polygons_equal(Some(&noisy), Some(&a), DEFAULT_TOLERANCE));
    }

    #[test]
    fn test_polygons_equal_count_and_absence() {
        let a = square(1.0);
        let b = Polygon2D::new(a.points[..3].to_vec());

        assert!(!polygons_equal(Some(&a), Some(&b), DEFAULT_TOLERANCE));
        assert!(!polygons_equal(Some(&a), None, DEFAULT_TOLERANCE));
        assert!(polygons_equal(None, None, DEFAULT_TOLERANCE));
    }

    #[test]
    fn test_polygon_measures() {
        let sq = square(5.0);
        assert!(sq.is_valid());
        assert!((sq.signed_area() - 100.0).abs() < 1e-12);

        let (min, max) = sq.bounds().unwrap();
        assert_eq!(min, Point2::new(-5.0, -5.0));
        assert_eq!(max, Point2::new(5.0, 5.0));

        assert!(!Polygon2D::from_xz(&[[0.0, 0.0], [1.0, 1.0]]).is_valid());
        assert!(Polygon2D::default().bounds().is_none());
    }
}
