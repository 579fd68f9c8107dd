// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tab placement along a contour
//!
//! A single greedy forward pass over the boundary points: a point is taken
//! when it is at least `d_min` from the last taken point, and the last
//! boundary point must also clear `d_min` to the first boundary point unless
//! it coincides with it. Earlier choices are never revised, so the closing
//! stretch may end up with fewer tabs than it could hold.

use antiwarp_geometry::{Point2, Point3, Polygon2D};
use serde::{Deserialize, Serialize};

use crate::config::{BedSize, TabPlacementSpec};
use crate::error::PlacementRejection;

/// World height of the placement plane at an (x, z) position.
pub trait HeightQuery {
    fn height_at(&self, x: f64, z: f64) -> f64;
}

/// Every point sits on the build plate.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatBed;

impl HeightQuery for FlatBed {
    #[inline]
    fn height_at(&self, _x: f64, _z: f64) -> f64 {
        0.0
    }
}

impl<F> HeightQuery for F
where
    F: Fn(f64, f64) -> f64,
{
    #[inline]
    fn height_at(&self, x: f64, z: f64) -> f64 {
        self(x, z)
    }
}

/// Rejects tabs that would be off the bed or overhang its edge.
///
/// The bed is centred on the origin. All four edges are inset by the tab
/// radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementValidator {
    pub bed: BedSize,
    pub tab_radius: f64,
}

/// Inset edges a tab centre must stay within.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BedEdges {
    pub left: f64,
    pub right: f64,
    pub front: f64,
    pub rear: f64,
}

impl PlacementValidator {
    pub fn new(bed: BedSize, tab_radius: f64) -> Self {
        Self { bed, tab_radius }
    }

    pub fn edges(&self) -> BedEdges {
        let half_width = self.bed.width / 2.0;
        let half_depth = self.bed.depth / 2.0;
        BedEdges {
            left: -half_width + self.tab_radius,
            right: half_width - self.tab_radius,
            front: -half_depth + self.tab_radius,
            rear: half_depth - self.tab_radius,
        }
    }

    pub fn validate(&self, x: f64, z: f64) -> Result<(), PlacementRejection> {
        let half_width = self.bed.width / 2.0;
        let half_depth = self.bed.depth / 2.0;
        if x < -half_width || x > half_width || z < -half_depth || z > half_depth {
            return Err(PlacementRejection::OffBed);
        }

        let edges = self.edges();
        if x < edges.left || x > edges.right || z < edges.front || z > edges.rear {
            return Err(PlacementRejection::TooCloseToEdge);
        }
        Ok(())
    }
}

/// Indices of the boundary points chosen by the greedy spacing rule.
///
/// `accept` is consulted for every point passing the spacing rule; a point it
/// refuses is dropped and does not become the last placed point.
pub fn select_spacing_with<F>(boundary: &[Point2<f64>], min_spacing: f64, mut accept: F) -> Vec<usize>
where
    F: FnMut(usize, &Point2<f64>) -> bool,
{
    let Some(first) = boundary.first() else {
        return Vec::new();
    };
    let last_index = boundary.len() - 1;

    let mut selected = Vec::new();
    let mut last_placed: Option<Point2<f64>> = None;

    for (i, point) in boundary.iter().enumerate() {
        let gap = match last_placed {
            Some(last) => (point - last).norm(),
            None => min_spacing * 2.0,
        };
        let closing_gap = if i == last_index {
            (point - first).norm()
        } else {
            0.0
        };

        let spaced = gap >= min_spacing && (closing_gap == 0.0 || closing_gap >= min_spacing);
        if spaced && accept(i, point) {
            selected.push(i);
            last_placed = Some(*point);
        }
    }

    selected
}

/// [`select_spacing_with`] without a validity gate.
pub fn select_spacing(boundary: &[Point2<f64>], min_spacing: f64) -> Vec<usize> {
    select_spacing_with(boundary, min_spacing, |_, _| true)
}

/// An accepted tab position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacedPoint {
    pub position: Point3<f64>,
    /// Index of the contour within its object.
    pub contour: usize,
    /// Host id of the object the tab belongs to.
    pub object: u32,
}

/// A spaced boundary point refused by the validity predicate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkippedPoint {
    pub position: Point2<f64>,
    pub contour: usize,
    pub object: u32,
    pub reason: PlacementRejection,
}

/// Ordered placements from one or more contours.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacementResult {
    pub points: Vec<PlacedPoint>,
    pub skipped: Vec<SkippedPoint>,
}

impl PlacementResult {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn extend(&mut self, other: PlacementResult) {
        self.points.extend(other.points);
        self.skipped.extend(other.skipped);
    }
}

/// Greedy spacing plus bed validity for one placement pass.
#[derive(Debug, Clone, Copy)]
pub struct TabPlacementPlanner {
    pub min_spacing: f64,
    pub validator: PlacementValidator,
}

impl TabPlacementPlanner {
    pub fn new(min_spacing: f64, validator: PlacementValidator) -> Self {
        Self {
            min_spacing,
            validator,
        }
    }

    pub fn from_spec(spec: &TabPlacementSpec, bed: BedSize) -> Self {
        Self::new(spec.minimum_spacing(), PlacementValidator::new(bed, spec.radius()))
    }

    /// Place tabs along one boundary.
    pub fn plan_contour(
        &self,
        boundary: &Polygon2D,
        contour: usize,
        object: u32,
        height: &dyn HeightQuery,
    ) -> PlacementResult {
        let mut result = PlacementResult::default();

        let selected = select_spacing_with(&boundary.points, self.min_spacing, |_, point| {
            match self.validator.validate(point.x, point.y) {
                Ok(()) => true,
                Err(reason) => {
                    result.skipped.push(SkippedPoint {
                        position: *point,
                        contour,
                        object,
                        reason,
                    });
                    false
                }
            }
        });

        result.points = selected
            .into_iter()
            .map(|i| {
                let p = boundary.points[i];
                PlacedPoint {
                    position: Point3::new(p.x, height.height_at(p.x, p.y), p.y),
                    contour,
                    object,
                }
            })
            .collect();

        result
    }

    /// Place tabs along every boundary of one object, in order.
    pub fn plan(&self, boundaries: &[Polygon2D], object: u32, height: &dyn HeightQuery) -> PlacementResult {
        let mut result = PlacementResult::default();
        for (contour, boundary) in boundaries.iter().enumerate() {
            result.extend(self.plan_contour(boundary, contour, object, height));
        }
        result
    }
}
