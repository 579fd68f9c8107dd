// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Nested contour removal
//!
//! A footprint wholly inside another footprint (an inner shell, or a body
//! standing inside a ring) would get its own ring of tabs buried under the
//! outer one. Only outermost contours are kept.

use crate::polygon::{union_convex_hull, Polygon2D, DEFAULT_TOLERANCE};

/// Removes contours contained in another contour
#[derive(Debug, Clone, Copy)]
pub struct ContourFilter {
    pub tolerance: f64,
}

impl Default for ContourFilter {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl ContourFilter {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Flags per input polygon: `true` when it is contained in another one.
    ///
    /// For each ordered pair (A, B) with neither already contained, the hull
    /// of A ∪ B is compared against both: equal to A means B is inside A,
    /// otherwise equal to B means A is inside B. Equal polygons therefore
    /// keep whichever comes first.
    pub fn containment(&self, polygons: &[Polygon2D]) -> Vec<bool> {
        let n = polygons.len();
        let mut contained = vec![false; n];

        for a in 0..n {
            for b in 0..n {
                if a == b || contained[a] || contained[b] {
                    continue;
                }

                let Ok(union) = union_convex_hull(&polygons[a], &polygons[b]) else {
                    continue;
                };

                if union.approx_eq(&polygons[a], self.tolerance) {
                    contained[b] = true;
                } else if union.approx_eq(&polygons[b], self.tolerance) {
                    contained[a] = true;
                    break;
                }
            }
        }

        contained
    }

    /// The outermost polygons, in input order
    pub fn filter(&self, polygons: Vec<Polygon2D>) -> Vec<Polygon2D> {
        if polygons.len() < 2 {
            return polygons;
        }

        let contained = self.containment(&polygons);
        polygons
            .into_iter()
            .zip(contained)
            .filter_map(|(polygon, inside)| (!inside).then_some(polygon))
            .collect()
    }
}
