// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Anti-warping tab geometry
//!
//! Base footprint extraction, nested contour filtering and procedural tab
//! meshes, using nalgebra for vector math.

pub mod contour;
pub mod error;
pub mod filter;
pub mod mesh;
pub mod polygon;
pub mod tab_mesh;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector2, Vector3};

pub use contour::{section_contours, BaseContourExtractor, DEFAULT_BASE_HEIGHT};
pub use error::{Error, Result};
pub use filter::ContourFilter;
pub use mesh::{calculate_normals, face_normal, Mesh};
pub use polygon::{convex_hull, polygons_equal, union_convex_hull, Polygon2D, DEFAULT_TOLERANCE};
pub use tab_mesh::{
    build_cylinder, build_dish, CylinderParams, DishParams, DishRadii, TabGeometry, TabShape,
    DEFAULT_SEGMENT_ANGLE,
};
