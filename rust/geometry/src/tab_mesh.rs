// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Procedural tab meshes
//!
//! Tabs are built around the local origin in a Y-up frame and translated to
//! their placement point by the caller. Every triangle gets its own three
//! vertices, so the index buffer is always `[0, 1, 2, 3, 4, 5, ...]` and each
//! vertex carries its face's flat normal.
//!
//! The segment angle must divide 360 evenly; it is not validated. A
//! non-positive diameter or height yields degenerate (zero-area) triangles
//! with zero normals rather than an error.

use crate::mesh::Mesh;
use nalgebra::Point3;

/// Default angular step between ring samples, in degrees
pub const DEFAULT_SEGMENT_ANGLE: u32 = 10;

/// Wall inset of a dish, as a multiple of the printed line width
const DISH_WALL_FACTOR: f64 = 1.8;

/// Tab shape variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TabShape {
    #[default]
    Cylinder,
    Dish,
}

/// Flat cylinder tab
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CylinderParams {
    pub diameter: f64,
    /// Angular step in degrees
    pub segment_angle: u32,
    /// Vertical offset of the placement point; the tab bottom sits at `-start_y`
    pub start_y: f64,
    pub height: f64,
}

/// Flared dish tab
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DishParams {
    pub diameter: f64,
    /// Angular step in degrees
    pub segment_angle: u32,
    /// Vertical offset of the placement point; the tab bottom sits at `-start_y`
    pub start_y: f64,
    /// Height of the solid floor
    pub top_height: f64,
    pub line_width: f64,
    pub layer_count: u32,
}

/// Parameters for either tab variant
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TabGeometry {
    Cylinder(CylinderParams),
    Dish(DishParams),
}

impl TabGeometry {
    pub fn shape(&self) -> TabShape {
        match self {
            Self::Cylinder(_) => TabShape::Cylinder,
            Self::Dish(_) => TabShape::Dish,
        }
    }

    /// Generate the mesh
    pub fn build(&self) -> Mesh {
        match self {
            Self::Cylinder(params) => build_cylinder(params),
            Self::Dish(params) => build_dish(params),
        }
    }
}

/// Dish radii derived from the base radius
///
/// The cap flares out along a fixed 45° overhang over three floor heights,
/// independent of any printer overhang setting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DishRadii {
    pub base: f64,
    pub cap: f64,
    pub inner_cap: f64,
    pub inner_base: f64,
}

impl DishRadii {
    pub fn new(diameter: f64, top_height: f64, line_width: f64) -> Self {
        let base = diameter / 2.0;
        let cap = std::f64::consts::FRAC_PI_4.tan() * (top_height * 3.0) + base;
        let wall = DISH_WALL_FACTOR * line_width;

        Self {
            base,
            cap,
            inner_cap: cap - wall,
            inner_base: base - wall,
        }
    }
}

/// Number of ring samples for a segment angle
#[inline]
pub fn segment_count(segment_angle: u32) -> u32 {
    if segment_angle == 0 {
        0
    } else {
        360 / segment_angle
    }
}

/// Angular sampler for points on horizontal rings
struct Ring {
    step: f64,
}

impl Ring {
    fn new(segment_angle: u32) -> Self {
        Self {
            step: (segment_angle as f64).to_radians(),
        }
    }

    #[inline]
    fn at(&self, radius: f64, k: u32, y: f64) -> Point3<f64> {
        let angle = k as f64 * self.step;
        Point3::new(radius * angle.cos(), y, radius * angle.sin())
    }
}

/// Cylinder tab: 4 triangles per segment (top wedge, two wall triangles,
/// bottom wedge)
pub fn build_cylinder(params: &CylinderParams) -> Mesh {
    let segments = segment_count(params.segment_angle);
    let ring = Ring::new(params.segment_angle);
    let radius = params.diameter / 2.0;

    let max_y = -params.start_y + params.height;
    let min_y = -params.start_y;

    let vertex_count = segments as usize * 12;
    let mut mesh = Mesh::with_capacity(vertex_count, vertex_count);

    for i in 0..segments {
        let top_i = ring.at(radius, i, max_y);
        let top_j = ring.at(radius, i + 1, max_y);
        let bottom_i = ring.at(radius, i, min_y);
        let bottom_j = ring.at(radius, i + 1, min_y);

        mesh.add_flat_triangle(Point3::new(0.0, max_y, 0.0), top_j, top_i);
        mesh.add_flat_triangle(top_i, top_j, bottom_j);
        mesh.add_flat_triangle(bottom_j, bottom_i, top_i);
        mesh.add_flat_triangle(Point3::new(0.0, min_y, 0.0), bottom_i, bottom_j);
    }

    mesh
}

/// Dish tab: 8 triangles per segment (two cap-ring triangles, outer wall
/// pair, inner wall pair, inner floor wedge, bottom wedge)
///
/// The floor is `top_height` thick; the rim rises to twice that for
/// multi-layer tabs and three times that for single-layer tabs.
pub fn build_dish(params: &DishParams) -> Mesh {
    let segments = segment_count(params.segment_angle);
    let ring = Ring::new(params.segment_angle);
    let radii = DishRadii::new(params.diameter, params.top_height, params.line_width);

    let min_y = -params.start_y;
    let max_y = -params.start_y + params.top_height;
    let rim_factor = if params.layer_count > 1 { 2.0 } else { 3.0 };
    let cap_y = -params.start_y + params.top_height * rim_factor;

    let vertex_count = segments as usize * 24;
    let mut mesh = Mesh::with_capacity(vertex_count, vertex_count);

    for i in 0..segments {
        let j = i + 1;
        let cap_i = ring.at(radii.cap, i, cap_y);
        let cap_j = ring.at(radii.cap, j, cap_y);
        let inner_cap_i = ring.at(radii.inner_cap, i, cap_y);
        let inner_cap_j = ring.at(radii.inner_cap, j, cap_y);
        let base_i = ring.at(radii.base, i, min_y);
        let base_j = ring.at(radii.base, j, min_y);
        let inner_base_i = ring.at(radii.inner_base, i, max_y);
        let inner_base_j = ring.at(radii.inner_base, j, max_y);

        // Rim
        mesh.add_flat_triangle(inner_cap_i, cap_j, cap_i);
        mesh.add_flat_triangle(inner_cap_j, cap_j, inner_cap_i);

        // Outer wall
        mesh.add_flat_triangle(cap_i, cap_j, base_j);
        mesh.add_flat_triangle(base_j, base_i, cap_i);

        // Inner wall
        mesh.add_flat_triangle(inner_base_j, inner_cap_j, inner_cap_i);
        mesh.add_flat_triangle(inner_cap_i, inner_base_i, inner_base_j);

        // Floor top and bottom
        mesh.add_flat_triangle(Point3::new(0.0, max_y, 0.0), inner_base_j, inner_base_i);
        mesh.add_flat_triangle(Point3::new(0.0, min_y, 0.0), base_i, base_j);
    }

    mesh
}
