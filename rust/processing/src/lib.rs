// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Anti-warping tab placement
//!
//! Plans tab positions around the base of scene objects, builds the tab
//! meshes and keeps host printer settings consistent with the tabs created.
//!
//! # Example
//!
//! ```
//! use antiwarp_processing::{FlatBed, MemoryHost, NodeKind, SceneObject, TabTool};
//! use antiwarp_geometry::Polygon2D;
//!
//! let mut host = MemoryHost::default();
//! let mut tool = TabTool::default();
//! let outline = Polygon2D::from_xz(&[[-20.0, -20.0], [20.0, -20.0], [20.0, 20.0], [-20.0, 20.0]]);
//! let scene = vec![SceneObject::empty(1, "part", NodeKind::Sliceable).with_hull_boundary(outline)];
//!
//! let report = tool.auto_place(&mut host, &scene, &FlatBed);
//! assert_eq!(report.tabs.len(), 4);
//! ```

pub mod adjustments;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod planner;
pub mod registry;
pub mod scene;

pub use adjustments::{
    ensure_support_enabled, reconcile_host_settings, HostSettings, MemoryHost, SettingAdjustment,
    SettingAdjustmentTracker, SettingValue,
};
pub use config::{BedSize, ExtruderProperties, TabPlacementSpec, TabSettings};
pub use error::{Error, PlacementRejection, Result};
pub use pipeline::{
    build_tab_mesh, build_tab_meshes, plan_auto_placement, resolve_contours, AutoPlaceReport,
    AutoPlacement, ContourSource, ObjectReport, ObjectStatus, SinglePlacement, SkipReason, TabTool,
};
pub use planner::{
    select_spacing, FlatBed, HeightQuery, PlacedPoint, PlacementResult, PlacementValidator,
    SkippedPoint, TabPlacementPlanner,
};
pub use registry::{TabKey, TabOverrides, TabRecord, TabRegistry};
pub use scene::{support_required, NodeFlags, NodeKind, SceneObject};
