// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Batch tab generation
//!
//! Auto placement runs per object: resolve the object's base contours (with
//! fallbacks to coarser outlines), space tabs along them, then build every
//! accepted tab's mesh. Contour resolution and mesh building are independent
//! per item and run on the rayon pool; spacing is sequential per contour.
//! A failing object, contour or point is reported and skipped without
//! aborting the batch.

use antiwarp_geometry::{
    convex_hull, BaseContourExtractor, ContourFilter, Mesh, Point2, Point3, Polygon2D,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::adjustments::{
    ensure_support_enabled, reconcile_host_settings, HostSettings, SettingAdjustment,
    SettingAdjustmentTracker,
};
use crate::config::{BedSize, ExtruderProperties, TabPlacementSpec, TabSettings};
use crate::error::{Error, Result};
use crate::planner::{HeightQuery, PlacedPoint, PlacementResult, SkippedPoint, TabPlacementPlanner};
use crate::registry::{TabKey, TabOverrides, TabRecord, TabRegistry};
use crate::scene::{NodeKind, SceneObject};

/// Where an object's placement contours came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContourSource {
    /// Outermost hulls of the slice just above the object's base.
    BaseSlice,
    /// The host's convex hull boundary of the object.
    HullBoundary,
    /// Convex hull of every mesh vertex.
    WholeMeshHull,
}

#[derive(Debug, Clone)]
pub struct ResolvedContours {
    pub source: ContourSource,
    pub contours: Vec<Polygon2D>,
}

/// Placement contours for one object.
///
/// Falls back from the filtered base slice to the host hull boundary, then to
/// the hull of the whole mesh. Fails only when all three are unusable.
pub fn resolve_contours(
    object: &SceneObject,
    extractor: &BaseContourExtractor,
    filter: &ContourFilter,
) -> Result<ResolvedContours> {
    let contours = filter.filter(extractor.extract(&object.mesh));
    if !contours.is_empty() {
        return Ok(ResolvedContours {
            source: ContourSource::BaseSlice,
            contours,
        });
    }

    if let Some(boundary) = object.hull_boundary.as_ref().filter(|b| b.is_valid()) {
        debug!(object = object.id, "Base slice empty, using hull boundary");
        return Ok(ResolvedContours {
            source: ContourSource::HullBoundary,
            contours: vec![boundary.clone()],
        });
    }

    debug!(object = object.id, "Base slice empty, using whole mesh hull");
    let hull = whole_mesh_hull(&object.mesh)?;
    Ok(ResolvedContours {
        source: ContourSource::WholeMeshHull,
        contours: vec![hull],
    })
}

/// Convex hull of all mesh vertices projected to the (x, z) plane.
pub fn whole_mesh_hull(mesh: &Mesh) -> Result<Polygon2D> {
    let points: Vec<Point2<f64>> = mesh
        .positions
        .chunks_exact(3)
        .map(|chunk| Point2::new(chunk[0] as f64, chunk[2] as f64))
        .collect();
    Ok(convex_hull(&points)?)
}

/// Why an object received no tabs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Support, infill, cutting and anti-overhang meshes never get tabs.
    Unsupported(NodeKind),
    /// No contour could be derived from the object.
    NoContour(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectStatus {
    Planned {
        source: ContourSource,
        contours: usize,
        placed: usize,
        rejected: usize,
    },
    Skipped(SkipReason),
}

/// Outcome of auto placement for one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectReport {
    pub object: u32,
    pub name: String,
    pub status: ObjectStatus,
}

/// Planned placements for a batch of objects.
#[derive(Debug, Clone, Default)]
pub struct AutoPlacement {
    pub result: PlacementResult,
    pub reports: Vec<ObjectReport>,
}

/// Plan tabs for every object, in input order.
pub fn plan_auto_placement(
    objects: &[SceneObject],
    spec: &TabPlacementSpec,
    bed: BedSize,
    height: &dyn HeightQuery,
) -> AutoPlacement {
    let extractor = BaseContourExtractor::default();
    let filter = ContourFilter::default();
    let planner = TabPlacementPlanner::from_spec(spec, bed);

    let resolved: Vec<Option<Result<ResolvedContours>>> = objects
        .par_iter()
        .map(|object| {
            object
                .kind
                .accepts_tabs()
                .then(|| resolve_contours(object, &extractor, &filter))
        })
        .collect();

    let mut placement = AutoPlacement::default();
    for (object, contours) in objects.iter().zip(resolved) {
        let status = match contours {
            None => ObjectStatus::Skipped(SkipReason::Unsupported(object.kind)),
            Some(Err(e)) => {
                warn!(
                    object = object.id,
                    name = %object.name,
                    error = %e,
                    "Object cannot be tabbed because it has no usable outline"
                );
                ObjectStatus::Skipped(SkipReason::NoContour(e.to_string()))
            }
            Some(Ok(resolved)) => {
                let planned = planner.plan(&resolved.contours, object.id, height);
                debug!(
                    object = object.id,
                    source = ?resolved.source,
                    contours = resolved.contours.len(),
                    placed = planned.len(),
                    rejected = planned.skipped.len(),
                    "Planned tabs"
                );
                let status = ObjectStatus::Planned {
                    source: resolved.source,
                    contours: resolved.contours.len(),
                    placed: planned.len(),
                    rejected: planned.skipped.len(),
                };
                placement.result.extend(planned);
                status
            }
        };

        placement.reports.push(ObjectReport {
            object: object.id,
            name: object.name.clone(),
            status,
        });
    }

    placement
}

/// World-space mesh for a tab whose origin sits at `position`.
///
/// The tab is built relative to `position.y` so its bottom lands on the
/// build plate.
pub fn build_tab_mesh(position: Point3<f64>, spec: &TabPlacementSpec) -> Mesh {
    let mut mesh = spec.geometry(position.y).build();
    mesh.translate(position.coords);
    mesh
}

/// Meshes for a batch of placements, in the same order.
pub fn build_tab_meshes(points: &[PlacedPoint], spec: &TabPlacementSpec) -> Vec<Mesh> {
    points
        .par_iter()
        .map(|point| build_tab_mesh(point.position, spec))
        .collect()
}

/// Result of an auto placement session.
#[derive(Debug, Clone, Default)]
pub struct AutoPlaceReport {
    pub tabs: Vec<TabKey>,
    pub objects: Vec<ObjectReport>,
    pub skipped: Vec<SkippedPoint>,
    pub adjustments: Vec<SettingAdjustment>,
}

/// Result of placing one tab by hand.
#[derive(Debug, Clone)]
pub struct SinglePlacement {
    pub tab: TabKey,
    pub adjustments: Vec<SettingAdjustment>,
}

/// The tab tool: settings, bed and the tabs it created.
#[derive(Debug, Default)]
pub struct TabTool {
    pub settings: TabSettings,
    pub bed: BedSize,
    registry: TabRegistry,
}

impl TabTool {
    pub fn new(settings: TabSettings, bed: BedSize) -> Self {
        Self {
            settings,
            bed,
            registry: TabRegistry::new(),
        }
    }

    pub fn registry(&self) -> &TabRegistry {
        &self.registry
    }

    /// Pick up the bed size from the host when it reports one.
    pub fn refresh_bed(&mut self, host: &dyn HostSettings) {
        if let Some(bed) = BedSize::from_host(host) {
            self.bed = bed;
        }
    }

    /// Placement spec for the current settings and the host's extruder.
    pub fn spec(&self, host: &dyn HostSettings) -> TabPlacementSpec {
        TabPlacementSpec::from_settings(&self.settings, ExtruderProperties::from_host(host))
    }

    /// Place tabs around every eligible object in `scene`.
    pub fn auto_place(
        &mut self,
        host: &mut dyn HostSettings,
        scene: &[SceneObject],
        height: &dyn HeightQuery,
    ) -> AutoPlaceReport {
        let spec = self.spec(host);
        let mut tracker = SettingAdjustmentTracker::new();

        let planned = plan_auto_placement(scene, &spec, self.bed, height);
        let meshes = build_tab_meshes(&planned.result.points, &spec);

        if !meshes.is_empty() {
            reconcile_host_settings(host, &spec, self.registry.any_dish(), &mut tracker);
        }

        let tabs: Vec<TabKey> = planned
            .result
            .points
            .iter()
            .zip(meshes)
            .map(|(point, mesh)| self.insert_tab(&spec, point.object, point.position, mesh))
            .collect();

        info!(
            objects = planned.reports.len(),
            tabs = tabs.len(),
            rejected = planned.result.skipped.len(),
            "Automatic tab creation finished"
        );

        AutoPlaceReport {
            tabs,
            objects: planned.reports,
            skipped: planned.result.skipped,
            adjustments: tracker.adjustments().to_vec(),
        }
    }

    /// Place one tab at a picked position on `parent`.
    pub fn place_single(
        &mut self,
        host: &mut dyn HostSettings,
        parent: &SceneObject,
        position: Point3<f64>,
    ) -> Result<SinglePlacement> {
        if !parent.kind.accepts_tabs() {
            return Err(Error::UnsupportedNode(parent.kind));
        }

        let spec = self.spec(host);
        let planner = TabPlacementPlanner::from_spec(&spec, self.bed);
        planner
            .validator
            .validate(position.x, position.z)
            .map_err(Error::InvalidPlacement)?;

        let mut tracker = SettingAdjustmentTracker::new();
        reconcile_host_settings(host, &spec, self.registry.any_dish(), &mut tracker);

        let mesh = build_tab_mesh(position, &spec);
        let tab = self.insert_tab(&spec, parent.id, position, mesh);
        debug!(object = parent.id, x = position.x, z = position.z, "Placed tab");

        Ok(SinglePlacement {
            tab,
            adjustments: tracker.adjustments().to_vec(),
        })
    }

    pub fn remove_tab(&mut self, tab: TabKey) -> Result<TabRecord> {
        self.registry.remove(tab)
    }

    /// Remove every tab created by the tool.
    pub fn remove_all(&mut self) -> usize {
        let removed = self.registry.clear();
        info!(removed, "Removed all tabs");
        removed
    }

    /// Whether the tool should be usable for `scene`; see
    /// [`ensure_support_enabled`].
    pub fn update_enabled(
        &self,
        host: &mut dyn HostSettings,
        scene: &[SceneObject],
    ) -> (bool, Vec<SettingAdjustment>) {
        let mut tracker = SettingAdjustmentTracker::new();
        let enabled = ensure_support_enabled(host, scene, &mut tracker);
        (enabled, tracker.adjustments().to_vec())
    }

    fn insert_tab(&mut self, spec: &TabPlacementSpec, parent: u32, position: Point3<f64>, mesh: Mesh) -> TabKey {
        self.registry.insert(TabRecord {
            parent,
            position,
            shape: spec.shape,
            mesh,
            overrides: TabOverrides::new(spec.xy_distance),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjustments::{MemoryHost, SettingValue, SUPPORT_TYPE};
    use crate::error::PlacementRejection;
    use crate::planner::FlatBed;

    fn square(half: f64) -> Polygon2D {
        Polygon2D::from_xz(&[[-half, -half], [half, -half], [half, half], [-half, half]])
    }

    #[test]
    fn test_empty_mesh_without_boundary_is_an_error() {
        let object = SceneObject::empty(1, "empty", NodeKind::Sliceable);
        let err = resolve_contours(&object, &BaseContourExtractor::default(), &ContourFilter::default())
            .unwrap_err();
        assert!(matches!(err, Error::Geometry(_)));
    }

    #[test]
    fn test_hull_boundary_fallback() {
        let object = SceneObject::empty(1, "flat", NodeKind::Sliceable).with_hull_boundary(square(10.0));
        let resolved =
            resolve_contours(&object, &BaseContourExtractor::default(), &ContourFilter::default()).unwrap();
        assert_eq!(resolved.source, ContourSource::HullBoundary);
        assert_eq!(resolved.contours, vec![square(10.0)]);
    }

    #[test]
    fn test_whole_mesh_hull_fallback() {
        // A flat sheet: the slice 0.2 above its base misses it
        let mesh = Mesh::from_buffers(vec![0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 0.0, 0.0, 10.0], None).unwrap();
        let object = SceneObject::new(3, "sheet", NodeKind::Sliceable, mesh);

        let resolved =
            resolve_contours(&object, &BaseContourExtractor::default(), &ContourFilter::default()).unwrap();
        assert_eq!(resolved.source, ContourSource::WholeMeshHull);
        assert_eq!(resolved.contours[0].len(), 3);
    }

    #[test]
    fn test_unsupported_nodes_are_reported() {
        let objects = vec![
            SceneObject::empty(1, "tab", NodeKind::SupportMesh).with_hull_boundary(square(10.0)),
            SceneObject::empty(2, "part", NodeKind::Sliceable).with_hull_boundary(square(10.0)),
        ];
        let spec = TabPlacementSpec::from_settings(&TabSettings::default(), ExtruderProperties::default());

        let planned = plan_auto_placement(&objects, &spec, BedSize::default(), &FlatBed);

        assert_eq!(
            planned.reports[0].status,
            ObjectStatus::Skipped(SkipReason::Unsupported(NodeKind::SupportMesh))
        );
        assert!(matches!(planned.reports[1].status, ObjectStatus::Planned { placed: 4, .. }));
        assert!(planned.result.points.iter().all(|p| p.object == 2));
    }

    #[test]
    fn test_tab_mesh_sits_on_plate() {
        let spec = TabPlacementSpec::from_settings(&TabSettings::default(), ExtruderProperties::default());
        let mesh = build_tab_mesh(Point3::new(20.0, 4.0, -10.0), &spec);
        let (min, max) = mesh.bounds();

        assert!(min.y.abs() < 1e-5);
        assert!((max.y - 0.36).abs() < 1e-5);
        assert!((max.x - 25.0).abs() < 1e-4);
        assert!((min.x - 15.0).abs() < 1e-4);
    }

    #[test]
    fn test_place_single_validates() {
        let mut host = MemoryHost::default();
        let mut tool = TabTool::new(TabSettings::default(), BedSize::new(200.0, 200.0));
        let part = SceneObject::empty(1, "part", NodeKind::Sliceable);

        let err = tool
            .place_single(&mut host, &part, Point3::new(97.0, 0.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPlacement(PlacementRejection::TooCloseToEdge)));

        let infill = SceneObject::empty(2, "infill", NodeKind::InfillMesh);
        let err = tool
            .place_single(&mut host, &infill, Point3::new(0.0, 0.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedNode(NodeKind::InfillMesh)));

        let placed = tool.place_single(&mut host, &part, Point3::new(90.0, 0.0, 0.0)).unwrap();
        let tab = tool.registry().get(placed.tab).unwrap();
        assert_eq!(tab.parent, 1);
        assert_eq!(tab.mesh.triangle_count(), 144);
        assert!(tab.overrides.support_mesh);
    }

    #[test]
    fn test_dish_session_adjusts_support_placement() {
        let mut host = MemoryHost::default();
        host.global.insert(SUPPORT_TYPE.into(), SettingValue::Text("buildplate".into()));
        let mut tool = TabTool::new(
            TabSettings {
                as_dish: true,
                ..TabSettings::default()
            },
            BedSize::default(),
        );
        let scene = vec![SceneObject::empty(1, "part", NodeKind::Sliceable).with_hull_boundary(square(20.0))];

        let report = tool.auto_place(&mut host, &scene, &FlatBed);

        assert_eq!(report.tabs.len(), 4);
        assert!(report
            .adjustments
            .contains(&SettingAdjustment::SupportPlacementEverywhere));
        assert!(tool.registry().any_dish());
        assert_eq!(tool.remove_all(), 4);
        assert!(tool.registry().is_empty());
    }
}
