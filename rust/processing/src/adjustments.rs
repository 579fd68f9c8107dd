// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host printer settings and the adjustments tabs require.
//!
//! Tabs only print correctly with a few slicer settings in place: dish tabs
//! need support placement "everywhere", multi-layer tabs need solid support
//! infill, and the support X/Y distance should match the tab tool. Each
//! adjustment is reported once per session through a
//! [`SettingAdjustmentTracker`] owned by that session.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::TabPlacementSpec;
use crate::scene::{support_required, SceneObject};

pub const SUPPORT_TYPE: &str = "support_type";
pub const SUPPORT_XY_DISTANCE: &str = "support_xy_distance";
pub const SUPPORT_INFILL_RATE: &str = "support_infill_rate";
pub const SUPPORT_MESH_ENABLED: &str = "support_mesh_enabled";

/// A setting value as exposed by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SettingValue {
    Bool(bool),
    Float(f64),
    Text(String),
}

impl SettingValue {
    /// Numeric view; text is parsed, booleans are not numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SettingValue::Float(v) => Some(*v),
            SettingValue::Text(s) => s.trim().parse().ok(),
            SettingValue::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(v) => Some(*v),
            SettingValue::Text(s) => s.trim().parse().ok(),
            SettingValue::Float(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Read/write access to the host's printer settings.
pub trait HostSettings {
    fn global_property(&self, key: &str) -> Option<SettingValue>;

    /// Request a change. The host may refuse it (for example when the user
    /// pinned the value), which callers detect by reading the value back.
    fn set_global_property(&mut self, key: &str, value: SettingValue);

    fn extruder_property(&self, key: &str) -> Option<SettingValue>;
}

/// In-memory settings store.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    pub global: FxHashMap<String, SettingValue>,
    pub extruder: FxHashMap<String, SettingValue>,
    /// Keys whose writes are silently ignored.
    pub locked: FxHashSet<String>,
}

impl HostSettings for MemoryHost {
    fn global_property(&self, key: &str) -> Option<SettingValue> {
        self.global.get(key).cloned()
    }

    fn set_global_property(&mut self, key: &str, value: SettingValue) {
        if !self.locked.contains(key) {
            self.global.insert(key.to_string(), value);
        }
    }

    fn extruder_property(&self, key: &str) -> Option<SettingValue> {
        self.extruder.get(key).cloned()
    }
}

/// A change made (or attempted) to the host settings on behalf of tabs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SettingAdjustment {
    /// Support placement switched from "buildplate" to "everywhere" for dish tabs.
    SupportPlacementEverywhere,
    /// Support X/Y distance now matches the tab setting.
    XyDistanceSynced(f64),
    /// The host kept a different support X/Y distance.
    XyDistanceBlocked(f64),
    /// Support infill raised to 100% for multi-layer tabs.
    SupportInfillSolid,
    /// Support meshes were re-enabled because tabs exist.
    SupportReenabled,
}

impl SettingAdjustment {
    fn kind(&self) -> AdjustmentKind {
        match self {
            SettingAdjustment::SupportPlacementEverywhere => AdjustmentKind::SupportPlacement,
            SettingAdjustment::XyDistanceSynced(_) | SettingAdjustment::XyDistanceBlocked(_) => {
                AdjustmentKind::XyDistance
            }
            SettingAdjustment::SupportInfillSolid => AdjustmentKind::SupportInfill,
            SettingAdjustment::SupportReenabled => AdjustmentKind::SupportEnabled,
        }
    }

    /// Message suitable for a user notification.
    pub fn message(&self) -> String {
        match self {
            SettingAdjustment::SupportPlacementEverywhere => {
                "Support placement has been set to Everywhere to ensure dish tabs work correctly."
                    .to_string()
            }
            SettingAdjustment::XyDistanceSynced(d) => {
                format!("Support X/Y distance has been changed to match tab tool settings of {}mm.", d)
            }
            SettingAdjustment::XyDistanceBlocked(d) => format!(
                "Support X/Y distance has been manually set different to the tab tool setting of {}mm.",
                d
            ),
            SettingAdjustment::SupportInfillSolid => {
                "Support density has been set to 100% to ensure tabs over 1 layer high are solid."
                    .to_string()
            }
            SettingAdjustment::SupportReenabled => {
                "Support was re-enabled because tabs are present in the scene.".to_string()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum AdjustmentKind {
    SupportPlacement,
    XyDistance,
    SupportInfill,
    SupportEnabled,
}

/// Per-session record of setting adjustments.
///
/// Create one per placement session (or call [`reset`](Self::reset)); each
/// kind of adjustment is recorded at most once within it.
#[derive(Debug, Clone, Default)]
pub struct SettingAdjustmentTracker {
    seen: FxHashSet<AdjustmentKind>,
    adjustments: Vec<SettingAdjustment>,
}

impl SettingAdjustmentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an adjustment; returns `false` if its kind was already reported.
    pub fn record(&mut self, adjustment: SettingAdjustment) -> bool {
        if !self.seen.insert(adjustment.kind()) {
            return false;
        }
        info!(adjustment = ?adjustment, "{}", adjustment.message());
        self.adjustments.push(adjustment);
        true
    }

    pub fn adjustments(&self) -> &[SettingAdjustment] {
        &self.adjustments
    }

    pub fn is_empty(&self) -> bool {
        self.adjustments.is_empty()
    }

    pub fn reset(&mut self) {
        self.seen.clear();
        self.adjustments.clear();
    }
}

/// Bring host settings in line with the tabs being created.
///
/// `any_dish` is true when a dish tab already exists in the scene, in which
/// case support placement is enforced even for cylinder tabs.
pub fn reconcile_host_settings(
    host: &mut dyn HostSettings,
    spec: &TabPlacementSpec,
    any_dish: bool,
    tracker: &mut SettingAdjustmentTracker,
) {
    let dish = any_dish || spec.shape == antiwarp_geometry::TabShape::Dish;
    if dish {
        let placement = host.global_property(SUPPORT_TYPE);
        if placement.as_ref().and_then(SettingValue::as_str) == Some("buildplate") {
            host.set_global_property(SUPPORT_TYPE, SettingValue::Text("everywhere".into()));
            tracker.record(SettingAdjustment::SupportPlacementEverywhere);
        }
    }

    let current_xy = host.global_property(SUPPORT_XY_DISTANCE).and_then(|v| v.as_f64());
    if current_xy != Some(spec.xy_distance) {
        host.set_global_property(SUPPORT_XY_DISTANCE, SettingValue::Float(spec.xy_distance));
        let applied = host.global_property(SUPPORT_XY_DISTANCE).and_then(|v| v.as_f64());
        if applied == Some(spec.xy_distance) {
            tracker.record(SettingAdjustment::XyDistanceSynced(spec.xy_distance));
        } else {
            tracker.record(SettingAdjustment::XyDistanceBlocked(spec.xy_distance));
        }
    }

    if spec.layer_count > 1 {
        let infill = host
            .extruder_property(SUPPORT_INFILL_RATE)
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        if infill < 100.0 {
            host.set_global_property(SUPPORT_INFILL_RATE, SettingValue::Float(100.0));
            tracker.record(SettingAdjustment::SupportInfillSolid);
        }
    }

    debug!(dish, layer_count = spec.layer_count, "Reconciled host settings");
}

/// Whether the tab tool should be enabled for this scene.
///
/// When support meshes (tabs) exist but the host disabled support meshes,
/// they are switched back on and the adjustment recorded. Without tabs the
/// host's own setting decides.
pub fn ensure_support_enabled(
    host: &mut dyn HostSettings,
    scene: &[SceneObject],
    tracker: &mut SettingAdjustmentTracker,
) -> bool {
    let enabled = host
        .global_property(SUPPORT_MESH_ENABLED)
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    if !support_required(scene) {
        return enabled;
    }

    if !enabled {
        host.set_global_property(SUPPORT_MESH_ENABLED, SettingValue::Bool(true));
        tracker.record(SettingAdjustment::SupportReenabled);
    }
    true
}
