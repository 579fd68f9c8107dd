// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tab settings, printer properties and the per-pass placement spec.

use antiwarp_geometry::{CylinderParams, DishParams, TabGeometry, TabShape, DEFAULT_SEGMENT_ANGLE};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::adjustments::HostSettings;
use crate::error::{Error, Result};

/// Multiplier applied to the first layer height for the tab floor.
const FIRST_LAYER_FACTOR: f64 = 1.2;

/// Multiplier applied to the nozzle line width for dish walls.
const LINE_WIDTH_FACTOR: f64 = 1.2;

/// User-facing tab tool settings.
///
/// String setters validate their input and keep the previous value when it
/// is rejected, so the struct always holds a usable configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabSettings {
    /// Tab diameter in mm.
    pub tab_size: f64,
    /// Support X/Y distance applied to tabs, in mm.
    pub xy_distance: f64,
    /// Build flared dish tabs instead of flat cylinders.
    pub as_dish: bool,
    /// Number of printed layers in a tab.
    pub layer_count: u32,
    /// Auto-placement uses half the diameter as minimum spacing.
    pub dense: bool,
}

impl Default for TabSettings {
    fn default() -> Self {
        Self {
            tab_size: 10.0,
            xy_distance: 0.16,
            as_dish: false,
            layer_count: 1,
            dense: true,
        }
    }
}

impl TabSettings {
    /// Defaults overridden by `ANTIWARP_TAB_SIZE`, `ANTIWARP_XY_DISTANCE`,
    /// `ANTIWARP_AS_DISH`, `ANTIWARP_LAYER_COUNT` and `ANTIWARP_DENSE`.
    /// Rejected variables are logged and leave the default in place.
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        if let Ok(raw) = std::env::var("ANTIWARP_TAB_SIZE") {
            log_rejected("ANTIWARP_TAB_SIZE", settings.set_tab_size(&raw));
        }
        if let Ok(raw) = std::env::var("ANTIWARP_XY_DISTANCE") {
            log_rejected("ANTIWARP_XY_DISTANCE", settings.set_xy_distance(&raw));
        }
        if let Ok(raw) = std::env::var("ANTIWARP_LAYER_COUNT") {
            log_rejected("ANTIWARP_LAYER_COUNT", settings.set_layer_count(&raw));
        }
        settings.as_dish = std::env::var("ANTIWARP_AS_DISH")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(settings.as_dish);
        settings.dense = std::env::var("ANTIWARP_DENSE")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(settings.dense);

        settings
    }

    /// Parse and apply a tab diameter. Must be a positive number.
    pub fn set_tab_size(&mut self, raw: &str) -> Result<f64> {
        let value = parse_float("tab_size", raw)?;
        if value <= 0.0 {
            return Err(reject("tab_size", raw, "must be greater than zero"));
        }
        self.tab_size = value;
        Ok(value)
    }

    /// Parse and apply the support X/Y distance.
    pub fn set_xy_distance(&mut self, raw: &str) -> Result<f64> {
        let value = parse_float("xy_distance", raw)?;
        self.xy_distance = value;
        Ok(value)
    }

    /// Parse and apply the layer count. Must be at least 1.
    pub fn set_layer_count(&mut self, raw: &str) -> Result<u32> {
        let value: i64 = raw
            .trim()
            .parse()
            .map_err(|e: std::num::ParseIntError| reject("layer_count", raw, &e.to_string()))?;
        if value < 1 {
            return Err(reject("layer_count", raw, "must be at least 1"));
        }
        let value = u32::try_from(value).map_err(|e| reject("layer_count", raw, &e.to_string()))?;
        self.layer_count = value;
        Ok(value)
    }

    /// Serialize for host-side persistence.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Restore persisted settings; missing fields take their defaults.
    ///
    /// Restored values pass the same checks as the string setters.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self =
            serde_json::from_str(json).map_err(|e| reject("settings", json, &e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check the invariants the string setters enforce.
    pub fn validate(&self) -> Result<()> {
        if !self.tab_size.is_finite() || self.tab_size <= 0.0 {
            return Err(reject(
                "tab_size",
                &self.tab_size.to_string(),
                "must be a finite number greater than zero",
            ));
        }
        if !self.xy_distance.is_finite() {
            return Err(reject(
                "xy_distance",
                &self.xy_distance.to_string(),
                "must be a finite number",
            ));
        }
        if self.layer_count < 1 {
            return Err(reject(
                "layer_count",
                &self.layer_count.to_string(),
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

fn log_rejected<T>(variable: &'static str, outcome: Result<T>) {
    if let Err(e) = outcome {
        warn!(variable, error = %e, "Ignoring environment override");
    }
}

fn parse_float(key: &'static str, raw: &str) -> Result<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|e: std::num::ParseFloatError| reject(key, raw, &e.to_string()))?;
    if !value.is_finite() {
        return Err(reject(key, raw, "must be a finite number"));
    }
    Ok(value)
}

fn reject(key: &'static str, raw: &str, reason: &str) -> Error {
    Error::ConfigurationParse {
        key,
        value: raw.to_string(),
        reason: reason.to_string(),
    }
}

/// Extruder properties that size the tab.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtruderProperties {
    /// First layer height (`layer_height_0`).
    pub base_layer_height: f64,
    pub layer_height: f64,
    pub line_width: f64,
}

impl Default for ExtruderProperties {
    /// Values for a standard 0.4mm nozzle.
    fn default() -> Self {
        Self {
            base_layer_height: 0.3,
            layer_height: 0.2,
            line_width: 0.4,
        }
    }
}

impl ExtruderProperties {
    /// Read properties from the host, substituting the default for each one
    /// that is missing or not numeric.
    pub fn from_host(host: &dyn HostSettings) -> Self {
        let defaults = Self::default();
        let read = |key: &'static str, fallback: f64| -> f64 {
            match host.extruder_property(key).and_then(|v| v.as_f64()) {
                Some(value) if value.is_finite() => value,
                _ => {
                    warn!(
                        error = %Error::ExtruderPropertyUnavailable(key),
                        fallback,
                        "Using default extruder property"
                    );
                    fallback
                }
            }
        };

        Self {
            base_layer_height: read("layer_height_0", defaults.base_layer_height),
            layer_height: read("layer_height", defaults.layer_height),
            line_width: read("line_width", defaults.line_width),
        }
    }

    /// Parse raw property strings. Any unparseable value falls back to the
    /// default for that property.
    pub fn from_raw(base_layer_height: &str, layer_height: &str, line_width: &str) -> Self {
        let defaults = Self::default();
        let parse = |raw: &str, fallback: f64| match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => value,
            _ => fallback,
        };

        Self {
            base_layer_height: parse(base_layer_height, defaults.base_layer_height),
            layer_height: parse(layer_height, defaults.layer_height),
            line_width: parse(line_width, defaults.line_width),
        }
    }
}

/// Printable bed extent, centred on the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BedSize {
    pub width: f64,
    pub depth: f64,
}

impl Default for BedSize {
    fn default() -> Self {
        Self::new(200.0, 200.0)
    }
}

impl BedSize {
    pub fn new(width: f64, depth: f64) -> Self {
        Self { width, depth }
    }

    /// Read `machine_width` / `machine_depth` from the host.
    pub fn from_host(host: &dyn HostSettings) -> Option<Self> {
        let width = host.global_property("machine_width")?.as_f64()?;
        let depth = host.global_property("machine_depth")?.as_f64()?;
        Some(Self { width, depth })
    }
}

/// Configuration snapshot for one placement pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TabPlacementSpec {
    pub diameter: f64,
    pub xy_distance: f64,
    pub layer_count: u32,
    pub shape: TabShape,
    pub dense: bool,
    pub extruder: ExtruderProperties,
    /// Angular step of the tab mesh, in degrees.
    pub segment_angle: u32,
}

impl TabPlacementSpec {
    pub fn from_settings(settings: &TabSettings, extruder: ExtruderProperties) -> Self {
        Self {
            diameter: settings.tab_size,
            xy_distance: settings.xy_distance,
            layer_count: settings.layer_count.max(1),
            shape: if settings.as_dish {
                TabShape::Dish
            } else {
                TabShape::Cylinder
            },
            dense: settings.dense,
            extruder,
            segment_angle: DEFAULT_SEGMENT_ANGLE,
        }
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.diameter / 2.0
    }

    /// Minimum distance between consecutive auto-placed tabs.
    #[inline]
    pub fn minimum_spacing(&self) -> f64 {
        if self.dense {
            self.diameter * 0.5
        } else {
            self.diameter
        }
    }

    /// Tab height: a slightly thick first layer plus the remaining layers.
    pub fn total_height(&self) -> f64 {
        self.extruder.base_layer_height * FIRST_LAYER_FACTOR
            + self.extruder.layer_height * (self.layer_count.saturating_sub(1)) as f64
    }

    /// Line width used for dish walls.
    pub fn tab_line_width(&self) -> f64 {
        self.extruder.line_width * LINE_WIDTH_FACTOR
    }

    /// Mesh parameters for a tab whose placement point sits at height `start_y`.
    pub fn geometry(&self, start_y: f64) -> TabGeometry {
        match self.shape {
            TabShape::Cylinder => TabGeometry::Cylinder(CylinderParams {
                diameter: self.diameter,
                segment_angle: self.segment_angle,
                start_y,
                height: self.total_height(),
            }),
            TabShape::Dish => TabGeometry::Dish(DishParams {
                diameter: self.diameter,
                segment_angle: self.segment_angle,
                start_y,
                top_height: self.total_height(),
                line_width: self.tab_line_width(),
                layer_count: self.layer_count,
            }),
        }
    }
}
