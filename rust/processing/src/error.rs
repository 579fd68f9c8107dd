// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for tab placement.
//!
//! Every variant is recoverable at the level of a single setting, point or
//! object; batch operations report them per item instead of aborting.

use crate::scene::NodeKind;
use std::fmt;

/// Result type alias for placement operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a candidate tab position was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PlacementRejection {
    /// The point lies outside the printable bed.
    OffBed,
    /// A tab centred here would hang over the bed edge.
    TooCloseToEdge,
}

impl fmt::Display for PlacementRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementRejection::OffBed => f.write_str("position is off the build plate"),
            PlacementRejection::TooCloseToEdge => {
                f.write_str("position is too close to the build plate edge")
            }
        }
    }
}

/// Errors that can occur while planning or creating tabs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("geometry error: {0}")]
    Geometry(#[from] antiwarp_geometry::Error),

    /// A numeric setting could not be parsed or is out of range. The previous
    /// value is kept.
    #[error("invalid value {value:?} for setting '{key}': {reason}")]
    ConfigurationParse {
        key: &'static str,
        value: String,
        reason: String,
    },

    /// The host could not supply an extruder property; defaults apply.
    #[error("extruder property '{0}' is unavailable")]
    ExtruderPropertyUnavailable(&'static str),

    #[error("invalid tab placement: {0}")]
    InvalidPlacement(PlacementRejection),

    /// Tabs can only be attached to ordinary printable meshes.
    #[error("cannot attach a tab to a {0} node")]
    UnsupportedNode(NodeKind),

    /// The tab handle was already removed.
    #[error("tab handle is no longer valid")]
    StaleTab,
}
