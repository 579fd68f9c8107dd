// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arena of created tabs.
//!
//! Every tab the tool creates is stored under a generational [`TabKey`].
//! Removing a tab invalidates its key; later lookups or removals with that
//! key fail with [`Error::StaleTab`] instead of touching another tab.

use antiwarp_geometry::{Mesh, Point3, TabShape};
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

use crate::error::{Error, Result};

new_key_type! {
    /// Handle to a tab created by the tool.
    pub struct TabKey;
}

/// Node name given to every tab.
pub const TAB_NODE_NAME: &str = "AdhesionTab";

/// Per-node setting overrides a tab carries into the slicer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TabOverrides {
    pub support_mesh: bool,
    /// Tabs sit on the plate already; dropping them down would misplace them.
    pub support_mesh_drop_down: bool,
    pub support_xy_distance: f64,
}

impl TabOverrides {
    pub fn new(xy_distance: f64) -> Self {
        Self {
            support_mesh: true,
            support_mesh_drop_down: false,
            support_xy_distance: xy_distance,
        }
    }
}

/// A created tab.
#[derive(Debug, Clone)]
pub struct TabRecord {
    /// Host id of the object the tab is attached to.
    pub parent: u32,
    /// World position of the tab's origin.
    pub position: Point3<f64>,
    pub shape: TabShape,
    /// World-space tab mesh.
    pub mesh: Mesh,
    pub overrides: TabOverrides,
}

#[derive(Debug, Default)]
pub struct TabRegistry {
    tabs: SlotMap<TabKey, TabRecord>,
    any_dish: bool,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: TabRecord) -> TabKey {
        if record.shape == TabShape::Dish {
            self.any_dish = true;
        }
        self.tabs.insert(record)
    }

    pub fn get(&self, key: TabKey) -> Option<&TabRecord> {
        self.tabs.get(key)
    }

    pub fn contains(&self, key: TabKey) -> bool {
        self.tabs.contains_key(key)
    }

    pub fn remove(&mut self, key: TabKey) -> Result<TabRecord> {
        self.tabs.remove(key).ok_or(Error::StaleTab)
    }

    /// Remove every tab, returning how many there were.
    ///
    /// Also forgets that a dish tab was ever created.
    pub fn clear(&mut self) -> usize {
        let count = self.tabs.len();
        self.tabs.clear();
        self.any_dish = false;
        count
    }

    /// Whether a dish tab was created since the last [`clear`](Self::clear).
    /// Stays set when that tab is removed individually.
    pub fn any_dish(&self) -> bool {
        self.any_dish
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TabKey, &TabRecord)> {
        self.tabs.iter()
    }
}
