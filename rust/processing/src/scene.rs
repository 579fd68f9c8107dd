// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scene objects as seen by the tab tool.

use antiwarp_geometry::{Mesh, Polygon2D};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What role a scene node plays in slicing.
///
/// Resolved once from the host's per-node mesh-type flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NodeKind {
    /// An ordinary printable object.
    #[default]
    Sliceable,
    /// A support mesh; tabs themselves are support meshes.
    SupportMesh,
    InfillMesh,
    CuttingMesh,
    AntiOverhangMesh,
    /// Anything the slicer ignores (groups, cameras, the build plate).
    Other,
}

/// Per-node mesh-type flags as reported by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFlags {
    pub sliceable: bool,
    pub support_mesh: bool,
    pub infill_mesh: bool,
    pub cutting_mesh: bool,
    pub anti_overhang_mesh: bool,
}

impl NodeKind {
    pub fn from_flags(flags: NodeFlags) -> Self {
        if !flags.sliceable {
            NodeKind::Other
        } else if flags.support_mesh {
            NodeKind::SupportMesh
        } else if flags.infill_mesh {
            NodeKind::InfillMesh
        } else if flags.cutting_mesh {
            NodeKind::CuttingMesh
        } else if flags.anti_overhang_mesh {
            NodeKind::AntiOverhangMesh
        } else {
            NodeKind::Sliceable
        }
    }

    /// Whether tabs may be attached to nodes of this kind.
    #[inline]
    pub fn accepts_tabs(self) -> bool {
        self == NodeKind::Sliceable
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Sliceable => "sliceable",
            NodeKind::SupportMesh => "support mesh",
            NodeKind::InfillMesh => "infill mesh",
            NodeKind::CuttingMesh => "cutting mesh",
            NodeKind::AntiOverhangMesh => "anti-overhang mesh",
            NodeKind::Other => "non-printing",
        };
        f.write_str(name)
    }
}

/// A scene node with its world-space mesh.
#[derive(Debug, Clone)]
pub struct SceneObject {
    /// Host node id, carried through to placements for traceability.
    pub id: u32,
    pub name: String,
    pub kind: NodeKind,
    /// Transformed (world-space) mesh.
    pub mesh: Mesh,
    /// Host-computed convex hull boundary in the (x, z) plane, used when the
    /// base slice yields nothing.
    pub hull_boundary: Option<Polygon2D>,
}

impl SceneObject {
    pub fn new(id: u32, name: impl Into<String>, kind: NodeKind, mesh: Mesh) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            mesh,
            hull_boundary: None,
        }
    }

    /// A node without geometry.
    pub fn empty(id: u32, name: impl Into<String>, kind: NodeKind) -> Self {
        Self::new(id, name, kind, Mesh::new())
    }

    pub fn with_hull_boundary(mut self, boundary: Polygon2D) -> Self {
        self.hull_boundary = Some(boundary);
        self
    }
}

/// Whether the scene holds tabs, so support meshes must stay enabled.
pub fn support_required(nodes: &[SceneObject]) -> bool {
    nodes.iter().any(|node| node.kind == NodeKind::SupportMesh)
}
