// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during geometry processing
#[derive(Error, Debug)]
pub enum Error {
    /// Fewer than 3 distinct, non-collinear points were available for a hull
    #[error("Insufficient geometry: {0}")]
    InsufficientGeometry(String),

    #[error("Invalid mesh buffers: {0}")]
    InvalidMesh(String),
}
