// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the extraction services.

use thiserror::Error;

/// Extraction error taxonomy.
///
/// Per-element failures inside bulk or tree extraction are handled locally
/// and never surface as these variants; everything here aborts the requested
/// operation and becomes the single top-level error object.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// A path or identifier did not resolve.
    #[error("{0}")]
    NotFound(String),

    /// The underlying parse of a structurally invalid file failed.
    #[error("failed to open IFC file: {0}")]
    Load(#[source] ifc_intel_model::Error),

    /// The file parses but lacks a mandatory structural record.
    #[error("{0}")]
    Schema(String),

    /// A resolved entity is not of the kind the operation expects.
    #[error("element {guid} is not an {expected}")]
    TypeMismatch { guid: String, expected: &'static str },

    /// An external subprocess exceeded its deadline and was killed.
    #[error("{command} timed out after {seconds}s")]
    Timeout { command: String, seconds: u64 },
}
