// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC-Intel Model
//!
//! STEP/IFC model-access layer built with [nom](https://docs.rs/nom).
//! Parses an IFC file into an immutable in-memory handle with the query
//! surface the extraction services need:
//!
//! - **Type queries**: [`IfcModel::by_type`], including legacy
//!   standard-case subtype expansion
//! - **Identity queries**: [`IfcModel::by_guid`]
//! - **Relationship traversal**: decomposition (`IfcRelAggregates`) and
//!   containment (`IfcRelContainedInSpatialStructure`)
//! - **Merged property view**: directly assigned, type-inherited and
//!   quantity sets in one map ([`IfcModel::property_sets`])
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ifc_intel_model::IfcModel;
//!
//! let model = IfcModel::open(std::path::Path::new("model.ifc"))?;
//! for wall in model.by_type("IfcWall") {
//!     println!("{}: {:?}", wall.ifc_type(), wall.name());
//! }
//! ```
//!
//! A loaded model is read-only. Share it behind `Arc` for concurrent use.

pub mod entity;
pub mod error;
pub mod legacy;
pub mod model;
pub mod parser;
pub mod pset;
pub mod schema;

pub use entity::{AttributeValue, DecodedEntity};
pub use error::{Error, Result};
pub use model::IfcModel;
pub use parser::{parse_entity, Token};
pub use pset::{PropMap, PropValue, PsetMap};
pub use schema::{canonical_name, is_spatial_type, SPATIAL_TYPES};
