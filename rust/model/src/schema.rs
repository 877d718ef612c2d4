// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Type-name registry.
//!
//! STEP files carry entity tags in uppercase (`IFCWALL`); the IFC schema and
//! every downstream consumer use the mixed-case form (`IfcWall`). The
//! registry covers the entity types this layer understands; unknown tags
//! keep their raw uppercase form.

use rustc_hash::FxHashMap;
use std::sync::OnceLock;

/// The spatial structure types of the IFC schema
pub const SPATIAL_TYPES: [&str; 6] = [
    "IfcProject",
    "IfcSite",
    "IfcBuilding",
    "IfcBuildingStorey",
    "IfcSpace",
    "IfcZone",
];

/// Check whether a type tag names one of the six spatial types.
pub fn is_spatial_type(type_name: &str) -> bool {
    SPATIAL_TYPES
        .iter()
        .any(|t| t.eq_ignore_ascii_case(type_name))
}

static NAMES: &[&str] = &[
    // Spatial structure
    "IfcProject",
    "IfcSite",
    "IfcBuilding",
    "IfcBuildingStorey",
    "IfcSpace",
    "IfcZone",
    // Built elements
    "IfcWall",
    "IfcWallStandardCase",
    "IfcWallElementedCase",
    "IfcSlab",
    "IfcSlabStandardCase",
    "IfcSlabElementedCase",
    "IfcRoof",
    "IfcBeam",
    "IfcBeamStandardCase",
    "IfcColumn",
    "IfcColumnStandardCase",
    "IfcFooting",
    "IfcPile",
    "IfcRailing",
    "IfcDoor",
    "IfcDoorStandardCase",
    "IfcWindow",
    "IfcWindowStandardCase",
    "IfcCovering",
    "IfcCurtainWall",
    "IfcMember",
    "IfcMemberStandardCase",
    "IfcPlate",
    "IfcPlateStandardCase",
    "IfcStair",
    "IfcStairFlight",
    "IfcRamp",
    "IfcRampFlight",
    "IfcOpeningElement",
    "IfcBuildingElementProxy",
    "IfcProxy",
    // Furnishing
    "IfcFurnishingElement",
    "IfcFurniture",
    "IfcSystemFurnitureElement",
    // Distribution / MEP
    "IfcDistributionElement",
    "IfcDistributionFlowElement",
    "IfcDistributionControlElement",
    "IfcFlowTerminal",
    "IfcFlowSegment",
    "IfcFlowFitting",
    "IfcFlowController",
    "IfcFlowMovingDevice",
    "IfcFlowStorageDevice",
    "IfcFlowTreatmentDevice",
    "IfcEnergyConversionDevice",
    "IfcPipeFitting",
    "IfcPipeSegment",
    "IfcDuctFitting",
    "IfcDuctSegment",
    // Type objects
    "IfcWallType",
    "IfcDoorType",
    "IfcWindowType",
    "IfcSlabType",
    "IfcBeamType",
    "IfcColumnType",
    "IfcFurnitureType",
    // Relationships
    "IfcRelAggregates",
    "IfcRelContainedInSpatialStructure",
    "IfcRelDefinesByProperties",
    "IfcRelDefinesByType",
    // Property machinery
    "IfcPropertySet",
    "IfcElementQuantity",
    "IfcPropertySingleValue",
    "IfcPropertyListValue",
    "IfcQuantityLength",
    "IfcQuantityArea",
    "IfcQuantityVolume",
    "IfcQuantityCount",
    "IfcQuantityWeight",
    "IfcQuantityTime",
    // Ownership
    "IfcOwnerHistory",
    "IfcPersonAndOrganization",
    "IfcPerson",
    "IfcOrganization",
    "IfcApplication",
    // Base product
    "IfcProduct",
];

fn registry() -> &'static FxHashMap<String, &'static str> {
    static REGISTRY: OnceLock<FxHashMap<String, &'static str>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        NAMES
            .iter()
            .map(|name| (name.to_ascii_uppercase(), *name))
            .collect()
    })
}

/// Canonical mixed-case name for an uppercase STEP tag, if known.
pub fn canonical_name(raw_type: &str) -> Option<&'static str> {
    if raw_type.bytes().any(|b| b.is_ascii_lowercase()) {
        let upper = raw_type.to_ascii_uppercase();
        registry().get(&upper).copied()
    } else {
        registry().get(raw_type).copied()
    }
}
