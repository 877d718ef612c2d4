// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bulk element extraction.
//!
//! Drives the property extractor across every physical element type in one
//! pass, for database bulk-load. Per-element failures become warnings, not
//! errors; the pass succeeds at the file level.

use crate::error::ExtractError;
use crate::services::properties::{self, ElementProperties};
use ifc_intel_model::IfcModel;
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;

/// Element types extracted in bulk. Parent tags only: a type query already
/// returns legacy subtype instances (standard-case walls come back from the
/// IfcWall query), so subtypes must not be listed separately.
const ELEMENT_TYPES: [&str; 33] = [
    // Structural elements
    "IfcWall",
    "IfcSlab",
    "IfcRoof",
    "IfcBeam",
    "IfcColumn",
    "IfcFooting",
    "IfcPile",
    "IfcRailing",
    // Opening elements
    "IfcDoor",
    "IfcWindow",
    // Furnishing and equipment
    "IfcFurnishingElement",
    // Building equipment
    "IfcBuildingElementProxy",
    "IfcCovering",
    "IfcCurtainWall",
    "IfcMember",
    "IfcPlate",
    "IfcStair",
    "IfcStairFlight",
    "IfcRamp",
    "IfcRampFlight",
    // MEP elements
    "IfcFlowTerminal",
    "IfcFlowSegment",
    "IfcFlowFitting",
    "IfcFlowController",
    "IfcEnergyConversionDevice",
    "IfcFlowMovingDevice",
    "IfcFlowStorageDevice",
    "IfcFlowTreatmentDevice",
    // Distribution elements
    "IfcDistributionElement",
    // Spatial elements (for context)
    "IfcSpace",
    "IfcBuildingStorey",
    "IfcBuilding",
    "IfcSite",
];

/// One extracted element
#[derive(Debug, Clone, Serialize)]
pub struct BulkElement {
    pub global_id: String,
    pub element_type: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub properties: ElementProperties,
}

/// Timings and statistics of one bulk pass
#[derive(Debug, Clone, Serialize)]
pub struct BulkMetrics {
    pub timings: BulkTimings,
    pub statistics: BulkStatistics,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkTimings {
    pub parse_ms: u64,
    pub element_extraction_ms: u64,
    pub total_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkStatistics {
    pub total_elements: usize,
    pub element_type_counts: BTreeMap<String, usize>,
    pub total_property_sets: usize,
    pub total_properties: usize,
    pub total_quantities: usize,
}

/// Result of one bulk pass: the elements plus metrics with a warnings list.
/// This is the one operation that reports partial success.
#[derive(Debug, Clone, Serialize)]
pub struct BulkResult {
    pub elements: Vec<BulkElement>,
    pub metrics: BulkMetrics,
}

/// Extract every physical element with its properties.
///
/// `parse_ms` is the time the caller spent loading the handle; it is folded
/// into the reported timings.
pub fn extract_all(model: &IfcModel, parse_ms: u64) -> BulkResult {
    let extract_start = Instant::now();
    let mut elements: Vec<BulkElement> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();
    // Legacy subtypes surface under their parent tag too; if the allow-list
    // ever grows a subtype entry, identity dedup keeps elements single.
    let mut seen: FxHashSet<String> = FxHashSet::default();

    for element_type in ELEMENT_TYPES {
        // A type absent from the file is expected, not exceptional.
        for instance in model.by_type(element_type) {
            let Some(global_id) = instance.global_id() else {
                continue;
            };
            if !seen.insert(global_id.to_string()) {
                continue;
            }

            match properties::extract(model, global_id) {
                Ok(props) if props.is_empty() => {
                    // No property data at all: not a real building element.
                    tracing::debug!(global_id, "skipping element without properties");
                }
                Ok(props) => {
                    elements.push(BulkElement {
                        global_id: global_id.to_string(),
                        element_type: instance.ifc_type().to_string(),
                        name: instance.name().map(str::to_string),
                        description: instance.description().map(str::to_string),
                        properties: props,
                    });
                    if elements.len() % 100 == 0 {
                        tracing::debug!(count = elements.len(), "extracted elements...");
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to extract element {}: {}", global_id, e);
                    tracing::warn!(global_id, error = %e, "element extraction failed");
                    warnings.push(warning);
                }
            }
        }
    }

    let element_extraction_ms = extract_start.elapsed().as_millis() as u64;
    tracing::info!(
        elements = elements.len(),
        warnings = warnings.len(),
        extraction_ms = element_extraction_ms,
        "bulk extraction complete"
    );

    let statistics = statistics(&elements);
    BulkResult {
        elements,
        metrics: BulkMetrics {
            timings: BulkTimings {
                parse_ms,
                element_extraction_ms,
                total_ms: parse_ms + element_extraction_ms,
            },
            statistics,
            warnings,
        },
    }
}

fn statistics(elements: &[BulkElement]) -> BulkStatistics {
    let mut element_type_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_property_sets = 0;
    let mut total_properties = 0;
    let mut total_quantities = 0;

    for element in elements {
        *element_type_counts
            .entry(element.element_type.clone())
            .or_insert(0) += 1;

        total_property_sets += element.properties.property_sets.len();
        total_properties += element
            .properties
            .property_sets
            .values()
            .map(|set| set.len())
            .sum::<usize>();
        total_quantities += element
            .properties
            .quantities
            .values()
            .map(|set| set.len())
            .sum::<usize>();
    }

    BulkStatistics {
        total_elements: elements.len(),
        element_type_counts,
        total_property_sets,
        total_properties,
        total_quantities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_intel_model::IfcModel;

    // Two walls with property sets, one door without any, one wall whose
    // property definition reference dangles.
    const FIXTURE: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#10=IFCWALL('WallGuid0000000000000a',$,'Wall 1',$,$,$,$,$);
#11=IFCWALLSTANDARDCASE('WallGuid0000000000000b',$,'Wall 2',$,$,$,$,$);
#12=IFCDOOR('DoorGuid0000000000000a',$,'Door 1',$,$,$,$,$,2.1,0.9);
#13=IFCWALL('WallGuid0000000000000c',$,'Wall 3',$,$,$,$,$);
#40=IFCPROPERTYSET('PsetGuid0000000000000a',$,'Pset_WallCommon',$,(#41));
#41=IFCPROPERTYSINGLEVALUE('IsExternal',$,IFCBOOLEAN(.T.),$);
#60=IFCRELDEFINESBYPROPERTIES('RelPGuid0000000000000a',$,$,$,(#10,#11),#40);
#61=IFCRELDEFINESBYPROPERTIES('RelPGuid0000000000000b',$,$,$,(#13),#999);
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn test_partial_success_with_warning() {
        let model = IfcModel::parse(FIXTURE).unwrap();
        let result = extract_all(&model, 5);

        // Wall 1 and Wall 2 extracted; the door has no properties and Wall 3
        // fails on its dangling definition.
        assert_eq!(result.elements.len(), 2);
        assert_eq!(result.metrics.warnings.len(), 1);
        assert!(result.metrics.warnings[0].contains("WallGuid0000000000000c"));
    }

    #[test]
    fn test_subtype_reported_under_its_own_type() {
        let model = IfcModel::parse(FIXTURE).unwrap();
        let result = extract_all(&model, 0);

        let wall2 = result
            .elements
            .iter()
            .find(|e| e.global_id == "WallGuid0000000000000b")
            .unwrap();
        assert_eq!(wall2.element_type, "IfcWallStandardCase");
    }

    #[test]
    fn test_no_duplicates_across_tags() {
        let model = IfcModel::parse(FIXTURE).unwrap();
        let result = extract_all(&model, 0);

        let mut guids: Vec<_> = result.elements.iter().map(|e| &e.global_id).collect();
        guids.sort();
        guids.dedup();
        assert_eq!(guids.len(), result.elements.len());
    }

    #[test]
    fn test_statistics() {
        let model = IfcModel::parse(FIXTURE).unwrap();
        let result = extract_all(&model, 7);

        let stats = &result.metrics.statistics;
        assert_eq!(stats.total_elements, 2);
        assert_eq!(stats.element_type_counts.get("IfcWall"), Some(&1));
        assert_eq!(stats.element_type_counts.get("IfcWallStandardCase"), Some(&1));
        assert_eq!(stats.total_property_sets, 2);
        assert_eq!(stats.total_properties, 2);
        assert_eq!(stats.total_quantities, 0);

        assert_eq!(result.metrics.timings.parse_ms, 7);
        assert_eq!(
            result.metrics.timings.total_ms,
            7 + result.metrics.timings.element_extraction_ms
        );
    }
}
