// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Metadata extraction: project identity, schema, entity census, authorship.

use crate::error::ExtractError;
use ifc_intel_model::{DecodedEntity, IfcModel};
use serde::Serialize;
use std::collections::BTreeMap;

/// Metadata of one IFC file
#[derive(Debug, Clone, Serialize)]
pub struct IfcMetadata {
    pub model_id: String,
    pub project_name: String,
    pub schema: String,
    pub entity_counts: BTreeMap<String, usize>,
    pub author: Option<String>,
    pub organization: Option<String>,
    pub application: Option<String>,
}

struct CountedType {
    tag: &'static str,
    /// The tag does not exist before IFC4; querying it on an older schema
    /// is avoided rather than tolerated.
    ifc4_only: bool,
}

const fn counted(tag: &'static str) -> CountedType {
    CountedType {
        tag,
        ifc4_only: false,
    }
}

const fn counted_ifc4(tag: &'static str) -> CountedType {
    CountedType {
        tag,
        ifc4_only: true,
    }
}

/// Entity types worth reporting in the census: the building elements a
/// viewer cares about, the spatial structure, common MEP parts, furnishing.
const COUNTED_TYPES: [CountedType; 20] = [
    // Building elements
    counted("IfcWall"),
    counted("IfcWallStandardCase"),
    counted("IfcDoor"),
    counted("IfcWindow"),
    counted("IfcSlab"),
    counted("IfcBeam"),
    counted("IfcColumn"),
    counted("IfcStair"),
    counted("IfcRoof"),
    counted("IfcRailing"),
    // Spatial structure
    counted("IfcSpace"),
    counted("IfcBuildingStorey"),
    counted("IfcBuilding"),
    counted("IfcSite"),
    // MEP elements
    counted("IfcPipeFitting"),
    counted("IfcPipeSegment"),
    counted("IfcDuctFitting"),
    counted("IfcDuctSegment"),
    // Furniture & equipment
    counted("IfcFurnishingElement"),
    counted_ifc4("IfcFurniture"),
];

/// Parse file-level metadata from a loaded model.
pub fn parse(model: &IfcModel) -> Result<IfcMetadata, ExtractError> {
    let projects = model.by_type("IfcProject");
    let project = projects
        .first()
        .ok_or_else(|| ExtractError::Schema("No IfcProject found in file".to_string()))?;

    let project_name = match project.name() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => "Unnamed Project".to_string(),
    };

    let (author, organization, application) = authoring_info(model);

    Ok(IfcMetadata {
        model_id: project.global_id().unwrap_or_default().to_string(),
        project_name,
        schema: model.schema().to_string(),
        entity_counts: count_entities(model),
        author,
        organization,
        application,
    })
}

/// Count instances of the census types. Types absent from the file are
/// omitted; IFC4-only types are pruned on older schemas.
fn count_entities(model: &IfcModel) -> BTreeMap<String, usize> {
    let ifc4 = model.is_ifc4_or_later();
    let mut counts = BTreeMap::new();

    for entry in &COUNTED_TYPES {
        if entry.ifc4_only && !ifc4 {
            continue;
        }
        let count = model.by_type(entry.tag).len();
        if count > 0 {
            counts.insert(entry.tag.to_string(), count);
        }
    }

    counts
}

/// Walk the owner-history chain. Every link is optional; a missing link
/// yields `None` for the fields behind it, never an error.
fn authoring_info(model: &IfcModel) -> (Option<String>, Option<String>, Option<String>) {
    let histories = model.by_type("IfcOwnerHistory");
    let Some(history) = histories.first() else {
        return (None, None, None);
    };

    // IfcOwnerHistory: [0]=OwningUser, [1]=OwningApplication
    let user = history
        .get_ref(0)
        .and_then(|id| model.entity(id))
        .filter(|e| e.is_a("IfcPersonAndOrganization"));

    let author = user
        .and_then(|u| u.get_ref(0))
        .and_then(|id| model.entity(id))
        .and_then(person_name);

    let organization = user
        .and_then(|u| u.get_ref(1))
        .and_then(|id| model.entity(id))
        // IfcOrganization: [1]=Name
        .and_then(|org| org.get_str(1))
        .map(str::to_string);

    let application = history
        .get_ref(1)
        .and_then(|id| model.entity(id))
        // IfcApplication: [2]=ApplicationFullName
        .and_then(|app| app.get_str(2))
        .map(str::to_string);

    (author, organization, application)
}

/// "Given Family" from an IfcPerson ([1]=FamilyName, [2]=GivenName), or
/// `None` when both parts are blank.
fn person_name(person: &DecodedEntity) -> Option<String> {
    let family = person.get_str(1).unwrap_or("");
    let given = person.get_str(2).unwrap_or("");
    let full = format!("{} {}", given, family).trim().to_string();
    if full.is_empty() {
        None
    } else {
        Some(full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_intel_model::IfcModel;

    // Schema "IFC4", 2 walls, 1 door, 1 window, project "Sample Project".
    const FIXTURE: &str = r#"ISO-10303-21;
HEADER;
FILE_DESCRIPTION((''),'2;1');
FILE_NAME('sample.ifc','2024-05-01',(''),(''),'','','');
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPROJECT('3vB2YO$MX4xv5uCqZZG0Xq',#2,'Sample Project',$,$,$,$,(),$);
#2=IFCOWNERHISTORY(#3,#6,$,.ADDED.,$,$,$,1700000000);
#3=IFCPERSONANDORGANIZATION(#4,#5,$);
#4=IFCPERSON('jdoe','Doe','Jane',$,$,$,$,$);
#5=IFCORGANIZATION($,'Acme Architecture',$,$,$);
#6=IFCAPPLICATION(#5,'1.0','Acme Modeler','acme_modeler');
#10=IFCWALL('0DWgwt6o1FOx7466fPk$jl',#2,'Wall 1',$,$,$,$,$);
#11=IFCWALL('0DWgwt6o1FOx7466fPk$jm',#2,'Wall 2',$,$,$,$,$);
#12=IFCDOOR('0DWgwt6o1FOx7466fPk$jn',#2,'Door 1',$,$,$,$,$,2.1,0.9);
#13=IFCWINDOW('0DWgwt6o1FOx7466fPk$jo',#2,'Window 1',$,$,$,$,$,1.2,0.8);
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn test_metadata_scenario() {
        let model = IfcModel::parse(FIXTURE).unwrap();
        let metadata = parse(&model).unwrap();

        assert_eq!(metadata.model_id, "3vB2YO$MX4xv5uCqZZG0Xq");
        assert_eq!(metadata.project_name, "Sample Project");
        assert_eq!(metadata.schema, "IFC4");

        let mut expected = BTreeMap::new();
        expected.insert("IfcWall".to_string(), 2);
        expected.insert("IfcDoor".to_string(), 1);
        expected.insert("IfcWindow".to_string(), 1);
        assert_eq!(metadata.entity_counts, expected);
    }

    #[test]
    fn test_authoring_chain() {
        let model = IfcModel::parse(FIXTURE).unwrap();
        let metadata = parse(&model).unwrap();

        assert_eq!(metadata.author.as_deref(), Some("Jane Doe"));
        assert_eq!(metadata.organization.as_deref(), Some("Acme Architecture"));
        assert_eq!(metadata.application.as_deref(), Some("Acme Modeler"));
    }

    #[test]
    fn test_authoring_is_optional() {
        let content = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPROJECT('3vB2YO$MX4xv5uCqZZG0Xq',$,'Sample Project',$,$,$,$,(),$);
ENDSEC;
END-ISO-10303-21;
"#;
        let model = IfcModel::parse(content).unwrap();
        let metadata = parse(&model).unwrap();
        assert_eq!(metadata.author, None);
        assert_eq!(metadata.organization, None);
        assert_eq!(metadata.application, None);
    }

    #[test]
    fn test_missing_project_is_schema_error() {
        let content = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#10=IFCWALL('0DWgwt6o1FOx7466fPk$jl',$,'Wall 1',$,$,$,$,$);
ENDSEC;
END-ISO-10303-21;
"#;
        let model = IfcModel::parse(content).unwrap();
        assert!(matches!(parse(&model), Err(ExtractError::Schema(_))));
    }

    #[test]
    fn test_blank_project_name_gets_placeholder() {
        let content = FIXTURE.replace("'Sample Project'", "$");
        let model = IfcModel::parse(&content).unwrap();
        let metadata = parse(&model).unwrap();
        assert_eq!(metadata.project_name, "Unnamed Project");
    }

    #[test]
    fn test_ifc4_only_types_pruned_on_older_schema() {
        let content = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC2X3'));
ENDSEC;
DATA;
#1=IFCPROJECT('3vB2YO$MX4xv5uCqZZG0Xq',$,'Old Project',$,$,$,$,(),$);
#10=IFCFURNISHINGELEMENT('0DWgwt6o1FOx7466fPk$jl',$,'Desk',$,$,$,$,$);
ENDSEC;
END-ISO-10303-21;
"#;
        let model = IfcModel::parse(content).unwrap();
        let metadata = parse(&model).unwrap();

        assert_eq!(metadata.entity_counts.get("IfcFurnishingElement"), Some(&1));
        // IfcFurniture is never queried on a pre-IFC4 schema.
        assert!(!metadata.entity_counts.contains_key("IfcFurniture"));
    }
}
