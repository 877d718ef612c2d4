// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial hierarchy extraction.
//!
//! The tree walk merges two distinct relationship sources: decomposition
//! (IfcRelAggregates) provides the spatial nesting, containment
//! (IfcRelContainedInSpatialStructure) provides the physical elements that
//! occupy a storey or space. Walking only one of them either loses every
//! wall and door or lists child storeys twice.
//!
//! Nesting is constrained to the schema's spatial structure:
//! Project > Site > Building > Storey > Space. Decomposition children
//! outside the current level's admissible set are ignored.

use crate::error::ExtractError;
use ifc_intel_model::{is_spatial_type, DecodedEntity, IfcModel};
use serde::Serialize;

/// One node of the spatial hierarchy tree
#[derive(Debug, Clone, Serialize)]
pub struct SpatialNode {
    pub global_id: String,
    pub name: Option<String>,
    pub ifc_type: String,
    pub description: Option<String>,
    pub long_name: Option<String>,
    pub children: Vec<SpatialNode>,
}

/// Flat spatial element record (no tree structure)
#[derive(Debug, Clone, Serialize)]
pub struct SpatialElement {
    pub global_id: String,
    pub name: Option<String>,
    pub ifc_type: String,
    pub description: Option<String>,
    pub long_name: Option<String>,
}

/// Element record of the storey-scoped query
#[derive(Debug, Clone, Serialize)]
pub struct StoreyElement {
    pub global_id: String,
    pub name: Option<String>,
    pub ifc_type: String,
}

/// Hierarchy levels of the spatial structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpatialLevel {
    Project,
    Site,
    Building,
    Storey,
    Space,
}

impl SpatialLevel {
    fn of(type_name: &str) -> Option<Self> {
        if type_name.eq_ignore_ascii_case("IfcProject") {
            Some(SpatialLevel::Project)
        } else if type_name.eq_ignore_ascii_case("IfcSite") {
            Some(SpatialLevel::Site)
        } else if type_name.eq_ignore_ascii_case("IfcBuilding") {
            Some(SpatialLevel::Building)
        } else if type_name.eq_ignore_ascii_case("IfcBuildingStorey") {
            Some(SpatialLevel::Storey)
        } else if type_name.eq_ignore_ascii_case("IfcSpace") {
            Some(SpatialLevel::Space)
        } else {
            None
        }
    }

    /// Admissible decomposition child types at this level.
    fn admissible_children(self) -> &'static [&'static str] {
        match self {
            SpatialLevel::Project => &["IfcSite"],
            SpatialLevel::Site => &["IfcBuilding"],
            SpatialLevel::Building => &["IfcBuildingStorey"],
            SpatialLevel::Storey => &["IfcSpace"],
            SpatialLevel::Space => &[],
        }
    }

    /// Levels whose contained physical elements are attached as leaves.
    fn carries_elements(self) -> bool {
        matches!(self, SpatialLevel::Storey | SpatialLevel::Space)
    }
}

/// Build the full spatial hierarchy tree, rooted at the project.
pub fn build_tree(model: &IfcModel) -> Result<SpatialNode, ExtractError> {
    let projects = model.by_type("IfcProject");
    let project = projects
        .first()
        .ok_or_else(|| ExtractError::Schema("No IfcProject found in IFC file".to_string()))?;

    Ok(build_node(model, project, SpatialLevel::Project))
}

fn build_node(model: &IfcModel, element: &DecodedEntity, level: SpatialLevel) -> SpatialNode {
    let mut node = make_node(model, element);

    let admissible = level.admissible_children();
    for child in model.decomposition(element.id) {
        let Some(child_level) = SpatialLevel::of(child.ifc_type()) else {
            continue;
        };
        if !admissible.iter().any(|t| child.is_a(t)) {
            continue;
        }
        node.children.push(build_node(model, child, child_level));
    }

    if level.carries_elements() {
        for contained in model.contained_elements(element.id) {
            // A spatial element reached through containment would already
            // appear through decomposition; listing it here would count
            // spatial containment as physical occupancy.
            if is_spatial_type(contained.ifc_type()) {
                continue;
            }
            node.children.push(make_node(model, contained));
        }
    }

    node
}

fn make_node(model: &IfcModel, element: &DecodedEntity) -> SpatialNode {
    SpatialNode {
        global_id: element.global_id().unwrap_or_default().to_string(),
        name: element.name().map(str::to_string),
        ifc_type: element.ifc_type().to_string(),
        description: element.description().map(str::to_string),
        long_name: model.long_name(element).map(str::to_string),
        children: Vec::new(),
    }
}

/// All spatial elements as a flat list, one pass per spatial type.
pub fn flat_elements(model: &IfcModel) -> Vec<SpatialElement> {
    let mut elements = Vec::new();

    for spatial_type in ifc_intel_model::SPATIAL_TYPES {
        for element in model.by_type(spatial_type) {
            elements.push(SpatialElement {
                global_id: element.global_id().unwrap_or_default().to_string(),
                name: element.name().map(str::to_string),
                ifc_type: element.ifc_type().to_string(),
                description: element.description().map(str::to_string),
                long_name: model.long_name(element).map(str::to_string),
            });
        }
    }

    elements
}

/// Direct decomposition set of one storey, resolved by GlobalId.
///
/// This is deliberately shallower than the tree walk above: it returns the
/// raw decomposition children, unfiltered and without the containment
/// merge. Callers wanting the occupants of a storey want the tree; callers
/// wanting its structural breakdown want this.
pub fn storey_decomposition(
    model: &IfcModel,
    storey_guid: &str,
) -> Result<Vec<StoreyElement>, ExtractError> {
    let storey = model.by_guid(storey_guid).ok_or_else(|| {
        ExtractError::NotFound(format!(
            "Building storey with GUID {} not found",
            storey_guid
        ))
    })?;

    if !storey.is_a("IfcBuildingStorey") {
        return Err(ExtractError::TypeMismatch {
            guid: storey_guid.to_string(),
            expected: "IfcBuildingStorey",
        });
    }

    Ok(model
        .decomposition(storey.id)
        .into_iter()
        .map(|element| StoreyElement {
            global_id: element.global_id().unwrap_or_default().to_string(),
            name: element.name().map(str::to_string),
            ifc_type: element.ifc_type().to_string(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_intel_model::IfcModel;

    // Project > Site > Building > Storey > Space, walls and a door on the
    // storey, furniture in the space. #40 aggregates the space under the
    // storey AND lists it as contained, which must not duplicate it.
    const FIXTURE: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPROJECT('ProjGuid0000000000000p',$,'Project',$,$,'The project',$,(),$);
#2=IFCSITE('SiteGuid00000000000000',$,'Site',$,$,$,$,'Site grounds',.ELEMENT.,$,$,0.,$,$);
#3=IFCBUILDING('BldgGuid00000000000000',$,'Building A',$,$,$,$,'Headquarters',.ELEMENT.,$,$,$);
#4=IFCBUILDINGSTOREY('StryGuid00000000000000',$,'Level 1',$,$,$,$,'Ground floor',.ELEMENT.,0.);
#5=IFCSPACE('SpceGuid00000000000000',$,'Office 101',$,$,$,$,'Corner office',.ELEMENT.,.INTERNAL.,$);
#10=IFCWALL('WallGuid0000000000000a',$,'Wall 1',$,$,$,$,$);
#11=IFCWALL('WallGuid0000000000000b',$,'Wall 2',$,$,$,$,$);
#12=IFCDOOR('DoorGuid0000000000000a',$,'Door 1',$,$,$,$,$,2.1,0.9);
#13=IFCFURNISHINGELEMENT('FurnGuid0000000000000a',$,'Desk',$,$,$,$,$);
#30=IFCRELAGGREGATES('RelAGuid0000000000000a',$,$,$,#1,(#2));
#31=IFCRELAGGREGATES('RelAGuid0000000000000b',$,$,$,#2,(#3));
#32=IFCRELAGGREGATES('RelAGuid0000000000000c',$,$,$,#3,(#4));
#33=IFCRELAGGREGATES('RelAGuid0000000000000d',$,$,$,#4,(#5));
#40=IFCRELCONTAINEDINSPATIALSTRUCTURE('RelCGuid0000000000000a',$,$,$,(#10,#11,#12,#5),#4);
#41=IFCRELCONTAINEDINSPATIALSTRUCTURE('RelCGuid0000000000000b',$,$,$,(#13),#5);
ENDSEC;
END-ISO-10303-21;
"#;

    fn assert_level_validity(node: &SpatialNode) {
        let admissible: &[&str] = match node.ifc_type.as_str() {
            "IfcProject" => &["IfcSite"],
            "IfcSite" => &["IfcBuilding"],
            "IfcBuilding" => &["IfcBuildingStorey"],
            "IfcBuildingStorey" => &["IfcSpace"],
            "IfcSpace" => &[],
            _ => return, // contained leaf
        };
        for child in &node.children {
            if is_spatial_type(&child.ifc_type) {
                assert!(
                    admissible.contains(&child.ifc_type.as_str()),
                    "{} may not nest under {}",
                    child.ifc_type,
                    node.ifc_type
                );
            } else {
                assert!(
                    node.ifc_type == "IfcBuildingStorey" || node.ifc_type == "IfcSpace",
                    "physical element under {}",
                    node.ifc_type
                );
                assert!(child.children.is_empty());
            }
            assert_level_validity(child);
        }
    }

    #[test]
    fn test_tree_structure() {
        let model = IfcModel::parse(FIXTURE).unwrap();
        let tree = build_tree(&model).unwrap();

        assert_eq!(tree.ifc_type, "IfcProject");
        assert_eq!(tree.long_name.as_deref(), Some("The project"));
        assert_eq!(tree.children.len(), 1);

        let site = &tree.children[0];
        assert_eq!(site.ifc_type, "IfcSite");
        let building = &site.children[0];
        assert_eq!(building.ifc_type, "IfcBuilding");
        let storey = &building.children[0];
        assert_eq!(storey.ifc_type, "IfcBuildingStorey");
        assert_eq!(storey.long_name.as_deref(), Some("Ground floor"));

        // Space (via decomposition) + 3 physical elements (via containment)
        assert_eq!(storey.children.len(), 4);

        assert_level_validity(&tree);
    }

    #[test]
    fn test_space_listed_once_despite_containment() {
        let model = IfcModel::parse(FIXTURE).unwrap();
        let tree = build_tree(&model).unwrap();

        let storey = &tree.children[0].children[0].children[0];
        let spaces: Vec<_> = storey
            .children
            .iter()
            .filter(|c| c.ifc_type == "IfcSpace")
            .collect();
        assert_eq!(spaces.len(), 1);

        // The space keeps its own contained furniture as a leaf.
        let space = spaces[0];
        assert_eq!(space.children.len(), 1);
        assert_eq!(space.children[0].ifc_type, "IfcFurnishingElement");
        assert!(space.children[0].children.is_empty());
    }

    #[test]
    fn test_missing_project_is_schema_error() {
        let content = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#10=IFCWALL('WallGuid0000000000000a',$,'Wall 1',$,$,$,$,$);
ENDSEC;
END-ISO-10303-21;
"#;
        let model = IfcModel::parse(content).unwrap();
        assert!(matches!(build_tree(&model), Err(ExtractError::Schema(_))));
    }

    #[test]
    fn test_dangling_child_does_not_abort_tree() {
        let content = FIXTURE.replace("#1,(#2)", "#1,(#2,#99)");
        let model = IfcModel::parse(&content).unwrap();
        let tree = build_tree(&model).unwrap();
        assert_eq!(tree.children.len(), 1);
    }

    #[test]
    fn test_flat_elements() {
        let model = IfcModel::parse(FIXTURE).unwrap();
        let elements = flat_elements(&model);

        assert_eq!(elements.len(), 5);
        assert!(elements.iter().all(|e| is_spatial_type(&e.ifc_type)));
        assert!(elements.iter().any(|e| e.ifc_type == "IfcSpace"));
    }

    #[test]
    fn test_storey_decomposition_is_shallow_and_unfiltered() {
        let model = IfcModel::parse(FIXTURE).unwrap();
        let elements = storey_decomposition(&model, "StryGuid00000000000000").unwrap();

        // Only the aggregated space; contained walls are not merged in.
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].ifc_type, "IfcSpace");
    }

    #[test]
    fn test_storey_query_errors() {
        let model = IfcModel::parse(FIXTURE).unwrap();

        assert!(matches!(
            storey_decomposition(&model, "NoSuchGuid000000000000"),
            Err(ExtractError::NotFound(_))
        ));
        assert!(matches!(
            storey_decomposition(&model, "WallGuid0000000000000a"),
            Err(ExtractError::TypeMismatch { .. })
        ));
    }
}
