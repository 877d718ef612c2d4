// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory model handle.
//!
//! [`IfcModel::parse`] decodes every entity line of a STEP file up front and
//! builds the lookup indices the extraction layer queries. A loaded model is
//! immutable; it can be shared freely for concurrent reads.

use crate::entity::{AttributeValue, DecodedEntity};
use crate::error::{Error, Result};
use crate::legacy;
use crate::parser::parse_entity;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::path::Path;

type IdList = SmallVec<[u32; 4]>;

/// Parsed IFC model with entity and relationship indices
#[derive(Debug)]
pub struct IfcModel {
    schema: String,
    entities: FxHashMap<u32, DecodedEntity>,
    type_index: FxHashMap<String, Vec<u32>>,
    guid_index: FxHashMap<String, u32>,
    /// IfcRelAggregates: relating object -> related objects
    aggregates: FxHashMap<u32, IdList>,
    /// IfcRelContainedInSpatialStructure: relating structure -> related elements
    containment: FxHashMap<u32, IdList>,
    /// IfcRelDefinesByProperties: object -> property definitions
    pub(crate) definitions: FxHashMap<u32, IdList>,
    /// IfcRelDefinesByType: object -> type object
    pub(crate) type_objects: FxHashMap<u32, u32>,
    skipped_lines: usize,
}

impl IfcModel {
    /// Read and parse a STEP file from disk.
    pub fn open(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse STEP content into a model.
    ///
    /// Entity lines that fail to decode are skipped and counted; a file
    /// without the STEP magic fails outright.
    pub fn parse(content: &str) -> Result<Self> {
        if !content.trim_start().starts_with("ISO-10303-21") {
            return Err(Error::NotStep);
        }

        let mut model = IfcModel {
            schema: file_schema(content).unwrap_or_else(|| "IFC2X3".to_string()),
            entities: FxHashMap::default(),
            type_index: FxHashMap::default(),
            guid_index: FxHashMap::default(),
            aggregates: FxHashMap::default(),
            containment: FxHashMap::default(),
            definitions: FxHashMap::default(),
            type_objects: FxHashMap::default(),
            skipped_lines: 0,
        };

        for line in EntityLines::new(content) {
            match parse_entity(line) {
                Ok((id, raw_type, tokens)) => {
                    let attributes = tokens.iter().map(AttributeValue::from_token).collect();
                    let entity = DecodedEntity::new(id, raw_type, attributes);
                    model.index_entity(&entity, raw_type);
                    model.entities.insert(id, entity);
                }
                Err(_) => model.skipped_lines += 1,
            }
        }

        Ok(model)
    }

    fn index_entity(&mut self, entity: &DecodedEntity, raw_type: &str) {
        self.type_index
            .entry(raw_type.to_ascii_uppercase())
            .or_default()
            .push(entity.id);

        if let Some(guid) = entity.global_id() {
            self.guid_index.entry(guid.to_string()).or_insert(entity.id);
        }

        // Relationship attribute layout follows the IFC schema: related
        // objects at 4 and relating object at 5, except IfcRelAggregates
        // which puts the relating object first.
        match raw_type.to_ascii_uppercase().as_str() {
            "IFCRELAGGREGATES" => {
                if let (Some(relating), Some(related)) = (entity.get_ref(4), entity.get_list(5)) {
                    let children = self.aggregates.entry(relating).or_default();
                    children.extend(related.iter().filter_map(|v| v.as_entity_ref()));
                }
            }
            "IFCRELCONTAINEDINSPATIALSTRUCTURE" => {
                if let (Some(related), Some(relating)) = (entity.get_list(4), entity.get_ref(5)) {
                    let elements = self.containment.entry(relating).or_default();
                    elements.extend(related.iter().filter_map(|v| v.as_entity_ref()));
                }
            }
            "IFCRELDEFINESBYPROPERTIES" => {
                if let (Some(objects), Some(definition)) = (entity.get_list(4), entity.get_ref(5)) {
                    for object in objects.iter().filter_map(|v| v.as_entity_ref()) {
                        self.definitions.entry(object).or_default().push(definition);
                    }
                }
            }
            "IFCRELDEFINESBYTYPE" => {
                if let (Some(objects), Some(type_object)) = (entity.get_list(4), entity.get_ref(5))
                {
                    for object in objects.iter().filter_map(|v| v.as_entity_ref()) {
                        self.type_objects.insert(object, type_object);
                    }
                }
            }
            _ => {}
        }
    }

    /// Declared schema version, e.g. `IFC4` or `IFC2X3`
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Whether the declared schema is IFC4 or later
    pub fn is_ifc4_or_later(&self) -> bool {
        self.schema.to_ascii_uppercase().starts_with("IFC4")
    }

    /// Number of decoded entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of entity lines that failed to decode during parsing
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    /// Look up an entity by its STEP id.
    pub fn entity(&self, id: u32) -> Option<&DecodedEntity> {
        self.entities.get(&id)
    }

    /// Look up an entity by its GlobalId.
    pub fn by_guid(&self, guid: &str) -> Option<&DecodedEntity> {
        self.guid_index.get(guid).and_then(|id| self.entity(*id))
    }

    /// All instances of a type, in file order, including instances written
    /// with legacy subtype tags (`IfcWall` also returns
    /// `IfcWallStandardCase` instances).
    pub fn by_type(&self, type_name: &str) -> Vec<&DecodedEntity> {
        let upper = type_name.to_ascii_uppercase();
        let mut out = Vec::new();
        self.collect_type(&upper, &mut out);
        for subtype in legacy::legacy_subtypes(&upper) {
            self.collect_type(subtype, &mut out);
        }
        out
    }

    fn collect_type<'a>(&'a self, upper: &str, out: &mut Vec<&'a DecodedEntity>) {
        if let Some(ids) = self.type_index.get(upper) {
            out.extend(ids.iter().filter_map(|id| self.entity(*id)));
        }
    }

    /// Decomposition children of an object (IfcRelAggregates). Dangling
    /// references are silently dropped.
    pub fn decomposition(&self, id: u32) -> Vec<&DecodedEntity> {
        self.resolve(self.aggregates.get(&id))
    }

    /// Elements contained in a spatial structure
    /// (IfcRelContainedInSpatialStructure). Dangling references are
    /// silently dropped.
    pub fn contained_elements(&self, id: u32) -> Vec<&DecodedEntity> {
        self.resolve(self.containment.get(&id))
    }

    fn resolve(&self, ids: Option<&IdList>) -> Vec<&DecodedEntity> {
        ids.map(|ids| ids.iter().filter_map(|id| self.entity(*id)).collect())
            .unwrap_or_default()
    }

    /// LongName of a spatial element. The attribute position depends on the
    /// entity type: IfcProject and IfcZone carry it at index 5, the spatial
    /// structure elements at index 7.
    pub fn long_name<'a>(&self, entity: &'a DecodedEntity) -> Option<&'a str> {
        if entity.is_a("IfcProject") || entity.is_a("IfcZone") {
            entity.get_str(5)
        } else if entity.is_a("IfcSite")
            || entity.is_a("IfcBuilding")
            || entity.is_a("IfcBuildingStorey")
            || entity.is_a("IfcSpace")
        {
            entity.get_str(7)
        } else {
            None
        }
    }
}

/// Extract the first declared schema from the `FILE_SCHEMA` header record.
fn file_schema(content: &str) -> Option<String> {
    let start = content.find("FILE_SCHEMA")?;
    let rest = &content[start..];
    let open = rest.find('\'')?;
    let after = &rest[open + 1..];
    let close = after.find('\'')?;
    let schema = &after[..close];
    if schema.is_empty() {
        None
    } else {
        Some(schema.to_string())
    }
}

/// Iterator over `#id=TYPE(...);` entity line slices, located with
/// SIMD-accelerated byte search.
struct EntityLines<'a> {
    content: &'a str,
    position: usize,
}

impl<'a> EntityLines<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            content,
            position: 0,
        }
    }
}

impl<'a> Iterator for EntityLines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let bytes = self.content.as_bytes();

        loop {
            let remaining = &bytes[self.position..];
            let hash = memchr::memchr(b'#', remaining)?;
            let start = self.position + hash;

            let after_hash = &bytes[start + 1..];
            let digits = after_hash
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .count();
            let mut cursor = start + 1 + digits;
            while cursor < bytes.len() && bytes[cursor].is_ascii_whitespace() {
                cursor += 1;
            }

            // A '#' not followed by `<digits>=` is a reference inside another
            // line; skip past it.
            if digits == 0 || cursor >= bytes.len() || bytes[cursor] != b'=' {
                self.position = start + 1;
                continue;
            }

            match memchr::memchr(b';', &bytes[cursor..]) {
                Some(semi) => {
                    let end = cursor + semi + 1;
                    self.position = end;
                    return Some(&self.content[start..end]);
                }
                None => return None,
            }
        }
    }
}
