// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-element property extraction.
//!
//! The merged set view from the model is partitioned into three buckets by
//! set name: `Qto_*` sets are quantities, `*Type` / `*Type.*` sets come
//! from the element's type, the rest are plain property sets. Values are
//! coerced into JSON-safe shapes on the way out.

use crate::error::ExtractError;
use ifc_intel_model::{IfcModel, PropValue};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Keys the underlying set view uses for bookkeeping, never exported.
const RESERVED_KEYS: [&str; 2] = ["id", "type"];

type PropertyBucket = BTreeMap<String, BTreeMap<String, Value>>;

/// All properties of one element
#[derive(Debug, Clone, Serialize)]
pub struct ElementProperties {
    pub global_id: String,
    pub element_type: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub property_sets: PropertyBucket,
    pub quantities: PropertyBucket,
    pub type_properties: PropertyBucket,
}

impl ElementProperties {
    /// True when no bucket holds any set.
    pub fn is_empty(&self) -> bool {
        self.property_sets.is_empty()
            && self.quantities.is_empty()
            && self.type_properties.is_empty()
    }
}

/// Extract all properties of the element with the given GlobalId.
pub fn extract(model: &IfcModel, global_id: &str) -> Result<ElementProperties, ExtractError> {
    let element = model.by_guid(global_id).ok_or_else(|| {
        ExtractError::NotFound(format!("Element not found with GlobalId: {}", global_id))
    })?;

    let merged = model
        .property_sets(element.id)
        .map_err(|e| ExtractError::Schema(format!("Broken property definition: {}", e)))?;

    let mut property_sets = PropertyBucket::new();
    let mut quantities = PropertyBucket::new();
    let mut type_properties = PropertyBucket::new();

    for (set_name, props) in merged {
        let cleaned = clean_set(&props);
        if set_name.starts_with("Qto_") {
            quantities.insert(set_name, cleaned);
        } else if set_name.ends_with("Type") || set_name.contains("Type.") {
            type_properties.insert(set_name, cleaned);
        } else {
            property_sets.insert(set_name, cleaned);
        }
    }

    Ok(ElementProperties {
        global_id: global_id.to_string(),
        element_type: element.ifc_type().to_string(),
        name: element.name().map(str::to_string),
        description: element.description().map(str::to_string),
        property_sets,
        quantities,
        type_properties,
    })
}

/// Extract properties for many elements. Identifiers that fail to resolve
/// are skipped; partial results are valid results.
pub fn extract_batch(
    model: &IfcModel,
    global_ids: &[String],
) -> BTreeMap<String, ElementProperties> {
    let mut results = BTreeMap::new();
    for global_id in global_ids {
        match extract(model, global_id) {
            Ok(properties) => {
                results.insert(global_id.clone(), properties);
            }
            Err(e) => {
                tracing::debug!(global_id = %global_id, error = %e, "skipping element");
            }
        }
    }
    results
}

/// Drop bookkeeping keys and coerce every value to a JSON-safe shape.
fn clean_set(props: &BTreeMap<String, PropValue>) -> BTreeMap<String, Value> {
    props
        .iter()
        .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), coerce(value)))
        .collect()
}

/// Primitives pass through; list elements are mapped one by one, with
/// non-primitive elements rendered as strings; anything else is rendered
/// as a string outright.
fn coerce(value: &PropValue) -> Value {
    match value {
        PropValue::Null => Value::Null,
        PropValue::Bool(b) => Value::Bool(*b),
        PropValue::Integer(i) => Value::from(*i),
        PropValue::Real(f) => {
            serde_json::Number::from_f64(*f).map(Value::Number).unwrap_or_else(|| {
                // Non-finite reals have no JSON representation.
                Value::String(f.to_string())
            })
        }
        PropValue::Text(s) => Value::String(s.clone()),
        PropValue::List(items) => Value::Array(
            items
                .iter()
                .map(|item| {
                    if item.is_scalar() {
                        coerce(item)
                    } else {
                        Value::String(item.to_string())
                    }
                })
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_intel_model::IfcModel;

    const FIXTURE: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#10=IFCWALL('WallGuid0000000000000a',$,'Wall 1','South wall',$,$,$,$);
#40=IFCPROPERTYSET('PsetGuid0000000000000a',$,'Pset_WallCommon',$,(#41,#42,#43));
#41=IFCPROPERTYSINGLEVALUE('IsExternal',$,IFCBOOLEAN(.T.),$);
#42=IFCPROPERTYSINGLEVALUE('FireRating',$,IFCLABEL('REI30'),$);
#43=IFCPROPERTYLISTVALUE('Layers',$,(IFCLABEL('Brick'),(1.,2.)),$);
#44=IFCELEMENTQUANTITY('QsetGuid0000000000000a',$,'Qto_WallBaseQuantities',$,$,(#45));
#45=IFCQUANTITYAREA('NetSideArea',$,$,11.25);
#50=IFCWALLTYPE('TypeGuid0000000000000a',$,'Basic Wall',$,$,(#51),$,$,$,.STANDARD.);
#51=IFCPROPERTYSET('PsetGuid0000000000000b',$,'Pset_WallCommonType',$,(#52));
#52=IFCPROPERTYSINGLEVALUE('ThermalTransmittance',$,IFCREAL(0.24),$);
#60=IFCRELDEFINESBYPROPERTIES('RelPGuid0000000000000a',$,$,$,(#10),#40);
#61=IFCRELDEFINESBYPROPERTIES('RelPGuid0000000000000b',$,$,$,(#10),#44);
#62=IFCRELDEFINESBYTYPE('RelTGuid0000000000000a',$,$,$,(#10),#50);
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn test_partition() {
        let model = IfcModel::parse(FIXTURE).unwrap();
        let props = extract(&model, "WallGuid0000000000000a").unwrap();

        assert_eq!(props.element_type, "IfcWall");
        assert_eq!(props.name.as_deref(), Some("Wall 1"));
        assert_eq!(props.description.as_deref(), Some("South wall"));

        assert!(props.property_sets.contains_key("Pset_WallCommon"));
        assert!(props.quantities.contains_key("Qto_WallBaseQuantities"));
        assert!(props.type_properties.contains_key("Pset_WallCommonType"));
        assert_eq!(props.property_sets.len(), 1);
        assert_eq!(props.quantities.len(), 1);
        assert_eq!(props.type_properties.len(), 1);
    }

    #[test]
    fn test_partition_is_complete_and_disjoint() {
        let model = IfcModel::parse(FIXTURE).unwrap();
        let merged = model
            .property_sets(model.by_guid("WallGuid0000000000000a").unwrap().id)
            .unwrap();
        let props = extract(&model, "WallGuid0000000000000a").unwrap();

        for (set_name, set) in &merged {
            let buckets = [
                props.property_sets.get(set_name),
                props.quantities.get(set_name),
                props.type_properties.get(set_name),
            ];
            let placed: Vec<_> = buckets.iter().flatten().collect();
            assert_eq!(placed.len(), 1, "set {} must land in one bucket", set_name);

            let cleaned = placed[0];
            let expected_keys: Vec<_> = set
                .keys()
                .filter(|k| !RESERVED_KEYS.contains(&k.as_str()))
                .collect();
            assert_eq!(cleaned.keys().collect::<Vec<_>>(), expected_keys);
        }
    }

    #[test]
    fn test_reserved_keys_dropped() {
        let model = IfcModel::parse(FIXTURE).unwrap();
        let props = extract(&model, "WallGuid0000000000000a").unwrap();
        let common = &props.property_sets["Pset_WallCommon"];
        assert!(!common.contains_key("id"));
        assert!(!common.contains_key("type"));
    }

    #[test]
    fn test_value_coercion() {
        let model = IfcModel::parse(FIXTURE).unwrap();
        let props = extract(&model, "WallGuid0000000000000a").unwrap();

        let common = &props.property_sets["Pset_WallCommon"];
        assert_eq!(common["IsExternal"], Value::Bool(true));
        assert_eq!(common["FireRating"], Value::String("REI30".into()));

        // List values: scalar elements pass through, the nested list is
        // rendered as a string.
        let layers = common["Layers"].as_array().unwrap();
        assert_eq!(layers[0], Value::String("Brick".into()));
        assert_eq!(layers[1], Value::String("(1, 2)".into()));

        let quantities = &props.quantities["Qto_WallBaseQuantities"];
        assert_eq!(quantities["NetSideArea"], Value::from(11.25));
    }

    #[test]
    fn test_unknown_guid_is_not_found() {
        let model = IfcModel::parse(FIXTURE).unwrap();
        assert!(matches!(
            extract(&model, "NoSuchGuid000000000000"),
            Err(ExtractError::NotFound(_))
        ));
    }

    #[test]
    fn test_batch_skips_unresolved() {
        let model = IfcModel::parse(FIXTURE).unwrap();
        let results = extract_batch(
            &model,
            &[
                "WallGuid0000000000000a".to_string(),
                "NoSuchGuid000000000000".to_string(),
            ],
        );
        assert_eq!(results.len(), 1);
        assert!(results.contains_key("WallGuid0000000000000a"));
    }
}
