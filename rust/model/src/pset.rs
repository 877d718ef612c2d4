// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Merged property-set view.
//!
//! Collects every property set reachable from an object: sets inherited
//! from its type object first, then directly assigned property and quantity
//! sets, which override inherited sets of the same name. Each set carries
//! its defining entity id under the reserved `id` key.

use crate::entity::{AttributeValue, DecodedEntity};
use crate::error::{Error, Result};
use crate::model::IfcModel;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A single property or quantity value in JSON-compatible shape
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    List(Vec<PropValue>),
}

impl PropValue {
    fn from_attribute(value: &AttributeValue) -> Self {
        if let Some(b) = value.as_bool() {
            return PropValue::Bool(b);
        }
        match value {
            AttributeValue::Text(s) => PropValue::Text(s.clone()),
            AttributeValue::Integer(i) => PropValue::Integer(*i),
            AttributeValue::Real(f) => PropValue::Real(*f),
            AttributeValue::Enum(e) => PropValue::Text(e.clone()),
            AttributeValue::Typed(_, inner) => Self::from_attribute(inner),
            AttributeValue::List(items) => {
                PropValue::List(items.iter().map(Self::from_attribute).collect())
            }
            AttributeValue::Ref(id) => PropValue::Text(format!("#{}", id)),
            AttributeValue::Null | AttributeValue::Derived => PropValue::Null,
        }
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, PropValue::List(_))
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Null => write!(f, "null"),
            PropValue::Bool(b) => write!(f, "{}", b),
            PropValue::Integer(i) => write!(f, "{}", i),
            PropValue::Real(r) => write!(f, "{}", r),
            PropValue::Text(s) => write!(f, "{}", s),
            PropValue::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Properties of one set, keyed by property name
pub type PropMap = BTreeMap<String, PropValue>;

/// All sets of an object, keyed by set name
pub type PsetMap = BTreeMap<String, PropMap>;

impl IfcModel {
    /// Merged property-set view of an object: type-inherited sets, then
    /// directly assigned property sets and quantity sets.
    ///
    /// A dangling reference to a set definition or one of its members is an
    /// error; the file structure is broken at that point and silently
    /// returning a partial set would hide it. Callers that tolerate broken
    /// elements catch this per object.
    pub fn property_sets(&self, object_id: u32) -> Result<PsetMap> {
        let mut merged = PsetMap::new();

        if let Some(&type_id) = self.type_objects.get(&object_id) {
            let type_object = self
                .entity(type_id)
                .ok_or(Error::EntityNotFound(type_id))?;
            // IfcTypeObject.HasPropertySets is attribute 5
            if let Some(set_refs) = type_object.get_list(5) {
                for set_ref in set_refs {
                    if let Some(set_id) = set_ref.as_entity_ref() {
                        self.read_definition(set_id, &mut merged)?;
                    }
                }
            }
        }

        if let Some(definition_ids) = self.definitions.get(&object_id) {
            for &definition_id in definition_ids {
                self.read_definition(definition_id, &mut merged)?;
            }
        }

        Ok(merged)
    }

    fn read_definition(&self, definition_id: u32, merged: &mut PsetMap) -> Result<()> {
        let definition = self
            .entity(definition_id)
            .ok_or(Error::EntityNotFound(definition_id))?;

        if definition.is_a("IfcPropertySet") {
            // [2]=Name, [4]=HasProperties
            let Some(name) = definition.get_str(2) else {
                return Ok(());
            };
            let mut props = PropMap::new();
            props.insert("id".to_string(), PropValue::Integer(definition.id as i64));
            if let Some(property_refs) = definition.get_list(4) {
                for property_ref in property_refs {
                    if let Some(property_id) = property_ref.as_entity_ref() {
                        let property = self
                            .entity(property_id)
                            .ok_or(Error::EntityNotFound(property_id))?;
                        if let Some((key, value)) = read_property(property) {
                            props.insert(key, value);
                        }
                    }
                }
            }
            merged.insert(name.to_string(), props);
        } else if definition.is_a("IfcElementQuantity") {
            // [2]=Name, [5]=Quantities
            let Some(name) = definition.get_str(2) else {
                return Ok(());
            };
            let mut quantities = PropMap::new();
            quantities.insert("id".to_string(), PropValue::Integer(definition.id as i64));
            if let Some(quantity_refs) = definition.get_list(5) {
                for quantity_ref in quantity_refs {
                    if let Some(quantity_id) = quantity_ref.as_entity_ref() {
                        let quantity = self
                            .entity(quantity_id)
                            .ok_or(Error::EntityNotFound(quantity_id))?;
                        if let Some((key, value)) = read_quantity(quantity) {
                            quantities.insert(key, value);
                        }
                    }
                }
            }
            merged.insert(name.to_string(), quantities);
        }
        // Other definition kinds (e.g. IfcPropertySetTemplate) are not part
        // of the extraction surface and are skipped.

        Ok(())
    }
}

/// Read one IfcProperty. Single and list values are supported; other
/// property kinds are skipped.
fn read_property(property: &DecodedEntity) -> Option<(String, PropValue)> {
    if property.is_a("IfcPropertySingleValue") {
        // [0]=Name, [2]=NominalValue
        let name = property.get_str(0)?;
        let value = property
            .attr(2)
            .map(PropValue::from_attribute)
            .unwrap_or(PropValue::Null);
        Some((name.to_string(), value))
    } else if property.is_a("IfcPropertyListValue") {
        // [0]=Name, [2]=ListValues
        let name = property.get_str(0)?;
        let values = property
            .get_list(2)
            .map(|items| items.iter().map(PropValue::from_attribute).collect())
            .unwrap_or_default();
        Some((name.to_string(), PropValue::List(values)))
    } else {
        None
    }
}

/// Read one IfcPhysicalQuantity. All six simple quantity kinds carry
/// [0]=Name and the numeric value at [3].
fn read_quantity(quantity: &DecodedEntity) -> Option<(String, PropValue)> {
    const QUANTITY_TYPES: [&str; 6] = [
        "IfcQuantityLength",
        "IfcQuantityArea",
        "IfcQuantityVolume",
        "IfcQuantityCount",
        "IfcQuantityWeight",
        "IfcQuantityTime",
    ];
    if !QUANTITY_TYPES.iter().any(|t| quantity.is_a(t)) {
        return None;
    }
    let name = quantity.get_str(0)?;
    let value = quantity.get_float(3)?;
    Some((name.to_string(), PropValue::Real(value)))
}
