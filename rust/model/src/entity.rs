// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoded entities and attribute values.
//!
//! Every accessor returns `Option`: an attribute is either a concrete value
//! or explicitly absent. Callers never probe for attribute existence.

use crate::parser::Token;
use crate::schema;

/// Decoded IFC attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Entity reference
    Ref(u32),
    /// String value (STEP quote escapes unfolded)
    Text(String),
    /// Integer value
    Integer(i64),
    /// Real value
    Real(f64),
    /// Enumeration value, without the surrounding dots
    Enum(String),
    /// List of values
    List(Vec<AttributeValue>),
    /// Wrapped select value, e.g. `IFCLABEL('x')`
    Typed(String, Box<AttributeValue>),
    /// Unset (`$`)
    Null,
    /// Derived (`*`)
    Derived,
}

impl AttributeValue {
    pub fn from_token(token: &Token) -> Self {
        match token {
            Token::Ref(id) => AttributeValue::Ref(*id),
            Token::Str(s) => AttributeValue::Text(unescape(s)),
            Token::Int(i) => AttributeValue::Integer(*i),
            Token::Real(f) => AttributeValue::Real(*f),
            Token::Enum(e) => AttributeValue::Enum((*e).to_string()),
            Token::List(items) => {
                AttributeValue::List(items.iter().map(Self::from_token).collect())
            }
            Token::Typed(type_name, args) => {
                let inner = match args.as_slice() {
                    [single] => Self::from_token(single),
                    many => AttributeValue::List(many.iter().map(Self::from_token).collect()),
                };
                AttributeValue::Typed((*type_name).to_string(), Box::new(inner))
            }
            Token::Null => AttributeValue::Null,
            Token::Derived => AttributeValue::Derived,
        }
    }

    /// Get as entity reference
    #[inline]
    pub fn as_entity_ref(&self) -> Option<u32> {
        match self {
            AttributeValue::Ref(id) => Some(*id),
            _ => None,
        }
    }

    /// Get as string, looking through a select wrapper
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            AttributeValue::Typed(_, inner) => inner.as_str(),
            _ => None,
        }
    }

    /// Get as float, looking through a select wrapper
    #[inline]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttributeValue::Real(f) => Some(*f),
            AttributeValue::Integer(i) => Some(*i as f64),
            AttributeValue::Typed(_, inner) => inner.as_float(),
            _ => None,
        }
    }

    /// Get as integer, looking through a select wrapper
    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            AttributeValue::Typed(_, inner) => inner.as_int(),
            _ => None,
        }
    }

    /// Get as boolean. STEP encodes booleans as `.T.`/`.F.` enumerations,
    /// logicals additionally as `.TRUE.`/`.FALSE.`.
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Enum(e) if e == "T" || e == "TRUE" => Some(true),
            AttributeValue::Enum(e) if e == "F" || e == "FALSE" => Some(false),
            AttributeValue::Typed(_, inner) => inner.as_bool(),
            _ => None,
        }
    }

    /// Get as list
    #[inline]
    pub fn as_list(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Check if unset/derived
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null | AttributeValue::Derived)
    }
}

/// Unfold doubled quote characters inside a STEP string literal.
fn unescape(raw: &str) -> String {
    if raw.contains("''") {
        raw.replace("''", "'")
    } else {
        raw.to_string()
    }
}

/// Decoded IFC entity with attributes
#[derive(Debug, Clone)]
pub struct DecodedEntity {
    pub id: u32,
    /// Canonical type name (`IfcWall`); raw uppercase tag for unknown types
    pub type_name: String,
    pub attributes: Vec<AttributeValue>,
}

impl DecodedEntity {
    pub fn new(id: u32, raw_type: &str, attributes: Vec<AttributeValue>) -> Self {
        let type_name = schema::canonical_name(raw_type)
            .map(str::to_string)
            .unwrap_or_else(|| raw_type.to_ascii_uppercase());
        Self {
            id,
            type_name,
            attributes,
        }
    }

    /// Entity type name, e.g. `IfcWall`
    #[inline]
    pub fn ifc_type(&self) -> &str {
        &self.type_name
    }

    /// Case-insensitive type check
    #[inline]
    pub fn is_a(&self, type_name: &str) -> bool {
        self.type_name.eq_ignore_ascii_case(type_name)
    }

    /// Get attribute by index
    pub fn attr(&self, index: usize) -> Option<&AttributeValue> {
        self.attributes.get(index)
    }

    /// Get entity reference attribute
    pub fn get_ref(&self, index: usize) -> Option<u32> {
        self.attr(index).and_then(|v| v.as_entity_ref())
    }

    /// Get string attribute
    pub fn get_str(&self, index: usize) -> Option<&str> {
        self.attr(index).and_then(|v| v.as_str())
    }

    /// Get float attribute
    pub fn get_float(&self, index: usize) -> Option<f64> {
        self.attr(index).and_then(|v| v.as_float())
    }

    /// Get list attribute
    pub fn get_list(&self, index: usize) -> Option<&[AttributeValue]> {
        self.attr(index).and_then(|v| v.as_list())
    }

    /// GlobalId of a rooted entity (attribute 0)
    pub fn global_id(&self) -> Option<&str> {
        self.get_str(0)
    }

    /// Name of a rooted entity (attribute 2)
    pub fn name(&self) -> Option<&str> {
        self.get_str(2)
    }

    /// Description of a rooted entity (attribute 3)
    pub fn description(&self) -> Option<&str> {
        self.get_str(3)
    }
}
