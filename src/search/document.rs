//! Documents, field values and document ids

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque document id, stored in the index as a string member
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(String);

impl DocId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DocId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&String> for DocId {
    fn from(id: &String) -> Self {
        Self(id.clone())
    }
}

impl From<&DocId> for DocId {
    fn from(id: &DocId) -> Self {
        id.clone()
    }
}

macro_rules! doc_id_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for DocId {
                fn from(id: $t) -> Self {
                    Self(id.to_string())
                }
            }
        )*
    };
}

doc_id_from_int!(i32, i64, u32, u64, usize);

/// A single field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Scalar {
    /// Empty text, zero, NaN and `false` are not indexed
    pub fn is_falsy(&self) -> bool {
        match self {
            Scalar::Bool(b) => !b,
            Scalar::Number(n) => *n == 0.0 || n.is_nan(),
            Scalar::Text(s) => s.is_empty(),
        }
    }

    /// Sorted-set score of an exact-match value
    pub fn score(&self) -> f64 {
        match self {
            Scalar::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Scalar::Number(n) => *n,
            Scalar::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()).unwrap_or(0.0),
        }
    }
}

/// Renders the value as it appears in keys and reverse index sets
impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

macro_rules! scalar_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Scalar {
                fn from(value: $t) -> Self {
                    Scalar::Number(value as f64)
                }
            }
        )*
    };
}

scalar_from_number!(i32, i64, u32, u64, f32, f64);

/// Value of a document field: one scalar or a list of scalars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(Scalar),
    List(Vec<Scalar>),
}

impl FieldValue {
    /// Scalars that will be indexed, falsy ones dropped
    pub fn indexable(&self) -> Vec<&Scalar> {
        match self {
            FieldValue::Single(scalar) => {
                if scalar.is_falsy() {
                    Vec::new()
                } else {
                    vec![scalar]
                }
            }
            FieldValue::List(scalars) => scalars.iter().filter(|s| !s.is_falsy()).collect(),
        }
    }
}

macro_rules! field_value_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FieldValue {
                fn from(value: $t) -> Self {
                    FieldValue::Single(value.into())
                }
            }

            impl From<Vec<$t>> for FieldValue {
                fn from(values: Vec<$t>) -> Self {
                    FieldValue::List(values.into_iter().map(Into::into).collect())
                }
            }
        )*
    };
}

field_value_from!(&str, String, bool, i32, i64, u32, u64, f32, f64);

impl From<Scalar> for FieldValue {
    fn from(value: Scalar) -> Self {
        FieldValue::Single(value)
    }
}

impl From<Vec<Scalar>> for FieldValue {
    fn from(values: Vec<Scalar>) -> Self {
        FieldValue::List(values)
    }
}

/// A document to index: field name to value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: BTreeMap<String, FieldValue>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a field
    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
