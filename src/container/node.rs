//! Arena storage for the record tree.

use super::property::{ArrayData, Property};

/// Index of a record in its [`Document`](super::Document) arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A named record with typed properties.
///
/// Children are stored as arena ids in file order.
#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    pub properties: Vec<Property>,
    pub children: Vec<NodeId>,
    /// Absolute offset one past the last byte of this record.
    pub end_offset: usize,
}

impl Node {
    /// First property as a string.
    pub fn first_str(&self) -> Option<&str> {
        self.properties.first().and_then(Property::as_str)
    }

    /// Numeric payload of this record as f64 values.
    ///
    /// Handles both encodings: a single array property, or a run of scalar
    /// properties (the early-version style, one value per property).
    pub fn f64_values(&self) -> Vec<f64> {
        if let Some(array) = self.properties.first().and_then(Property::as_array) {
            return match &array.data {
                ArrayData::F64(v) => v.clone(),
                ArrayData::F32(v) => v.iter().map(|&x| x as f64).collect(),
                ArrayData::I32(v) => v.iter().map(|&x| x as f64).collect(),
                ArrayData::I64(v) => v.iter().map(|&x| x as f64).collect(),
                ArrayData::Bool(v) => v.iter().map(|&x| if x { 1.0 } else { 0.0 }).collect(),
            };
        }
        self.properties.iter().filter_map(Property::as_f64).collect()
    }

    /// Integer payload of this record as i64 values.
    ///
    /// Like [`f64_values`](Self::f64_values); floating point entries are
    /// rejected by returning `None` rather than truncated.
    pub fn i64_values(&self) -> Option<Vec<i64>> {
        if let Some(array) = self.properties.first().and_then(Property::as_array) {
            return match &array.data {
                ArrayData::I32(v) => Some(v.iter().map(|&x| x as i64).collect()),
                ArrayData::I64(v) => Some(v.clone()),
                ArrayData::Bool(v) => Some(v.iter().map(|&x| x as i64).collect()),
                ArrayData::F32(_) | ArrayData::F64(_) => None,
            };
        }
        self.properties.iter().map(Property::as_i64).collect()
    }
}
