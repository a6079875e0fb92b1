//! Host tuples as seen by this backend.
//!
//! Tuples are shared as `Arc<Tuple>`; the strong count plays the role of the
//! host's tuple reference count.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// A single field of a tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Unsigned number.
    Num(u64),
    /// UTF-8 string.
    Str(String),
    /// Opaque bytes.
    Bytes(Vec<u8>),
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        Self::Num(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// An immutable row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tuple {
    fields: Vec<FieldValue>,
}

impl Tuple {
    /// Creates a tuple from its fields.
    #[must_use]
    pub fn new(fields: Vec<FieldValue>) -> Self {
        Self { fields }
    }

    /// Returns field `fieldno`, if present.
    #[must_use]
    pub fn field(&self, fieldno: u32) -> Option<&FieldValue> {
        self.fields.get(fieldno as usize)
    }

    /// Returns all fields.
    #[must_use]
    pub fn fields(&self) -> &[FieldValue] {
        &self.fields
    }

    /// Encodes the tuple as the value stored in the engine.
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| CoreError::tuple_encoding(e.to_string()))?;
        Ok(buf)
    }

    /// Decodes a value read back from the engine.
    pub fn decode(bytes: &[u8]) -> CoreResult<Self> {
        ciborium::from_reader(bytes).map_err(|e| CoreError::tuple_encoding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_access() {
        let tuple = Tuple::new(vec![1u64.into(), "name".into()]);
        assert_eq!(tuple.field(0), Some(&FieldValue::Num(1)));
        assert_eq!(tuple.field(1), Some(&FieldValue::Str("name".into())));
        assert_eq!(tuple.field(2), None);
    }

    #[test]
    fn decode_garbage_fails() {
        assert!(matches!(
            Tuple::decode(&[0xff, 0x00, 0x13]),
            Err(CoreError::TupleEncoding { .. })
        ));
    }

    #[test]
    fn encoded_tuple_reads_back() {
        let tuple = Tuple::new(vec![
            7u64.into(),
            FieldValue::Bytes(vec![1, 2, 3]),
        ]);
        let bytes = tuple.encode().unwrap();
        assert_eq!(Tuple::decode(&bytes).unwrap(), tuple);
    }
}
