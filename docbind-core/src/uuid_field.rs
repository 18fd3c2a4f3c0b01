//! UUID values stored as BSON binary.
//!
//! [`UuidField`] wraps a [`Uuid`] and persists it as 16 bytes of binary subtype 3 (legacy UUID),
//! the layout older drivers write. Use it for record fields that have to stay readable by them.

use bson::{Binary, spec::BinarySubtype};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct UuidField {
    pub data: Uuid,
}

impl UuidField {
    /// A random (version 4) UUID.
    pub fn new() -> Self {
        Self { data: Uuid::new_v4() }
    }
}

impl From<Uuid> for UuidField {
    fn from(data: Uuid) -> Self {
        Self { data }
    }
}

impl From<UuidField> for Uuid {
    fn from(field: UuidField) -> Self {
        field.data
    }
}

impl fmt::Display for UuidField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.data, f)
    }
}

impl Serialize for UuidField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Binary {
            subtype: BinarySubtype::UuidOld,
            bytes: self.data.as_bytes().to_vec(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for UuidField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let binary = Binary::deserialize(deserializer)?;
        let data = Uuid::from_slice(&binary.bytes).map_err(D::Error::custom)?;

        Ok(Self { data })
    }
}

#[cfg(test)]
mod tests {
    use bson::{Bson, de::deserialize_from_bson, ser::serialize_to_bson};

    use super::*;

    #[test]
    fn test_serializes_as_legacy_uuid_binary() {
        let field = UuidField::new();

        match serialize_to_bson(&field).unwrap() {
            Bson::Binary(binary) => {
                assert_eq!(binary.subtype, BinarySubtype::UuidOld);
                assert_eq!(binary.bytes, field.data.as_bytes().to_vec());
            }
            other => panic!("expected binary, got {other:?}"),
        }
    }

    #[test]
    fn test_reads_back_stored_value() {
        let field = UuidField::from(Uuid::new_v4());

        let stored = serialize_to_bson(&field).unwrap();
        let restored: UuidField = deserialize_from_bson(stored).unwrap();

        assert_eq!(restored, field);
    }

    #[test]
    fn test_rejects_binary_of_wrong_length() {
        let stored = Bson::Binary(Binary { subtype: BinarySubtype::UuidOld, bytes: vec![1, 2, 3] });

        assert!(deserialize_from_bson::<UuidField>(stored).is_err());
    }

    #[test]
    fn test_new_is_random() {
        assert_ne!(UuidField::new(), UuidField::new());
        assert!(UuidField::default().data.is_nil());
    }
}
