//! Tag-based archiving and the process-wide object factory
//!
//! Every serializable object reports a numeric tag and a JSON payload. An
//! [`Archive`] pairs the two; [`Factory::create`] maps the tag back to a
//! constructor. Built-in tables and collections are registered the first time
//! the factory is used; downstream crates register their own models.

use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

use algokit_core::{Error, ErrorDetail, ErrorKind, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::collection::DataObject;
use crate::table::NumericTablePtr;

/// Serialization tags of the built-in objects
///
/// Table tags are a base plus [`element_offset`] of the native type.
pub mod tags {
    use algokit_core::DataType;

    pub const HOMOGEN_TABLE: u32 = 1000;
    pub const SOA_TABLE: u32 = 1010;
    pub const AOS_TABLE: u32 = 1020;
    pub const CSR_TABLE: u32 = 1030;
    pub const PACKED_TABLE: u32 = 1040;
    pub const DIAGONAL_TABLE: u32 = 1050;
    pub const MERGED_TABLE: u32 = 1060;
    pub const ROW_MERGED_TABLE: u32 = 1070;

    pub const DATA_COLLECTION: u32 = 1101;
    pub const KEY_VALUE_COLLECTION: u32 = 1102;

    pub fn element_offset(data_type: DataType) -> u32 {
        match data_type {
            DataType::F64 => 0,
            DataType::F32 => 1,
            DataType::I32 => 2,
        }
    }

    pub fn typed(base: u32, data_type: DataType) -> u32 {
        base + element_offset(data_type)
    }
}

/// Serde adapter for value arrays that may hold NaN or infinities
///
/// JSON numbers cannot represent non-finite floats, so those elements are
/// written as the strings `"NaN"`, `"inf"` and `"-inf"`. Finite elements stay
/// plain numbers. Use with `#[serde(with = "...")]` on `Vec<T>` fields, or the
/// [`option`](lossless::option) and [`nested`](lossless::nested) variants.
pub mod lossless {
    use algokit_core::Numeric;
    use serde::de::{self, Deserialize, Deserializer};
    use serde::ser::{Serialize, SerializeSeq, Serializer};

    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Element<T> {
        Number(T),
        Special(String),
    }

    struct Values<'a, T>(&'a [T]);

    impl<T: Numeric + Serialize> Serialize for Values<'_, T> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
            for value in self.0 {
                if value.is_finite_value() {
                    seq.serialize_element(value)?;
                } else {
                    seq.serialize_element(special_name(value.as_f64()))?;
                }
            }
            seq.end()
        }
    }

    struct OwnedValues<T>(Vec<T>);

    impl<'de, T: Numeric + Deserialize<'de>> Deserialize<'de> for OwnedValues<T> {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            Vec::<Element<T>>::deserialize(deserializer)?
                .into_iter()
                .map(|element| match element {
                    Element::Number(value) => Ok(value),
                    Element::Special(name) => parse_special(&name),
                })
                .collect::<Result<Vec<T>, D::Error>>()
                .map(OwnedValues)
        }
    }

    fn special_name(value: f64) -> &'static str {
        if value.is_nan() {
            "NaN"
        } else if value > 0.0 {
            "inf"
        } else {
            "-inf"
        }
    }

    fn parse_special<T: Numeric, E: de::Error>(name: &str) -> Result<T, E> {
        match name {
            "NaN" => Ok(T::from_f64(f64::NAN)),
            "inf" => Ok(T::from_f64(f64::INFINITY)),
            "-inf" => Ok(T::from_f64(f64::NEG_INFINITY)),
            other => Err(E::custom(format!("unknown non-finite value {other:?}"))),
        }
    }

    #[allow(clippy::ptr_arg)]
    pub fn serialize<T, S>(values: &Vec<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Numeric + Serialize,
        S: Serializer,
    {
        Values(values.as_slice()).serialize(serializer)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        T: Numeric + Deserialize<'de>,
        D: Deserializer<'de>,
    {
        OwnedValues::deserialize(deserializer).map(|values| values.0)
    }

    /// `Option<Vec<T>>` fields
    pub mod option {
        use super::*;

        pub fn serialize<T, S>(values: &Option<Vec<T>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            T: Numeric + Serialize,
            S: Serializer,
        {
            match values {
                Some(values) => serializer.serialize_some(&Values(values.as_slice())),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
        where
            T: Numeric + Deserialize<'de>,
            D: Deserializer<'de>,
        {
            Option::<OwnedValues<T>>::deserialize(deserializer).map(|values| values.map(|v| v.0))
        }
    }

    /// `Vec<Vec<T>>` fields
    pub mod nested {
        use super::*;

        #[allow(clippy::ptr_arg)]
        pub fn serialize<T, S>(columns: &Vec<Vec<T>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            T: Numeric + Serialize,
            S: Serializer,
        {
            let mut seq = serializer.serialize_seq(Some(columns.len()))?;
            for column in columns {
                seq.serialize_element(&Values(column.as_slice()))?;
            }
            seq.end()
        }

        pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Vec<Vec<T>>, D::Error>
        where
            T: Numeric + Deserialize<'de>,
            D: Deserializer<'de>,
        {
            Vec::<OwnedValues<T>>::deserialize(deserializer).map(|columns| columns.into_iter().map(|c| c.0).collect())
        }
    }
}

/// Objects that can be archived
pub trait SerializationIface {
    fn serialization_tag(&self) -> u32;

    /// State needed to reconstruct the object
    fn serialize_payload(&self) -> Result<Value>;
}

/// A tagged, self-describing serialized object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archive {
    pub tag: u32,
    pub payload: Value,
}

impl Archive {
    pub fn of<S: SerializationIface + ?Sized>(object: &S) -> Result<Self> {
        Ok(Self {
            tag: object.serialization_tag(),
            payload: object.serialize_payload()?,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(serialization_error)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(serialization_error)
    }
}

/// Encode a payload struct
pub fn to_payload<S: Serialize>(value: &S) -> Result<Value> {
    serde_json::to_value(value).map_err(serialization_error)
}

/// Decode a payload struct
pub fn from_payload<D: DeserializeOwned>(payload: &Value) -> Result<D> {
    D::deserialize(payload).map_err(serialization_error)
}

fn serialization_error(err: serde_json::Error) -> algokit_core::Status {
    Error::new(ErrorKind::Serialization)
        .with_detail(ErrorDetail::Message, err.to_string())
        .into()
}

/// Rebuilds an object from its payload
pub type Constructor = fn(&Value) -> Result<DataObject>;

/// Registry from serialization tag to constructor
pub struct Factory {
    constructors: RwLock<HashMap<u32, Constructor>>,
}

static FACTORY: OnceLock<Factory> = OnceLock::new();

impl Factory {
    /// The process-wide factory, with built-in objects registered
    pub fn instance() -> &'static Factory {
        FACTORY.get_or_init(|| {
            let mut constructors = HashMap::new();
            crate::tables::register_builtin(&mut constructors);
            crate::collection::register_builtin(&mut constructors);
            log::debug!("serialization factory initialised with {} tags", constructors.len());
            Factory {
                constructors: RwLock::new(constructors),
            }
        })
    }

    /// Register a constructor; a tag can be registered only once
    pub fn register(&self, tag: u32, constructor: Constructor) -> Result<()> {
        let mut constructors = self.constructors.write().unwrap_or_else(PoisonError::into_inner);
        if constructors.contains_key(&tag) {
            return Err(Error::new(ErrorKind::Serialization)
                .with_detail(ErrorDetail::SerializationTag, tag)
                .with_detail(ErrorDetail::Message, "tag already registered")
                .into());
        }
        constructors.insert(tag, constructor);
        Ok(())
    }

    pub fn is_registered(&self, tag: u32) -> bool {
        let constructors = self.constructors.read().unwrap_or_else(PoisonError::into_inner);
        constructors.contains_key(&tag)
    }

    pub fn create(&self, archive: &Archive) -> Result<DataObject> {
        let constructor = {
            let constructors = self.constructors.read().unwrap_or_else(PoisonError::into_inner);
            constructors.get(&archive.tag).copied()
        };
        match constructor {
            Some(constructor) => constructor(&archive.payload),
            None => Err(Error::new(ErrorKind::SerializationTagNotRegistered)
                .with_detail(ErrorDetail::SerializationTag, archive.tag)
                .into()),
        }
    }
}

/// Serialize any object to bytes
pub fn serialize<S: SerializationIface + ?Sized>(object: &S) -> Result<Vec<u8>> {
    Archive::of(object)?.to_bytes()
}

/// Reconstruct an object from bytes produced by [`serialize`]
pub fn deserialize(bytes: &[u8]) -> Result<DataObject> {
    let archive = Archive::from_bytes(bytes)?;
    Factory::instance().create(&archive)
}

/// Reconstruct a table from an archive
pub fn table_from_archive(archive: &Archive) -> Result<NumericTablePtr> {
    match Factory::instance().create(archive)? {
        DataObject::Table(table) => Ok(table),
        other => Err(Error::new(ErrorKind::IncorrectTypeOfNumericTable)
            .with_detail(ErrorDetail::Message, format!("archive holds a {}", other.kind_name()))
            .into()),
    }
}
