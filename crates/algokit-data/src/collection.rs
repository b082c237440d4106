//! Polymorphic data objects and collections of them
//!
//! Algorithm arguments, partial results and models all travel as
//! [`DataObject`]s: a closed set of handle kinds, each cheap to clone.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use algokit_core::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::serialization::{from_payload, tags, to_payload, Archive, Constructor, Factory, SerializationIface};
use crate::table::NumericTablePtr;

/// A trained model or other algorithm-specific object
pub trait Model: SerializationIface + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a model
pub type ModelPtr = Arc<dyn Model>;

/// Any object that can be passed to or produced by an algorithm
#[derive(Debug, Clone)]
pub enum DataObject {
    Table(NumericTablePtr),
    Model(ModelPtr),
    Collection(Arc<DataCollection>),
    KeyValue(Arc<KeyValueDataCollection>),
}

impl DataObject {
    pub fn kind_name(&self) -> &'static str {
        match self {
            DataObject::Table(_) => "table",
            DataObject::Model(_) => "model",
            DataObject::Collection(_) => "collection",
            DataObject::KeyValue(_) => "key-value collection",
        }
    }

    pub fn as_table(&self) -> Option<&NumericTablePtr> {
        match self {
            DataObject::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_model(&self) -> Option<&ModelPtr> {
        match self {
            DataObject::Model(m) => Some(m),
            _ => None,
        }
    }

    /// Downcast a model object to its concrete type
    pub fn model_ref<M: Model + 'static>(&self) -> Option<&M> {
        self.as_model().and_then(|m| m.as_any().downcast_ref::<M>())
    }

    pub fn as_collection(&self) -> Option<&Arc<DataCollection>> {
        match self {
            DataObject::Collection(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_key_value(&self) -> Option<&Arc<KeyValueDataCollection>> {
        match self {
            DataObject::KeyValue(c) => Some(c),
            _ => None,
        }
    }
}

impl SerializationIface for DataObject {
    fn serialization_tag(&self) -> u32 {
        match self {
            DataObject::Table(t) => t.serialization_tag(),
            DataObject::Model(m) => m.serialization_tag(),
            DataObject::Collection(c) => c.serialization_tag(),
            DataObject::KeyValue(c) => c.serialization_tag(),
        }
    }

    fn serialize_payload(&self) -> Result<Value> {
        match self {
            DataObject::Table(t) => t.serialize_payload(),
            DataObject::Model(m) => m.serialize_payload(),
            DataObject::Collection(c) => c.serialize_payload(),
            DataObject::KeyValue(c) => c.serialize_payload(),
        }
    }
}

impl From<NumericTablePtr> for DataObject {
    fn from(table: NumericTablePtr) -> Self {
        DataObject::Table(table)
    }
}

impl From<ModelPtr> for DataObject {
    fn from(model: ModelPtr) -> Self {
        DataObject::Model(model)
    }
}

impl From<DataCollection> for DataObject {
    fn from(collection: DataCollection) -> Self {
        DataObject::Collection(Arc::new(collection))
    }
}

impl From<KeyValueDataCollection> for DataObject {
    fn from(collection: KeyValueDataCollection) -> Self {
        DataObject::KeyValue(Arc::new(collection))
    }
}

/// Ordered sequence of data objects
#[derive(Debug, Clone, Default)]
pub struct DataCollection {
    items: Vec<DataObject>,
}

impl DataCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: impl Into<DataObject>) {
        self.items.push(item.into());
    }

    pub fn get(&self, index: usize) -> Option<&DataObject> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataObject> {
        self.items.iter()
    }
}

impl FromIterator<DataObject> for DataCollection {
    fn from_iter<I: IntoIterator<Item = DataObject>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl SerializationIface for DataCollection {
    fn serialization_tag(&self) -> u32 {
        tags::DATA_COLLECTION
    }

    fn serialize_payload(&self) -> Result<Value> {
        let archives = self
            .items
            .iter()
            .map(Archive::of)
            .collect::<Result<Vec<_>>>()?;
        to_payload(&archives)
    }
}

/// Data objects keyed by integer id
#[derive(Debug, Clone, Default)]
pub struct KeyValueDataCollection {
    items: BTreeMap<usize, DataObject>,
}

impl KeyValueDataCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert, returning the object previously stored under `key`
    pub fn insert(&mut self, key: usize, item: impl Into<DataObject>) -> Option<DataObject> {
        self.items.insert(key, item.into())
    }

    pub fn get(&self, key: usize) -> Option<&DataObject> {
        self.items.get(&key)
    }

    pub fn remove(&mut self, key: usize) -> Option<DataObject> {
        self.items.remove(&key)
    }

    pub fn keys(&self) -> impl Iterator<Item = usize> + '_ {
        self.items.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &DataObject)> {
        self.items.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Serialize, Deserialize)]
struct KeyedArchive {
    key: usize,
    archive: Archive,
}

impl SerializationIface for KeyValueDataCollection {
    fn serialization_tag(&self) -> u32 {
        tags::KEY_VALUE_COLLECTION
    }

    fn serialize_payload(&self) -> Result<Value> {
        let entries = self
            .items
            .iter()
            .map(|(key, item)| {
                Ok(KeyedArchive {
                    key: *key,
                    archive: Archive::of(item)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        to_payload(&entries)
    }
}

fn collection_from_payload(payload: &Value) -> Result<DataObject> {
    let archives: Vec<Archive> = from_payload(payload)?;
    let factory = Factory::instance();
    let items = archives
        .iter()
        .map(|a| factory.create(a))
        .collect::<Result<DataCollection>>()?;
    Ok(items.into())
}

fn key_value_from_payload(payload: &Value) -> Result<DataObject> {
    let entries: Vec<KeyedArchive> = from_payload(payload)?;
    let factory = Factory::instance();
    let mut collection = KeyValueDataCollection::new();
    for entry in &entries {
        collection.insert(entry.key, factory.create(&entry.archive)?);
    }
    Ok(collection.into())
}

pub(crate) fn register_builtin(constructors: &mut HashMap<u32, Constructor>) {
    constructors.insert(tags::DATA_COLLECTION, collection_from_payload);
    constructors.insert(tags::KEY_VALUE_COLLECTION, key_value_from_payload);
}
