//! Keyed argument collections for algorithm inputs and results

use std::fmt;
use std::marker::PhantomData;

use algokit_core::{Error, ErrorDetail, ErrorKind, Result};
use algokit_data::{DataObject, KeyValueDataCollection, Model, NumericTablePtr};

/// Small enumerated id naming one slot of an [`Argument`]
pub trait ArgumentKey: Copy + fmt::Debug + Send + Sync + 'static {
    /// Number of slots
    const COUNT: usize;

    /// Slot position, below `COUNT`
    fn index(self) -> usize;

    /// Name reported in `ArgumentName` error details
    fn name(self) -> &'static str;
}

/// Fixed set of optional data objects addressed by `K`
#[derive(Debug, Clone)]
pub struct Argument<K> {
    items: Vec<Option<DataObject>>,
    _key: PhantomData<K>,
}

impl<K: ArgumentKey> Default for Argument<K> {
    fn default() -> Self {
        Self {
            items: vec![None; K::COUNT],
            _key: PhantomData,
        }
    }
}

impl<K: ArgumentKey> Argument<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: K) -> Option<&DataObject> {
        self.items[id.index()].as_ref()
    }

    /// Store `value`, returning what the slot held before
    pub fn set(&mut self, id: K, value: impl Into<DataObject>) -> Option<DataObject> {
        self.items[id.index()].replace(value.into())
    }

    pub fn take(&mut self, id: K) -> Option<DataObject> {
        self.items[id.index()].take()
    }

    pub fn is_set(&self, id: K) -> bool {
        self.items[id.index()].is_some()
    }

    /// The table in slot `id`; `NullInput` when empty
    pub fn table(&self, id: K) -> Result<&NumericTablePtr> {
        let object = self.get(id).ok_or_else(|| Error::null_input(id.name()))?;
        object.as_table().ok_or_else(|| {
            Error::new(ErrorKind::IncorrectTypeOfNumericTable)
                .with_detail(ErrorDetail::ArgumentName, id.name())
                .with_detail(ErrorDetail::Message, format!("slot holds a {}", object.kind_name()))
                .into()
        })
    }

    /// The model of concrete type `M` in slot `id`
    pub fn model<M: Model + 'static>(&self, id: K) -> Result<&M> {
        let object = self.get(id).ok_or_else(|| Error::null_input(id.name()))?;
        object.model_ref::<M>().ok_or_else(|| {
            Error::new(ErrorKind::IncorrectDataType)
                .with_detail(ErrorDetail::ArgumentName, id.name())
                .with_detail(ErrorDetail::Message, format!("slot holds a {}", object.kind_name()))
                .into()
        })
    }

    /// Filled slots keyed by their index
    pub fn to_key_value(&self) -> KeyValueDataCollection {
        let mut collection = KeyValueDataCollection::new();
        for (index, item) in self.items.iter().enumerate() {
            if let Some(item) = item {
                collection.insert(index, item.clone());
            }
        }
        collection
    }
}
