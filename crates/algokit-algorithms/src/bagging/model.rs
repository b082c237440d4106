use std::any::Any;
use std::sync::Arc;

use algokit_core::{Error, ErrorDetail, ErrorKind, Result};
use algokit_data::serialization::{from_payload, table_from_archive, to_payload};
use algokit_data::{
    Archive, DataObject, HomogenNumericTable, Model, NumericTable, NumericTablePtr, ReadRows, SerializationIface,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tags;

/// Bootstrap draws for an ensemble of trees
///
/// Row `t` of `samples` holds the row indices tree `t` trains on, drawn with
/// replacement. Row `t` of `features` holds the sorted, distinct feature
/// indices of tree `t`.
#[derive(Debug, Clone)]
pub struct BaggingModel {
    n_rows: usize,
    n_features: usize,
    samples: NumericTablePtr,
    features: NumericTablePtr,
}

#[derive(Serialize, Deserialize)]
struct Payload {
    n_rows: usize,
    n_features: usize,
    samples: Archive,
    features: Archive,
}

fn to_i32(values: &[usize], name: &str) -> Result<Vec<i32>> {
    values
        .iter()
        .map(|&v| {
            i32::try_from(v).map_err(|_| {
                Error::new(ErrorKind::OutOfRange)
                    .with_detail(ErrorDetail::ArgumentName, name)
                    .with_detail(ErrorDetail::ActualValue, v)
                    .into()
            })
        })
        .collect()
}

impl BaggingModel {
    /// Pack per-tree draws into `n_trees x n` index tables
    pub fn from_indices(
        n_rows: usize,
        n_features: usize,
        samples: &[Vec<usize>],
        features: &[Vec<usize>],
    ) -> Result<Self> {
        let n_trees = samples.len();
        let per_tree = samples.first().map_or(0, Vec::len);
        let per_node = features.first().map_or(0, Vec::len);
        if features.len() != n_trees
            || samples.iter().any(|s| s.len() != per_tree)
            || features.iter().any(|f| f.len() != per_node)
        {
            return Err(Error::new(ErrorKind::IncorrectNumberOfColumns)
                .with_detail(ErrorDetail::ArgumentName, "bagging draws")
                .with_detail(ErrorDetail::Message, "trees drew unequal counts")
                .into());
        }
        let flat_samples = to_i32(&samples.concat(), "samples")?;
        let flat_features = to_i32(&features.concat(), "features")?;
        Ok(Self {
            n_rows,
            n_features,
            samples: HomogenNumericTable::from_vec(flat_samples, per_tree, n_trees)?.into_ptr(),
            features: HomogenNumericTable::from_vec(flat_features, per_node, n_trees)?.into_ptr(),
        })
    }

    pub fn number_of_trees(&self) -> usize {
        self.samples.number_of_rows()
    }

    /// Rows of the training table the draws index into
    pub fn number_of_rows(&self) -> usize {
        self.n_rows
    }

    pub fn number_of_features(&self) -> usize {
        self.n_features
    }

    pub fn samples(&self) -> &NumericTablePtr {
        &self.samples
    }

    pub fn features(&self) -> &NumericTablePtr {
        &self.features
    }

    fn tree_row(table: &dyn NumericTable, tree: usize) -> Result<Vec<usize>> {
        let rows = ReadRows::<i32>::new(table, tree, 1)?;
        Ok(rows.row(0).iter().map(|&i| i as usize).collect())
    }

    /// Row indices of tree `tree`, in draw order
    pub fn sample_indices(&self, tree: usize) -> Result<Vec<usize>> {
        Self::tree_row(self.samples.as_ref(), tree)
    }

    pub fn feature_indices(&self, tree: usize) -> Result<Vec<usize>> {
        Self::tree_row(self.features.as_ref(), tree)
    }

    /// Rows tree `tree` never drew, ascending
    pub fn out_of_bag_rows(&self, tree: usize) -> Result<Vec<usize>> {
        let mut in_bag = vec![false; self.n_rows];
        for row in self.sample_indices(tree)? {
            if let Some(flag) = in_bag.get_mut(row) {
                *flag = true;
            }
        }
        Ok(in_bag
            .iter()
            .enumerate()
            .filter_map(|(row, &drawn)| (!drawn).then_some(row))
            .collect())
    }
}

impl SerializationIface for BaggingModel {
    fn serialization_tag(&self) -> u32 {
        tags::BAGGING_MODEL
    }

    fn serialize_payload(&self) -> Result<Value> {
        to_payload(&Payload {
            n_rows: self.n_rows,
            n_features: self.n_features,
            samples: Archive::of(self.samples.as_ref())?,
            features: Archive::of(self.features.as_ref())?,
        })
    }
}

impl Model for BaggingModel {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) fn model_from_payload(payload: &Value) -> Result<DataObject> {
    let payload: Payload = from_payload(payload)?;
    let samples = table_from_archive(&payload.samples)?;
    let features = table_from_archive(&payload.features)?;
    if samples.number_of_rows() != features.number_of_rows() {
        return Err(Error::new(ErrorKind::Serialization)
            .with_detail(ErrorDetail::SerializationTag, tags::BAGGING_MODEL)
            .with_detail(ErrorDetail::ExpectedValue, samples.number_of_rows())
            .with_detail(ErrorDetail::ActualValue, features.number_of_rows())
            .into());
    }
    Ok(DataObject::Model(Arc::new(BaggingModel {
        n_rows: payload.n_rows,
        n_features: payload.n_features,
        samples,
        features,
    })))
}
