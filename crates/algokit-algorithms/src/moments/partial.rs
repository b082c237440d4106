use std::any::Any;

use algokit_core::{DataType, Error, ErrorDetail, ErrorKind, Result};
use algokit_data::serialization::{from_payload, lossless, to_payload};
use algokit_data::{DataObject, Model, SerializationIface};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::algorithm::PartialResult;
use crate::tags;

/// Per-column running moments of some set of rows
///
/// Accumulators are kept in `f64` whatever precision the kernel reads in;
/// `data_type` records that precision for the final result tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentsPartial {
    pub(crate) n_rows: usize,
    pub(crate) data_type: DataType,
    #[serde(with = "lossless")]
    pub(crate) minimum: Vec<f64>,
    #[serde(with = "lossless")]
    pub(crate) maximum: Vec<f64>,
    #[serde(with = "lossless")]
    pub(crate) sum: Vec<f64>,
    #[serde(with = "lossless")]
    pub(crate) sum_squares: Vec<f64>,
    /// Sum of squared deviations from the mean of these rows
    #[serde(with = "lossless")]
    pub(crate) sum_squares_centered: Vec<f64>,
}

impl MomentsPartial {
    pub fn number_of_columns(&self) -> usize {
        self.sum.len()
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn minimum(&self) -> &[f64] {
        &self.minimum
    }

    pub fn maximum(&self) -> &[f64] {
        &self.maximum
    }

    pub fn sum(&self) -> &[f64] {
        &self.sum
    }

    pub fn sum_squares(&self) -> &[f64] {
        &self.sum_squares
    }

    pub fn sum_squares_centered(&self) -> &[f64] {
        &self.sum_squares_centered
    }

    fn check_width(&self, other: &Self) -> Result<()> {
        if other.number_of_columns() != self.number_of_columns() {
            return Err(Error::new(ErrorKind::IncorrectNumberOfColumns)
                .with_detail(ErrorDetail::ArgumentName, "partialResults")
                .with_detail(ErrorDetail::ExpectedValue, self.number_of_columns())
                .with_detail(ErrorDetail::ActualValue, other.number_of_columns())
                .into());
        }
        Ok(())
    }

    /// Fold in rows whose deviations were taken about the same centers
    pub(crate) fn merge_same_center(&mut self, other: &Self) -> Result<()> {
        self.check_width(other)?;
        self.n_rows += other.n_rows;
        for j in 0..self.number_of_columns() {
            self.minimum[j] = self.minimum[j].min(other.minimum[j]);
            self.maximum[j] = self.maximum[j].max(other.maximum[j]);
            self.sum[j] += other.sum[j];
            self.sum_squares[j] += other.sum_squares[j];
            self.sum_squares_centered[j] += other.sum_squares_centered[j];
        }
        Ok(())
    }
}

impl PartialResult for MomentsPartial {
    /// Pairwise update: `M2 = M2a + M2b + delta^2 * na * nb / n`
    fn merge(&mut self, other: &Self) -> Result<()> {
        self.check_width(other)?;
        if other.n_rows == 0 {
            return Ok(());
        }
        if self.n_rows == 0 {
            *self = other.clone();
            return Ok(());
        }
        let na = self.n_rows as f64;
        let nb = other.n_rows as f64;
        let weight = na * nb / (na + nb);
        for j in 0..self.number_of_columns() {
            let delta = other.sum[j] / nb - self.sum[j] / na;
            self.sum_squares_centered[j] += other.sum_squares_centered[j] + delta * delta * weight;
            self.minimum[j] = self.minimum[j].min(other.minimum[j]);
            self.maximum[j] = self.maximum[j].max(other.maximum[j]);
            self.sum[j] += other.sum[j];
            self.sum_squares[j] += other.sum_squares[j];
        }
        self.n_rows += other.n_rows;
        Ok(())
    }

    fn check_compatible(&self, other: &Self) -> Result<()> {
        self.check_width(other)
    }

    fn number_of_rows(&self) -> usize {
        self.n_rows
    }
}

impl SerializationIface for MomentsPartial {
    fn serialization_tag(&self) -> u32 {
        tags::MOMENTS_PARTIAL
    }

    fn serialize_payload(&self) -> Result<Value> {
        to_payload(self)
    }
}

impl Model for MomentsPartial {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) fn partial_from_payload(payload: &Value) -> Result<DataObject> {
    let partial: MomentsPartial = from_payload(payload)?;
    let width = partial.sum.len();
    let columns = [
        partial.minimum.len(),
        partial.maximum.len(),
        partial.sum_squares.len(),
        partial.sum_squares_centered.len(),
    ];
    if columns.iter().any(|&n| n != width) {
        return Err(Error::new(ErrorKind::Serialization)
            .with_detail(ErrorDetail::SerializationTag, tags::MOMENTS_PARTIAL)
            .with_detail(ErrorDetail::Message, "ragged moment vectors")
            .into());
    }
    Ok(DataObject::Model(std::sync::Arc::new(partial)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn partial_of(rows: &[[f64; 2]]) -> MomentsPartial {
        let n = rows.len() as f64;
        let sum: Vec<f64> = (0..2).map(|j| rows.iter().map(|r| r[j]).sum()).collect();
        let mean: Vec<f64> = sum.iter().map(|s| s / n).collect();
        MomentsPartial {
            n_rows: rows.len(),
            data_type: DataType::F64,
            minimum: (0..2).map(|j| rows.iter().map(|r| r[j]).fold(f64::INFINITY, f64::min)).collect(),
            maximum: (0..2).map(|j| rows.iter().map(|r| r[j]).fold(f64::NEG_INFINITY, f64::max)).collect(),
            sum_squares: (0..2).map(|j| rows.iter().map(|r| r[j] * r[j]).sum()).collect(),
            sum_squares_centered: (0..2)
                .map(|j| rows.iter().map(|r| (r[j] - mean[j]).powi(2)).sum())
                .collect(),
            sum,
        }
    }

    #[test]
    fn test_merge_matches_single_pass() {
        let rows = [[1.0, 10.0], [4.0, -2.0], [2.5, 7.0], [9.0, 0.5], [-3.0, 3.0]];
        let whole = partial_of(&rows);

        let mut left = partial_of(&rows[..2]);
        left.merge(&partial_of(&rows[2..])).unwrap();
        let mut right = partial_of(&rows[3..]);
        right.merge(&partial_of(&rows[..3])).unwrap();

        for merged in [&left, &right] {
            assert_eq!(merged.n_rows, 5);
            assert_eq!(merged.minimum, whole.minimum);
            assert_eq!(merged.maximum, whole.maximum);
            for j in 0..2 {
                assert_relative_eq!(merged.sum[j], whole.sum[j], epsilon = 1e-12);
                assert_relative_eq!(merged.sum_squares_centered[j], whole.sum_squares_centered[j], epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_width_mismatch() {
        let mut a = partial_of(&[[1.0, 2.0]]);
        let mut b = partial_of(&[[1.0, 2.0]]);
        b.sum.push(0.0);
        let err = a.merge(&b).unwrap_err();
        assert!(err.contains(ErrorKind::IncorrectNumberOfColumns));
    }

    #[test]
    fn test_non_finite_accumulators_survive_payload() {
        let partial = partial_of(&[[f64::NAN, 1.0], [2.0, f64::INFINITY], [3.0, f64::NEG_INFINITY]]);
        assert!(partial.sum[0].is_nan());
        assert!(partial.maximum[1].is_infinite());

        let object = partial_from_payload(&partial.serialize_payload().unwrap()).unwrap();
        let restored = object.model_ref::<MomentsPartial>().unwrap();
        assert!(restored.sum[0].is_nan());
        assert!(restored.sum_squares_centered[0].is_nan());
        assert_eq!(restored.maximum[1], f64::INFINITY);
        assert_eq!(restored.minimum[1], f64::NEG_INFINITY);
        assert_eq!(restored.minimum[0], partial.minimum[0]);
        assert_eq!(restored.n_rows, 3);
    }
}
