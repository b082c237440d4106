use std::any::Any;
use std::sync::Arc;

use algokit_core::{DataType, Error, ErrorDetail, ErrorKind, Result, Status};
use algokit_data::serialization::{from_payload, table_from_archive, to_payload};
use algokit_data::{
    check_numeric_table, AllocationFlag, Archive, DataObject, HomogenNumericTable, Model, NumericTableExt,
    NumericTablePtr, ReadWriteMode, SerializationIface, WriteRows,
};
use serde_json::Value;

use super::partial::MomentsPartial;
use crate::algorithm::{Argument, ArgumentKey};
use crate::tags;

/// One output of the moments algorithm, each a `1 x nColumns` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Moment {
    Minimum,
    Maximum,
    Sum,
    SumSquares,
    SumSquaresCentered,
    Mean,
    SecondOrderRawMoment,
    Variance,
    StandardDeviation,
    Variation,
}

impl Moment {
    pub const ALL: [Moment; 10] = [
        Moment::Minimum,
        Moment::Maximum,
        Moment::Sum,
        Moment::SumSquares,
        Moment::SumSquaresCentered,
        Moment::Mean,
        Moment::SecondOrderRawMoment,
        Moment::Variance,
        Moment::StandardDeviation,
        Moment::Variation,
    ];
}

impl ArgumentKey for Moment {
    const COUNT: usize = 10;

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            Moment::Minimum => "minimum",
            Moment::Maximum => "maximum",
            Moment::Sum => "sum",
            Moment::SumSquares => "sumSquares",
            Moment::SumSquaresCentered => "sumSquaresCentered",
            Moment::Mean => "mean",
            Moment::SecondOrderRawMoment => "secondOrderRawMoment",
            Moment::Variance => "variance",
            Moment::StandardDeviation => "standardDeviation",
            Moment::Variation => "variation",
        }
    }
}

/// Value of `moment` for every column of `partial`
///
/// Variance uses the `n - 1` denominator and is zero for a single row.
fn moment_values(partial: &MomentsPartial, moment: Moment) -> Vec<f64> {
    let n = partial.n_rows as f64;
    let variance = |c: &f64| if partial.n_rows > 1 { c / (n - 1.0) } else { 0.0 };
    match moment {
        Moment::Minimum => partial.minimum.clone(),
        Moment::Maximum => partial.maximum.clone(),
        Moment::Sum => partial.sum.clone(),
        Moment::SumSquares => partial.sum_squares.clone(),
        Moment::SumSquaresCentered => partial.sum_squares_centered.clone(),
        Moment::Mean => partial.sum.iter().map(|s| s / n).collect(),
        Moment::SecondOrderRawMoment => partial.sum_squares.iter().map(|s| s / n).collect(),
        Moment::Variance => partial.sum_squares_centered.iter().map(variance).collect(),
        Moment::StandardDeviation => partial
            .sum_squares_centered
            .iter()
            .map(|c| variance(c).sqrt())
            .collect(),
        Moment::Variation => partial
            .sum_squares_centered
            .iter()
            .zip(&partial.sum)
            .map(|(c, s)| variance(c).sqrt() / (s / n))
            .collect(),
    }
}

/// The ten moment tables
#[derive(Debug, Clone, Default)]
pub struct MomentsResult {
    argument: Argument<Moment>,
}

impl MomentsResult {
    /// Allocate every moment as a `1 x n_columns` table of `data_type`
    pub fn allocate_columns(n_columns: usize, data_type: DataType) -> Result<Self> {
        let mut result = Self::default();
        for moment in Moment::ALL {
            let table = match data_type {
                DataType::F64 => HomogenNumericTable::<f64>::create(n_columns, 1, AllocationFlag::DoAllocate)?.into_ptr(),
                DataType::F32 => HomogenNumericTable::<f32>::create(n_columns, 1, AllocationFlag::DoAllocate)?.into_ptr(),
                DataType::I32 => {
                    return Err(Error::new(ErrorKind::IncorrectDataType)
                        .with_detail(ErrorDetail::ArgumentName, moment.name())
                        .into())
                }
            };
            result.argument.set(moment, table);
        }
        Ok(result)
    }

    pub fn get(&self, moment: Moment) -> Result<&NumericTablePtr> {
        self.argument.table(moment)
    }

    pub fn set(&mut self, moment: Moment, table: NumericTablePtr) {
        self.argument.set(moment, table);
    }

    /// Values of one moment, converted to `f64`
    pub fn values(&self, moment: Moment) -> Result<Vec<f64>> {
        self.get(moment)?.to_row_major::<f64>()
    }

    /// Every table present and `1 x n_columns`
    pub(crate) fn check_shape(&self, n_columns: usize) -> Status {
        let mut status = Status::new();
        for moment in Moment::ALL {
            match self.get(moment) {
                Ok(table) => status |= check_numeric_table(table.as_ref(), moment.name(), Some(1), Some(n_columns), None),
                Err(missing) => status |= missing,
            }
        }
        status
    }

    /// Write the moments of `partial` into the allocated tables
    pub(crate) fn write(&self, partial: &MomentsPartial) -> Result<()> {
        for moment in Moment::ALL {
            let table = self.get(moment)?;
            let values = moment_values(partial, moment);
            let mut rows = WriteRows::<f64>::new(table.as_ref(), 0, 1, ReadWriteMode::WriteOnly)?;
            if rows.len() != values.len() {
                return Err(Error::new(ErrorKind::IncorrectNumberOfColumns)
                    .with_detail(ErrorDetail::ArgumentName, moment.name())
                    .with_detail(ErrorDetail::ExpectedValue, values.len())
                    .with_detail(ErrorDetail::ActualValue, rows.len())
                    .into());
            }
            rows.copy_from_slice(&values);
            rows.finish()?;
        }
        Ok(())
    }
}

impl SerializationIface for MomentsResult {
    fn serialization_tag(&self) -> u32 {
        tags::MOMENTS_RESULT
    }

    fn serialize_payload(&self) -> Result<Value> {
        let tables = Moment::ALL
            .iter()
            .map(|&m| match self.argument.get(m).and_then(DataObject::as_table) {
                Some(table) => Archive::of(table.as_ref()).map(Some),
                None => Ok(None),
            })
            .collect::<Result<Vec<_>>>()?;
        to_payload(&tables)
    }
}

impl Model for MomentsResult {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) fn result_from_payload(payload: &Value) -> Result<DataObject> {
    let tables: Vec<Option<Archive>> = from_payload(payload)?;
    if tables.len() != Moment::COUNT {
        return Err(Error::new(ErrorKind::Serialization)
            .with_detail(ErrorDetail::SerializationTag, tags::MOMENTS_RESULT)
            .with_detail(ErrorDetail::ExpectedValue, Moment::COUNT)
            .with_detail(ErrorDetail::ActualValue, tables.len())
            .into());
    }
    let mut result = MomentsResult::default();
    for (moment, archive) in Moment::ALL.into_iter().zip(&tables) {
        if let Some(archive) = archive {
            result.set(moment, table_from_archive(archive)?);
        }
    }
    Ok(DataObject::Model(Arc::new(result)))
}
