use std::sync::Arc;

use algokit_core::{Error, ErrorDetail, ErrorKind, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{allocate_filled, attached, check_buffer_len};
use crate::block::{BlockBuffer, BlockSlice, BlockValue};
use crate::buffer::{AllocationFlag, MemoryStatus, SharedBuffer};
use crate::collection::DataObject;
use crate::dictionary::Dictionary;
use crate::serialization::{from_payload, tags, to_payload, SerializationIface};
use crate::statistics::BasicStatistics;
use crate::table::{check_column_index, check_row_range, rows_in, NumericTable, NumericTablePtr, StorageLayout};

/// Square matrix storing only its diagonal
///
/// Off-diagonal cells read as zero; writing a nonzero there fails with
/// `UnsupportedOperation` and leaves the table unchanged.
#[derive(Debug)]
pub struct DiagonalNumericTable<T: BlockValue> {
    n: usize,
    diagonal: Option<SharedBuffer<T>>,
    dictionary: Dictionary,
    statistics: BasicStatistics,
    memory_status: MemoryStatus,
}

impl<T: BlockValue> DiagonalNumericTable<T> {
    pub fn create(n: usize, flag: AllocationFlag) -> Result<Self> {
        let (diagonal, memory_status) = match flag {
            AllocationFlag::DoAllocate => (
                Some(SharedBuffer::new(allocate_filled(n, T::default())?)),
                MemoryStatus::InternallyAllocated,
            ),
            AllocationFlag::NotAllocate => (None, MemoryStatus::NotAllocated),
        };
        Ok(Self {
            n,
            diagonal,
            dictionary: Dictionary::homogeneous(n, T::DATA_TYPE),
            statistics: BasicStatistics::new(),
            memory_status,
        })
    }

    pub fn from_diagonal(diagonal: Vec<T>) -> Self {
        Self {
            n: diagonal.len(),
            dictionary: Dictionary::homogeneous(diagonal.len(), T::DATA_TYPE),
            diagonal: Some(SharedBuffer::new(diagonal)),
            statistics: BasicStatistics::new(),
            memory_status: MemoryStatus::InternallyAllocated,
        }
    }

    pub fn wrap(buffer: SharedBuffer<T>, n: usize) -> Result<Self> {
        check_buffer_len(buffer.len(), n)?;
        let mut table = Self::create(n, AllocationFlag::NotAllocate)?;
        table.diagonal = Some(buffer);
        table.memory_status = MemoryStatus::UserAllocated;
        Ok(table)
    }

    pub fn diagonal(&self) -> Result<Vec<T>> {
        let n = self.n;
        Ok(attached(&self.diagonal, "diagonal")?.with_read(|d| d[..n].to_vec()))
    }

    pub fn into_ptr(self) -> NumericTablePtr {
        Arc::new(self)
    }
}

fn off_diagonal_error(row: usize, column: usize) -> algokit_core::Status {
    Error::new(ErrorKind::UnsupportedOperation)
        .with_detail(ErrorDetail::Row, row)
        .with_detail(ErrorDetail::Column, column)
        .with_detail(ErrorDetail::Message, "nonzero off the diagonal")
        .into()
}

impl<T: BlockValue> NumericTable for DiagonalNumericTable<T> {
    fn number_of_rows(&self) -> usize {
        self.n
    }

    fn number_of_columns(&self) -> usize {
        self.n
    }

    fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    fn layout(&self) -> StorageLayout {
        StorageLayout::Diagonal
    }

    fn basic_statistics(&self) -> &BasicStatistics {
        &self.statistics
    }

    fn memory_status(&self) -> MemoryStatus {
        self.memory_status
    }

    fn pull_rows(&self, start: usize, mut out: BlockBuffer<'_>) -> Result<()> {
        let diagonal = attached(&self.diagonal, "diagonal")?;
        let n = self.n;
        let n_rows = rows_in(out.len(), n)?;
        check_row_range(start, n_rows, n)?;
        out.fill_zero();
        diagonal.with_read(|d| {
            for r in 0..n_rows {
                out.set(r * n + start + r, d[start + r]);
            }
        });
        Ok(())
    }

    fn push_rows(&self, start: usize, src: BlockSlice<'_>) -> Result<()> {
        let diagonal = attached(&self.diagonal, "diagonal")?;
        let n = self.n;
        let n_rows = rows_in(src.len(), n)?;
        check_row_range(start, n_rows, n)?;
        let zero = T::default();
        for r in 0..n_rows {
            if let Some(c) = (0..n).find(|&c| c != start + r && src.get::<T>(r * n + c) != zero) {
                return Err(off_diagonal_error(start + r, c));
            }
        }
        diagonal.with_write(|d| {
            for r in 0..n_rows {
                d[start + r] = src.get(r * n + start + r);
            }
        });
        Ok(())
    }

    fn pull_column(&self, column: usize, start: usize, mut out: BlockBuffer<'_>) -> Result<()> {
        let diagonal = attached(&self.diagonal, "diagonal")?;
        check_column_index(column, self.n)?;
        let n_rows = out.len();
        check_row_range(start, n_rows, self.n)?;
        out.fill_zero();
        if (start..start + n_rows).contains(&column) {
            let value = diagonal.with_read(|d| d[column]);
            out.set(column - start, value);
        }
        Ok(())
    }

    fn push_column(&self, column: usize, start: usize, src: BlockSlice<'_>) -> Result<()> {
        let diagonal = attached(&self.diagonal, "diagonal")?;
        check_column_index(column, self.n)?;
        check_row_range(start, src.len(), self.n)?;
        let zero = T::default();
        if let Some(r) = (0..src.len()).find(|&r| start + r != column && src.get::<T>(r) != zero) {
            return Err(off_diagonal_error(start + r, column));
        }
        if (start..start + src.len()).contains(&column) {
            diagonal.with_write(|d| d[column] = src.get(column - start));
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(bound = "T: BlockValue")]
struct DiagonalPayload<T> {
    n: usize,
    dictionary: Dictionary,
    #[serde(with = "crate::serialization::lossless::option")]
    diagonal: Option<Vec<T>>,
}

impl<T: BlockValue> SerializationIface for DiagonalNumericTable<T> {
    fn serialization_tag(&self) -> u32 {
        tags::typed(tags::DIAGONAL_TABLE, T::DATA_TYPE)
    }

    fn serialize_payload(&self) -> Result<Value> {
        let diagonal = match &self.diagonal {
            Some(_) => Some(self.diagonal()?),
            None => None,
        };
        to_payload(&DiagonalPayload {
            n: self.n,
            dictionary: self.dictionary.clone(),
            diagonal,
        })
    }
}

pub(super) fn diagonal_from_payload<T: BlockValue>(payload: &Value) -> Result<DataObject> {
    let payload: DiagonalPayload<T> = from_payload(payload)?;
    let mut table = match payload.diagonal {
        Some(diagonal) => {
            check_buffer_len(diagonal.len(), payload.n)?;
            DiagonalNumericTable::from_diagonal(diagonal)
        }
        None => DiagonalNumericTable::create(payload.n, AllocationFlag::NotAllocate)?,
    };
    super::check_dictionary_width(&payload.dictionary, table.n)?;
    table.dictionary = payload.dictionary;
    Ok(DataObject::Table(table.into_ptr()))
}
