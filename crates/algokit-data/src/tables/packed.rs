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

/// Which half of a square matrix is stored, and what the other half means
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackedKind {
    /// Upper half stored, lower half mirrors it
    SymmetricUpper,
    /// Lower half stored, upper half mirrors it
    SymmetricLower,
    /// Upper half stored, lower half is zero
    TriangularUpper,
    /// Lower half stored, upper half is zero
    TriangularLower,
}

impl PackedKind {
    /// Packed position of `(i, j)`, or `None` for an implicit zero
    fn index(self, n: usize, i: usize, j: usize) -> Option<usize> {
        let upper = |i: usize, j: usize| i * (2 * n - i + 1) / 2 + (j - i);
        let lower = |i: usize, j: usize| i * (i + 1) / 2 + j;
        match self {
            PackedKind::SymmetricUpper if i <= j => Some(upper(i, j)),
            PackedKind::SymmetricUpper => Some(upper(j, i)),
            PackedKind::SymmetricLower if j <= i => Some(lower(i, j)),
            PackedKind::SymmetricLower => Some(lower(j, i)),
            PackedKind::TriangularUpper if i <= j => Some(upper(i, j)),
            PackedKind::TriangularLower if j <= i => Some(lower(i, j)),
            PackedKind::TriangularUpper | PackedKind::TriangularLower => None,
        }
    }

    fn layout(self) -> StorageLayout {
        match self {
            PackedKind::SymmetricUpper => StorageLayout::PackedSymmetricUpper,
            PackedKind::SymmetricLower => StorageLayout::PackedSymmetricLower,
            PackedKind::TriangularUpper => StorageLayout::PackedTriangularUpper,
            PackedKind::TriangularLower => StorageLayout::PackedTriangularLower,
        }
    }
}

/// Number of stored elements of an `n x n` packed matrix
pub(crate) fn packed_len(n: usize) -> Result<usize> {
    n.checked_add(1)
        .and_then(|m| m.checked_mul(n))
        .map(|m| m / 2)
        .ok_or_else(|| Error::new(ErrorKind::MemoryAllocationFailed).with_detail(ErrorDetail::Row, n).into())
}

/// Square symmetric or triangular matrix storing one half
///
/// Writes to a symmetric table land in the single stored cell, so both
/// mirror positions read the new value. Writing a nonzero into the implicit
/// zero half of a triangular table fails with `UnsupportedOperation` and
/// leaves the table unchanged.
#[derive(Debug)]
pub struct PackedNumericTable<T: BlockValue> {
    kind: PackedKind,
    n: usize,
    buffer: Option<SharedBuffer<T>>,
    dictionary: Dictionary,
    statistics: BasicStatistics,
    memory_status: MemoryStatus,
}

impl<T: BlockValue> PackedNumericTable<T> {
    pub fn create(n: usize, kind: PackedKind, flag: AllocationFlag) -> Result<Self> {
        let (buffer, memory_status) = match flag {
            AllocationFlag::DoAllocate => (
                Some(SharedBuffer::new(allocate_filled(packed_len(n)?, T::default())?)),
                MemoryStatus::InternallyAllocated,
            ),
            AllocationFlag::NotAllocate => (None, MemoryStatus::NotAllocated),
        };
        Ok(Self {
            kind,
            n,
            buffer,
            dictionary: Dictionary::homogeneous(n, T::DATA_TYPE),
            statistics: BasicStatistics::new(),
            memory_status,
        })
    }

    /// Take ownership of a packed array of `n * (n + 1) / 2` elements
    pub fn from_packed(data: Vec<T>, n: usize, kind: PackedKind) -> Result<Self> {
        let len = packed_len(n)?;
        if data.len() != len {
            return Err(Error::new(ErrorKind::IncorrectSizeOfBuffer)
                .with_detail(ErrorDetail::ExpectedValue, len)
                .with_detail(ErrorDetail::ActualValue, data.len())
                .into());
        }
        let mut table = Self::create(n, kind, AllocationFlag::NotAllocate)?;
        table.buffer = Some(SharedBuffer::new(data));
        table.memory_status = MemoryStatus::InternallyAllocated;
        Ok(table)
    }

    /// View a caller-owned packed array without copying
    pub fn wrap(buffer: SharedBuffer<T>, n: usize, kind: PackedKind) -> Result<Self> {
        check_buffer_len(buffer.len(), packed_len(n)?)?;
        let mut table = Self::create(n, kind, AllocationFlag::NotAllocate)?;
        table.buffer = Some(buffer);
        table.memory_status = MemoryStatus::UserAllocated;
        Ok(table)
    }

    pub fn kind(&self) -> PackedKind {
        self.kind
    }

    /// Copy of the packed array
    pub fn packed_array(&self) -> Result<Vec<T>> {
        let len = packed_len(self.n)?;
        Ok(attached(&self.buffer, "packed")?.with_read(|d| d[..len].to_vec()))
    }

    pub fn into_ptr(self) -> NumericTablePtr {
        Arc::new(self)
    }

    /// First `(row, column)` in `cells` that would store a nonzero in the zero half
    fn implicit_zero_violation(&self, cells: impl Iterator<Item = (usize, usize, usize)>, src: &BlockSlice<'_>) -> Option<(usize, usize)> {
        let zero = T::default();
        cells
            .filter(|&(i, j, _)| self.kind.index(self.n, i, j).is_none())
            .find(|&(_, _, k)| src.get::<T>(k) != zero)
            .map(|(i, j, _)| (i, j))
    }
}

fn implicit_zero_error(row: usize, column: usize) -> algokit_core::Status {
    Error::new(ErrorKind::UnsupportedOperation)
        .with_detail(ErrorDetail::Row, row)
        .with_detail(ErrorDetail::Column, column)
        .with_detail(ErrorDetail::Message, "nonzero outside the stored triangle")
        .into()
}

impl<T: BlockValue> NumericTable for PackedNumericTable<T> {
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
        self.kind.layout()
    }

    fn basic_statistics(&self) -> &BasicStatistics {
        &self.statistics
    }

    fn memory_status(&self) -> MemoryStatus {
        self.memory_status
    }

    fn pull_rows(&self, start: usize, mut out: BlockBuffer<'_>) -> Result<()> {
        let buffer = attached(&self.buffer, "packed")?;
        let n = self.n;
        let n_rows = rows_in(out.len(), n)?;
        check_row_range(start, n_rows, n)?;
        buffer.with_read(|data| {
            for r in 0..n_rows {
                for c in 0..n {
                    let value = self.kind.index(n, start + r, c).map_or(T::default(), |k| data[k]);
                    out.set(r * n + c, value);
                }
            }
        });
        Ok(())
    }

    fn push_rows(&self, start: usize, src: BlockSlice<'_>) -> Result<()> {
        let buffer = attached(&self.buffer, "packed")?;
        let n = self.n;
        let n_rows = rows_in(src.len(), n)?;
        check_row_range(start, n_rows, n)?;
        let cells = (0..n_rows).flat_map(|r| (0..n).map(move |c| (start + r, c, r * n + c)));
        if let Some((i, j)) = self.implicit_zero_violation(cells.clone(), &src) {
            return Err(implicit_zero_error(i, j));
        }
        buffer.with_write(|data| {
            for (i, j, k) in cells {
                if let Some(idx) = self.kind.index(n, i, j) {
                    data[idx] = src.get(k);
                }
            }
        });
        Ok(())
    }

    fn pull_column(&self, column: usize, start: usize, mut out: BlockBuffer<'_>) -> Result<()> {
        let buffer = attached(&self.buffer, "packed")?;
        check_column_index(column, self.n)?;
        let n_rows = out.len();
        check_row_range(start, n_rows, self.n)?;
        buffer.with_read(|data| {
            for r in 0..n_rows {
                let value = self
                    .kind
                    .index(self.n, start + r, column)
                    .map_or(T::default(), |k| data[k]);
                out.set(r, value);
            }
        });
        Ok(())
    }

    fn push_column(&self, column: usize, start: usize, src: BlockSlice<'_>) -> Result<()> {
        let buffer = attached(&self.buffer, "packed")?;
        check_column_index(column, self.n)?;
        check_row_range(start, src.len(), self.n)?;
        let cells = (0..src.len()).map(|r| (start + r, column, r));
        if let Some((i, j)) = self.implicit_zero_violation(cells.clone(), &src) {
            return Err(implicit_zero_error(i, j));
        }
        buffer.with_write(|data| {
            for (i, j, k) in cells {
                if let Some(idx) = self.kind.index(self.n, i, j) {
                    data[idx] = src.get(k);
                }
            }
        });
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(bound = "T: BlockValue")]
struct PackedPayload<T> {
    n: usize,
    kind: PackedKind,
    dictionary: Dictionary,
    #[serde(with = "crate::serialization::lossless::option")]
    data: Option<Vec<T>>,
}

impl<T: BlockValue> SerializationIface for PackedNumericTable<T> {
    fn serialization_tag(&self) -> u32 {
        tags::typed(tags::PACKED_TABLE, T::DATA_TYPE)
    }

    fn serialize_payload(&self) -> Result<Value> {
        let data = match &self.buffer {
            Some(_) => Some(self.packed_array()?),
            None => None,
        };
        to_payload(&PackedPayload {
            n: self.n,
            kind: self.kind,
            dictionary: self.dictionary.clone(),
            data,
        })
    }
}

pub(super) fn packed_from_payload<T: BlockValue>(payload: &Value) -> Result<DataObject> {
    let payload: PackedPayload<T> = from_payload(payload)?;
    let mut table = match payload.data {
        Some(data) => PackedNumericTable::from_packed(data, payload.n, payload.kind)?,
        None => PackedNumericTable::create(payload.n, payload.kind, AllocationFlag::NotAllocate)?,
    };
    super::check_dictionary_width(&payload.dictionary, payload.n)?;
    table.dictionary = payload.dictionary;
    Ok(DataObject::Table(table.into_ptr()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::ReadWriteMode;
    use crate::table::NumericTableExt;

    #[test]
    fn test_packed_indices() {
        // Upper rows of a 3x3: (0,0) (0,1) (0,2) | (1,1) (1,2) | (2,2)
        assert_eq!(PackedKind::TriangularUpper.index(3, 1, 1), Some(3));
        assert_eq!(PackedKind::TriangularUpper.index(3, 1, 2), Some(4));
        assert_eq!(PackedKind::TriangularUpper.index(3, 2, 2), Some(5));
        assert_eq!(PackedKind::TriangularUpper.index(3, 2, 0), None);
        // Lower rows: (0,0) | (1,0) (1,1) | (2,0) (2,1) (2,2)
        assert_eq!(PackedKind::TriangularLower.index(3, 2, 1), Some(4));
        assert_eq!(PackedKind::SymmetricLower.index(3, 0, 2), Some(3));
        assert_eq!(packed_len(3).unwrap(), 6);
    }

    #[test]
    fn test_symmetric_expansion() {
        let table = PackedNumericTable::from_packed(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3, PackedKind::SymmetricUpper)
            .unwrap();
        let dense = table.to_row_major::<f64>().unwrap();
        assert_eq!(dense, vec![1.0, 2.0, 3.0, 2.0, 4.0, 5.0, 3.0, 5.0, 6.0]);
    }

    #[test]
    fn test_symmetric_write_mirrors() {
        let table = PackedNumericTable::<f64>::create(2, PackedKind::SymmetricLower, AllocationFlag::DoAllocate)
            .unwrap();
        let mut block = table.get_block_of_column_values::<f64>(1, 0, 1, ReadWriteMode::WriteOnly).unwrap();
        block.as_mut_slice().unwrap()[0] = 9.0;
        table.release_block_of_column_values(block).unwrap();
        assert_eq!(table.to_row_major::<f64>().unwrap(), vec![0.0, 9.0, 9.0, 0.0]);
    }

    #[test]
    fn test_triangular_rejects_nonzero_in_zero_half() {
        let table = PackedNumericTable::<f32>::create(2, PackedKind::TriangularUpper, AllocationFlag::DoAllocate)
            .unwrap();
        let mut block = table.get_block_of_rows::<f32>(0, 2, ReadWriteMode::WriteOnly).unwrap();
        block.as_mut_slice().unwrap().copy_from_slice(&[1.0, 2.0, 7.0, 3.0]);
        let err = table.release_block_of_rows(block).unwrap_err();
        assert!(err.contains(ErrorKind::UnsupportedOperation));
        assert_eq!(table.packed_array().unwrap(), vec![0.0; 3]);

        let mut block = table.get_block_of_rows::<f32>(0, 2, ReadWriteMode::WriteOnly).unwrap();
        block.as_mut_slice().unwrap().copy_from_slice(&[1.0, 2.0, 0.0, 3.0]);
        table.release_block_of_rows(block).unwrap();
        assert_eq!(table.packed_array().unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(table.layout(), StorageLayout::PackedTriangularUpper);
    }
}
