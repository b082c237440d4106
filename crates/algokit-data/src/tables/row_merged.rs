use std::sync::{Arc, PoisonError, RwLock};

use algokit_core::{Error, ErrorDetail, ErrorKind, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::block::{BlockBuffer, BlockSlice};
use crate::buffer::MemoryStatus;
use crate::collection::DataObject;
use crate::dictionary::Dictionary;
use crate::serialization::{from_payload, table_from_archive, tags, to_payload, Archive, SerializationIface};
use crate::statistics::BasicStatistics;
use crate::table::{check_column_index, check_row_range, rows_in, NumericTable, NumericTablePtr, StorageLayout};

/// Tables of equal width stacked vertically
///
/// The column count is fixed at construction; the row count grows with
/// every [`add_table`](Self::add_table).
#[derive(Debug)]
pub struct RowMergedNumericTable {
    tables: RwLock<Vec<NumericTablePtr>>,
    n_columns: usize,
    dictionary: Dictionary,
    statistics: BasicStatistics,
}

impl RowMergedNumericTable {
    pub fn new(dictionary: Dictionary) -> Self {
        Self {
            tables: RwLock::new(Vec::new()),
            n_columns: dictionary.number_of_features(),
            dictionary,
            statistics: BasicStatistics::new(),
        }
    }

    /// Stack `tables`, taking the column metadata from the first one
    pub fn from_tables(tables: Vec<NumericTablePtr>) -> Result<Self> {
        let dictionary = tables
            .first()
            .map(|t| t.dictionary().clone())
            .ok_or_else(|| Error::new(ErrorKind::EmptyInput).with_detail(ErrorDetail::ArgumentName, "tables"))?;
        let merged = Self::new(dictionary);
        for table in tables {
            merged.add_table(table)?;
        }
        Ok(merged)
    }

    /// Append a table below the current rows
    pub fn add_table(&self, table: NumericTablePtr) -> Result<()> {
        if table.number_of_columns() != self.n_columns {
            return Err(Error::new(ErrorKind::IncorrectNumberOfColumns)
                .with_detail(ErrorDetail::ArgumentName, "table")
                .with_detail(ErrorDetail::ExpectedValue, self.n_columns)
                .with_detail(ErrorDetail::ActualValue, table.number_of_columns())
                .into());
        }
        self.tables.write().unwrap_or_else(PoisonError::into_inner).push(table);
        Ok(())
    }

    pub fn number_of_tables(&self) -> usize {
        self.tables.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn into_ptr(self) -> NumericTablePtr {
        Arc::new(self)
    }

    fn parts(&self) -> Vec<NumericTablePtr> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Visit the parts overlapping `[start, start + n_rows)`
    ///
    /// `f` receives the part, the first row inside it, and the row range of
    /// the request it covers.
    fn for_each_part(
        &self,
        start: usize,
        n_rows: usize,
        mut f: impl FnMut(&NumericTablePtr, usize, std::ops::Range<usize>) -> Result<()>,
    ) -> Result<()> {
        let parts = self.parts();
        let total = parts.iter().map(|t| t.number_of_rows()).sum();
        check_row_range(start, n_rows, total)?;
        let end = start + n_rows;
        let mut base = 0;
        for part in &parts {
            let part_rows = part.number_of_rows();
            let from = start.max(base);
            let to = end.min(base + part_rows);
            if from < to {
                f(part, from - base, from - start..to - start)?;
            }
            base += part_rows;
            if base >= end {
                break;
            }
        }
        Ok(())
    }
}

impl NumericTable for RowMergedNumericTable {
    fn number_of_rows(&self) -> usize {
        self.parts().iter().map(|t| t.number_of_rows()).sum()
    }

    fn number_of_columns(&self) -> usize {
        self.n_columns
    }

    fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    fn layout(&self) -> StorageLayout {
        StorageLayout::RowMerged
    }

    fn basic_statistics(&self) -> &BasicStatistics {
        &self.statistics
    }

    fn memory_status(&self) -> MemoryStatus {
        if self.parts().iter().any(|t| t.memory_status() == MemoryStatus::NotAllocated) {
            MemoryStatus::NotAllocated
        } else {
            MemoryStatus::InternallyAllocated
        }
    }

    fn pull_rows(&self, start: usize, mut out: BlockBuffer<'_>) -> Result<()> {
        let width = self.n_columns;
        let n_rows = rows_in(out.len(), width)?;
        self.for_each_part(start, n_rows, |part, local, rows| {
            part.pull_rows(local, out.sub(rows.start * width..rows.end * width))
        })
    }

    fn push_rows(&self, start: usize, src: BlockSlice<'_>) -> Result<()> {
        let width = self.n_columns;
        let n_rows = rows_in(src.len(), width)?;
        self.for_each_part(start, n_rows, |part, local, rows| {
            part.push_rows(local, src.sub(rows.start * width..rows.end * width))
        })
    }

    fn pull_column(&self, column: usize, start: usize, mut out: BlockBuffer<'_>) -> Result<()> {
        check_column_index(column, self.n_columns)?;
        let n_rows = out.len();
        self.for_each_part(start, n_rows, |part, local, rows| {
            part.pull_column(column, local, out.sub(rows))
        })
    }

    fn push_column(&self, column: usize, start: usize, src: BlockSlice<'_>) -> Result<()> {
        check_column_index(column, self.n_columns)?;
        self.for_each_part(start, src.len(), |part, local, rows| {
            part.push_column(column, local, src.sub(rows))
        })
    }

    fn supports_dense_write(&self) -> bool {
        self.parts().iter().all(|t| t.supports_dense_write())
    }
}

#[derive(Serialize, Deserialize)]
struct RowMergedPayload {
    dictionary: Dictionary,
    parts: Vec<Archive>,
}

impl SerializationIface for RowMergedNumericTable {
    fn serialization_tag(&self) -> u32 {
        tags::ROW_MERGED_TABLE
    }

    fn serialize_payload(&self) -> Result<Value> {
        let parts = self
            .parts()
            .iter()
            .map(|t| Archive::of(t.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        to_payload(&RowMergedPayload {
            dictionary: self.dictionary.clone(),
            parts,
        })
    }
}

pub(super) fn row_merged_from_payload(payload: &Value) -> Result<DataObject> {
    let payload: RowMergedPayload = from_payload(payload)?;
    let merged = RowMergedNumericTable::new(payload.dictionary);
    for part in &payload.parts {
        merged.add_table(table_from_archive(part)?)?;
    }
    Ok(DataObject::Table(merged.into_ptr()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::ReadWriteMode;
    use crate::table::NumericTableExt;
    use crate::tables::HomogenNumericTable;
    use algokit_core::DataType;

    fn stacked() -> (RowMergedNumericTable, NumericTablePtr) {
        let top = HomogenNumericTable::from_vec(vec![1.0f64, 2.0], 2, 1).unwrap().into_ptr();
        let bottom = HomogenNumericTable::from_vec(vec![3.0f32, 4.0, 5.0, 6.0], 2, 2).unwrap().into_ptr();
        let merged = RowMergedNumericTable::from_tables(vec![top, bottom.clone()]).unwrap();
        (merged, bottom)
    }

    #[test]
    fn test_rows_span_parts() {
        let (merged, _) = stacked();
        assert_eq!(merged.number_of_rows(), 3);
        let block = merged.get_block_of_rows::<f64>(0, 3, ReadWriteMode::ReadOnly).unwrap();
        assert_eq!(block.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let column = merged.get_block_of_column_values::<i32>(1, 1, 2, ReadWriteMode::ReadOnly).unwrap();
        assert_eq!(column.as_slice(), &[4, 6]);
    }

    #[test]
    fn test_grows_with_add_table() {
        let (merged, _) = stacked();
        merged
            .add_table(HomogenNumericTable::from_vec(vec![7i32, 8], 2, 1).unwrap().into_ptr())
            .unwrap();
        assert_eq!(merged.number_of_rows(), 4);
        assert_eq!(merged.number_of_tables(), 3);
        let err = merged
            .add_table(HomogenNumericTable::from_vec(vec![1.0f64], 1, 1).unwrap().into_ptr())
            .unwrap_err();
        assert!(err.contains(ErrorKind::IncorrectNumberOfColumns));
    }

    #[test]
    fn test_write_crossing_boundary() {
        let (merged, bottom) = stacked();
        let mut block = merged.get_block_of_rows::<f64>(0, 2, ReadWriteMode::ReadWrite).unwrap();
        block.as_mut_slice().unwrap()[2] = 30.0;
        merged.release_block_of_rows(block).unwrap();
        assert_eq!(bottom.to_row_major::<f32>().unwrap(), vec![30.0, 4.0, 5.0, 6.0]);
        assert_eq!(merged.dictionary().feature(0).unwrap().data_type, DataType::F64);
    }

    #[test]
    fn test_empty_merge_requires_dictionary() {
        let err = RowMergedNumericTable::from_tables(Vec::new()).unwrap_err();
        assert!(err.contains(ErrorKind::EmptyInput));
        let empty = RowMergedNumericTable::new(Dictionary::homogeneous(2, DataType::F64));
        assert_eq!(empty.number_of_rows(), 0);
        assert!(empty.get_block_of_rows::<f64>(0, 1, ReadWriteMode::ReadOnly).is_err());
    }
}
