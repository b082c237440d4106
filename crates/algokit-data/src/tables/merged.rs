use std::sync::Arc;

use algokit_core::{Error, ErrorDetail, ErrorKind, Result};
use serde_json::Value;

use crate::block::{BlockBuffer, BlockSlice, OwnedBlock};
use crate::buffer::MemoryStatus;
use crate::collection::DataObject;
use crate::dictionary::Dictionary;
use crate::serialization::{from_payload, table_from_archive, tags, to_payload, Archive, SerializationIface};
use crate::statistics::BasicStatistics;
use crate::table::{check_column_index, check_row_range, rows_in, NumericTable, NumericTablePtr, StorageLayout};

/// Tables of equal height placed side by side
///
/// Holds shared handles to its parts; writes go through to them.
#[derive(Debug)]
pub struct MergedNumericTable {
    tables: Vec<NumericTablePtr>,
    /// First merged column of each part
    offsets: Vec<usize>,
    n_rows: usize,
    n_columns: usize,
    dictionary: Dictionary,
    statistics: BasicStatistics,
}

impl MergedNumericTable {
    pub fn new(tables: Vec<NumericTablePtr>) -> Result<Self> {
        let n_rows = tables.first().map_or(0, |t| t.number_of_rows());
        if let Some(bad) = tables.iter().position(|t| t.number_of_rows() != n_rows) {
            return Err(Error::new(ErrorKind::IncorrectNumberOfRows)
                .with_detail(ErrorDetail::ArgumentName, "tables")
                .with_detail(ErrorDetail::ExpectedValue, n_rows)
                .with_detail(ErrorDetail::ActualValue, tables[bad].number_of_rows())
                .into());
        }
        let mut offsets = Vec::with_capacity(tables.len());
        let mut n_columns = 0;
        for table in &tables {
            offsets.push(n_columns);
            n_columns += table.number_of_columns();
        }
        let dictionary = Dictionary::concat(tables.iter().map(|t| t.dictionary()));
        Ok(Self {
            tables,
            offsets,
            n_rows,
            n_columns,
            dictionary,
            statistics: BasicStatistics::new(),
        })
    }

    pub fn tables(&self) -> &[NumericTablePtr] {
        &self.tables
    }

    pub fn into_ptr(self) -> NumericTablePtr {
        Arc::new(self)
    }

    /// Part holding merged column `column` and the column inside it
    fn locate(&self, column: usize) -> (&NumericTablePtr, usize) {
        let part = self.offsets.partition_point(|&o| o <= column) - 1;
        (&self.tables[part], column - self.offsets[part])
    }
}

impl NumericTable for MergedNumericTable {
    fn number_of_rows(&self) -> usize {
        self.n_rows
    }

    fn number_of_columns(&self) -> usize {
        self.n_columns
    }

    fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    fn layout(&self) -> StorageLayout {
        StorageLayout::ColumnMerged
    }

    fn basic_statistics(&self) -> &BasicStatistics {
        &self.statistics
    }

    fn memory_status(&self) -> MemoryStatus {
        if self.tables.iter().any(|t| t.memory_status() == MemoryStatus::NotAllocated) {
            MemoryStatus::NotAllocated
        } else {
            MemoryStatus::InternallyAllocated
        }
    }

    fn pull_rows(&self, start: usize, mut out: BlockBuffer<'_>) -> Result<()> {
        let n_rows = rows_in(out.len(), self.n_columns)?;
        check_row_range(start, n_rows, self.n_rows)?;
        for (table, &offset) in self.tables.iter().zip(&self.offsets) {
            let width = table.number_of_columns();
            if width == 0 {
                continue;
            }
            let mut part = OwnedBlock::zeros(out.data_type(), n_rows * width);
            table.pull_rows(start, part.as_buffer())?;
            let part = part.as_slice();
            for r in 0..n_rows {
                out.fill_from_block(r * self.n_columns + offset, &part, r * width, width);
            }
        }
        Ok(())
    }

    fn push_rows(&self, start: usize, src: BlockSlice<'_>) -> Result<()> {
        let n_rows = rows_in(src.len(), self.n_columns)?;
        check_row_range(start, n_rows, self.n_rows)?;
        for (table, &offset) in self.tables.iter().zip(&self.offsets) {
            let width = table.number_of_columns();
            if width == 0 {
                continue;
            }
            let mut part = OwnedBlock::zeros(src.data_type(), n_rows * width);
            let mut buffer = part.as_buffer();
            for r in 0..n_rows {
                buffer.fill_from_block(r * width, &src, r * self.n_columns + offset, width);
            }
            table.push_rows(start, part.as_slice())?;
        }
        Ok(())
    }

    fn pull_column(&self, column: usize, start: usize, out: BlockBuffer<'_>) -> Result<()> {
        check_column_index(column, self.n_columns)?;
        let (table, local) = self.locate(column);
        table.pull_column(local, start, out)
    }

    fn push_column(&self, column: usize, start: usize, src: BlockSlice<'_>) -> Result<()> {
        check_column_index(column, self.n_columns)?;
        let (table, local) = self.locate(column);
        table.push_column(local, start, src)
    }

    fn supports_dense_write(&self) -> bool {
        self.tables.iter().all(|t| t.supports_dense_write())
    }
}

impl SerializationIface for MergedNumericTable {
    fn serialization_tag(&self) -> u32 {
        tags::MERGED_TABLE
    }

    fn serialize_payload(&self) -> Result<Value> {
        let parts = self
            .tables
            .iter()
            .map(|t| Archive::of(t.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        to_payload(&parts)
    }
}

pub(super) fn merged_from_payload(payload: &Value) -> Result<DataObject> {
    let parts: Vec<Archive> = from_payload(payload)?;
    let tables = parts.iter().map(table_from_archive).collect::<Result<Vec<_>>>()?;
    Ok(DataObject::Table(MergedNumericTable::new(tables)?.into_ptr()))
}
