use std::sync::Arc;

use algokit_core::{DataType, Error, ErrorDetail, ErrorKind, Result};
use bytemuck::Pod;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{allocate_filled, attached, check_buffer_len, element_count};
use crate::block::{BlockBuffer, BlockSlice};
use crate::buffer::{AllocationFlag, MemoryStatus, SharedBuffer};
use crate::collection::DataObject;
use crate::dictionary::{Dictionary, FeatureInfo};
use crate::serialization::{from_payload, tags, to_payload, SerializationIface};
use crate::statistics::BasicStatistics;
use crate::table::{check_column_index, check_row_range, rows_in, NumericTable, NumericTablePtr, StorageLayout};

/// One column of an array-of-structs record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AosField {
    /// Byte offset inside the record
    pub offset: usize,
    pub data_type: DataType,
}

impl AosField {
    pub fn new(offset: usize, data_type: DataType) -> Self {
        Self { offset, data_type }
    }

    /// Fields laid out back to back without padding
    pub fn packed(types: &[DataType]) -> Vec<AosField> {
        let mut offset = 0;
        types
            .iter()
            .map(|&data_type| {
                let field = AosField { offset, data_type };
                offset += data_type.size_of();
                field
            })
            .collect()
    }
}

/// Table of fixed-size records, one per row, with mixed column types
///
/// Records are plain bytes; every access decodes or encodes fields
/// through `bytemuck`, so no alignment is required.
#[derive(Debug)]
pub struct AosNumericTable {
    records: Option<SharedBuffer<u8>>,
    record_size: usize,
    fields: Vec<AosField>,
    n_rows: usize,
    dictionary: Dictionary,
    statistics: BasicStatistics,
    memory_status: MemoryStatus,
}

impl AosNumericTable {
    pub fn create(record_size: usize, fields: Vec<AosField>, n_rows: usize, flag: AllocationFlag) -> Result<Self> {
        if let Some(bad) = fields
            .iter()
            .position(|f| f.offset + f.data_type.size_of() > record_size)
        {
            return Err(Error::incorrect_parameter("fields")
                .with_detail(ErrorDetail::Column, bad)
                .with_detail(ErrorDetail::ExpectedValue, record_size)
                .into());
        }
        let (records, memory_status) = match flag {
            AllocationFlag::DoAllocate => {
                let len = element_count(n_rows, record_size)?;
                (Some(SharedBuffer::new(allocate_filled(len, 0u8)?)), MemoryStatus::InternallyAllocated)
            }
            AllocationFlag::NotAllocate => (None, MemoryStatus::NotAllocated),
        };
        let dictionary = Dictionary::from_features(
            fields
                .iter()
                .map(|f| FeatureInfo::continuous(f.data_type))
                .collect(),
        );
        Ok(Self {
            records,
            record_size,
            fields,
            n_rows,
            dictionary,
            statistics: BasicStatistics::new(),
            memory_status,
        })
    }

    /// Copy a slice of `Pod` records
    pub fn from_records<R: Pod>(records: &[R], fields: Vec<AosField>) -> Result<Self> {
        let mut table = Self::create(std::mem::size_of::<R>(), fields, records.len(), AllocationFlag::NotAllocate)?;
        table.records = Some(SharedBuffer::new(bytemuck::cast_slice(records).to_vec()));
        table.memory_status = MemoryStatus::InternallyAllocated;
        Ok(table)
    }

    /// View caller-owned record bytes without copying
    pub fn wrap(buffer: SharedBuffer<u8>, record_size: usize, fields: Vec<AosField>, n_rows: usize) -> Result<Self> {
        let mut table = Self::create(record_size, fields, n_rows, AllocationFlag::NotAllocate)?;
        check_buffer_len(buffer.len(), element_count(n_rows, record_size)?)?;
        table.records = Some(buffer);
        table.memory_status = MemoryStatus::UserAllocated;
        Ok(table)
    }

    pub fn fields(&self) -> &[AosField] {
        &self.fields
    }

    pub fn record_size(&self) -> usize {
        self.record_size
    }

    pub fn into_ptr(self) -> NumericTablePtr {
        Arc::new(self)
    }

    fn decode(&self, bytes: &[u8], row: usize, column: usize, out: &mut BlockBuffer<'_>, index: usize) {
        let field = self.fields[column];
        let at = row * self.record_size + field.offset;
        let raw = &bytes[at..at + field.data_type.size_of()];
        match field.data_type {
            DataType::F64 => out.set(index, bytemuck::pod_read_unaligned::<f64>(raw)),
            DataType::F32 => out.set(index, bytemuck::pod_read_unaligned::<f32>(raw)),
            DataType::I32 => out.set(index, bytemuck::pod_read_unaligned::<i32>(raw)),
        }
    }

    fn encode(&self, bytes: &mut [u8], row: usize, column: usize, src: &BlockSlice<'_>, index: usize) {
        let field = self.fields[column];
        let at = row * self.record_size + field.offset;
        let raw = &mut bytes[at..at + field.data_type.size_of()];
        match field.data_type {
            DataType::F64 => raw.copy_from_slice(bytemuck::bytes_of(&src.get::<f64>(index))),
            DataType::F32 => raw.copy_from_slice(bytemuck::bytes_of(&src.get::<f32>(index))),
            DataType::I32 => raw.copy_from_slice(bytemuck::bytes_of(&src.get::<i32>(index))),
        }
    }
}

impl NumericTable for AosNumericTable {
    fn number_of_rows(&self) -> usize {
        self.n_rows
    }

    fn number_of_columns(&self) -> usize {
        self.fields.len()
    }

    fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    fn layout(&self) -> StorageLayout {
        StorageLayout::ArrayOfStructs
    }

    fn basic_statistics(&self) -> &BasicStatistics {
        &self.statistics
    }

    fn memory_status(&self) -> MemoryStatus {
        self.memory_status
    }

    fn pull_rows(&self, start: usize, mut out: BlockBuffer<'_>) -> Result<()> {
        let records = attached(&self.records, "records")?;
        let n_columns = self.fields.len();
        let n_rows = rows_in(out.len(), n_columns)?;
        check_row_range(start, n_rows, self.n_rows)?;
        records.with_read(|bytes| {
            for r in 0..n_rows {
                for c in 0..n_columns {
                    self.decode(bytes, start + r, c, &mut out, r * n_columns + c);
                }
            }
        });
        Ok(())
    }

    fn push_rows(&self, start: usize, src: BlockSlice<'_>) -> Result<()> {
        let records = attached(&self.records, "records")?;
        let n_columns = self.fields.len();
        let n_rows = rows_in(src.len(), n_columns)?;
        check_row_range(start, n_rows, self.n_rows)?;
        records.with_write(|bytes| {
            for r in 0..n_rows {
                for c in 0..n_columns {
                    self.encode(bytes, start + r, c, &src, r * n_columns + c);
                }
            }
        });
        Ok(())
    }

    fn pull_column(&self, column: usize, start: usize, mut out: BlockBuffer<'_>) -> Result<()> {
        let records = attached(&self.records, "records")?;
        check_column_index(column, self.fields.len())?;
        let n_rows = out.len();
        check_row_range(start, n_rows, self.n_rows)?;
        records.with_read(|bytes| {
            for r in 0..n_rows {
                self.decode(bytes, start + r, column, &mut out, r);
            }
        });
        Ok(())
    }

    fn push_column(&self, column: usize, start: usize, src: BlockSlice<'_>) -> Result<()> {
        let records = attached(&self.records, "records")?;
        check_column_index(column, self.fields.len())?;
        check_row_range(start, src.len(), self.n_rows)?;
        records.with_write(|bytes| {
            for r in 0..src.len() {
                self.encode(bytes, start + r, column, &src, r);
            }
        });
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct AosPayload {
    record_size: usize,
    fields: Vec<AosField>,
    n_rows: usize,
    dictionary: Dictionary,
    records: Option<Vec<u8>>,
}

impl SerializationIface for AosNumericTable {
    fn serialization_tag(&self) -> u32 {
        tags::AOS_TABLE
    }

    fn serialize_payload(&self) -> Result<Value> {
        let len = self.n_rows * self.record_size;
        to_payload(&AosPayload {
            record_size: self.record_size,
            fields: self.fields.clone(),
            n_rows: self.n_rows,
            dictionary: self.dictionary.clone(),
            records: self.records.as_ref().map(|b| b.with_read(|d| d[..len].to_vec())),
        })
    }
}

pub(super) fn aos_from_payload(payload: &Value) -> Result<DataObject> {
    let payload: AosPayload = from_payload(payload)?;
    let mut table = AosNumericTable::create(
        payload.record_size,
        payload.fields,
        payload.n_rows,
        AllocationFlag::NotAllocate,
    )?;
    if let Some(records) = payload.records {
        check_buffer_len(records.len(), element_count(payload.n_rows, payload.record_size)?)?;
        table.records = Some(SharedBuffer::new(records));
        table.memory_status = MemoryStatus::InternallyAllocated;
    }
    if payload.dictionary.number_of_features() != table.fields.len() {
        return Err(Error::new(ErrorKind::IncorrectNumberOfColumns)
            .with_detail(ErrorDetail::ArgumentName, "dictionary")
            .into());
    }
    table.dictionary = payload.dictionary;
    Ok(DataObject::Table(table.into_ptr()))
}
