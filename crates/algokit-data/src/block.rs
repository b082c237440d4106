//! Block descriptors and the type-erased buffers tables fill
//!
//! Table implementations are object-safe: they read into a [`BlockBuffer`] and
//! write from a [`BlockSlice`], both of which carry one of the native element
//! types. Conversion to the caller's requested type happens element-wise
//! while the block is materialized.

use std::ops::Range;
use std::sync::Arc;

use algokit_core::{convert_slice, DataType, Error, ErrorKind, Result, TableValue};

/// Access mode of a requested block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadWriteMode {
    ReadOnly,
    ReadWrite,
    WriteOnly,
}

impl ReadWriteMode {
    /// Whether releasing the block writes it back
    pub fn is_writable(self) -> bool {
        !matches!(self, ReadWriteMode::ReadOnly)
    }

    /// Whether the block must be filled from the table on acquire
    pub fn is_readable(self) -> bool {
        !matches!(self, ReadWriteMode::WriteOnly)
    }
}

/// Mutable destination of a block read
#[derive(Debug)]
pub enum BlockBuffer<'a> {
    F64(&'a mut [f64]),
    F32(&'a mut [f32]),
    I32(&'a mut [i32]),
}

impl<'a> BlockBuffer<'a> {
    pub fn len(&self) -> usize {
        match self {
            BlockBuffer::F64(d) => d.len(),
            BlockBuffer::F32(d) => d.len(),
            BlockBuffer::I32(d) => d.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> DataType {
        match self {
            BlockBuffer::F64(_) => DataType::F64,
            BlockBuffer::F32(_) => DataType::F32,
            BlockBuffer::I32(_) => DataType::I32,
        }
    }

    /// Reborrow a sub-range
    pub fn sub(&mut self, range: Range<usize>) -> BlockBuffer<'_> {
        match self {
            BlockBuffer::F64(d) => BlockBuffer::F64(&mut d[range]),
            BlockBuffer::F32(d) => BlockBuffer::F32(&mut d[range]),
            BlockBuffer::I32(d) => BlockBuffer::I32(&mut d[range]),
        }
    }

    /// Convert `src` into `self[offset..offset + src.len()]`
    pub fn fill_from<S: TableValue>(&mut self, offset: usize, src: &[S]) {
        let range = offset..offset + src.len();
        match self {
            BlockBuffer::F64(d) => convert_slice(src, &mut d[range]),
            BlockBuffer::F32(d) => convert_slice(src, &mut d[range]),
            BlockBuffer::I32(d) => convert_slice(src, &mut d[range]),
        }
    }

    /// Copy `len` elements of `src` starting at `src_offset` into `self` at `offset`
    pub fn fill_from_block(&mut self, offset: usize, src: &BlockSlice<'_>, src_offset: usize, len: usize) {
        let range = src_offset..src_offset + len;
        match src {
            BlockSlice::F64(s) => self.fill_from(offset, &s[range]),
            BlockSlice::F32(s) => self.fill_from(offset, &s[range]),
            BlockSlice::I32(s) => self.fill_from(offset, &s[range]),
        }
    }

    /// Set one element, converting from `S`
    pub fn set<S: TableValue>(&mut self, index: usize, value: S) {
        match self {
            BlockBuffer::F64(d) => d[index] = f64::cast_from(value),
            BlockBuffer::F32(d) => d[index] = f32::cast_from(value),
            BlockBuffer::I32(d) => d[index] = i32::cast_from(value),
        }
    }

    /// Fill every element with the zero of its type
    pub fn fill_zero(&mut self) {
        match self {
            BlockBuffer::F64(d) => d.fill(0.0),
            BlockBuffer::F32(d) => d.fill(0.0),
            BlockBuffer::I32(d) => d.fill(0),
        }
    }
}

/// Immutable source of a block write
#[derive(Debug, Clone, Copy)]
pub enum BlockSlice<'a> {
    F64(&'a [f64]),
    F32(&'a [f32]),
    I32(&'a [i32]),
}

impl<'a> BlockSlice<'a> {
    pub fn len(&self) -> usize {
        match self {
            BlockSlice::F64(s) => s.len(),
            BlockSlice::F32(s) => s.len(),
            BlockSlice::I32(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> DataType {
        match self {
            BlockSlice::F64(_) => DataType::F64,
            BlockSlice::F32(_) => DataType::F32,
            BlockSlice::I32(_) => DataType::I32,
        }
    }

    pub fn sub(&self, range: Range<usize>) -> BlockSlice<'a> {
        match *self {
            BlockSlice::F64(s) => BlockSlice::F64(&s[range]),
            BlockSlice::F32(s) => BlockSlice::F32(&s[range]),
            BlockSlice::I32(s) => BlockSlice::I32(&s[range]),
        }
    }

    /// Convert `self[offset..offset + dst.len()]` into `dst`
    pub fn copy_into<D: TableValue>(&self, offset: usize, dst: &mut [D]) {
        let range = offset..offset + dst.len();
        match self {
            BlockSlice::F64(s) => convert_slice(&s[range], dst),
            BlockSlice::F32(s) => convert_slice(&s[range], dst),
            BlockSlice::I32(s) => convert_slice(&s[range], dst),
        }
    }

    /// Read one element as `D`
    pub fn get<D: TableValue>(&self, index: usize) -> D {
        match self {
            BlockSlice::F64(s) => D::cast_from(s[index]),
            BlockSlice::F32(s) => D::cast_from(s[index]),
            BlockSlice::I32(s) => D::cast_from(s[index]),
        }
    }
}

/// Owned scratch block of a runtime-selected type
#[derive(Debug, Clone, PartialEq)]
pub enum OwnedBlock {
    F64(Vec<f64>),
    F32(Vec<f32>),
    I32(Vec<i32>),
}

impl OwnedBlock {
    pub fn zeros(data_type: DataType, len: usize) -> Self {
        match data_type {
            DataType::F64 => OwnedBlock::F64(vec![0.0; len]),
            DataType::F32 => OwnedBlock::F32(vec![0.0; len]),
            DataType::I32 => OwnedBlock::I32(vec![0; len]),
        }
    }

    pub fn as_buffer(&mut self) -> BlockBuffer<'_> {
        match self {
            OwnedBlock::F64(v) => BlockBuffer::F64(v),
            OwnedBlock::F32(v) => BlockBuffer::F32(v),
            OwnedBlock::I32(v) => BlockBuffer::I32(v),
        }
    }

    pub fn as_slice(&self) -> BlockSlice<'_> {
        match self {
            OwnedBlock::F64(v) => BlockSlice::F64(v),
            OwnedBlock::F32(v) => BlockSlice::F32(v),
            OwnedBlock::I32(v) => BlockSlice::I32(v),
        }
    }
}

/// Zero-copy view into a table's storage snapshot
#[derive(Debug, Clone)]
pub struct SharedRows<T> {
    data: Arc<Vec<T>>,
    range: Range<usize>,
}

impl<T> SharedRows<T> {
    pub fn new(data: Arc<Vec<T>>, range: Range<usize>) -> Self {
        Self { data, range }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data[self.range.clone()]
    }
}

/// A zero-copy view of any native element type
#[derive(Debug, Clone)]
pub enum Borrowed {
    F64(SharedRows<f64>),
    F32(SharedRows<f32>),
    I32(SharedRows<i32>),
}

/// Element types that can be requested as blocks
pub trait BlockValue: TableValue {
    fn as_buffer(data: &mut [Self]) -> BlockBuffer<'_>;

    fn as_block_slice(data: &[Self]) -> BlockSlice<'_>;

    fn wrap_shared(rows: SharedRows<Self>) -> Borrowed;

    fn unwrap_shared(borrowed: Borrowed) -> Option<SharedRows<Self>>;
}

macro_rules! impl_block_value {
    ($type:ty, $variant:ident) => {
        impl BlockValue for $type {
            fn as_buffer(data: &mut [Self]) -> BlockBuffer<'_> {
                BlockBuffer::$variant(data)
            }

            fn as_block_slice(data: &[Self]) -> BlockSlice<'_> {
                BlockSlice::$variant(data)
            }

            fn wrap_shared(rows: SharedRows<Self>) -> Borrowed {
                Borrowed::$variant(rows)
            }

            fn unwrap_shared(borrowed: Borrowed) -> Option<SharedRows<Self>> {
                match borrowed {
                    Borrowed::$variant(rows) => Some(rows),
                    _ => None,
                }
            }
        }
    };
}

impl_block_value!(f64, F64);
impl_block_value!(f32, F32);
impl_block_value!(i32, I32);

/// Region of a table a block covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRegion {
    Rows { start: usize, n_rows: usize },
    Column { column: usize, start: usize, n_rows: usize },
}

#[derive(Debug)]
enum BlockData<T> {
    Shared(SharedRows<T>),
    Owned(Vec<T>),
}

/// A typed, possibly converted view over a block of a table
///
/// Obtained from `get_block_of_rows` / `get_block_of_column_values` and handed
/// back to the matching release call, which consumes it. Writable blocks are
/// always owned copies that reach the table on release.
#[derive(Debug)]
pub struct BlockDescriptor<T: BlockValue> {
    data: BlockData<T>,
    mode: ReadWriteMode,
    region: BlockRegion,
    n_columns: usize,
}

impl<T: BlockValue> BlockDescriptor<T> {
    pub(crate) fn owned(data: Vec<T>, mode: ReadWriteMode, region: BlockRegion, n_columns: usize) -> Self {
        Self {
            data: BlockData::Owned(data),
            mode,
            region,
            n_columns,
        }
    }

    pub(crate) fn shared(rows: SharedRows<T>, region: BlockRegion, n_columns: usize) -> Self {
        Self {
            data: BlockData::Shared(rows),
            mode: ReadWriteMode::ReadOnly,
            region,
            n_columns,
        }
    }

    pub fn as_slice(&self) -> &[T] {
        match &self.data {
            BlockData::Shared(rows) => rows.as_slice(),
            BlockData::Owned(v) => v.as_slice(),
        }
    }

    /// Mutable access; fails for read-only blocks
    pub fn as_mut_slice(&mut self) -> Result<&mut [T]> {
        match (&mut self.data, self.mode) {
            (BlockData::Owned(v), mode) if mode.is_writable() => Ok(v.as_mut_slice()),
            _ => Err(Error::new(ErrorKind::UnsupportedOperation)
                .with_detail(algokit_core::ErrorDetail::Message, "block was acquired read-only")
                .into()),
        }
    }

    pub fn mode(&self) -> ReadWriteMode {
        self.mode
    }

    pub fn region(&self) -> BlockRegion {
        self.region
    }

    pub fn number_of_rows(&self) -> usize {
        match self.region {
            BlockRegion::Rows { n_rows, .. } | BlockRegion::Column { n_rows, .. } => n_rows,
        }
    }

    /// Values per row: table width for row blocks, one for column blocks
    pub fn number_of_columns(&self) -> usize {
        self.n_columns
    }

    /// Row `i` of the block
    pub fn row(&self, i: usize) -> &[T] {
        let w = self.n_columns;
        &self.as_slice()[i * w..(i + 1) * w]
    }

    /// Whether the block points straight into table storage
    pub fn is_zero_copy(&self) -> bool {
        matches!(self.data, BlockData::Shared(_))
    }

    pub fn into_vec(self) -> Vec<T> {
        match self.data {
            BlockData::Shared(rows) => rows.as_slice().to_vec(),
            BlockData::Owned(v) => v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_conversion() {
        let mut out = vec![0i32; 4];
        let mut buffer = i32::as_buffer(&mut out);
        buffer.fill_from(1, &[1.9f64, -2.2]);
        buffer.set(3, 7.0f32);
        assert_eq!(out, vec![0, 1, -2, 7]);
    }

    #[test]
    fn test_slice_copy_and_get() {
        let src = [1.0f32, 2.5, 3.0];
        let slice = f32::as_block_slice(&src);
        let mut dst = [0f64; 2];
        slice.copy_into(1, &mut dst);
        assert_eq!(dst, [2.5, 3.0]);
        assert_eq!(slice.get::<i32>(1), 2);
        assert_eq!(slice.sub(1..3).len(), 2);
    }

    #[test]
    fn test_shared_round_trip() {
        let rows = SharedRows::new(Arc::new(vec![1.0f64, 2.0, 3.0]), 1..3);
        let borrowed = f64::wrap_shared(rows);
        assert!(f32::unwrap_shared(borrowed.clone()).is_none());
        let back = f64::unwrap_shared(borrowed).unwrap();
        assert_eq!(back.as_slice(), &[2.0, 3.0]);
    }

    #[test]
    fn test_read_only_descriptor_rejects_mutation() {
        let region = BlockRegion::Rows { start: 0, n_rows: 1 };
        let mut block = BlockDescriptor::owned(vec![1.0f64, 2.0], ReadWriteMode::ReadOnly, region, 2);
        assert!(block.as_mut_slice().is_err());
        assert_eq!(block.row(0), &[1.0, 2.0]);

        let mut block = BlockDescriptor::owned(vec![1.0f64, 2.0], ReadWriteMode::ReadWrite, region, 2);
        block.as_mut_slice().unwrap()[1] = 5.0;
        assert_eq!(block.into_vec(), vec![1.0, 5.0]);
    }
}
