//! Scoped block access
//!
//! Guards pair acquire with release: a [`WriteRows`] dropped without an
//! explicit [`WriteRows::finish`] still writes back, logging any failure.

use std::ops::{Deref, DerefMut};

use algokit_core::{Error, Result};

use crate::block::{BlockDescriptor, BlockValue, ReadWriteMode};
use crate::table::{NumericTable, NumericTableExt};

fn require_writable(mode: ReadWriteMode) -> Result<()> {
    if !mode.is_writable() {
        return Err(Error::unsupported("write guard acquired with a read-only mode").into());
    }
    Ok(())
}

/// Read-only rows of a table, released on drop
#[derive(Debug)]
pub struct ReadRows<'t, T: BlockValue> {
    table: &'t dyn NumericTable,
    block: Option<BlockDescriptor<T>>,
}

impl<'t, T: BlockValue> ReadRows<'t, T> {
    pub fn new(table: &'t dyn NumericTable, start: usize, n_rows: usize) -> Result<Self> {
        let block = table.get_block_of_rows::<T>(start, n_rows, ReadWriteMode::ReadOnly)?;
        Ok(Self {
            table,
            block: Some(block),
        })
    }

    pub fn is_zero_copy(&self) -> bool {
        self.block.as_ref().is_some_and(|b| b.is_zero_copy())
    }

    /// Row `i` of the guarded block
    pub fn row(&self, i: usize) -> &[T] {
        self.block.as_ref().map_or(&[], |b| b.row(i))
    }
}

impl<T: BlockValue> Deref for ReadRows<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.block.as_ref().map_or(&[], |b| b.as_slice())
    }
}

impl<T: BlockValue> Drop for ReadRows<'_, T> {
    fn drop(&mut self) {
        if let Some(block) = self.block.take() {
            if let Err(status) = self.table.release_block_of_rows(block) {
                log::warn!("failed to release read block: {status}");
            }
        }
    }
}

/// Writable rows of a table, written back on drop or [`finish`](Self::finish)
#[derive(Debug)]
pub struct WriteRows<'t, T: BlockValue> {
    table: &'t dyn NumericTable,
    block: Option<BlockDescriptor<T>>,
}

impl<'t, T: BlockValue> WriteRows<'t, T> {
    pub fn new(table: &'t dyn NumericTable, start: usize, n_rows: usize, mode: ReadWriteMode) -> Result<Self> {
        require_writable(mode)?;
        let block = table.get_block_of_rows::<T>(start, n_rows, mode)?;
        Ok(Self {
            table,
            block: Some(block),
        })
    }

    /// Write back now and surface the result
    pub fn finish(mut self) -> Result<()> {
        match self.block.take() {
            Some(block) => self.table.release_block_of_rows(block),
            None => Ok(()),
        }
    }

    pub fn number_of_columns(&self) -> usize {
        self.block.as_ref().map_or(0, |b| b.number_of_columns())
    }
}

impl<T: BlockValue> Deref for WriteRows<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.block.as_ref().map_or(&[], |b| b.as_slice())
    }
}

impl<T: BlockValue> DerefMut for WriteRows<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        match self.block.as_mut().map(|b| b.as_mut_slice()) {
            Some(Ok(slice)) => slice,
            _ => &mut [],
        }
    }
}

impl<T: BlockValue> Drop for WriteRows<'_, T> {
    fn drop(&mut self) {
        if let Some(block) = self.block.take() {
            if let Err(status) = self.table.release_block_of_rows(block) {
                log::warn!("failed to write back block: {status}");
            }
        }
    }
}

/// Read-only part of one column, released on drop
#[derive(Debug)]
pub struct ReadColumn<'t, T: BlockValue> {
    table: &'t dyn NumericTable,
    block: Option<BlockDescriptor<T>>,
}

impl<'t, T: BlockValue> ReadColumn<'t, T> {
    pub fn new(table: &'t dyn NumericTable, column: usize, start: usize, n_rows: usize) -> Result<Self> {
        let block = table.get_block_of_column_values::<T>(column, start, n_rows, ReadWriteMode::ReadOnly)?;
        Ok(Self {
            table,
            block: Some(block),
        })
    }
}

impl<T: BlockValue> Deref for ReadColumn<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.block.as_ref().map_or(&[], |b| b.as_slice())
    }
}

impl<T: BlockValue> Drop for ReadColumn<'_, T> {
    fn drop(&mut self) {
        if let Some(block) = self.block.take() {
            if let Err(status) = self.table.release_block_of_column_values(block) {
                log::warn!("failed to release column block: {status}");
            }
        }
    }
}

/// Writable part of one column
#[derive(Debug)]
pub struct WriteColumn<'t, T: BlockValue> {
    table: &'t dyn NumericTable,
    block: Option<BlockDescriptor<T>>,
}

impl<'t, T: BlockValue> WriteColumn<'t, T> {
    pub fn new(
        table: &'t dyn NumericTable,
        column: usize,
        start: usize,
        n_rows: usize,
        mode: ReadWriteMode,
    ) -> Result<Self> {
        require_writable(mode)?;
        let block = table.get_block_of_column_values::<T>(column, start, n_rows, mode)?;
        Ok(Self {
            table,
            block: Some(block),
        })
    }

    pub fn finish(mut self) -> Result<()> {
        match self.block.take() {
            Some(block) => self.table.release_block_of_column_values(block),
            None => Ok(()),
        }
    }
}

impl<T: BlockValue> Deref for WriteColumn<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.block.as_ref().map_or(&[], |b| b.as_slice())
    }
}

impl<T: BlockValue> DerefMut for WriteColumn<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        match self.block.as_mut().map(|b| b.as_mut_slice()) {
            Some(Ok(slice)) => slice,
            _ => &mut [],
        }
    }
}

impl<T: BlockValue> Drop for WriteColumn<'_, T> {
    fn drop(&mut self) {
        if let Some(block) = self.block.take() {
            if let Err(status) = self.table.release_block_of_column_values(block) {
                log::warn!("failed to write back column block: {status}");
            }
        }
    }
}
