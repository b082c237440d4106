//! Shared backing storage for numeric tables
//!
//! A [`SharedBuffer`] is a reference-counted, lock-protected array. Tables
//! created with [`AllocationFlag::NotAllocate`] wrap a buffer the caller keeps a
//! handle to, so the caller observes every write made through the table
//! without any copy.
//!
//! Readers take a snapshot (`Arc<Vec<T>>`) under a short read lock and keep it
//! after the lock is released. Writers copy the array only while such a
//! snapshot is outstanding, so a reader never observes a partially applied
//! write.
//!
//! The length of a buffer never changes after construction.

use std::sync::{Arc, PoisonError, RwLock};

/// Allocation policy for table factories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllocationFlag {
    /// Allocate fresh storage owned by the table
    #[default]
    DoAllocate,
    /// Leave storage unset; the caller attaches its own buffer
    NotAllocate,
}

/// Where a table's storage came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryStatus {
    NotAllocated,
    InternallyAllocated,
    UserAllocated,
}

/// Reference-counted array shared between a table and its creator
#[derive(Debug)]
pub struct SharedBuffer<T> {
    inner: Arc<RwLock<Arc<Vec<T>>>>,
}

impl<T> Clone for SharedBuffer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone> SharedBuffer<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(data))),
        }
    }

    /// Current contents; stays valid after later writes
    pub fn snapshot(&self) -> Arc<Vec<T>> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn with_read<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(guard.as_slice())
    }

    /// Mutate in place, copying first only if a snapshot is outstanding
    ///
    /// The length is fixed at construction; tables wrapping the buffer rely
    /// on it.
    pub fn with_write<R>(&self, f: impl FnOnce(&mut [T]) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(Arc::make_mut(&mut guard).as_mut_slice())
    }

    pub fn len(&self) -> usize {
        self.with_read(|d| d.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.with_read(|d| d.to_vec())
    }

    /// Whether two handles refer to the same storage
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl<T: Clone> From<Vec<T>> for SharedBuffer<T> {
    fn from(data: Vec<T>) -> Self {
        SharedBuffer::new(data)
    }
}
