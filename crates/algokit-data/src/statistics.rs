//! Basic-statistics side table attached to a numeric table
//!
//! Producers (data sources, earlier passes) may attach per-column minimum,
//! maximum, sum and sum of squares so later algorithms skip recomputing them.
//! The cache is never invalidated automatically: whoever mutates the table's
//! data clears stale entries.

use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use crate::table::NumericTablePtr;

/// Identifier of a cached statistic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatisticId {
    Minimum,
    Maximum,
    Sum,
    SumSquares,
}

/// Cache of `1 x nColumns` statistic tables
#[derive(Default)]
pub struct BasicStatistics {
    entries: RwLock<HashMap<StatisticId, NumericTablePtr>>,
}

impl BasicStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: StatisticId) -> Option<NumericTablePtr> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(&id).cloned()
    }

    pub fn set(&self, id: StatisticId, table: NumericTablePtr) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(id, table);
    }

    pub fn remove(&self, id: StatisticId) -> Option<NumericTablePtr> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(&id)
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.is_empty()
    }
}

impl fmt::Debug for BasicStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<_> = entries.keys().copied().collect();
        keys.sort_by_key(|k| *k as u8);
        f.debug_struct("BasicStatistics").field("cached", &keys).finish()
    }
}
