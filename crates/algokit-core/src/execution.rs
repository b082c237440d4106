//! Row-block execution for kernels
//!
//! The table and algorithm scaffolding is synchronous; kernels may split their
//! rows into blocks and process them on the rayon pool when the `parallel`
//! feature is enabled. Results always come back in block order, so reductions
//! over them are deterministic for a fixed block size.

use std::ops::Range;

/// Execution strategy for block operations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// Process blocks sequentially on the calling thread
    Sequential,
    /// Process blocks on the rayon pool
    Parallel,
}

impl ExecutionStrategy {
    /// Parallel when compiled in and more than one thread is available
    pub fn auto(number_of_threads: usize) -> Self {
        if cfg!(feature = "parallel") && number_of_threads > 1 {
            ExecutionStrategy::Parallel
        } else {
            ExecutionStrategy::Sequential
        }
    }
}

/// Split `[0, n_rows)` into consecutive ranges of at most `block_size` rows
pub fn row_blocks(n_rows: usize, block_size: usize) -> Vec<Range<usize>> {
    let block_size = block_size.max(1);
    (0..n_rows)
        .step_by(block_size)
        .map(|start| start..(start + block_size).min(n_rows))
        .collect()
}

/// Map `f` over the row blocks of a table, returning results in block order
pub fn map_row_blocks<F, R>(
    strategy: ExecutionStrategy,
    n_rows: usize,
    block_size: usize,
    f: F,
) -> Vec<R>
where
    F: Fn(Range<usize>) -> R + Sync + Send,
    R: Send,
{
    let blocks = row_blocks(n_rows, block_size);
    match strategy {
        #[cfg(feature = "parallel")]
        ExecutionStrategy::Parallel if blocks.len() > 1 => {
            use rayon::prelude::*;
            blocks.into_par_iter().map(f).collect()
        }
        _ => blocks.into_iter().map(f).collect(),
    }
}

/// Execute `f(i)` for `i in 0..count`, returning results in index order
pub fn execute_batch<F, R>(strategy: ExecutionStrategy, count: usize, f: F) -> Vec<R>
where
    F: Fn(usize) -> R + Sync + Send,
    R: Send,
{
    match strategy {
        #[cfg(feature = "parallel")]
        ExecutionStrategy::Parallel if count > 1 => {
            use rayon::prelude::*;
            (0..count).into_par_iter().map(f).collect()
        }
        _ => (0..count).map(f).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_blocks_cover_all_rows() {
        assert_eq!(row_blocks(10, 4), vec![0..4, 4..8, 8..10]);
        assert_eq!(row_blocks(4, 4), vec![0..4]);
        assert!(row_blocks(0, 4).is_empty());
        assert_eq!(row_blocks(3, 0), vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn test_map_row_blocks_preserves_order() {
        for strategy in [ExecutionStrategy::Sequential, ExecutionStrategy::Parallel] {
            let starts = map_row_blocks(strategy, 100, 7, |r| r.start);
            let expected: Vec<usize> = (0..100).step_by(7).collect();
            assert_eq!(starts, expected);
        }
    }

    #[test]
    fn test_execute_batch() {
        let squares = execute_batch(ExecutionStrategy::auto(4), 5, |i| i * i);
        assert_eq!(squares, vec![0, 1, 4, 9, 16]);
        assert_eq!(ExecutionStrategy::auto(1), ExecutionStrategy::Sequential);
    }
}
