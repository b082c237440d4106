//! Shared fixtures for table integration tests

#![allow(dead_code)]

use algokit_data::{HomogenNumericTable, NumericTablePtr};

pub use approx::assert_relative_eq;

/// The 4x4 reference table, row-major
pub const EXAMPLE_DATA: [f64; 16] = [
    7.0, 3.0, 6.0, 2.0, //
    1.0, 3.0, 0.0, 2.0, //
    9.0, 2.0, 6.0, 2.0, //
    3.0, 4.0, 7.0, 2.0,
];

pub fn example_table() -> HomogenNumericTable<f64> {
    HomogenNumericTable::from_vec(EXAMPLE_DATA.to_vec(), 4, 4).unwrap()
}

pub fn example_ptr() -> NumericTablePtr {
    example_table().into_ptr()
}

/// Sparse-ish dense data: every third element is nonzero
pub fn sparse_pattern(n_rows: usize, n_columns: usize) -> Vec<f64> {
    (0..n_rows * n_columns)
        .map(|i| if i % 3 == 0 { i as f64 + 0.5 } else { 0.0 })
        .collect()
}
