//! Shared fixtures for algorithm integration tests

#![allow(dead_code)]

use algokit_data::{HomogenNumericTable, NumericTable, NumericTableExt, NumericTablePtr, StatisticId};

pub use approx::assert_relative_eq;

/// The 4x4 reference table, row-major
pub const EXAMPLE_DATA: [f64; 16] = [
    7.0, 3.0, 6.0, 2.0, //
    1.0, 3.0, 0.0, 2.0, //
    9.0, 2.0, 6.0, 2.0, //
    3.0, 4.0, 7.0, 2.0,
];

pub fn example_ptr() -> NumericTablePtr {
    HomogenNumericTable::from_vec(EXAMPLE_DATA.to_vec(), 4, 4).unwrap().into_ptr()
}

/// `n_rows x n_columns` table with distinct, uneven values
pub fn ramp(n_rows: usize, n_columns: usize) -> Vec<f64> {
    (0..n_rows * n_columns)
        .map(|i| ((i * 37) % 101) as f64 * 0.25 - 7.0)
        .collect()
}

pub fn table_of(data: &[f64], n_columns: usize) -> NumericTablePtr {
    HomogenNumericTable::from_vec(data.to_vec(), n_columns, data.len() / n_columns)
        .unwrap()
        .into_ptr()
}

/// Attach the column sums of `table` as its cached `Sum` statistic
pub fn cache_sums(table: &NumericTablePtr) {
    let n_columns = table.number_of_columns();
    let values = table.to_row_major::<f64>().unwrap();
    let sums: Vec<f64> = (0..n_columns)
        .map(|j| values.iter().skip(j).step_by(n_columns).sum())
        .collect();
    let sums = HomogenNumericTable::from_vec(sums, n_columns, 1).unwrap().into_ptr();
    table.basic_statistics().set(StatisticId::Sum, sums);
}

pub fn assert_all_close(actual: &[f64], expected: &[f64], epsilon: f64) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert_relative_eq!(*a, *e, epsilon = epsilon, max_relative = epsilon);
    }
}
