//! Dense/CSR conversion properties

mod common;

use algokit_data::{
    CsrNumericTable, CsrTableExt, HomogenNumericTable, NumericTable, NumericTableExt, ReadWriteMode,
};
use common::*;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_dense_csr_dense_round_trip(
        n_rows in 0usize..12,
        n_columns in 1usize..8,
        cells in proptest::collection::vec(prop_oneof![Just(0.0f64), -50.0f64..50.0], 96),
    ) {
        let dense = &cells[..n_rows * n_columns];
        let table = HomogenNumericTable::from_vec(dense.to_vec(), n_columns, n_rows).unwrap();
        let csr = CsrNumericTable::<f64>::from_table(&table).unwrap();

        // Zeros are never stored, every nonzero keeps its position.
        let values = csr.values();
        prop_assert!(values.iter().all(|&v| v != 0.0));
        prop_assert_eq!(values.len(), dense.iter().filter(|&&v| v != 0.0).count());
        for row in 0..n_rows {
            let range = csr.row_offsets()[row] - 1..csr.row_offsets()[row + 1] - 1;
            for k in range {
                let column = csr.column_indices()[k];
                prop_assert!(column >= 1 && column <= n_columns);
                prop_assert_eq!(values[k], dense[row * n_columns + column - 1]);
            }
        }

        let back = csr.to_row_major::<f64>().unwrap();
        prop_assert_eq!(&back[..], dense);

        let again = CsrNumericTable::<f64>::from_dense(&back, n_columns, n_rows).unwrap();
        prop_assert_eq!(again.values(), values);
        prop_assert_eq!(again.column_indices(), csr.column_indices());
        prop_assert_eq!(again.row_offsets(), csr.row_offsets());
    }
}

#[test]
fn test_sparse_block_over_pattern() {
    let dense = sparse_pattern(6, 5);
    let csr = CsrNumericTable::from_dense(&dense, 5, 6).unwrap();
    assert_eq!(csr.number_of_rows(), 6);

    let block = csr.get_sparse_block::<f32>(2, 3, ReadWriteMode::ReadOnly).unwrap();
    assert_eq!(block.number_of_rows(), 3);
    assert_eq!(block.row_offsets()[0], 1);
    for i in 0..3 {
        let (columns, values) = block.row(i);
        for (&c, &v) in columns.iter().zip(values) {
            assert_relative_eq!(v as f64, dense[(2 + i) * 5 + c - 1], epsilon = 1e-4);
        }
    }
    csr.release_sparse_block(block).unwrap();
}

#[test]
fn test_read_only_sparse_block_is_not_writable() {
    let csr = CsrNumericTable::from_dense(&[1.0f64, 0.0, 2.0, 3.0], 2, 2).unwrap();
    let mut block = csr.get_sparse_block::<f64>(0, 2, ReadWriteMode::ReadOnly).unwrap();
    assert!(block.values_mut().is_err());
    csr.release_sparse_block(block).unwrap();
    assert_eq!(csr.values(), vec![1.0, 2.0, 3.0]);
}
