//! Block acquire/release behaviour across layouts

mod common;

use std::thread;

use algokit_core::{DataType, ErrorKind};
use algokit_data::{
    check_numeric_table, AllocationFlag, Dictionary, FeatureInfo, HomogenNumericTable, NumericTable,
    NumericTableExt, ReadRows, ReadWriteMode, SharedBuffer, SoaNumericTable, SpecialValuePolicy, StorageLayout,
    WriteColumn, WriteRows,
};
use common::*;
use proptest::prelude::*;

#[test]
fn test_fresh_table_dimensions_and_assign() {
    for &(n_rows, n_columns) in &[(1, 1), (3, 7), (64, 2), (5, 1)] {
        let table = HomogenNumericTable::<f32>::create(n_columns, n_rows, AllocationFlag::DoAllocate).unwrap();
        assert_eq!(table.number_of_rows(), n_rows);
        assert_eq!(table.number_of_columns(), n_columns);
        table.assign(2.5f32).unwrap();
        let values = table.to_row_major::<f64>().unwrap();
        assert_eq!(values.len(), n_rows * n_columns);
        assert!(values.iter().all(|&v| v == 2.5));
    }
}

#[test]
fn test_guards_release_on_drop() {
    let table = example_table();
    {
        let rows = ReadRows::<f64>::new(&table, 0, 2).unwrap();
        assert!(rows.is_zero_copy());
        assert_eq!(rows.row(1), &[1.0, 3.0, 0.0, 2.0]);
    }
    {
        let mut rows = WriteRows::<i32>::new(&table, 3, 1, ReadWriteMode::ReadWrite).unwrap();
        assert_eq!(&rows[..], &[3, 4, 7, 2]);
        rows[0] = 30;
    }
    assert_eq!(table.to_row_major::<f64>().unwrap()[12], 30.0);

    let rows = WriteRows::<f64>::new(&table, 0, 1, ReadWriteMode::WriteOnly).unwrap();
    assert_eq!(rows.number_of_columns(), 4);
    rows.finish().unwrap();
    assert_eq!(&table.to_row_major::<f64>().unwrap()[..4], &[0.0; 4]);
}

#[test]
fn test_disjoint_concurrent_writers() {
    let n_rows = 64;
    let n_columns = 3;
    let table = HomogenNumericTable::<f64>::create(n_columns, n_rows, AllocationFlag::DoAllocate).unwrap();
    let table: &dyn NumericTable = &table;

    thread::scope(|scope| {
        for worker in 0..4usize {
            scope.spawn(move || {
                let start = worker * 16;
                for round in 0..50 {
                    let mut rows = WriteRows::<f64>::new(table, start, 16, ReadWriteMode::WriteOnly).unwrap();
                    rows.fill((worker * 1000 + round) as f64);
                    rows.finish().unwrap();

                    // A reader never sees a half-written block of another worker.
                    let other = (worker + 1) % 4;
                    let seen = ReadRows::<f64>::new(table, other * 16, 16).unwrap();
                    assert!(seen.iter().all(|&v| v == seen[0]));
                }
            });
        }
    });

    let values = table.to_row_major::<f64>().unwrap();
    for worker in 0..4 {
        let block = &values[worker * 16 * n_columns..(worker + 1) * 16 * n_columns];
        assert!(block.iter().all(|&v| v == (worker * 1000 + 49) as f64));
    }
}

#[test]
fn test_caller_buffer_sees_writes() {
    let caller = SharedBuffer::new(vec![0i32; 6]);
    let table = HomogenNumericTable::wrap(caller.clone(), 3, 2).unwrap();
    let mut block = table.get_block_of_column_values::<f64>(1, 0, 2, ReadWriteMode::WriteOnly).unwrap();
    block.as_mut_slice().unwrap().copy_from_slice(&[8.0, 9.0]);
    table.release_block_of_column_values(block).unwrap();
    assert_eq!(caller.to_vec(), vec![0, 8, 0, 0, 9, 0]);
}

#[test]
fn test_caller_writes_keep_wrapped_shape() {
    let caller = SharedBuffer::new(vec![1.0f64, 2.0, 3.0, 4.0]);
    let table = HomogenNumericTable::wrap(caller.clone(), 2, 2).unwrap();
    caller.with_write(|data| data.fill(-1.0));
    assert_eq!(caller.len(), 4);

    let block = table.get_block_of_rows::<f32>(0, 2, ReadWriteMode::ReadOnly).unwrap();
    assert_eq!(block.as_slice(), &[-1.0f32; 4]);
    table.release_block_of_rows(block).unwrap();

    let err = table.get_block_of_rows::<f32>(1, 2, ReadWriteMode::ReadOnly).unwrap_err();
    assert!(err.contains(ErrorKind::OutOfRange));
}

#[test]
fn test_write_guards_need_writable_mode() {
    let table = example_table();
    let err = WriteRows::<f64>::new(&table, 0, 1, ReadWriteMode::ReadOnly).unwrap_err();
    assert!(err.contains(ErrorKind::UnsupportedOperation));
    let err = WriteColumn::<f64>::new(&table, 0, 0, 1, ReadWriteMode::ReadOnly).unwrap_err();
    assert!(err.contains(ErrorKind::UnsupportedOperation));
    assert_eq!(table.to_row_major::<f64>().unwrap(), EXAMPLE_DATA.to_vec());
}

#[test]
fn test_check_numeric_table_accumulates() {
    let table = example_ptr();
    assert!(check_numeric_table(table.as_ref(), "data", Some(4), Some(4), None).is_ok());

    let status = check_numeric_table(table.as_ref(), "data", Some(5), Some(3), Some(&[StorageLayout::Csr]));
    assert!(status.contains(ErrorKind::IncorrectNumberOfRows));
    assert!(status.contains(ErrorKind::IncorrectNumberOfColumns));
    assert!(status.contains(ErrorKind::IncorrectTypeOfNumericTable));
    assert_eq!(status.errors().len(), 3);

    let empty = HomogenNumericTable::<f64>::create(0, 0, AllocationFlag::DoAllocate).unwrap();
    assert!(check_numeric_table(&empty, "data", None, None, None).contains(ErrorKind::EmptyInput));

    let unset = HomogenNumericTable::<f64>::create(2, 2, AllocationFlag::NotAllocate).unwrap();
    assert!(check_numeric_table(&unset, "data", None, None, None).contains(ErrorKind::NullInput));
}

#[test]
fn test_special_value_policy() {
    let mut table = SoaNumericTable::from_columns(vec![vec![1.0f64, f64::NAN], vec![f64::INFINITY, 2.0]]).unwrap();
    assert!(check_numeric_table(&table, "data", None, None, None).is_ok());

    let dictionary = Dictionary::from_features(vec![
        FeatureInfo::continuous(DataType::F64).with_special_values(SpecialValuePolicy::Reject),
        FeatureInfo::continuous(DataType::F64),
    ]);
    table.set_dictionary(dictionary).unwrap();
    let status = check_numeric_table(&table, "data", None, None, None);
    assert!(status.contains(ErrorKind::NonFiniteValue));
    assert_eq!(status.errors().len(), 1);
}

proptest! {
    #[test]
    fn prop_row_block_matches_column_blocks(n_rows in 1usize..20, n_columns in 1usize..6, seed in 0u64..1000) {
        let data: Vec<f64> = (0..n_rows * n_columns).map(|i| ((i as u64 * 31 + seed) % 97) as f64).collect();
        let table = HomogenNumericTable::from_vec(data.clone(), n_columns, n_rows).unwrap();
        for column in 0..n_columns {
            let block = table.get_block_of_column_values::<f64>(column, 0, n_rows, ReadWriteMode::ReadOnly).unwrap();
            for row in 0..n_rows {
                prop_assert_eq!(block.as_slice()[row], data[row * n_columns + column]);
            }
        }
    }
}
