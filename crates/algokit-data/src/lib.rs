//! Numeric tables, collections and serialization for algokit
//!
//! Every storage layout implements the flat [`NumericTable`] interface;
//! [`NumericTableExt`] adds typed block access on top of it:
//!
//! - [`HomogenNumericTable`] - dense row-major
//! - [`SoaNumericTable`] - dense column-major, one array per column
//! - [`AosNumericTable`] - mixed-type records
//! - [`CsrNumericTable`] - compressed sparse rows, 1-based
//! - [`PackedNumericTable`] - symmetric or triangular halves
//! - [`DiagonalNumericTable`]
//! - [`MergedNumericTable`] and [`RowMergedNumericTable`] - views over other tables
//!
//! # Example
//!
//! ```rust
//! use algokit_data::{AllocationFlag, HomogenNumericTable, NumericTable, NumericTableExt, WriteRows, ReadWriteMode};
//!
//! let table = HomogenNumericTable::<f64>::create(2, 3, AllocationFlag::DoAllocate).unwrap();
//! {
//!     let mut rows = WriteRows::<f64>::new(&table, 1, 1, ReadWriteMode::WriteOnly).unwrap();
//!     rows.copy_from_slice(&[4.0, 5.0]);
//! }
//! assert_eq!(table.to_row_major::<i32>().unwrap(), vec![0, 0, 4, 5, 0, 0]);
//! assert_eq!(table.number_of_rows(), 3);
//! ```

pub mod block;
pub mod buffer;
pub mod collection;
pub mod dictionary;
pub mod guards;
pub mod serialization;
pub mod statistics;
pub mod table;
pub mod tables;

pub use block::{BlockBuffer, BlockDescriptor, BlockRegion, BlockSlice, BlockValue, OwnedBlock, ReadWriteMode};
pub use buffer::{AllocationFlag, MemoryStatus, SharedBuffer};
pub use collection::{DataCollection, DataObject, KeyValueDataCollection, Model, ModelPtr};
pub use dictionary::{Dictionary, FeatureInfo, FeatureType, SpecialValuePolicy};
pub use guards::{ReadColumn, ReadRows, WriteColumn, WriteRows};
pub use serialization::{deserialize, serialize, Archive, Factory, SerializationIface};
pub use statistics::{BasicStatistics, StatisticId};
pub use table::{check_numeric_table, NumericTable, NumericTableExt, NumericTablePtr, StorageLayout};
pub use tables::{
    AosField, AosNumericTable, CsrAccess, CsrBlockDescriptor, CsrNumericTable, CsrTableExt, DiagonalNumericTable,
    HomogenNumericTable, MergedNumericTable, PackedKind, PackedNumericTable, RowMergedNumericTable, SoaNumericTable,
};
