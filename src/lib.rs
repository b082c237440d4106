//! algokit: analytics algorithms over pluggable numeric tables
//!
//! Re-exports the workspace crates under one roof:
//!
//! - [`algokit_core`] - status model, numeric traits, CPU environment and backends
//! - [`algokit_data`] - numeric tables, collections and serialization
//! - [`algokit_algorithms`] - the algorithm object model, engines, moments and bagging
//!
//! The [`prelude`] pulls in what a typical caller needs.
//!
//! # Example
//!
//! ```rust
//! use algokit::prelude::*;
//!
//! let data = HomogenNumericTable::from_vec(vec![2.0f64, 4.0, 4.0, 8.0, 6.0, 12.0], 2, 3).unwrap();
//! let mut batch = MomentsBatch::new(MomentsMethod::DefaultDense, MomentsParameter::default()).unwrap();
//! batch.set_input(MomentsInputId::Data, data.into_ptr());
//! batch.compute().unwrap();
//!
//! let mean = batch.result().unwrap().values(Moment::Mean).unwrap();
//! assert_eq!(mean, vec![4.0, 8.0]);
//! ```

pub use algokit_algorithms;
pub use algokit_core;
pub use algokit_data;

pub mod prelude {
    pub use algokit_algorithms::bagging::{BaggingBatch, BaggingInputId, BaggingMethod, BaggingModel, BaggingParameter};
    pub use algokit_algorithms::moments::{
        low_order_moments, Moment, MomentsBatch, MomentsInputId, MomentsMethod, MomentsOnline, MomentsParameter,
        MomentsStep1Local, MomentsStep2Master,
    };
    pub use algokit_algorithms::{ChaChaEngine, ComputeState, Engine, EngineRng, Mcg59, Mt19937};
    pub use algokit_core::{CpuType, DataType, Environment, Error, ErrorKind, Result, Status};
    pub use algokit_data::{
        CsrNumericTable, HomogenNumericTable, NumericTable, NumericTableExt, NumericTablePtr, ReadRows, WriteRows,
    };
}
