//! Core types for the algokit analytics infrastructure
//!
//! This crate provides the pieces every other algokit crate is built on:
//!
//! 1. **Status model** - composable [`Status`] values carrying [`Error`] records
//! 2. **Numeric types** - [`Numeric`] and [`TableValue`] element traits
//! 3. **Environment** - one-time CPU detection with an injectable [`CpuType`]
//! 4. **Primitives** - [`ComputePrimitives`] backends, one per CPU variant
//! 5. **Execution** - row-block mapping, optionally on the rayon pool
//!
//! # Example
//!
//! ```rust
//! use algokit_core::{ComputePrimitives, CpuType, Environment, ScalarBackend};
//!
//! let env = Environment::instance();
//! assert!(env.cpu_id() >= CpuType::Scalar);
//!
//! let backend = ScalarBackend::new();
//! assert_eq!(backend.sum(&[1.0f64, 2.0, 3.0]), 6.0);
//! ```

pub mod environment;
pub mod error;
pub mod execution;
pub mod numeric;
pub mod primitives;

pub use environment::{CpuType, Environment};
pub use error::{DetailValue, Error, ErrorDetail, ErrorKind, Result, Severity, Status};
pub use execution::ExecutionStrategy;
pub use numeric::{convert_slice, DataType, FloatValue, Numeric, TableValue};
pub use primitives::{
    best_backend_name, scalar_backend, Avx2Backend, Avx512Backend, ComputePrimitives,
    KernelDispatch, ScalarBackend, SimdDispatch, SseBackend,
};
