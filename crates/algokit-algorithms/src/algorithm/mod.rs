//! Algorithm object model
//!
//! Every algorithm family plugs into the same scaffolding:
//!
//! - **Arguments** - [`Argument`] slots addressed by a small enumerated id
//! - **Parameter / Input / Result** - [`Parameter`], [`AlgorithmInput`] and
//!   [`AlgorithmResult`], each with a `check` that runs before any kernel
//! - **Container** - [`Container`] binds one kernel per CPU variant,
//!   precision and method when the algorithm object is built
//! - **Drivers** - [`Batch`], [`Online`], and the two distributed steps
//!   [`DistributedStep1Local`] / [`DistributedStep2Master`]
//!
//! # Compute protocol
//!
//! Drivers move through [`ComputeState`]:
//!
//! ```text
//! Unconfigured -> InputsSet -> Validated -> Computed -> ResultAvailable
//! ```
//!
//! `compute` validates the input first. A failed validation returns the
//! accumulated [`Status`](algokit_core::Status) without touching the kernel or
//! allocating a result, and leaves the driver at `InputsSet`.

mod argument;
mod batch;
mod container;
mod distributed;
mod online;
mod state;
mod traits;

pub use argument::{Argument, ArgumentKey};
pub use batch::Batch;
pub use container::{Backend, Container, KernelBuilder};
pub use distributed::{DistributedStep1Local, DistributedStep2Master};
pub use online::Online;
pub use state::ComputeState;
pub use traits::{
    AlgorithmInput, AlgorithmMethod, AlgorithmResult, BatchAlgorithm, IncrementalAlgorithm, InputId, Parameter,
    PartialResult,
};
