//! Algorithms for algokit
//!
//! This crate layers the algorithm object model over the tables of
//! `algokit-data` and the backends of `algokit-core`:
//!
//! 1. **Object model** - typed arguments, parameter/input/result checks and
//!    the batch, online and distributed drivers ([`algorithm`])
//! 2. **Engines** - splittable pseudo-random generators ([`engines`])
//! 3. **Algorithms** - low-order [`moments`] and [`bagging`]
//!
//! # Example
//!
//! ```rust
//! use algokit_algorithms::moments::{Moment, MomentsBatch, MomentsInputId, MomentsMethod, MomentsParameter};
//! use algokit_data::HomogenNumericTable;
//!
//! let data = HomogenNumericTable::from_vec(vec![1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap();
//! let mut batch = MomentsBatch::new(MomentsMethod::DefaultDense, MomentsParameter::default()).unwrap();
//! batch.set_input(MomentsInputId::Data, data.into_ptr());
//! batch.compute().unwrap();
//!
//! let result = batch.result().unwrap();
//! assert_eq!(result.values(Moment::Sum).unwrap(), vec![9.0, 12.0]);
//! assert_eq!(result.values(Moment::Variance).unwrap(), vec![4.0, 4.0]);
//! ```

pub mod algorithm;
pub mod bagging;
pub mod engines;
pub mod moments;

use std::sync::OnceLock;

use algokit_core::{Result, Status};
use algokit_data::Factory;

pub use algorithm::{Batch, ComputeState, Container, DistributedStep1Local, DistributedStep2Master, Online};
pub use engines::{ChaChaEngine, Engine, EngineRng, Mcg59, Mt19937};

/// Serialization tags of the objects this crate defines
pub mod tags {
    pub const MOMENTS_PARTIAL: u32 = 2001;
    pub const MOMENTS_RESULT: u32 = 2002;
    pub const BAGGING_MODEL: u32 = 2101;
}

static REGISTERED: OnceLock<Status> = OnceLock::new();

/// Register this crate's models with the serialization factory
///
/// Runs once per process; every algorithm constructor calls it, so archives
/// of partial results and models can be read back as soon as any algorithm
/// object exists.
pub fn register_serializable() -> Result<()> {
    REGISTERED
        .get_or_init(|| {
            let factory = Factory::instance();
            let mut status = Status::new();
            status |= factory.register(tags::MOMENTS_PARTIAL, moments::partial_from_payload);
            status |= factory.register(tags::MOMENTS_RESULT, moments::result_from_payload);
            status |= factory.register(tags::BAGGING_MODEL, bagging::model_from_payload);
            tracing::debug!(%status, "registered algorithm models");
            status
        })
        .clone()
        .into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use algokit_data::{deserialize, serialize, DataObject};
    use bagging::BaggingModel;

    #[test]
    fn test_registration_is_idempotent() {
        register_serializable().unwrap();
        register_serializable().unwrap();
        assert!(Factory::instance().is_registered(tags::BAGGING_MODEL));
    }

    #[test]
    fn test_bagging_model_round_trip() {
        register_serializable().unwrap();
        let model = BaggingModel::from_indices(4, 2, &[vec![3, 0], vec![1, 1]], &[vec![1], vec![0]]).unwrap();
        let object = deserialize(&serialize(&model).unwrap()).unwrap();
        let restored = object.model_ref::<BaggingModel>().unwrap();
        assert_eq!(restored.sample_indices(0).unwrap(), vec![3, 0]);
        assert_eq!(restored.feature_indices(1).unwrap(), vec![0]);
        assert_eq!(restored.number_of_rows(), 4);
        assert!(matches!(object, DataObject::Model(_)));
    }
}
