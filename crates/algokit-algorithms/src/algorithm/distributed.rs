//! Two-step distributed computation
//!
//! Every participant runs a [`DistributedStep1Local`] over its own rows and
//! ships the partial result. One [`DistributedStep2Master`] collects the
//! partial results with [`add`](DistributedStep2Master::add) and, once all
//! expected contributions have arrived, finalizes them. Partial results merge
//! associatively and commutatively, so arrival order does not affect the
//! final result.

use algokit_core::{DataType, Environment, Error, ErrorDetail, ErrorKind, Result, Status};
use algokit_data::DataObject;
use tracing::{debug, instrument};

use super::container::Container;
use super::state::ComputeState;
use super::traits::{AlgorithmInput, AlgorithmMethod, IncrementalAlgorithm, InputId, PartialResult};

/// Local step: partial result of one participant's data
pub struct DistributedStep1Local<A: IncrementalAlgorithm> {
    parameter: A::Parameter,
    method: A::Method,
    input: A::Input,
    container: Container<A::Kernel>,
    partial: Option<A::Partial>,
    state: ComputeState,
}

impl<A: IncrementalAlgorithm> DistributedStep1Local<A> {
    pub fn new(method: A::Method, parameter: A::Parameter) -> Result<Self> {
        Self::with_environment(Environment::instance(), DataType::F64, method, parameter)
    }

    pub fn with_environment(
        env: &Environment,
        data_type: DataType,
        method: A::Method,
        parameter: A::Parameter,
    ) -> Result<Self> {
        crate::register_serializable()?;
        let container = Container::bind(env, &A::kernel_builder(method, data_type))?;
        Ok(Self {
            parameter,
            method,
            input: A::Input::default(),
            container,
            partial: None,
            state: ComputeState::Unconfigured,
        })
    }

    pub fn set_input(&mut self, id: InputId<A>, value: impl Into<DataObject>) {
        self.input.argument_mut().set(id, value);
        self.state = ComputeState::InputsSet;
    }

    pub fn state(&self) -> ComputeState {
        self.state
    }

    pub fn partial_result(&self) -> Option<&A::Partial> {
        self.partial.as_ref()
    }

    pub fn take_partial_result(&mut self) -> Option<A::Partial> {
        self.partial.take()
    }

    #[instrument(skip(self), fields(algorithm = A::NAME, method = self.method.name()))]
    pub fn compute(&mut self) -> Result<()> {
        let status = self.input.check(&self.parameter, self.method);
        if !status.is_ok() {
            debug!(%status, "input check failed");
            self.state = self.state.after_failure();
            return Err(status);
        }
        self.state = ComputeState::Validated;
        match A::compute_partial(self.container.kernel(), &self.input, &self.parameter) {
            Ok(partial) => {
                self.partial = Some(partial);
                self.state = ComputeState::ResultAvailable;
                Ok(())
            }
            Err(status) => {
                self.state = self.state.after_failure();
                Err(status)
            }
        }
    }
}

/// Master step: merge of every participant's partial result
#[derive(Debug)]
pub struct DistributedStep2Master<A: IncrementalAlgorithm> {
    parameter: A::Parameter,
    method: A::Method,
    expected: usize,
    received: usize,
    pending: Vec<A::Partial>,
    merged: Option<A::Partial>,
    result: Option<A::Result>,
    state: ComputeState,
}

impl<A: IncrementalAlgorithm> DistributedStep2Master<A> {
    /// Master expecting `expected_partials` contributions
    pub fn new(method: A::Method, parameter: A::Parameter, expected_partials: usize) -> Result<Self> {
        crate::register_serializable()?;
        if expected_partials == 0 {
            return Err(Error::incorrect_parameter("expected_partials")
                .with_detail(ErrorDetail::ActualValue, 0usize)
                .into());
        }
        Ok(Self {
            parameter,
            method,
            expected: expected_partials,
            received: 0,
            pending: Vec::new(),
            merged: None,
            result: None,
            state: ComputeState::Unconfigured,
        })
    }

    pub fn expected_partials(&self) -> usize {
        self.expected
    }

    /// Partial results added so far
    pub fn received_partials(&self) -> usize {
        self.received
    }

    pub fn state(&self) -> ComputeState {
        self.state
    }

    /// Add the next participant's partial result
    pub fn add(&mut self, partial: A::Partial) -> Result<()> {
        if self.received == self.expected {
            return Err(Error::new(ErrorKind::IncorrectComputeState)
                .with_detail(ErrorDetail::ArgumentName, "partialResults")
                .with_detail(ErrorDetail::ExpectedValue, self.expected)
                .with_detail(ErrorDetail::ActualValue, self.received + 1)
                .into());
        }
        if let Some(first) = self.merged.as_ref().or_else(|| self.pending.first()) {
            first.check_compatible(&partial)?;
        }
        self.pending.push(partial);
        self.received += 1;
        self.result = None;
        self.state = ComputeState::InputsSet;
        Ok(())
    }

    /// Add a partial result that arrived as a data object
    pub fn add_object(&mut self, object: &DataObject) -> Result<()> {
        let partial = object.model_ref::<A::Partial>().ok_or_else(|| {
            Error::new(ErrorKind::IncorrectDataType)
                .with_detail(ErrorDetail::ArgumentName, "partialResults")
                .with_detail(ErrorDetail::Message, format!("received a {}", object.kind_name()))
        })?;
        self.add(partial.clone())
    }

    /// Merge the partial results added since the last call
    ///
    /// On failure neither the merged state nor the pending partial results
    /// change.
    #[instrument(skip(self), fields(algorithm = A::NAME, pending = self.pending.len()))]
    pub fn compute(&mut self) -> Result<()> {
        let mut merged = self.merged.clone();
        for partial in &self.pending {
            match &mut merged {
                Some(merged) => merged.merge(partial)?,
                None => merged = Some(partial.clone()),
            }
        }
        self.merged = merged;
        self.pending.clear();
        self.state = ComputeState::Computed;
        Ok(())
    }

    /// Finalize once every expected partial result has been added
    #[instrument(skip(self), fields(algorithm = A::NAME, received = self.received, expected = self.expected))]
    pub fn finalize_compute(&mut self) -> Result<()> {
        if self.received < self.expected {
            return Err(Error::new(ErrorKind::MissingPartialResults)
                .with_detail(ErrorDetail::ExpectedValue, self.expected)
                .with_detail(ErrorDetail::ActualValue, self.received)
                .into());
        }
        self.compute()?;
        let merged = self.merged.as_ref().ok_or_else(|| Status::from(ErrorKind::MissingPartialResults))?;
        debug!(rows = merged.number_of_rows(), "finalizing merged partial results");
        self.result = Some(A::finalize(merged, &self.parameter, self.method)?);
        self.state = ComputeState::ResultAvailable;
        Ok(())
    }

    pub fn partial_result(&self) -> Option<&A::Partial> {
        self.merged.as_ref()
    }

    pub fn result(&self) -> Option<&A::Result> {
        self.result.as_ref()
    }

    pub fn take_result(&mut self) -> Option<A::Result> {
        self.result.take()
    }
}
