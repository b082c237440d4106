use algokit_core::{DataType, Environment, Error, ErrorDetail, ErrorKind, Result, Status};
use algokit_data::DataObject;
use tracing::{debug, instrument};

use super::container::Container;
use super::state::ComputeState;
use super::traits::{AlgorithmInput, AlgorithmMethod, IncrementalAlgorithm, InputId, PartialResult};

/// Incremental computation over a stream of input blocks
///
/// Each `compute` folds the current input into the running partial result;
/// `finalize_compute` turns the partial result into the final one.
pub struct Online<A: IncrementalAlgorithm> {
    parameter: A::Parameter,
    method: A::Method,
    input: A::Input,
    container: Container<A::Kernel>,
    partial: Option<A::Partial>,
    result: Option<A::Result>,
    state: ComputeState,
    warnings: Status,
}

impl<A: IncrementalAlgorithm> Online<A> {
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
        Ok(Self::with_container(container, method, parameter))
    }

    pub fn with_container(container: Container<A::Kernel>, method: A::Method, parameter: A::Parameter) -> Self {
        Self {
            parameter,
            method,
            input: A::Input::default(),
            container,
            partial: None,
            result: None,
            state: ComputeState::Unconfigured,
            warnings: Status::new(),
        }
    }

    pub fn parameter(&self) -> &A::Parameter {
        &self.parameter
    }

    pub fn set_input(&mut self, id: InputId<A>, value: impl Into<DataObject>) {
        self.input.argument_mut().set(id, value);
        self.state = ComputeState::InputsSet;
    }

    /// Resume from a partial result saved earlier
    pub fn set_partial_result(&mut self, partial: A::Partial) {
        self.partial = Some(partial);
        self.result = None;
        self.state = ComputeState::Computed;
    }

    pub fn partial_result(&self) -> Option<&A::Partial> {
        self.partial.as_ref()
    }

    pub fn result(&self) -> Option<&A::Result> {
        self.result.as_ref()
    }

    pub fn take_result(&mut self) -> Option<A::Result> {
        self.result.take()
    }

    pub fn state(&self) -> ComputeState {
        self.state
    }

    pub fn warnings(&self) -> &Status {
        &self.warnings
    }

    /// Fold the current input block into the partial result
    #[instrument(skip(self), fields(algorithm = A::NAME, method = self.method.name()))]
    pub fn compute(&mut self) -> Result<()> {
        let status = self.input.check(&self.parameter, self.method);
        if !status.is_ok() {
            debug!(%status, "input check failed");
            self.state = self.state.after_failure();
            return Err(status);
        }
        self.state = ComputeState::Validated;

        let block = match A::compute_partial(self.container.kernel(), &self.input, &self.parameter) {
            Ok(block) => block,
            Err(status) => {
                self.state = self.state.after_failure();
                return Err(status);
            }
        };
        match &mut self.partial {
            Some(partial) => {
                if let Err(status) = partial.merge(&block) {
                    self.state = self.state.after_failure();
                    return Err(status);
                }
            }
            None => self.partial = Some(block),
        }
        debug!(
            rows = self.partial.as_ref().map_or(0, PartialResult::number_of_rows),
            "merged input block"
        );
        self.result = None;
        self.warnings = status;
        self.state = ComputeState::Computed;
        Ok(())
    }

    /// Produce the final result from every block seen so far
    #[instrument(skip(self), fields(algorithm = A::NAME))]
    pub fn finalize_compute(&mut self) -> Result<()> {
        let partial = self.partial.as_ref().ok_or_else(|| {
            Error::new(ErrorKind::IncorrectComputeState)
                .with_detail(ErrorDetail::Message, format!("finalize requested while {}", self.state))
        })?;
        self.result = Some(A::finalize(partial, &self.parameter, self.method)?);
        self.state = ComputeState::ResultAvailable;
        Ok(())
    }
}
