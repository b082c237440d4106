use algokit_core::{DataType, Environment, Result, Status};
use algokit_data::DataObject;
use tracing::{debug, instrument};

use super::container::Container;
use super::state::ComputeState;
use super::traits::{AlgorithmInput, AlgorithmMethod, AlgorithmResult, BatchAlgorithm, InputId};

/// Single-shot computation over the whole input
pub struct Batch<A: BatchAlgorithm> {
    parameter: A::Parameter,
    method: A::Method,
    input: A::Input,
    container: Container<A::Kernel>,
    result: Option<A::Result>,
    state: ComputeState,
    warnings: Status,
}

impl<A: BatchAlgorithm> Batch<A> {
    /// Double precision on the detected CPU
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

    /// Use a kernel bound elsewhere
    pub fn with_container(container: Container<A::Kernel>, method: A::Method, parameter: A::Parameter) -> Self {
        Self {
            parameter,
            method,
            input: A::Input::default(),
            container,
            result: None,
            state: ComputeState::Unconfigured,
            warnings: Status::new(),
        }
    }

    pub fn method(&self) -> A::Method {
        self.method
    }

    pub fn parameter(&self) -> &A::Parameter {
        &self.parameter
    }

    pub fn parameter_mut(&mut self) -> &mut A::Parameter {
        &mut self.parameter
    }

    pub fn input(&self) -> &A::Input {
        &self.input
    }

    pub fn set_input(&mut self, id: InputId<A>, value: impl Into<DataObject>) {
        self.input.argument_mut().set(id, value);
        self.state = ComputeState::InputsSet;
    }

    /// Provide result storage instead of letting `compute` allocate it
    pub fn set_result(&mut self, result: A::Result) {
        self.result = Some(result);
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

    pub fn container(&self) -> &Container<A::Kernel> {
        &self.container
    }

    /// Warnings left by the last successful `compute`
    pub fn warnings(&self) -> &Status {
        &self.warnings
    }

    /// Validate the input, then run the bound kernel
    ///
    /// Nothing is allocated and the kernel is not called when validation
    /// fails.
    #[instrument(skip(self), fields(algorithm = A::NAME, method = self.method.name()))]
    pub fn compute(&mut self) -> Result<()> {
        let status = self.input.check(&self.parameter, self.method);
        if !status.is_ok() {
            debug!(%status, "input check failed");
            self.state = self.state.after_failure();
            return Err(status);
        }
        self.state = ComputeState::Validated;

        let mut result = match self.result.take() {
            Some(result) => {
                let result_status = result.check(&self.input, &self.parameter, self.method);
                if !result_status.is_ok() {
                    self.result = Some(result);
                    self.state = self.state.after_failure();
                    return Err(result_status);
                }
                result
            }
            None => {
                match A::Result::allocate(&self.input, &self.parameter, self.method, self.container.data_type()) {
                    Ok(result) => result,
                    Err(status) => {
                        self.state = self.state.after_failure();
                        return Err(status);
                    }
                }
            }
        };

        let outcome = A::run(self.container.kernel(), &self.input, &self.parameter, &mut result);
        self.result = Some(result);
        if let Err(status) = outcome {
            self.state = self.state.after_failure();
            return Err(status);
        }
        self.state = ComputeState::Computed;
        debug!("kernel finished");
        self.warnings = status;
        self.state = ComputeState::ResultAvailable;
        Ok(())
    }
}
