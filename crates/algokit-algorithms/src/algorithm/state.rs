use std::fmt;

/// Lifecycle of an algorithm object
///
/// Ordered: a failed validation moves a driver back to `InputsSet`, never
/// forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComputeState {
    Unconfigured,
    InputsSet,
    Validated,
    Computed,
    ResultAvailable,
}

impl ComputeState {
    pub fn is_result_available(self) -> bool {
        self == ComputeState::ResultAvailable
    }

    /// State after a failed validation or kernel run
    pub(crate) fn after_failure(self) -> Self {
        self.min(ComputeState::InputsSet)
    }
}

impl fmt::Display for ComputeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComputeState::Unconfigured => "unconfigured",
            ComputeState::InputsSet => "inputs set",
            ComputeState::Validated => "validated",
            ComputeState::Computed => "computed",
            ComputeState::ResultAvailable => "result available",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_never_moves_forward() {
        assert_eq!(ComputeState::Unconfigured.after_failure(), ComputeState::Unconfigured);
        assert_eq!(ComputeState::Validated.after_failure(), ComputeState::InputsSet);
        assert_eq!(ComputeState::ResultAvailable.after_failure(), ComputeState::InputsSet);
        assert!(!ComputeState::Computed.is_result_available());
    }
}
