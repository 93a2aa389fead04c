//! Experiment states

/// Experiment task states
///
/// ```text
/// Init -> Run -> [Print] -> End
///                   \
///                    -> AwaitParams -> Init   (re-arm mode)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExperimentState {
    /// Zero the encoder and latch the start time
    Init,
    /// Closed-loop sampling
    Run,
    /// Motor stopped, recorded samples being reported
    Print,
    /// Finished for good
    End,
    /// Motor stopped, waiting for a new setpoint/gain
    AwaitParams,
}

impl ExperimentState {
    /// Check if the motor may be driven in this state
    pub fn motor_allowed(&self) -> bool {
        matches!(self, ExperimentState::Run)
    }

    /// Value the completion signal holds while in this state
    ///
    /// False until the experiment has stopped, true from then on.
    pub fn completion(&self) -> bool {
        !matches!(self, ExperimentState::Init | ExperimentState::Run)
    }

    /// Check if this is the permanent end state
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExperimentState::End)
    }

    /// Short name for reports and logs
    pub fn label(&self) -> &'static str {
        match self {
            ExperimentState::Init => "INIT",
            ExperimentState::Run => "RUN",
            ExperimentState::Print => "PRINT",
            ExperimentState::End => "END",
            ExperimentState::AwaitParams => "AWAIT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_per_state() {
        assert!(!ExperimentState::Init.completion());
        assert!(!ExperimentState::Run.completion());
        assert!(ExperimentState::Print.completion());
        assert!(ExperimentState::End.completion());
        assert!(ExperimentState::AwaitParams.completion());
    }

    #[test]
    fn test_motor_allowed() {
        assert!(ExperimentState::Run.motor_allowed());
        assert!(!ExperimentState::Init.motor_allowed());
        assert!(!ExperimentState::End.motor_allowed());
    }

    #[test]
    fn test_only_end_is_terminal() {
        assert!(ExperimentState::End.is_terminal());
        assert!(!ExperimentState::AwaitParams.is_terminal());
    }
}
