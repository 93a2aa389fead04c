//! Configuration type definitions

use heapless::String;

use crate::scheduler::Priority;
use crate::traits::{ControlParams, Gain};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum label length
pub const MAX_LABEL_LEN: usize = 16;

/// Maximum experiments per run
pub const MAX_EXPERIMENTS: usize = 4;

/// Default number of RUN samples per experiment
pub const DEFAULT_SAMPLE_LIMIT: u32 = 500;

/// Default resume period in milliseconds
///
/// 500 samples at 10 ms gives a 5 second step response.
pub const DEFAULT_PERIOD_MS: u32 = 10;

/// Default setpoint: 16 revolutions of a 256 line encoder in x4 decoding
pub const DEFAULT_SETPOINT: i32 = 256 * 4 * 16;

/// Default proportional gain (0.10)
pub const DEFAULT_GAIN: Gain = Gain::lit("0.1");

/// Errors found while validating a configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Period must be at least 1 ms
    ZeroPeriod,
    /// Experiment must take at least one sample
    ZeroSampleLimit,
    /// Experiment needs a name for logs and reports
    EmptyName,
    /// Recording is enabled but the sample log cannot hold every sample
    LogTooSmall,
    /// More experiments than the orchestrator can hold
    TooManyExperiments,
}

/// What an experiment does once it has stopped and reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EndBehavior {
    /// Stay finished forever
    #[default]
    Terminal,
    /// Wait for a new setpoint/gain and run again
    Rearm,
}

/// Per-task settings consumed by the experiment state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TaskSettings {
    /// Number of RUN samples before stopping
    pub sample_limit: u32,
    /// Record (elapsed time, position) pairs for reporting
    pub recording: bool,
    /// Terminal or re-armable end state
    pub end: EndBehavior,
}

impl Default for TaskSettings {
    fn default() -> Self {
        Self {
            sample_limit: DEFAULT_SAMPLE_LIMIT,
            recording: false,
            end: EndBehavior::Terminal,
        }
    }
}

/// Experiment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExperimentConfig {
    /// Label used in logs and reports
    pub name: String<MAX_LABEL_LEN>,
    /// Scheduling priority (higher runs first when both are due)
    pub priority: Priority,
    /// Resume period in milliseconds
    pub period_ms: u32,
    /// Number of RUN samples
    pub sample_limit: u32,
    /// Target position in encoder ticks
    pub setpoint: i32,
    /// Proportional gain
    pub gain: Gain,
    /// Record samples and report them when done
    pub recording: bool,
    /// Terminal or re-armable end state
    pub end: EndBehavior,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        let mut name = String::new();
        let _ = name.push_str("experiment");
        Self {
            name,
            priority: 1,
            period_ms: DEFAULT_PERIOD_MS,
            sample_limit: DEFAULT_SAMPLE_LIMIT,
            setpoint: DEFAULT_SETPOINT,
            gain: DEFAULT_GAIN,
            recording: true,
            end: EndBehavior::Terminal,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ExperimentConfig {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "{} (prio={}, period={}ms, samples={}, {:?}, recording={}, end={:?})",
            self.name.as_str(),
            self.priority,
            self.period_ms,
            self.sample_limit,
            self.control_params(),
            self.recording,
            self.end
        );
    }
}

impl ExperimentConfig {
    /// Check the configuration for values the experiment cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if self.period_ms == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        if self.sample_limit == 0 {
            return Err(ConfigError::ZeroSampleLimit);
        }
        Ok(())
    }

    /// Settings for the experiment state machine
    pub fn task_settings(&self) -> TaskSettings {
        TaskSettings {
            sample_limit: self.sample_limit,
            recording: self.recording,
            end: self.end,
        }
    }

    /// Initial controller parameters
    pub fn control_params(&self) -> ControlParams {
        ControlParams {
            setpoint: self.setpoint,
            gain: self.gain,
        }
    }

    /// Nominal experiment duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.sample_limit as u64 * self.period_ms as u64
    }
}

/// Validate a full set of experiments
pub fn validate_all(configs: &[ExperimentConfig]) -> Result<(), ConfigError> {
    if configs.len() > MAX_EXPERIMENTS {
        return Err(ConfigError::TooManyExperiments);
    }
    configs.iter().try_for_each(ExperimentConfig::validate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ExperimentConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.setpoint, 16384);
        assert_eq!(config.duration_ms(), 5000);
    }

    #[test]
    fn test_default_gain() {
        let gain = ExperimentConfig::default().gain;
        // 0.1 is not exact in binary; within one part in a billion
        let error = (gain - Gain::from_num(0.1)).abs();
        assert!(error < Gain::from_num(0.000_000_001));
    }

    #[test]
    fn test_rejects_zero_period() {
        let config = ExperimentConfig {
            period_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroPeriod));
    }

    #[test]
    fn test_rejects_zero_samples() {
        let config = ExperimentConfig {
            sample_limit: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroSampleLimit));
    }

    #[test]
    fn test_rejects_empty_name() {
        let config = ExperimentConfig {
            name: String::new(),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyName));
    }

    #[test]
    fn test_validate_all_limits_count() {
        let configs: [ExperimentConfig; MAX_EXPERIMENTS + 1] = Default::default();
        assert_eq!(validate_all(&configs), Err(ConfigError::TooManyExperiments));
        assert_eq!(validate_all(&configs[..2]), Ok(()));
    }

    #[test]
    fn test_task_settings() {
        let config = ExperimentConfig {
            sample_limit: 150,
            end: EndBehavior::Rearm,
            ..Default::default()
        };
        let settings = config.task_settings();
        assert_eq!(settings.sample_limit, 150);
        assert!(settings.recording);
        assert_eq!(settings.end, EndBehavior::Rearm);
    }
}
