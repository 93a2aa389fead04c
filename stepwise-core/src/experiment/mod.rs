//! Step-response experiment
//!
//! One [`ExperimentTask`] per motor under test. Each resume by the
//! cooperative scheduler performs exactly one unit of work (one control
//! sample, one state transition or one bounded chunk of reporting) and
//! returns.

pub mod recorder;
pub mod state;
pub mod task;

pub use recorder::{Sample, SampleLog};
pub use state::ExperimentState;
pub use task::{ExperimentTask, REPORT_LINES_PER_RESUME};

use crate::traits::{EncoderError, MotorError, ReportError};

/// Fault raised by one of an experiment's handles
///
/// Experiments never retry; the handle's error is passed up unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExperimentError {
    /// Motor driver fault
    Motor(MotorError),
    /// Encoder fault
    Encoder(EncoderError),
    /// Reporting channel fault
    Report(ReportError),
}

impl From<MotorError> for ExperimentError {
    fn from(e: MotorError) -> Self {
        Self::Motor(e)
    }
}

impl From<EncoderError> for ExperimentError {
    fn from(e: EncoderError) -> Self {
        Self::Encoder(e)
    }
}

impl From<ReportError> for ExperimentError {
    fn from(e: ReportError) -> Self {
        Self::Report(e)
    }
}
