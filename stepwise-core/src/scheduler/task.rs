//! Cooperative task interface

use crate::experiment::ExperimentError;

/// Dispatch priority; higher runs first
pub type Priority = u8;

/// Result of one resume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    /// Suspended; resume again at the next period
    Yield,
    /// Finished; never resume again
    Done,
}

/// A task that does one bounded unit of work per resume
///
/// `resume` must not block. All state needed across resumes lives in the
/// implementor.
pub trait Cooperative {
    /// Label used in logs
    fn name(&self) -> &str;

    /// Perform one unit of work at time `now_us`
    fn resume(&mut self, now_us: u64) -> Result<Step, ExperimentError>;

    /// Put the task's outputs in a safe state (motor off)
    fn halt(&mut self) -> Result<(), ExperimentError>;
}

/// Monotonic microsecond time source
pub trait Clock {
    /// Current time in microseconds
    fn now_us(&mut self) -> u64;
}
