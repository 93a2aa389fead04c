//! Adapters between the experiment traits and the task channels

use stepwise_core::traits::{ControlParams, ParamSource, ReportError, SampleSink};

use crate::channels::{REARM_PARAMS, REPORT_LOCK, REPORT_PIPE};

/// Sample sink writing whole lines into the report pipe
///
/// Never blocks: a line that does not fit right now is refused with
/// [`ReportError::Busy`] and retried by the experiment on its next resume.
/// Every experiment shares the pipe, so a report holds [`REPORT_LOCK`]
/// from its name line to its terminator.
pub struct PipeSink {
    index: u8,
}

impl PipeSink {
    /// Sink for the experiment on motor channel `index`
    pub const fn new(index: u8) -> Self {
        Self { index }
    }
}

impl SampleSink for PipeSink {
    fn write_line(&mut self, line: &str) -> Result<(), ReportError> {
        if REPORT_LOCK.owner() != Some(self.index) {
            return Err(ReportError::Busy);
        }

        let bytes = line.as_bytes();
        if bytes.len() > REPORT_PIPE.capacity() {
            return Err(ReportError::Overflow);
        }
        if REPORT_PIPE.capacity() - REPORT_PIPE.len() < bytes.len() {
            return Err(ReportError::Busy);
        }

        // Only the runner writes, so the free space checked above is still there
        match REPORT_PIPE.try_write(bytes) {
            Ok(n) if n == bytes.len() => Ok(()),
            Ok(_) => Err(ReportError::Overflow),
            Err(_) => Err(ReportError::Busy),
        }
    }

    fn claim(&mut self) -> bool {
        REPORT_LOCK.try_claim(self.index)
    }

    fn release(&mut self) {
        REPORT_LOCK.release(self.index);
    }
}

/// Parameter source fed by the command RX task
pub struct SignalParams {
    index: usize,
}

impl SignalParams {
    /// Source for the experiment on motor channel `index`
    pub const fn new(index: usize) -> Self {
        Self { index }
    }
}

impl ParamSource for SignalParams {
    fn poll_params(&mut self) -> Option<ControlParams> {
        REARM_PARAMS.get(self.index)?.try_take()
    }
}
