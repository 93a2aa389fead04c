//! Experiment task state machine
//!
//! Drives one motor toward a fixed setpoint with proportional feedback for
//! a fixed number of samples, then stops the motor and raises its
//! completion signal. Every call to [`ExperimentTask::step`] is one bounded,
//! non-blocking unit of work; the scheduler decides when the next one runs.

use heapless::String;

use super::recorder::{Sample, SampleLog};
use super::state::ExperimentState;
use super::ExperimentError;
use crate::config::{ConfigError, EndBehavior, TaskSettings, MAX_LABEL_LEN};
use crate::report::{format_header, format_sample, DONE_LINE};
use crate::scheduler::{Cooperative, Step};
use crate::signal::CompletionSignal;
use crate::traits::{
    ControlParams, Controller, Encoder, MotorDriver, ParamSource, ReportError, SampleSink,
};

/// Maximum report lines written per PRINT resume
pub const REPORT_LINES_PER_RESUME: usize = 16;

/// Step-response experiment for one motor
///
/// Owns its motor, encoder and controller for its whole lifetime. The
/// completion signal belongs to the orchestration layer; the task writes it
/// `false` on entering INIT and `true` once the motor has been stopped.
pub struct ExperimentTask<'a, M, E, C, const N: usize> {
    name: String<MAX_LABEL_LEN>,
    motor: M,
    encoder: E,
    controller: C,
    settings: TaskSettings,
    signal: &'a CompletionSignal,
    state: ExperimentState,
    /// Samples taken in the current RUN
    sample_index: u32,
    /// Time of the INIT resume (µs)
    started_us: u64,
    log: SampleLog<N>,
    /// Next report line during PRINT: the name line, then one per sample
    report_cursor: usize,
    /// Sink output claimed for the report in progress
    report_claimed: bool,
    sink: Option<&'a mut dyn SampleSink>,
    params: Option<&'a mut dyn ParamSource>,
    /// Completed experiments (incremented on each stop)
    runs: u32,
}

impl<'a, M, E, C, const N: usize> ExperimentTask<'a, M, E, C, N>
where
    M: MotorDriver,
    E: Encoder,
    C: Controller,
{
    /// Create a new experiment in the INIT state
    ///
    /// Writes `false` to the completion signal. Fails if recording is
    /// enabled and the sample log cannot hold `sample_limit` samples.
    pub fn new(
        motor: M,
        encoder: E,
        controller: C,
        settings: TaskSettings,
        signal: &'a CompletionSignal,
    ) -> Result<Self, ConfigError> {
        if settings.recording && settings.sample_limit as usize > N {
            return Err(ConfigError::LogTooSmall);
        }

        let mut name = String::new();
        let _ = name.push_str("experiment");

        // INIT entry
        signal.put(false);

        Ok(Self {
            name,
            motor,
            encoder,
            controller,
            settings,
            signal,
            state: ExperimentState::Init,
            sample_index: 0,
            started_us: 0,
            log: SampleLog::new(),
            report_cursor: 0,
            report_claimed: false,
            sink: None,
            params: None,
            runs: 0,
        })
    }

    /// Set the label used in logs (truncated to the label length)
    pub fn with_name(mut self, name: &str) -> Self {
        self.name.clear();
        for c in name.chars() {
            if self.name.push(c).is_err() {
                break;
            }
        }
        self
    }

    /// Report recorded samples through `sink` during PRINT
    ///
    /// Without a sink the samples stay readable through [`Self::log`]
    /// until the next INIT.
    pub fn with_recording(mut self, sink: &'a mut dyn SampleSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Poll `source` for new parameters while waiting to re-arm
    pub fn with_param_source(mut self, source: &'a mut dyn ParamSource) -> Self {
        self.params = Some(source);
        self
    }

    /// Get the current state
    pub fn state(&self) -> ExperimentState {
        self.state
    }

    /// Samples taken in the current run
    pub fn sample_index(&self) -> u32 {
        self.sample_index
    }

    /// Task settings
    pub fn settings(&self) -> &TaskSettings {
        &self.settings
    }

    /// Current controller parameters
    pub fn params(&self) -> ControlParams {
        self.controller.params()
    }

    /// Recorded samples
    pub fn log(&self) -> &SampleLog<N> {
        &self.log
    }

    /// Number of experiments completed so far
    pub fn runs(&self) -> u32 {
        self.runs
    }

    /// Current value of the completion signal
    pub fn is_complete(&self) -> bool {
        self.signal.get()
    }

    /// Get access to the motor
    pub fn motor(&self) -> &M {
        &self.motor
    }

    /// Get access to the encoder
    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Get access to the controller
    pub fn controller(&self) -> &C {
        &self.controller
    }

    /// Perform one unit of work
    ///
    /// Returns [`Step::Done`] only from END; every other state yields.
    pub fn step(&mut self, now_us: u64) -> Result<Step, ExperimentError> {
        if self.state.is_terminal() {
            return Ok(Step::Done);
        }

        match self.state {
            ExperimentState::Init => {
                self.encoder.zero()?;
                self.started_us = now_us;
                self.log.clear();
                self.report_cursor = 0;
                self.sample_index = 0;

                if self.settings.sample_limit == 0 {
                    self.stop_and_report()?;
                } else {
                    self.enter(ExperimentState::Run);
                }
            }
            ExperimentState::Run => {
                self.sample(now_us)?;
                if self.sample_index >= self.settings.sample_limit {
                    self.stop_and_report()?;
                }
            }
            ExperimentState::Print => self.report()?,
            ExperimentState::End => {}
            ExperimentState::AwaitParams => {
                if let Some(params) = self.params.as_mut().and_then(|p| p.poll_params()) {
                    self.controller.set_params(params);
                    self.enter(ExperimentState::Init);
                }
            }
        }

        Ok(Step::Yield)
    }

    /// Take one closed-loop sample
    fn sample(&mut self, now_us: u64) -> Result<(), ExperimentError> {
        debug_assert!(self.state.motor_allowed());

        let position = self.encoder.read_position()?;
        let duty = self.controller.compute(position);
        self.motor.set_duty_cycle(duty)?;

        if self.settings.recording {
            let elapsed_us = now_us.saturating_sub(self.started_us);
            let sample = Sample {
                elapsed_us: u32::try_from(elapsed_us).unwrap_or(u32::MAX),
                position,
            };
            if !self.log.record(sample) {
                #[cfg(feature = "defmt")]
                defmt::warn!("{}: sample log full", self.name.as_str());
            }
        }

        self.sample_index += 1;
        Ok(())
    }

    /// STOP-AND-REPORT entry: de-energise the motor, then announce completion
    fn stop_and_report(&mut self) -> Result<(), ExperimentError> {
        self.motor.set_duty_cycle(0)?;
        self.signal.put(true);
        self.runs = self.runs.saturating_add(1);

        if self.settings.recording {
            self.enter(ExperimentState::Print);
        } else {
            self.enter(self.after_report());
        }
        Ok(())
    }

    /// Write the next chunk of the report
    fn report(&mut self) -> Result<(), ExperimentError> {
        let Some(sink) = self.sink.as_deref_mut() else {
            // Nowhere to send it; keep the log for the caller
            self.enter(self.after_report());
            return Ok(());
        };

        if !self.report_claimed {
            if !sink.claim() {
                return Ok(());
            }
            self.report_claimed = true;
        }

        let drained = match drain(sink, &self.name, &self.log, &mut self.report_cursor) {
            Ok(drained) => drained,
            Err(e) => {
                sink.release();
                self.report_claimed = false;
                return Err(e.into());
            }
        };

        if drained {
            sink.release();
            self.report_claimed = false;
            self.log.clear();
            self.report_cursor = 0;
            self.enter(self.after_report());
        }
        Ok(())
    }

    /// State following a completed report
    fn after_report(&self) -> ExperimentState {
        match self.settings.end {
            EndBehavior::Terminal => ExperimentState::End,
            EndBehavior::Rearm => ExperimentState::AwaitParams,
        }
    }

    fn enter(&mut self, next: ExperimentState) {
        #[cfg(feature = "defmt")]
        defmt::debug!(
            "{}: {} -> {}",
            self.name.as_str(),
            self.state.label(),
            next.label()
        );

        if next == ExperimentState::Init {
            self.signal.put(false);
        }
        self.state = next;
    }
}

/// Write up to [`REPORT_LINES_PER_RESUME`] lines starting at `cursor`
///
/// Line 0 is the experiment name, line `i` the sample `i - 1`. Returns
/// `true` once every sample and the terminator have been written. A busy
/// sink leaves the cursor on the line that was refused.
fn drain<S, const N: usize>(
    sink: &mut S,
    name: &str,
    log: &SampleLog<N>,
    cursor: &mut usize,
) -> Result<bool, ReportError>
where
    S: SampleSink + ?Sized,
{
    for _ in 0..REPORT_LINES_PER_RESUME {
        let written = match cursor.checked_sub(1) {
            None => sink.write_line(&format_header(name)),
            Some(index) => match log.get(index) {
                Some(sample) => sink.write_line(&format_sample(sample)),
                None => {
                    return match sink.write_line(DONE_LINE) {
                        Ok(()) => Ok(true),
                        Err(ReportError::Busy) => Ok(false),
                        Err(e) => Err(e),
                    };
                }
            },
        };

        match written {
            Ok(()) => *cursor += 1,
            Err(ReportError::Busy) => return Ok(false),
            Err(e) => return Err(e),
        }
    }
    Ok(false)
}

impl<M, E, C, const N: usize> Cooperative for ExperimentTask<'_, M, E, C, N>
where
    M: MotorDriver,
    E: Encoder,
    C: Controller,
{
    fn name(&self) -> &str {
        self.name.as_str()
    }

    fn resume(&mut self, now_us: u64) -> Result<Step, ExperimentError> {
        self.step(now_us)
    }

    fn halt(&mut self) -> Result<(), ExperimentError> {
        self.motor.stop()?;
        Ok(())
    }
}
