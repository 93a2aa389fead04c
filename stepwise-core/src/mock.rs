//! Mock hardware handles shared by the host tests

use std::cell::RefCell;

use heapless::Vec;

use crate::report::{ReportLine, ReportLock};
use crate::scheduler::Clock;
use crate::traits::{
    ControlParams, Controller, Encoder, EncoderError, Gain, MotorDriver, MotorError, ParamSource,
    ReportError, SampleSink,
};

/// Motor that remembers the last duty cycle
#[derive(Debug, Default)]
pub struct MockMotor {
    pub duty: i32,
    pub writes: u32,
    pub fail: bool,
}

impl MotorDriver for MockMotor {
    fn set_duty_cycle(&mut self, duty: i32) -> Result<(), MotorError> {
        if self.fail {
            return Err(MotorError::Pwm);
        }
        self.duty = duty;
        self.writes += 1;
        Ok(())
    }
}

/// Encoder moving at a constant number of ticks per read
#[derive(Debug, Default)]
pub struct MockEncoder {
    pub position: i32,
    pub velocity: i32,
    pub reads: u32,
    pub zeros: u32,
    /// Fail every read from this read count on
    pub fail_at: Option<u32>,
}

impl MockEncoder {
    pub fn at(position: i32) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn moving(velocity: i32) -> Self {
        Self {
            velocity,
            ..Default::default()
        }
    }
}

impl Encoder for MockEncoder {
    fn read_position(&mut self) -> Result<i32, EncoderError> {
        self.reads += 1;
        if self.fail_at.is_some_and(|n| self.reads >= n) {
            return Err(EncoderError::Disconnected);
        }
        let position = self.position;
        self.position += self.velocity;
        Ok(position)
    }

    fn zero(&mut self) -> Result<(), EncoderError> {
        self.zeros += 1;
        Ok(())
    }
}

/// Plain proportional controller
#[derive(Debug)]
pub struct TestController {
    pub params: ControlParams,
}

impl TestController {
    pub fn new(setpoint: i32, gain: Gain) -> Self {
        Self {
            params: ControlParams { setpoint, gain },
        }
    }
}

impl Controller for TestController {
    fn compute(&self, position: i32) -> i32 {
        let error = Gain::saturating_from_num(self.params.setpoint.saturating_sub(position));
        self.params
            .gain
            .saturating_mul(error)
            .saturating_to_num::<i32>()
    }

    fn setpoint(&self) -> i32 {
        self.params.setpoint
    }

    fn gain(&self) -> Gain {
        self.params.gain
    }

    fn set_params(&mut self, params: ControlParams) {
        self.params = params;
    }
}

/// Sink collecting lines, optionally refusing a number of writes first
#[derive(Debug, Default)]
pub struct MockSink {
    pub lines: Vec<ReportLine, 64>,
    pub busy: u32,
    pub closed: bool,
}

impl SampleSink for MockSink {
    fn write_line(&mut self, line: &str) -> Result<(), ReportError> {
        if self.closed {
            return Err(ReportError::Closed);
        }
        if self.busy > 0 {
            self.busy -= 1;
            return Err(ReportError::Busy);
        }
        let line = ReportLine::try_from(line).map_err(|_| ReportError::Overflow)?;
        self.lines.push(line).map_err(|_| ReportError::Overflow)
    }
}

/// Sink writing into a line buffer shared with other experiments
///
/// Refuses lines unless it holds the shared lock.
pub struct SharedSink<'a> {
    pub id: u8,
    pub lock: &'a ReportLock,
    pub lines: &'a RefCell<std::vec::Vec<ReportLine>>,
    pub closed: bool,
}

impl<'a> SharedSink<'a> {
    pub fn new(id: u8, lock: &'a ReportLock, lines: &'a RefCell<std::vec::Vec<ReportLine>>) -> Self {
        Self {
            id,
            lock,
            lines,
            closed: false,
        }
    }
}

impl SampleSink for SharedSink<'_> {
    fn write_line(&mut self, line: &str) -> Result<(), ReportError> {
        if self.closed {
            return Err(ReportError::Closed);
        }
        if self.lock.owner() != Some(self.id) {
            return Err(ReportError::Busy);
        }
        let line = ReportLine::try_from(line).map_err(|_| ReportError::Overflow)?;
        self.lines.borrow_mut().push(line);
        Ok(())
    }

    fn claim(&mut self) -> bool {
        self.lock.try_claim(self.id)
    }

    fn release(&mut self) {
        self.lock.release(self.id);
    }
}

/// Queue of parameter sets handed out one per poll
#[derive(Debug, Default)]
pub struct QueuedParams {
    pub pending: Vec<ControlParams, 4>,
}

impl ParamSource for QueuedParams {
    fn poll_params(&mut self) -> Option<ControlParams> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending.remove(0))
        }
    }
}

/// Clock advancing by a fixed step on every read
#[derive(Debug)]
pub struct StepClock {
    pub now_us: u64,
    pub step_us: u64,
}

impl Clock for StepClock {
    fn now_us(&mut self) -> u64 {
        let now = self.now_us;
        self.now_us += self.step_us;
        now
    }
}
