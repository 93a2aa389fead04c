//! Closed-loop controller trait and control parameters

use fixed::types::I32F32;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Controller gain in Q32.32 fixed point
///
/// Cortex-M0+ has no FPU, so gains are kept in fixed point like the rest of
/// the control math.
pub type Gain = I32F32;

/// Setpoint and gain for one experiment run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ControlParams {
    /// Target encoder position in ticks
    pub setpoint: i32,
    /// Proportional gain
    pub gain: Gain,
}

#[cfg(feature = "defmt")]
impl defmt::Format for ControlParams {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "ControlParams {{ setpoint: {}, gain_x1000: {} }}",
            self.setpoint,
            (self.gain * Gain::from_num(1000)).to_num::<i32>()
        );
    }
}

/// Trait for position controllers
///
/// `compute` is a pure function of the controller's setpoint/gain and the
/// given position; it never touches hardware.
pub trait Controller {
    /// Compute the duty cycle command for a measured position
    fn compute(&self, position: i32) -> i32;

    /// Current setpoint in ticks
    fn setpoint(&self) -> i32;

    /// Current gain
    fn gain(&self) -> Gain;

    /// Replace setpoint and gain (used when re-arming an experiment)
    fn set_params(&mut self, params: ControlParams);

    /// Current parameters
    fn params(&self) -> ControlParams {
        ControlParams {
            setpoint: self.setpoint(),
            gain: self.gain(),
        }
    }
}

/// Non-blocking source of new control parameters
///
/// Re-armable experiments poll this once per resume while waiting.
pub trait ParamSource {
    /// Take the next pending parameter set, if any
    fn poll_params(&mut self) -> Option<ControlParams>;
}
