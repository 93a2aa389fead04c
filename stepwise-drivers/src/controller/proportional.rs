//! Proportional position controller
//!
//! `duty = floor(gain × (setpoint − position))`, evaluated in Q32.32 fixed
//! point since the RP2040 has no FPU. The result is not clamped here; the
//! motor driver clamps to its own range.

use stepwise_core::traits::{ControlParams, Controller, Gain};

/// P controller with a fixed setpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProportionalController {
    params: ControlParams,
}

impl ProportionalController {
    /// Create a controller driving toward `setpoint` with `gain`
    pub const fn new(setpoint: i32, gain: Gain) -> Self {
        Self {
            params: ControlParams { setpoint, gain },
        }
    }

    /// Create a controller from a parameter set
    pub const fn from_params(params: ControlParams) -> Self {
        Self { params }
    }
}

impl Controller for ProportionalController {
    fn compute(&self, position: i32) -> i32 {
        let error = Gain::from_num(self.params.setpoint.saturating_sub(position));
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

    fn params(&self) -> ControlParams {
        self.params
    }
}
