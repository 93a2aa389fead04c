//! Motor driver trait
//!
//! Experiments command the motor with a signed duty cycle. The sign selects
//! the direction and the driver is responsible for clamping the magnitude to
//! whatever range its output stage accepts.

/// Errors that can occur with motor operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorError {
    /// PWM output rejected the duty cycle
    Pwm,
    /// Bridge enable pin could not be driven
    Enable,
    /// Motor driver is disabled
    Disabled,
}

/// Trait for PWM-driven DC motors
///
/// Implementations must not block: a duty cycle write is a register update.
pub trait MotorDriver {
    /// Command a signed duty cycle
    ///
    /// Positive values drive forward, negative values reverse, 0 lets the
    /// motor coast. Values outside the driver's range are clamped by the
    /// driver, never by the caller.
    fn set_duty_cycle(&mut self, duty: i32) -> Result<(), MotorError>;

    /// Stop driving the motor
    fn stop(&mut self) -> Result<(), MotorError> {
        self.set_duty_cycle(0)
    }
}
