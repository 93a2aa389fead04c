//! H-bridge DC motor driver
//!
//! Drives a brushed DC motor through a bridge with one PWM input per
//! direction (e.g. DRV8833, TB6612 in PWM/PWM mode) and an enable/standby
//! pin. The signed duty cycle from the experiment selects the channel:
//!
//! - positive: channel A at `duty`%, channel B fully off
//! - negative: channel B at `|duty|`%, channel A fully off
//! - zero: both channels fully off (coast)
//!
//! Duty cycles are clamped to ±[`MAX_DUTY`]. Writing the same duty cycle
//! twice touches no hardware the second time.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use stepwise_core::traits::{MotorDriver, MotorError};

/// Largest accepted duty cycle magnitude in percent
pub const MAX_DUTY: i32 = 100;

/// PWM H-bridge motor
pub struct HBridgeMotor<EN, A, B> {
    enable: EN,
    forward: A,
    reverse: B,
    enabled: bool,
    /// Last duty cycle applied to the channels
    applied: Option<i32>,
}

impl<EN, A, B> HBridgeMotor<EN, A, B>
where
    EN: OutputPin,
    A: SetDutyCycle,
    B: SetDutyCycle,
{
    /// Create a disabled driver
    ///
    /// Nothing is written to the hardware until [`Self::enable`] or the
    /// first duty cycle command.
    pub fn new(enable: EN, forward: A, reverse: B) -> Self {
        Self {
            enable,
            forward,
            reverse,
            enabled: false,
            applied: None,
        }
    }

    /// Drive the enable pin high
    pub fn enable(&mut self) -> Result<(), MotorError> {
        self.enable.set_high().map_err(|_| MotorError::Enable)?;
        self.enabled = true;
        Ok(())
    }

    /// Turn both channels off and drive the enable pin low
    pub fn disable(&mut self) -> Result<(), MotorError> {
        self.apply(0)?;
        self.enable.set_low().map_err(|_| MotorError::Enable)?;
        self.enabled = false;
        Ok(())
    }

    /// Check if the bridge is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Last duty cycle written to the channels (after clamping)
    pub fn duty(&self) -> i32 {
        self.applied.unwrap_or(0)
    }

    /// Get access to the forward channel
    pub fn forward(&self) -> &A {
        &self.forward
    }

    /// Get access to the reverse channel
    pub fn reverse(&self) -> &B {
        &self.reverse
    }

    /// Get access to the enable pin
    pub fn enable_pin(&self) -> &EN {
        &self.enable
    }

    fn apply(&mut self, duty: i32) -> Result<(), MotorError> {
        if self.applied == Some(duty) {
            return Ok(());
        }

        // Always release the opposite channel first to avoid shoot-through
        let percent = duty.unsigned_abs() as u8;
        if duty > 0 {
            self.reverse
                .set_duty_cycle_fully_off()
                .map_err(|_| MotorError::Pwm)?;
            self.forward
                .set_duty_cycle_percent(percent)
                .map_err(|_| MotorError::Pwm)?;
        } else if duty < 0 {
            self.forward
                .set_duty_cycle_fully_off()
                .map_err(|_| MotorError::Pwm)?;
            self.reverse
                .set_duty_cycle_percent(percent)
                .map_err(|_| MotorError::Pwm)?;
        } else {
            self.forward
                .set_duty_cycle_fully_off()
                .map_err(|_| MotorError::Pwm)?;
            self.reverse
                .set_duty_cycle_fully_off()
                .map_err(|_| MotorError::Pwm)?;
        }

        self.applied = Some(duty);
        Ok(())
    }
}

impl<EN, A, B> MotorDriver for HBridgeMotor<EN, A, B>
where
    EN: OutputPin,
    A: SetDutyCycle,
    B: SetDutyCycle,
{
    fn set_duty_cycle(&mut self, duty: i32) -> Result<(), MotorError> {
        let duty = duty.clamp(-MAX_DUTY, MAX_DUTY);
        // Stopping is always allowed, driving needs the bridge enabled
        if duty != 0 && !self.enabled {
            return Err(MotorError::Disabled);
        }
        self.apply(duty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital;
    use embedded_hal::pwm::{self, ErrorKind};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct PwmFault;

    impl pwm::Error for PwmFault {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    /// PWM channel remembering its compare value
    #[derive(Debug, Default)]
    struct FakeChannel {
        duty: u16,
        writes: u32,
        fail: bool,
    }

    impl pwm::ErrorType for FakeChannel {
        type Error = PwmFault;
    }

    impl SetDutyCycle for FakeChannel {
        fn max_duty_cycle(&self) -> u16 {
            1000
        }

        fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
            if self.fail {
                return Err(PwmFault);
            }
            self.duty = duty;
            self.writes += 1;
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct FakePin {
        high: bool,
    }

    impl digital::ErrorType for FakePin {
        type Error = Infallible;
    }

    impl OutputPin for FakePin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.high = true;
            Ok(())
        }
    }

    type Motor = HBridgeMotor<FakePin, FakeChannel, FakeChannel>;

    fn enabled_motor() -> Motor {
        let mut motor = HBridgeMotor::new(
            FakePin::default(),
            FakeChannel::default(),
            FakeChannel::default(),
        );
        motor.enable().unwrap();
        motor
    }

    fn total_writes(motor: &Motor) -> u32 {
        motor.forward().writes + motor.reverse().writes
    }

    #[test]
    fn test_enable_disable() {
        let mut motor = enabled_motor();
        assert!(motor.is_enabled());
        assert!(motor.enable_pin().high);

        motor.set_duty_cycle(40).unwrap();
        motor.disable().unwrap();
        assert!(!motor.is_enabled());
        assert!(!motor.enable_pin().high);
        assert_eq!(motor.forward().duty, 0);
    }

    #[test]
    fn test_forward_and_reverse() {
        let mut motor = enabled_motor();

        motor.set_duty_cycle(25).unwrap();
        assert_eq!(motor.forward().duty, 250);
        assert_eq!(motor.reverse().duty, 0);

        motor.set_duty_cycle(-60).unwrap();
        assert_eq!(motor.forward().duty, 0);
        assert_eq!(motor.reverse().duty, 600);

        motor.set_duty_cycle(0).unwrap();
        assert_eq!(motor.forward().duty, 0);
        assert_eq!(motor.reverse().duty, 0);
    }

    #[test]
    fn test_clamping() {
        let mut motor = enabled_motor();

        motor.set_duty_cycle(1638).unwrap();
        assert_eq!(motor.duty(), 100);
        assert_eq!(motor.forward().duty, 1000);

        motor.set_duty_cycle(i32::MIN).unwrap();
        assert_eq!(motor.duty(), -100);
        assert_eq!(motor.reverse().duty, 1000);
    }

    #[test]
    fn test_repeated_zero_is_noop() {
        let mut motor = enabled_motor();
        motor.set_duty_cycle(50).unwrap();
        motor.set_duty_cycle(0).unwrap();
        let writes = total_writes(&motor);

        for _ in 0..10 {
            motor.set_duty_cycle(0).unwrap();
            motor.stop().unwrap();
        }
        assert_eq!(total_writes(&motor), writes);
    }

    #[test]
    fn test_clamped_duplicates_are_noop() {
        let mut motor = enabled_motor();
        motor.set_duty_cycle(500).unwrap();
        let writes = total_writes(&motor);

        motor.set_duty_cycle(100).unwrap();
        motor.set_duty_cycle(9000).unwrap();
        assert_eq!(total_writes(&motor), writes);
    }

    #[test]
    fn test_disabled_rejects_drive() {
        let mut motor = HBridgeMotor::new(
            FakePin::default(),
            FakeChannel::default(),
            FakeChannel::default(),
        );
        assert_eq!(motor.set_duty_cycle(10), Err(MotorError::Disabled));
        // Stopping a disabled bridge is fine
        assert_eq!(motor.set_duty_cycle(0), Ok(()));
    }

    #[test]
    fn test_pwm_fault() {
        let mut motor = HBridgeMotor::new(
            FakePin::default(),
            FakeChannel {
                fail: true,
                ..Default::default()
            },
            FakeChannel::default(),
        );
        motor.enable().unwrap();
        assert_eq!(motor.set_duty_cycle(10), Err(MotorError::Pwm));
        // Failed write is not remembered, so it is retried
        assert_eq!(motor.duty(), 0);
        assert_eq!(motor.set_duty_cycle(10), Err(MotorError::Pwm));
    }
}
