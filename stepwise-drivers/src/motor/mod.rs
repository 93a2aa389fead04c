//! Motor driver implementations
//!
//! - H-bridge: two PWM channels (one per direction) plus an enable pin

pub mod hbridge;

pub use hbridge::{HBridgeMotor, MAX_DUTY};
