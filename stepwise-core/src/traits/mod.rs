//! Hardware abstraction traits
//!
//! These traits define the interface between the experiment logic
//! and hardware-specific implementations.

pub mod controller;
pub mod encoder;
pub mod motor;
pub mod report;

pub use controller::{ControlParams, Controller, Gain, ParamSource};
pub use encoder::{Encoder, EncoderError};
pub use motor::{MotorDriver, MotorError};
pub use report::{ReportError, SampleSink};
