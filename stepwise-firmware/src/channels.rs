//! Inter-task communication channels
//!
//! Defines the statics shared between Embassy tasks. Uses embassy-sync
//! primitives for async hand-off and portable-atomic for the encoder
//! counters, which are written on every edge.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::pipe::Pipe;
use embassy_sync::signal::Signal;
use portable_atomic::AtomicI32;

use stepwise_core::report::ReportLock;
use stepwise_core::signal::CompletionSignal;
use stepwise_core::traits::ControlParams;

use crate::config::MOTOR_COUNT;

/// Bytes buffered between the experiments and the UART
pub const REPORT_PIPE_SIZE: usize = 1024;

/// Report lines from the experiments, drained by the report TX task
pub static REPORT_PIPE: Pipe<CriticalSectionRawMutex, REPORT_PIPE_SIZE> = Pipe::new();

/// Held by the experiment whose report is in the pipe
pub static REPORT_LOCK: ReportLock = ReportLock::new();

/// Encoder tick counters, one per motor channel
pub static ENCODER_COUNTS: [AtomicI32; MOTOR_COUNT] = [const { AtomicI32::new(0) }; MOTOR_COUNT];

/// Completion signals, one per experiment
pub static COMPLETION: [CompletionSignal; MOTOR_COUNT] =
    [const { CompletionSignal::new() }; MOTOR_COUNT];

/// Re-arm parameters received over serial, one slot per experiment
///
/// A newer command overwrites one the experiment has not taken yet.
pub static REARM_PARAMS: [Signal<CriticalSectionRawMutex, ControlParams>; MOTOR_COUNT] =
    [const { Signal::new() }; MOTOR_COUNT];

/// Abort button pressed
pub static ABORT: Signal<CriticalSectionRawMutex, ()> = Signal::new();
