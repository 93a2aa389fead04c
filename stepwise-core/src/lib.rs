//! Board-agnostic core logic for motor step-response experiments
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (motor, encoder, controller, report sink)
//! - Completion signal shared between experiments and the orchestrator
//! - Experiment state machine (one per motor under test)
//! - Cooperative priority scheduler and orchestration loop
//! - Experiment configuration and validation
//! - Report and re-arm command line formats

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod command;
pub mod config;
pub mod experiment;
pub mod report;
pub mod scheduler;
pub mod signal;
pub mod traits;

#[cfg(test)]
mod mock;
