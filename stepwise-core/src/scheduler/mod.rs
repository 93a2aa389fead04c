//! Cooperative priority scheduler
//!
//! Runs experiment tasks one bounded step at a time, picking the due task
//! with the highest priority, and an orchestrator that stops the loop once
//! every experiment has signalled completion.

pub mod executor;
pub mod orchestrator;
pub mod task;

pub use executor::{Scheduler, SchedulerError, TaskFault, TaskId, TaskStats};
pub use orchestrator::{Orchestrator, RunOutcome, RunStatus};
pub use task::{Clock, Cooperative, Priority, Step};
