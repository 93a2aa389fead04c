//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.
//! The experiments themselves all live inside the runner task.

pub mod abort;
pub mod command_rx;
pub mod encoder;
pub mod report_tx;
pub mod runner;

pub use abort::abort_task;
pub use command_rx::command_rx_task;
pub use encoder::encoder_task;
pub use report_tx::report_tx_task;
pub use runner::runner_task;
