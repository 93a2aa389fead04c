//! Experiment runner task
//!
//! Owns the orchestrator and with it every experiment. Sleeps until the
//! earliest task deadline or the abort signal, dispatches everything that is
//! due and watches the completion signals. Motors are zeroed on abort, on a
//! task fault and once every task has finished.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_time::{Instant, Timer};

use stepwise_core::scheduler::{Orchestrator, RunStatus};

use crate::channels::ABORT;
use crate::config::MOTOR_COUNT;

/// Runner task - dispatches the experiments until they finish or abort
#[embassy_executor::task]
pub async fn runner_task(mut orchestrator: Orchestrator<'static, MOTOR_COUNT>) {
    info!("Runner task started");

    let mut announced = false;

    loop {
        match orchestrator.poll(Instant::now().as_micros()) {
            Ok(RunStatus::Complete) => {
                if !announced {
                    info!("All experiments complete");
                    log_stats(&orchestrator);
                    announced = true;
                }
            }
            Ok(RunStatus::Running) => announced = false,
            Err(fault) => {
                error!(
                    "Task '{}' faulted: {:?}",
                    orchestrator.scheduler().name(fault.task).unwrap_or("?"),
                    fault.error
                );
                shutdown(&mut orchestrator);
                return;
            }
        }

        let Some(next_due) = orchestrator.next_due_us() else {
            info!("All tasks finished");
            shutdown(&mut orchestrator);
            return;
        };

        match select(Timer::at(Instant::from_micros(next_due)), ABORT.wait()).await {
            Either::First(()) => {}
            Either::Second(()) => {
                warn!("Run aborted");
                shutdown(&mut orchestrator);
                return;
            }
        }
    }
}

/// Zero every motor and log what ran
fn shutdown(orchestrator: &mut Orchestrator<'static, MOTOR_COUNT>) {
    if let Err(fault) = orchestrator.shutdown() {
        error!(
            "Failed to halt '{}': {:?}",
            orchestrator.scheduler().name(fault.task).unwrap_or("?"),
            fault.error
        );
    }
    log_stats(orchestrator);
}

fn log_stats(orchestrator: &Orchestrator<'static, MOTOR_COUNT>) {
    let scheduler = orchestrator.scheduler();
    for id in 0..scheduler.len() as u8 {
        if let (Some(name), Some(stats)) = (scheduler.name(id), scheduler.stats(id)) {
            info!(
                "{}: resumes={} overruns={} finished={}",
                name, stats.resumes, stats.overruns, stats.finished
            );
        }
    }
}
