//! Experiment orchestration
//!
//! Registers every experiment with the scheduler together with its
//! completion signal and drives the dispatch loop until the conjunction of
//! all signals is true or the run is cancelled.

use heapless::Vec;
use portable_atomic::{AtomicBool, Ordering};

use super::executor::{Scheduler, SchedulerError, TaskFault, TaskId};
use super::task::{Clock, Cooperative, Priority};
use crate::signal::{all_set, CompletionSignal};

/// Status after a poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunStatus {
    /// At least one experiment has not signalled completion
    Running,
    /// Every experiment has signalled completion
    Complete,
}

/// How a blocking run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunOutcome {
    /// All completion signals were set
    Completed,
    /// The cancel flag was raised; every task has been halted
    Cancelled,
}

/// Scheduler plus the completion signals of the registered experiments
pub struct Orchestrator<'a, const N: usize> {
    scheduler: Scheduler<'a, N>,
    signals: Vec<&'a CompletionSignal, N>,
}

impl<'a, const N: usize> Orchestrator<'a, N> {
    /// Create an orchestrator with no experiments
    pub const fn new() -> Self {
        Self {
            scheduler: Scheduler::new(),
            signals: Vec::new(),
        }
    }

    /// Register an experiment and the signal it reports completion on
    pub fn add(
        &mut self,
        task: &'a mut dyn Cooperative,
        signal: &'a CompletionSignal,
        priority: Priority,
        period_ms: u32,
    ) -> Result<TaskId, SchedulerError> {
        let id = self.scheduler.register(task, priority, period_ms)?;
        // Same capacity as the scheduler, so this cannot fail after register
        self.signals.push(signal).map_err(|_| SchedulerError::Full)?;
        Ok(id)
    }

    /// Check if every registered experiment has signalled completion
    pub fn all_complete(&self) -> bool {
        all_set(self.signals.iter().copied())
    }

    /// Dispatch every task due at `now_us`, then report overall status
    ///
    /// Each due task is resumed at most once per poll.
    pub fn poll(&mut self, now_us: u64) -> Result<RunStatus, TaskFault> {
        while self.scheduler.dispatch(now_us)?.is_some() {}

        Ok(if self.all_complete() {
            RunStatus::Complete
        } else {
            RunStatus::Running
        })
    }

    /// Run until every experiment completes or `cancel` is raised
    ///
    /// Cancellation and task faults both halt every task before returning.
    pub fn run<K: Clock>(
        &mut self,
        clock: &mut K,
        cancel: &AtomicBool,
    ) -> Result<RunOutcome, TaskFault> {
        loop {
            if cancel.load(Ordering::Acquire) {
                #[cfg(feature = "defmt")]
                defmt::info!("run cancelled");
                self.shutdown()?;
                return Ok(RunOutcome::Cancelled);
            }

            match self.poll(clock.now_us()) {
                Ok(RunStatus::Complete) => return Ok(RunOutcome::Completed),
                Ok(RunStatus::Running) => {}
                Err(fault) => {
                    #[cfg(feature = "defmt")]
                    defmt::error!("task {} faulted: {}", fault.task, fault.error);
                    // Report the triggering fault, not a failed halt
                    let _ = self.shutdown();
                    return Err(fault);
                }
            }
        }
    }

    /// Halt every task (motors to zero duty)
    pub fn shutdown(&mut self) -> Result<(), TaskFault> {
        self.scheduler.halt_all()
    }

    /// Earliest pending deadline, for sleeping between polls
    pub fn next_due_us(&self) -> Option<u64> {
        self.scheduler.next_due_us()
    }

    /// Check if every task has returned `Step::Done`
    pub fn all_finished(&self) -> bool {
        self.scheduler.all_finished()
    }

    /// Underlying scheduler (statistics, names)
    pub fn scheduler(&self) -> &Scheduler<'a, N> {
        &self.scheduler
    }
}

impl<const N: usize> Default for Orchestrator<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EndBehavior, TaskSettings};
    use crate::experiment::{ExperimentState, ExperimentTask};
    use crate::mock::{MockEncoder, MockMotor, StepClock, TestController};
    use crate::traits::Gain;

    type Task<'a> = ExperimentTask<'a, MockMotor, MockEncoder, TestController, 0>;

    fn experiment<'a>(
        sample_limit: u32,
        encoder: MockEncoder,
        signal: &'a CompletionSignal,
    ) -> Task<'a> {
        ExperimentTask::new(
            MockMotor::default(),
            encoder,
            TestController::new(16384, Gain::from_num(0.1)),
            TaskSettings {
                sample_limit,
                recording: false,
                end: EndBehavior::Terminal,
            },
            signal,
        )
        .unwrap()
    }

    #[test]
    fn test_empty_is_complete() {
        let mut orch: Orchestrator<'_, 2> = Orchestrator::new();
        assert!(orch.all_complete());
        assert_eq!(orch.poll(0), Ok(RunStatus::Complete));
    }

    #[test]
    fn test_single_run_counts() {
        let signal = CompletionSignal::new();
        let mut task = experiment(500, MockEncoder::default(), &signal);

        let mut orch: Orchestrator<'_, 1> = Orchestrator::new();
        orch.add(&mut task, &signal, 1, 10).unwrap();

        let mut now = 0;
        while !orch.all_finished() {
            orch.poll(now).unwrap();
            now += 1_000;
        }

        // 1 INIT + 500 RUN + 1 END
        let stats = orch.scheduler().stats(0).unwrap();
        assert_eq!(stats.resumes, 502);
        assert_eq!(stats.overruns, 0);
        drop(orch);
        assert_eq!(task.encoder().reads, 500);
        assert_eq!(task.state(), ExperimentState::End);
    }

    #[test]
    fn test_two_periods_wait_for_slowest() {
        let fast_done = CompletionSignal::new();
        let slow_done = CompletionSignal::new();
        let mut fast = experiment(20, MockEncoder::moving(4), &fast_done);
        let mut slow = experiment(20, MockEncoder::moving(-4), &slow_done);

        let mut orch: Orchestrator<'_, 2> = Orchestrator::new();
        orch.add(&mut fast, &fast_done, 1, 10).unwrap();
        orch.add(&mut slow, &slow_done, 1, 50).unwrap();

        let mut now = 0;
        let mut fast_first = false;
        loop {
            let status = orch.poll(now).unwrap();
            if fast_done.get() && !slow_done.get() {
                fast_first = true;
                assert_eq!(status, RunStatus::Running);
            }
            if status == RunStatus::Complete {
                break;
            }
            now += 1_000;
        }

        assert!(fast_first);
        assert!(fast_done.get() && slow_done.get());
        // Slow task stops on its 21st resume at 20 * 50ms
        assert_eq!(now, 1_000_000);

        while !orch.all_finished() {
            now += 1_000;
            orch.poll(now).unwrap();
        }
        drop(orch);
        assert_eq!(fast.state(), ExperimentState::End);
        assert_eq!(slow.state(), ExperimentState::End);
        assert_eq!(fast.motor().duty, 0);
        assert_eq!(slow.motor().duty, 0);
    }

    #[test]
    fn test_run_completes() {
        let a_done = CompletionSignal::new();
        let b_done = CompletionSignal::new();
        let mut a = experiment(10, MockEncoder::default(), &a_done);
        let mut b = experiment(5, MockEncoder::default(), &b_done);

        let mut orch: Orchestrator<'_, 2> = Orchestrator::new();
        orch.add(&mut a, &a_done, 2, 10).unwrap();
        orch.add(&mut b, &b_done, 1, 20).unwrap();

        let mut clock = StepClock {
            now_us: 0,
            step_us: 500,
        };
        let cancel = AtomicBool::new(false);

        assert_eq!(orch.run(&mut clock, &cancel), Ok(RunOutcome::Completed));
        assert!(a_done.get() && b_done.get());
    }

    #[test]
    fn test_cancel_zeroes_motors() {
        let a_done = CompletionSignal::new();
        let b_done = CompletionSignal::new();
        let mut a = experiment(100, MockEncoder::default(), &a_done);
        let mut b = experiment(100, MockEncoder::default(), &b_done);

        let mut orch: Orchestrator<'_, 2> = Orchestrator::new();
        orch.add(&mut a, &a_done, 1, 10).unwrap();
        orch.add(&mut b, &b_done, 1, 10).unwrap();

        // Mid-RUN: both motors are driving
        for now in [0, 10_000, 20_000] {
            orch.poll(now).unwrap();
        }

        let cancel = AtomicBool::new(true);
        let mut clock = StepClock {
            now_us: 30_000,
            step_us: 1_000,
        };
        assert_eq!(orch.run(&mut clock, &cancel), Ok(RunOutcome::Cancelled));
        drop(orch);

        assert_eq!(a.motor().duty, 0);
        assert_eq!(b.motor().duty, 0);
        assert_eq!(a.state(), ExperimentState::Run);
        assert!(!a_done.get());
    }

    #[test]
    fn test_fault_shuts_down() {
        let a_done = CompletionSignal::new();
        let b_done = CompletionSignal::new();
        let mut a = experiment(100, MockEncoder::default(), &a_done);
        let failing = MockEncoder {
            fail_at: Some(3),
            ..Default::default()
        };
        let mut b = experiment(100, failing, &b_done);

        let mut orch: Orchestrator<'_, 2> = Orchestrator::new();
        orch.add(&mut a, &a_done, 1, 10).unwrap();
        orch.add(&mut b, &b_done, 1, 10).unwrap();

        let mut clock = StepClock {
            now_us: 0,
            step_us: 1_000,
        };
        let cancel = AtomicBool::new(false);
        let fault = orch.run(&mut clock, &cancel).unwrap_err();
        assert_eq!(fault.task, 1);
        drop(orch);

        assert_eq!(a.motor().duty, 0);
        assert_eq!(b.motor().duty, 0);
    }
}
