//! Fixed-capacity cooperative scheduler
//!
//! Each registered task has a priority and a period. A dispatch resumes
//! exactly one due task: the one with the highest priority, earliest
//! registration first among equals. Deadlines advance by whole periods, so
//! a late dispatch never shifts the task's phase.

use heapless::Vec;

use super::task::{Clock, Cooperative, Priority, Step};
use crate::experiment::ExperimentError;

/// Index of a registered task, in registration order
pub type TaskId = u8;

/// Errors that can occur while registering tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SchedulerError {
    /// No free task slot
    Full,
    /// Period must be at least 1 ms
    ZeroPeriod,
}

/// A task returned an error from `resume` or `halt`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskFault {
    /// Faulting task
    pub task: TaskId,
    /// Error passed up from the task
    pub error: ExperimentError,
}

/// Per-task dispatch statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskStats {
    /// Number of resumes
    pub resumes: u32,
    /// Periods skipped because the task was dispatched late
    pub overruns: u32,
    /// Task returned `Step::Done`
    pub finished: bool,
}

struct TaskSlot<'a> {
    task: &'a mut dyn Cooperative,
    priority: Priority,
    period_us: u64,
    /// `None` until the first resume (due immediately)
    next_run_us: Option<u64>,
    stats: TaskStats,
}

impl TaskSlot<'_> {
    fn is_due(&self, now_us: u64) -> bool {
        !self.stats.finished && self.next_run_us.map_or(true, |next| now_us >= next)
    }

    /// Advance the deadline past `now_us` by whole periods
    fn reschedule(&mut self, now_us: u64) {
        let base = self.next_run_us.unwrap_or(now_us);
        let mut next = base.saturating_add(self.period_us);

        if next <= now_us {
            let missed = (now_us - next) / self.period_us + 1;
            self.stats.overruns = self
                .stats
                .overruns
                .saturating_add(u32::try_from(missed).unwrap_or(u32::MAX));
            next = next.saturating_add(missed.saturating_mul(self.period_us));
        }

        self.next_run_us = Some(next);
    }
}

/// Cooperative scheduler for up to `N` tasks
pub struct Scheduler<'a, const N: usize> {
    slots: Vec<TaskSlot<'a>, N>,
}

impl<'a, const N: usize> Scheduler<'a, N> {
    /// Create an empty scheduler
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Register a task to be resumed every `period_ms`
    pub fn register(
        &mut self,
        task: &'a mut dyn Cooperative,
        priority: Priority,
        period_ms: u32,
    ) -> Result<TaskId, SchedulerError> {
        if period_ms == 0 {
            return Err(SchedulerError::ZeroPeriod);
        }

        let id = TaskId::try_from(self.slots.len()).map_err(|_| SchedulerError::Full)?;

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "register task {} '{}' prio={} period={}ms",
            id,
            task.name(),
            priority,
            period_ms
        );

        self.slots
            .push(TaskSlot {
                task,
                priority,
                period_us: u64::from(period_ms) * 1000,
                next_run_us: None,
                stats: TaskStats::default(),
            })
            .map_err(|_| SchedulerError::Full)?;

        Ok(id)
    }

    /// Number of registered tasks
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if no task is registered
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Resume the highest-priority due task, if any
    ///
    /// Returns the id of the resumed task, or `None` when nothing is due.
    pub fn dispatch(&mut self, now_us: u64) -> Result<Option<TaskId>, TaskFault> {
        let mut chosen: Option<usize> = None;
        for (index, slot) in self.slots.iter().enumerate() {
            if !slot.is_due(now_us) {
                continue;
            }
            match chosen {
                Some(best) if self.slots[best].priority >= slot.priority => {}
                _ => chosen = Some(index),
            }
        }

        let Some(index) = chosen else {
            return Ok(None);
        };
        // Bounded by N, which fits in TaskId via `register`
        let id = index as TaskId;
        let slot = &mut self.slots[index];

        slot.stats.resumes = slot.stats.resumes.saturating_add(1);
        let step = slot
            .task
            .resume(now_us)
            .map_err(|error| TaskFault { task: id, error })?;

        match step {
            Step::Yield => slot.reschedule(now_us),
            Step::Done => {
                #[cfg(feature = "defmt")]
                defmt::debug!("task {} '{}' finished", id, slot.task.name());
                slot.stats.finished = true;
                slot.next_run_us = None;
            }
        }

        Ok(Some(id))
    }

    /// Earliest deadline among unfinished tasks
    ///
    /// A task that has never run is due at `0`. `None` when every task has
    /// finished.
    pub fn next_due_us(&self) -> Option<u64> {
        self.slots
            .iter()
            .filter(|slot| !slot.stats.finished)
            .map(|slot| slot.next_run_us.unwrap_or(0))
            .min()
    }

    /// Check if every registered task has returned `Step::Done`
    pub fn all_finished(&self) -> bool {
        self.slots.iter().all(|slot| slot.stats.finished)
    }

    /// Statistics for a task
    pub fn stats(&self, id: TaskId) -> Option<TaskStats> {
        self.slots.get(usize::from(id)).map(|slot| slot.stats)
    }

    /// Name of a task
    pub fn name(&self, id: TaskId) -> Option<&str> {
        self.slots.get(usize::from(id)).map(|slot| slot.task.name())
    }

    /// Halt every task, finished or not
    ///
    /// Every task is attempted even if an earlier one fails; the first
    /// fault is returned.
    pub fn halt_all(&mut self) -> Result<(), TaskFault> {
        let mut first = Ok(());
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Err(error) = slot.task.halt() {
                #[cfg(feature = "defmt")]
                defmt::warn!("halt '{}' failed: {}", slot.task.name(), error);
                if first.is_ok() {
                    first = Err(TaskFault {
                        task: index as TaskId,
                        error,
                    });
                }
            }
        }
        first
    }

    /// Dispatch forever; only returns when a task faults
    pub fn run_forever<K: Clock>(&mut self, clock: &mut K) -> TaskFault {
        loop {
            let now_us = clock.now_us();
            if let Err(fault) = self.dispatch(now_us) {
                return fault;
            }
        }
    }
}

impl<const N: usize> Default for Scheduler<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}
