//! Report line format
//!
//! Recorded samples leave the board as text lines: the experiment name,
//! one line per sample, then a terminator line:
//!
//! ```text
//! motor_a\r\n
//! 10.042, 1532\r\n
//! 20.039, 2987\r\n
//! ...
//! done\r\n
//! ```
//!
//! Time is milliseconds since the experiment started, with microsecond
//! resolution; position is encoder ticks.
//!
//! Experiments sharing one output hold a [`ReportLock`] from the name line
//! to the terminator, so their reports never interleave.

use core::fmt::Write;

use heapless::String;
use portable_atomic::{AtomicU8, Ordering};

use crate::config::MAX_LABEL_LEN;
use crate::experiment::Sample;

/// Longest possible sample line (`u32::MAX` µs, `i32::MIN` ticks, CRLF)
pub const MAX_LINE_LEN: usize = 32;

/// Terminator sent after the last sample of an experiment
pub const DONE_LINE: &str = "done\r\n";

/// One formatted report line
pub type ReportLine = String<MAX_LINE_LEN>;

/// Format a sample as a report line
pub fn format_sample(sample: &Sample) -> ReportLine {
    let mut line = ReportLine::new();
    // Cannot overflow: the widest values fit in MAX_LINE_LEN
    let _ = write!(
        line,
        "{}.{:03}, {}\r\n",
        sample.elapsed_us / 1000,
        sample.elapsed_us % 1000,
        sample.position
    );
    line
}

/// Format the line that opens an experiment's report
pub fn format_header(name: &str) -> ReportLine {
    let mut line = ReportLine::new();
    let name = name.get(..MAX_LABEL_LEN).unwrap_or(name);
    let _ = write!(line, "{}\r\n", name);
    line
}

/// Parse a report line back into a sample
///
/// Accepts lines with or without the CRLF terminator. Returns `None` for the
/// `done` line and for anything malformed.
pub fn parse_sample(line: &str) -> Option<Sample> {
    let (time, position) = line.trim_end().split_once(',')?;
    let (ms, us) = time.trim().split_once('.')?;
    if us.len() != 3 {
        return None;
    }

    let ms: u32 = ms.parse().ok()?;
    let us: u32 = us.parse().ok()?;
    let elapsed_us = ms.checked_mul(1000)?.checked_add(us)?;
    let position = position.trim().parse().ok()?;

    Some(Sample {
        elapsed_us,
        position,
    })
}

/// Check for the terminator line
pub fn is_done_line(line: &str) -> bool {
    line.trim_end() == DONE_LINE.trim_end()
}

/// No report in progress
const UNCLAIMED: u8 = u8::MAX;

/// Exclusive claim on a report output shared by several experiments
///
/// Holders are identified by a small integer (any value but `u8::MAX`).
/// Claiming is non-blocking: a refused claim is retried on a later resume.
#[derive(Debug)]
pub struct ReportLock {
    owner: AtomicU8,
}

impl ReportLock {
    /// Create an unclaimed lock
    pub const fn new() -> Self {
        Self {
            owner: AtomicU8::new(UNCLAIMED),
        }
    }

    /// Claim the output for `id`
    ///
    /// Succeeds if the lock is free or already held by `id`.
    pub fn try_claim(&self, id: u8) -> bool {
        match self
            .owner
            .compare_exchange(UNCLAIMED, id, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => true,
            Err(current) => current == id,
        }
    }

    /// Give the output back; does nothing unless `id` holds it
    pub fn release(&self, id: u8) {
        let _ = self
            .owner
            .compare_exchange(id, UNCLAIMED, Ordering::AcqRel, Ordering::Acquire);
    }

    /// Current holder, if any
    pub fn owner(&self) -> Option<u8> {
        match self.owner.load(Ordering::Acquire) {
            UNCLAIMED => None,
            id => Some(id),
        }
    }
}

impl Default for ReportLock {
    fn default() -> Self {
        Self::new()
    }
}
