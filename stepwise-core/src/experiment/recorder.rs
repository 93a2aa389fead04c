//! Bounded sample log for step-response recording

use heapless::Vec;

/// One recorded sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sample {
    /// Time since the experiment started (microseconds)
    pub elapsed_us: u32,
    /// Encoder position (ticks)
    pub position: i32,
}

/// Fixed-capacity log of samples
///
/// Samples past capacity are counted and dropped rather than overwriting
/// earlier data, so the report always starts at t = 0.
#[derive(Debug, Clone, Default)]
pub struct SampleLog<const N: usize> {
    samples: Vec<Sample, N>,
    dropped: u32,
}

impl<const N: usize> SampleLog<N> {
    /// Create an empty log
    pub const fn new() -> Self {
        Self {
            samples: Vec::new(),
            dropped: 0,
        }
    }

    /// Maximum number of samples the log can hold
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Append a sample
    ///
    /// Returns `false` if the log was full and the sample was dropped.
    pub fn record(&mut self, sample: Sample) -> bool {
        if self.samples.push(sample).is_err() {
            self.dropped = self.dropped.saturating_add(1);
            false
        } else {
            true
        }
    }

    /// Recorded samples in order
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Sample at an index
    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    /// Number of recorded samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of samples dropped because the log was full
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Forget all samples and the drop count
    pub fn clear(&mut self) {
        self.samples.clear();
        self.dropped = 0;
    }
}
