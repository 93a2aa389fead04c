//! Reporting channel trait

/// Errors that can occur while writing report lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportError {
    /// Channel cannot take the line right now; retry on a later resume
    Busy,
    /// Line does not fit the channel at all
    Overflow,
    /// Channel has been closed
    Closed,
}

/// Line-oriented sink for recorded samples (e.g. a serial port)
///
/// Implementations must either accept the whole line or none of it, and
/// must not block.
pub trait SampleSink {
    /// Write one complete line, terminator included
    fn write_line(&mut self, line: &str) -> Result<(), ReportError>;

    /// Take exclusive use of the underlying output for one report
    ///
    /// Returns `false` while another writer holds it. Sinks that own their
    /// output outright keep the default.
    fn claim(&mut self) -> bool {
        true
    }

    /// End the report started by [`SampleSink::claim`]
    fn release(&mut self) {}
}
