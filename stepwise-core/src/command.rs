//! Re-arm command line format
//!
//! A re-armable experiment waits for a new setpoint and gain after it has
//! reported. They arrive as one text line:
//!
//! ```text
//! 16384 0.10          # every waiting experiment
//! motor_b: 8192, 0.25 # only the experiment named motor_b
//! ```

use crate::traits::{ControlParams, Gain};

/// Errors that can occur while parsing a command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Line holds no tokens
    Empty,
    /// Setpoint given without a gain
    MissingGain,
    /// Setpoint is not an integer
    InvalidSetpoint,
    /// Gain is not a decimal number
    InvalidGain,
    /// Extra tokens after the gain
    TrailingInput,
}

/// Parsed re-arm command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command<'a> {
    /// Experiment the command is for (`None` = all)
    pub target: Option<&'a str>,
    /// New controller parameters
    pub params: ControlParams,
}

impl Command<'_> {
    /// Check whether this command applies to the named experiment
    pub fn applies_to(&self, name: &str) -> bool {
        self.target.map_or(true, |target| target == name)
    }
}

/// Parse a command line
pub fn parse_command(line: &str) -> Result<Command<'_>, CommandError> {
    let line = line.trim();
    let (target, rest) = match line.split_once(':') {
        Some((name, rest)) => (Some(name.trim()), rest),
        None => (None, line),
    };

    if target == Some("") {
        return Err(CommandError::Empty);
    }

    Ok(Command {
        target,
        params: parse_params(rest)?,
    })
}

/// Parse `"<setpoint> <gain>"` (whitespace or comma separated)
pub fn parse_params(text: &str) -> Result<ControlParams, CommandError> {
    let mut tokens = text
        .split(|c: char| c == ',' || c.is_ascii_whitespace())
        .filter(|t| !t.is_empty());

    let setpoint = tokens.next().ok_or(CommandError::Empty)?;
    let gain = tokens.next().ok_or(CommandError::MissingGain)?;
    if tokens.next().is_some() {
        return Err(CommandError::TrailingInput);
    }

    let setpoint = setpoint
        .parse::<i32>()
        .map_err(|_| CommandError::InvalidSetpoint)?;
    let gain = gain.parse::<Gain>().map_err(|_| CommandError::InvalidGain)?;

    Ok(ControlParams { setpoint, gain })
}
