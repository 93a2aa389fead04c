//! Incremental encoder trait

/// Errors that can occur while reading an encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncoderError {
    /// Encoder counter is not running or not wired
    Disconnected,
}

/// Trait for incremental position encoders
///
/// Positions are in encoder ticks relative to the last [`Encoder::zero`].
/// Takes `&mut self` because counter reads typically require mutable access.
pub trait Encoder {
    /// Read the current position in ticks
    fn read_position(&mut self) -> Result<i32, EncoderError>;

    /// Make the current shaft position read as 0
    fn zero(&mut self) -> Result<(), EncoderError>;
}
