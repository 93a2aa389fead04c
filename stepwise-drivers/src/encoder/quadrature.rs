//! Quadrature decoding
//!
//! Channel A and B form a 2-bit Gray code. Moving forward the state walks
//! `00 -> 01 -> 11 -> 10 -> 00`; moving backward it walks the other way.
//! A transition that flips both bits at once means an edge was missed and
//! the direction is unknown, so it is counted as invalid and contributes 0.

use portable_atomic::{AtomicI32, Ordering};
use stepwise_core::traits::{Encoder, EncoderError};

/// Position delta indexed by `(previous << 2) | current`
const TRANSITIONS: [i8; 16] = [
    0, 1, -1, 0, // from 00
    -1, 0, 0, 1, // from 01
    1, 0, 0, -1, // from 10
    0, -1, 1, 0, // from 11
];

/// Edge-by-edge quadrature state tracker
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QuadratureDecoder {
    state: u8,
    invalid: u32,
}

impl QuadratureDecoder {
    /// Create a decoder starting from the current pin levels
    pub const fn new(a: bool, b: bool) -> Self {
        Self {
            state: Self::encode(a, b),
            invalid: 0,
        }
    }

    const fn encode(a: bool, b: bool) -> u8 {
        ((a as u8) << 1) | (b as u8)
    }

    /// Feed the pin levels after an edge and get the position delta
    ///
    /// Returns -1, 0 or +1.
    pub fn update(&mut self, a: bool, b: bool) -> i8 {
        let next = Self::encode(a, b);
        let prev = self.state;
        self.state = next;

        if prev ^ next == 0b11 {
            self.invalid = self.invalid.saturating_add(1);
            return 0;
        }

        TRANSITIONS[usize::from((prev << 2) | next)]
    }

    /// Number of transitions where both channels changed at once
    pub fn invalid_transitions(&self) -> u32 {
        self.invalid
    }
}

/// Encoder handle over a shared tick counter
///
/// The counter is written by whatever decodes the edges; this handle only
/// reads it. Zeroing latches an offset instead of touching the counter, so
/// the decoding side never races with the experiment.
#[derive(Debug)]
pub struct QuadratureEncoder<'a> {
    count: &'a AtomicI32,
    offset: i32,
}

impl<'a> QuadratureEncoder<'a> {
    /// Create an encoder reading `count`
    pub fn new(count: &'a AtomicI32) -> Self {
        Self { count, offset: 0 }
    }

    /// Raw counter value (not offset)
    pub fn raw(&self) -> i32 {
        self.count.load(Ordering::Relaxed)
    }
}

impl Encoder for QuadratureEncoder<'_> {
    fn read_position(&mut self) -> Result<i32, EncoderError> {
        Ok(self.raw().wrapping_sub(self.offset))
    }

    fn zero(&mut self) -> Result<(), EncoderError> {
        self.offset = self.raw();
        Ok(())
    }
}
