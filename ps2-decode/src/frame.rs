//! Frame assembly.
//!
//! A PS/2 frame is 11 bits, sent least significant first:
//!
//! ```text
//! bit  | 0     | 1 ..= 8          | 9            | 10
//!      | start | data, LSB first  | odd parity   | stop
//!      | 0     | d0 .. d7         | p            | 1
//! ```
//!
//! Bits are shifted in at the top of the register, so once all 11 are in,
//! each one sits at its index in the table above.

use core::fmt;

/// Number of bits in one frame.
pub const FRAME_BITS: u8 = 11;

const FRAME_MASK: u16 = (1 << FRAME_BITS) - 1;

/// One complete 11 bit frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Frame(u16);

/// Why a frame was refused by [`Frame::check`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The start bit was high
    StartBit,
    /// The stop bit was low
    StopBit,
    /// Data and parity bits hold an even number of ones
    Parity,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            FrameError::StartBit => "start bit not low",
            FrameError::StopBit => "stop bit not high",
            FrameError::Parity => "parity error",
        };
        f.write_str(msg)
    }
}

impl Frame {
    /// Wrap raw register bits. Anything above bit 10 is dropped.
    pub const fn from_bits(bits: u16) -> Self {
        Frame(bits & FRAME_MASK)
    }

    /// Build the frame a keyboard would send for `data`, with correct
    /// start, parity and stop bits.
    pub fn encode(data: u8) -> Self {
        let parity = data.count_ones() % 2 == 0;
        Frame(((data as u16) << 1) | ((parity as u16) << 9) | (1 << 10))
    }

    pub fn bits(self) -> u16 {
        self.0
    }

    /// The bit at `index`, in transmission order.
    pub fn bit(self, index: u8) -> bool {
        self.0 & (1 << index) != 0
    }

    pub fn start_bit(self) -> bool {
        self.bit(0)
    }

    /// The eight data bits. No other bit is looked at.
    pub fn data(self) -> u8 {
        (self.0 >> 1) as u8
    }

    pub fn parity_bit(self) -> bool {
        self.bit(9)
    }

    pub fn stop_bit(self) -> bool {
        self.bit(10)
    }

    /// The data byte, if start, stop and parity bits are what a keyboard
    /// sends.
    pub fn check(self) -> Result<u8, FrameError> {
        if self.start_bit() {
            return Err(FrameError::StartBit);
        }
        if !self.stop_bit() {
            return Err(FrameError::StopBit);
        }
        let ones = self.data().count_ones() + self.parity_bit() as u32;
        if ones % 2 == 0 {
            return Err(FrameError::Parity);
        }
        Ok(self.data())
    }
}

/// Collects bits into frames.
///
/// The bit counter free-runs: every bit shifted in counts towards the
/// current frame and every eleventh bit completes one, whatever was in it.
/// A lost or extra clock edge therefore shifts every later frame boundary.
/// [`FrameAssembler::idle_tick`] is the only thing that brings it back in
/// line short of a reset.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameAssembler {
    shift: u16,
    count: u8,
    /// Ticks since the last bit, while a frame is partially assembled
    quiet: u32,
}

impl FrameAssembler {
    pub const fn new() -> Self {
        FrameAssembler {
            shift: 0,
            count: 0,
            quiet: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Bits in the frame being assembled, `0..=10`.
    pub fn bit_count(&self) -> u8 {
        self.count
    }

    /// Shift a sampled data bit in. Returns the frame on its eleventh bit.
    pub fn shift(&mut self, bit: bool) -> Option<Frame> {
        self.shift = (self.shift >> 1) | ((bit as u16) << (FRAME_BITS - 1));
        self.quiet = 0;
        if self.count == FRAME_BITS - 1 {
            self.count = 0;
            Some(Frame::from_bits(self.shift))
        } else {
            self.count += 1;
            None
        }
    }

    /// Count a tick without a bit. Once a partial frame has waited `limit`
    /// ticks for its next bit it is thrown away, and the number of bits
    /// discarded is returned. A `limit` of 0 never times out.
    pub fn idle_tick(&mut self, limit: u32) -> Option<u8> {
        if self.count == 0 || limit == 0 {
            return None;
        }
        self.quiet = self.quiet.saturating_add(1);
        if self.quiet < limit {
            return None;
        }
        let dropped = self.count;
        self.reset();
        Some(dropped)
    }
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}
