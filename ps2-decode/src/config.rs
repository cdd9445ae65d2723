//! Pipeline configuration.

use crate::frame::{Frame, FrameError};
use crate::sync::FilterMode;

/// How forgiving the pipeline is of a noisy or misbehaving bus.
///
/// The default decodes the way the simplest hardware receivers do: every
/// eleventh bit closes a frame, whatever its framing bits, and nothing ever
/// times out. [`Config::strict`] turns on the checks that let the receiver
/// recover from a lost or extra clock edge on its own.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Config {
    /// How the line synchronizer filters both lines
    pub filter: FilterMode,
    /// Drop frames with a bad start, stop or parity bit instead of decoding
    /// their data bits
    pub check_frames: bool,
    /// Throw a partially received frame away after this many ticks without
    /// a clock edge. `Some(0)` is the same as `None`.
    pub resync_after: Option<u32>,
}

impl Config {
    pub const fn new() -> Self {
        Config {
            filter: FilterMode::Unanimous,
            check_frames: false,
            resync_after: None,
        }
    }

    /// Check framing bits and resynchronize after `resync_after` quiet
    /// ticks. A `resync_after` of 0 checks framing bits only.
    ///
    /// Within a frame, bits are at most one clock period apart, 100µs at
    /// the slowest clock a keyboard may use. Anything from a few clock
    /// periods up to a few milliseconds works.
    pub const fn strict(resync_after: u32) -> Self {
        Config {
            filter: FilterMode::Unanimous,
            check_frames: true,
            resync_after: Some(resync_after),
        }
    }

    /// The scan code in `frame`, as this configuration sees it.
    pub fn scan_code(&self, frame: Frame) -> Result<u8, FrameError> {
        if self.check_frames {
            frame.check()
        } else {
            Ok(frame.data())
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
