//! Sample streams of a keyboard sending frames, for tests.
extern crate std;
use std::vec::Vec;

use crate::frame::{Frame, FRAME_BITS};
use crate::sync::Lines;

/// Ticks per clock half period.
pub const HALF: usize = 4;

/// Idle ticks after each frame; enough for the last bit to make it
/// through the pipeline.
pub const GAP: usize = 4 * HALF;

pub fn idle(ticks: usize) -> Vec<Lines> {
    std::vec![Lines::IDLE; ticks]
}

/// One frame followed by an idle gap. The keyboard sets each bit while
/// the clock is high and holds it while the clock is low.
pub fn frame(frame: Frame) -> Vec<Lines> {
    let mut samples = Vec::new();
    for i in 0..FRAME_BITS {
        let bit = frame.bit(i);
        samples.extend(std::iter::repeat(Lines::new(true, bit)).take(HALF));
        samples.extend(std::iter::repeat(Lines::new(false, bit)).take(HALF));
    }
    samples.extend(idle(GAP));
    samples
}

pub fn byte(data: u8) -> Vec<Lines> {
    frame(Frame::encode(data))
}

pub fn bytes(data: &[u8]) -> Vec<Lines> {
    data.iter().flat_map(|&d| byte(d)).collect()
}
