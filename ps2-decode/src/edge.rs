//! Falling edge detection on the filtered clock.
//!
//! The keyboard changes the data line while the clock is high and holds it
//! while the clock is low, so the instant the clock falls is the one moment
//! a bit is guaranteed to be valid, whatever the duty cycle.

/// Pulses for exactly one step on each high to low transition.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FallingEdge {
    previous: bool,
}

impl FallingEdge {
    /// The clock idles high, so nothing fires when the first sample is low.
    pub const fn new() -> Self {
        FallingEdge { previous: true }
    }

    pub fn reset(&mut self) {
        self.previous = true;
    }

    /// Step the detector with the current clock level.
    pub fn step(&mut self, level: bool) -> bool {
        let fell = self.previous && !level;
        self.previous = level;
        fell
    }
}

impl Default for FallingEdge {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn one_pulse_per_fall() {
        let mut edge = FallingEdge::new();
        assert!(!edge.step(true));
        assert!(!edge.step(true));
        assert!(edge.step(false));
        assert!(!edge.step(false));
        assert!(!edge.step(true));
        assert!(edge.step(false));
    }

    #[test]
    fn no_pulse_on_rise() {
        let mut edge = FallingEdge::new();
        edge.step(false);
        assert!(!edge.step(true));
    }

    #[test]
    fn no_spurious_pulse_after_reset() {
        let mut edge = FallingEdge::new();
        edge.step(false);
        edge.reset();
        assert!(!edge.step(true));
        // a low right after reset still counts as a fall from idle
        let mut edge = FallingEdge::new();
        edge.step(false);
        edge.reset();
        assert!(edge.step(false));
    }
}
