//! Line synchronization.
//!
//! The PS/2 lines are driven by the keyboard, asynchronously to our sampling
//! clock, and pick up the odd spike on their way through a cable. Before
//! anything looks at them, each line passes through a short history of
//! samples:
//!
//! ```text
//!            ┌────┐  ┌────┐  ┌────┐
//! raw ──────>│ h0 │─>│ h1 │─>│ h2 │──> filtered
//!            └────┘  └────┘  └────┘
//! ```

/// How a line's filtered level is derived from its sample history.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FilterMode {
    /// The filtered level is the oldest sample in the history: a plain
    /// delay line. Resolves metastability, but passes glitches through
    /// (late).
    DelayLine,
    /// The filtered level only changes once every sample in the history
    /// agrees on the new level. A clean step comes out on the same tick as
    /// with [`FilterMode::DelayLine`]; anything shorter than the history is
    /// dropped.
    Unanimous,
}

impl Default for FilterMode {
    fn default() -> Self {
        FilterMode::Unanimous
    }
}

/// Depth of each line's history, in ticks.
pub const DEPTH: usize = 3;

/// A level on each of the two PS/2 lines.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Lines {
    pub clock: bool,
    pub data: bool,
}

impl Lines {
    /// An idle bus: both lines pulled up.
    pub const IDLE: Lines = Lines {
        clock: true,
        data: true,
    };

    pub fn new(clock: bool, data: bool) -> Self {
        Lines { clock, data }
    }
}

/// The sample history of a single line.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LineFilter {
    /// Newest sample first
    history: [bool; DEPTH],
    level: bool,
}

impl LineFilter {
    pub const fn idle() -> Self {
        LineFilter {
            history: [true; DEPTH],
            level: true,
        }
    }

    pub fn level(&self) -> bool {
        self.level
    }

    /// Push a raw sample into the history, dropping the oldest one, and
    /// return the new filtered level.
    pub fn push(&mut self, sample: bool, mode: FilterMode) -> bool {
        self.history.rotate_right(1);
        self.history[0] = sample;
        let oldest = self.history[DEPTH - 1];
        self.level = match mode {
            FilterMode::DelayLine => oldest,
            FilterMode::Unanimous => {
                if self.history.iter().all(|&s| s == oldest) {
                    oldest
                } else {
                    self.level
                }
            }
        };
        self.level
    }
}

impl Default for LineFilter {
    fn default() -> Self {
        Self::idle()
    }
}

/// Filters both lines with the same mode.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Synchronizer {
    mode: FilterMode,
    clock: LineFilter,
    data: LineFilter,
}

impl Synchronizer {
    pub const fn new(mode: FilterMode) -> Self {
        Synchronizer {
            mode,
            clock: LineFilter::idle(),
            data: LineFilter::idle(),
        }
    }

    /// Forget all history; both lines read idle again.
    pub fn reset(&mut self) {
        *self = Self::new(self.mode);
    }

    /// The filtered levels, as of the last push.
    pub fn levels(&self) -> Lines {
        Lines {
            clock: self.clock.level(),
            data: self.data.level(),
        }
    }

    pub fn push(&mut self, raw: Lines) -> Lines {
        Lines {
            clock: self.clock.push(raw.clock, self.mode),
            data: self.data.push(raw.data, self.mode),
        }
    }
}
