//! Scan code decoding and key state tracking.
//!
//! A key press sends its make code. A release sends the break prefix,
//! `0xF0`, followed by the same code. Tracking therefore needs one bit of
//! memory, whether the last code was the prefix:
//!
//! ```text
//!             0xF0                       any code [release if mapped]
//! {Normal} ─────────> {PendingBreak} ───────────────────────> {Normal}
//!   │  ^
//!   └──┘ mapped code [press], or unmapped code []
//! ```

use crate::keymap::{KeyStates, Keymap};

/// The prefix a keyboard sends before the code of a released key.
pub const BREAK_PREFIX: u8 = 0xf0;

/// Whether the next code is a release.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BreakState {
    Normal,
    PendingBreak,
}

/// The result of feeding one scan code to a [`KeyTracker`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// The break prefix; the next code will be a release
    BreakPrefix,
    /// The key at this index is now pressed
    Press(usize),
    /// The key at this index is now released
    Release(usize),
    /// A code no key is mapped to. No key changed.
    NoOp {
        code: u8,
        /// Whether this code followed a break prefix, which it consumed
        after_break: bool,
    },
}

impl Decoded {
    /// The key this changed, if any.
    pub fn key(&self) -> Option<usize> {
        match *self {
            Decoded::Press(key) | Decoded::Release(key) => Some(key),
            Decoded::BreakPrefix | Decoded::NoOp { .. } => None,
        }
    }
}

/// The make/break state machine and the levels of the tracked keys.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct KeyTracker<const N: usize> {
    keymap: Keymap<N>,
    keys: KeyStates<N>,
    state: BreakState,
}

impl<const N: usize> KeyTracker<N> {
    pub const fn new(keymap: Keymap<N>) -> Self {
        KeyTracker {
            keymap,
            keys: KeyStates::released(),
            state: BreakState::Normal,
        }
    }

    /// Release every key and forget any pending break prefix.
    pub fn reset(&mut self) {
        self.keys = KeyStates::released();
        self.state = BreakState::Normal;
    }

    pub fn keys(&self) -> KeyStates<N> {
        self.keys
    }

    pub fn state(&self) -> BreakState {
        self.state
    }

    pub fn keymap(&self) -> &Keymap<N> {
        &self.keymap
    }

    /// Consume one scan code.
    pub fn feed(&mut self, code: u8) -> Decoded {
        let key = self.keymap.lookup(code);
        let (next_state, decoded) = match self.state {
            BreakState::Normal if code == BREAK_PREFIX => {
                (BreakState::PendingBreak, Decoded::BreakPrefix)
            }
            BreakState::Normal => match key {
                Some(key) => (BreakState::Normal, Decoded::Press(key)),
                None => (
                    BreakState::Normal,
                    Decoded::NoOp {
                        code,
                        after_break: false,
                    },
                ),
            },
            // A break sequence is always two codes long, so the prefix is
            // consumed here even when the code is not one we track.
            BreakState::PendingBreak => match key {
                Some(key) => (BreakState::Normal, Decoded::Release(key)),
                None => (
                    BreakState::Normal,
                    Decoded::NoOp {
                        code,
                        after_break: true,
                    },
                ),
            },
        };
        match decoded {
            Decoded::Press(key) => self.keys.set(key, true),
            Decoded::Release(key) => self.keys.set(key, false),
            Decoded::BreakPrefix | Decoded::NoOp { .. } => (),
        }
        self.state = next_state;
        decoded
    }
}
