//! Mapping from scan codes to tracked keys, and the keys' levels.

/// Scan codes of the keys to track. The key at index `i` is the one whose
/// make (and break) code is `codes[i]`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Keymap<const N: usize> {
    codes: [u8; N],
}

impl<const N: usize> Keymap<N> {
    pub const fn new(codes: [u8; N]) -> Self {
        Keymap { codes }
    }

    /// The index of the key sending `code`. If a code appears more than
    /// once, the first key wins.
    pub fn lookup(&self, code: u8) -> Option<usize> {
        self.codes.iter().position(|&c| c == code)
    }

    pub fn code(&self, key: usize) -> Option<u8> {
        self.codes.get(key).copied()
    }

    pub fn len(&self) -> usize {
        N
    }

    pub fn is_empty(&self) -> bool {
        N == 0
    }
}

/// The four keys of a two player paddle game.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Paddle {
    /// W
    LeftUp = 0,
    /// S
    LeftDown = 1,
    /// I
    RightUp = 2,
    /// K
    RightDown = 3,
}

impl Paddle {
    pub const ALL: [Paddle; 4] = [
        Paddle::LeftUp,
        Paddle::LeftDown,
        Paddle::RightUp,
        Paddle::RightDown,
    ];

    /// Index into [`PADDLES`] and into the key states.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Paddle::LeftUp => "left_up",
            Paddle::LeftDown => "left_down",
            Paddle::RightUp => "right_up",
            Paddle::RightDown => "right_down",
        }
    }
}

/// Keymap of the [`Paddle`] keys.
#[rustfmt::skip]
pub const PADDLES: Keymap<4> = Keymap::new([
    0x1d, // W, left_up
    0x1b, // S, left_down
    0x43, // I, right_up
    0x42, // K, right_down
]);

/// Pressed (`true`) or released (`false`), for each key of a keymap.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct KeyStates<const N: usize>([bool; N]);

impl<const N: usize> KeyStates<N> {
    /// All keys released.
    pub const fn released() -> Self {
        KeyStates([false; N])
    }

    /// Out of range keys read as released.
    pub fn is_pressed(&self, key: usize) -> bool {
        self.0.get(key).copied().unwrap_or(false)
    }

    pub fn set(&mut self, key: usize, pressed: bool) {
        if let Some(state) = self.0.get_mut(key) {
            *state = pressed;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.iter().copied()
    }

    pub fn any_pressed(&self) -> bool {
        self.0.iter().any(|&k| k)
    }

    pub fn as_array(&self) -> &[bool; N] {
        &self.0
    }
}

impl KeyStates<4> {
    pub fn paddle(&self, paddle: Paddle) -> bool {
        self.is_pressed(paddle.index())
    }
}

impl<const N: usize> Default for KeyStates<N> {
    fn default() -> Self {
        Self::released()
    }
}
