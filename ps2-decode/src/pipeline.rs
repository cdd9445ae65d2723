//! The whole receive pipeline, stepped one tick at a time.
//!
//! Each stage is a register: on every tick it consumes what its upstream
//! stage produced on the previous tick. [`Ps2State::tick`] therefore walks
//! the stages from the last one to the first, so that every stage still
//! sees last tick's upstream output.
//!
//! ```text
//! tick  | n          | n+1           | n+2             | n+3
//! sync  | clock low  |               |                 |
//! edge  |            | fall, sample  |                 |
//! frame |            |               | 11th bit, ready |
//! keys  |            |               |                 | updated
//! ```

use shared_types::{EventKind, TraceEvent};

use crate::config::Config;
use crate::decode::{BreakState, Decoded, KeyTracker};
use crate::edge::FallingEdge;
use crate::frame::{Frame, FrameAssembler, FrameError};
use crate::keymap::{KeyStates, Keymap, PADDLES};
use crate::sync::{Lines, Synchronizer};

/// What the pipeline reads on each tick.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Input {
    /// Raw levels of the PS/2 lines
    pub lines: Lines,
    /// While set, the whole pipeline is held in its reset state
    pub reset: bool,
}

impl Input {
    pub fn new(clock: bool, data: bool) -> Self {
        Input {
            lines: Lines::new(clock, data),
            reset: false,
        }
    }

    pub fn reset() -> Self {
        Input {
            lines: Lines::IDLE,
            reset: true,
        }
    }
}

impl From<Lines> for Input {
    fn from(lines: Lines) -> Self {
        Input {
            lines,
            reset: false,
        }
    }
}

/// Something noteworthy that happened during a tick. There is at most one
/// per tick.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Event {
    /// A scan code went through the key tracker
    Decoded { code: u8, decoded: Decoded },
    /// A frame failed its framing checks and was dropped
    BadFrame { frame: Frame, error: FrameError },
    /// A partial frame timed out and was dropped
    Resync { dropped: u8 },
}

impl Event {
    /// The packed form of this event, for the trace log.
    pub fn trace(&self) -> TraceEvent {
        match *self {
            Event::Decoded { code, decoded } => {
                let (kind, arg) = match decoded {
                    Decoded::Press(key) => (EventKind::Press, key as u8),
                    Decoded::Release(key) => (EventKind::Release, key as u8),
                    Decoded::BreakPrefix => (EventKind::BreakPrefix, 0),
                    Decoded::NoOp {
                        after_break: false,
                        ..
                    } => (EventKind::Ignored, 0),
                    Decoded::NoOp {
                        after_break: true,
                        ..
                    } => (EventKind::IgnoredBreak, 0),
                };
                TraceEvent::new(kind, arg, code)
            }
            Event::BadFrame { frame, error } => {
                let arg = match error {
                    FrameError::StartBit => 0,
                    FrameError::StopBit => 1,
                    FrameError::Parity => 2,
                };
                TraceEvent::new(EventKind::BadFrame, arg, frame.data())
            }
            Event::Resync { dropped } => TraceEvent::new(EventKind::Resync, dropped, 0),
        }
    }
}

/// What the pipeline produces on each tick.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Output<const N: usize> {
    pub keys: KeyStates<N>,
    pub event: Option<Event>,
}

/// All state of the receive pipeline.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Ps2State<const N: usize> {
    config: Config,
    sync: Synchronizer,
    edge: FallingEdge,
    /// The data bit sampled on last tick's falling edge
    sampled: Option<bool>,
    assembler: FrameAssembler,
    /// Scan code of the frame completed last tick, waiting to be decoded
    ready: Option<u8>,
    /// Most recent scan code, kept between frames
    scan_code: u8,
    tracker: KeyTracker<N>,
}

impl Ps2State<4> {
    /// A pipeline tracking the [`Paddle`](crate::Paddle) keys.
    pub fn paddles(config: Config) -> Self {
        Self::new(PADDLES, config)
    }
}

impl<const N: usize> Ps2State<N> {
    pub fn new(keymap: Keymap<N>, config: Config) -> Self {
        Ps2State {
            config,
            sync: Synchronizer::new(config.filter),
            edge: FallingEdge::new(),
            sampled: None,
            assembler: FrameAssembler::new(),
            ready: None,
            scan_code: 0,
            tracker: KeyTracker::new(keymap),
        }
    }

    /// Return every stage to its initial state: lines idle, no partial
    /// frame, no pending break, every key released.
    pub fn reset(&mut self) {
        *self = Self::new(*self.tracker.keymap(), self.config);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn keys(&self) -> KeyStates<N> {
        self.tracker.keys()
    }

    pub fn break_state(&self) -> BreakState {
        self.tracker.state()
    }

    /// Filtered line levels.
    pub fn levels(&self) -> Lines {
        self.sync.levels()
    }

    /// Bits received of the frame in progress.
    pub fn bit_count(&self) -> u8 {
        self.assembler.bit_count()
    }

    pub fn scan_code(&self) -> u8 {
        self.scan_code
    }

    /// A scan code will be decoded on the next tick.
    pub fn scan_ready(&self) -> bool {
        self.ready.is_some()
    }

    /// Advance the pipeline by one tick.
    pub fn tick(&mut self, input: Input) -> Output<N> {
        if input.reset {
            self.reset();
            return Output {
                keys: self.keys(),
                event: None,
            };
        }

        let mut event = None;

        if let Some(code) = self.ready.take() {
            let decoded = self.tracker.feed(code);
            event = Some(Event::Decoded { code, decoded });
        }

        match self.sampled.take() {
            Some(bit) => {
                if let Some(frame) = self.assembler.shift(bit) {
                    match self.config.scan_code(frame) {
                        Ok(code) => {
                            self.ready = Some(code);
                            self.scan_code = code;
                        }
                        Err(error) => {
                            event = event.or(Some(Event::BadFrame { frame, error }));
                        }
                    }
                }
            }
            None => {
                if let Some(limit) = self.config.resync_after {
                    if let Some(dropped) = self.assembler.idle_tick(limit) {
                        event = event.or(Some(Event::Resync { dropped }));
                    }
                }
            }
        }

        let levels = self.sync.levels();
        if self.edge.step(levels.clock) {
            self.sampled = Some(levels.data);
        }
        self.sync.push(input.lines);

        Output {
            keys: self.keys(),
            event,
        }
    }

    /// Pure form of [`Ps2State::tick`]: the state after `input`, and the
    /// output of that tick.
    pub fn next(self, input: Input) -> (Self, Output<N>) {
        let mut state = self;
        let output = state.tick(input);
        (state, output)
    }
}

#[cfg(test)]
mod test {
    extern crate std;
    use super::*;
    use crate::keymap::Paddle;
    use crate::sync::FilterMode;
    use crate::wave;
    use std::vec::Vec;

    fn feed<const N: usize>(state: &mut Ps2State<N>, samples: &[Lines]) -> Vec<Event> {
        samples
            .iter()
            .filter_map(|&lines| state.tick(lines.into()).event)
            .collect()
    }

    fn left_up(state: &Ps2State<4>) -> bool {
        state.keys().paddle(Paddle::LeftUp)
    }

    #[test]
    fn press_and_release() {
        let mut state = Ps2State::paddles(Config::default());
        let mut seen = std::vec![left_up(&state)];
        for byte in [0x1d, 0xf0, 0x1d].iter() {
            feed(&mut state, &wave::byte(*byte));
            seen.push(left_up(&state));
        }
        assert_eq!(seen, [false, true, true, false]);
        assert_eq!(state.break_state(), BreakState::Normal);
    }

    #[test]
    fn one_event_per_frame() {
        let mut state = Ps2State::paddles(Config::default());
        let events = feed(&mut state, &wave::byte(0x42));
        assert_eq!(
            events,
            [Event::Decoded {
                code: 0x42,
                decoded: Decoded::Press(Paddle::RightDown.index())
            }]
        );
        let events = feed(&mut state, &wave::bytes(&[0xf0, 0x00]));
        assert_eq!(
            events,
            [
                Event::Decoded {
                    code: 0xf0,
                    decoded: Decoded::BreakPrefix
                },
                Event::Decoded {
                    code: 0x00,
                    decoded: Decoded::NoOp {
                        code: 0x00,
                        after_break: true
                    }
                },
            ]
        );
        assert!(state.keys().paddle(Paddle::RightDown));
        assert_eq!(state.break_state(), BreakState::Normal);
    }

    #[test]
    fn scan_code_is_held_between_frames() {
        let mut state = Ps2State::paddles(Config::default());
        feed(&mut state, &wave::bytes(&[0x1d, 0x43]));
        assert_eq!(state.scan_code(), 0x43);
        assert!(!state.scan_ready());
        assert!(state.keys().paddle(Paddle::LeftUp));
        assert!(state.keys().paddle(Paddle::RightUp));
    }

    #[test]
    fn scan_ready_lasts_one_tick() {
        let mut state = Ps2State::paddles(Config::default());
        let mut ready_ticks = 0;
        for &lines in wave::byte(0x1b).iter() {
            state.tick(lines.into());
            if state.scan_ready() {
                ready_ticks += 1;
            }
        }
        assert_eq!(ready_ticks, 1);
    }

    #[test]
    fn framing_bits_ignored_by_default() {
        let mut state = Ps2State::paddles(Config::default());
        let bad_parity = Frame::from_bits(Frame::encode(0x1d).bits() ^ (1 << 9));
        let events = feed(&mut state, &wave::frame(bad_parity));
        assert_eq!(events.len(), 1);
        assert!(left_up(&state));
    }

    #[test]
    fn strict_drops_bad_frames() {
        let mut state = Ps2State::paddles(Config::strict(64));
        let bad_stop = Frame::from_bits(Frame::encode(0x1d).bits() & !(1 << 10));
        let events = feed(&mut state, &wave::frame(bad_stop));
        assert_eq!(
            events,
            [Event::BadFrame {
                frame: bad_stop,
                error: FrameError::StopBit
            }]
        );
        assert!(!left_up(&state));
        assert_eq!(state.bit_count(), 0);
        // the next good frame decodes normally
        feed(&mut state, &wave::byte(0x1d));
        assert!(left_up(&state));
    }

    #[test]
    fn strict_resyncs_after_lost_bits() {
        let frame = wave::frame(Frame::encode(0x1b));
        let partial = &frame[..5 * 2 * wave::HALF];

        let mut state = Ps2State::paddles(Config::strict(64));
        let mut events = feed(&mut state, partial);
        events.extend(feed(&mut state, &wave::idle(100)));
        assert_eq!(events, [Event::Resync { dropped: 5 }]);
        feed(&mut state, &wave::byte(0x1d));
        assert!(left_up(&state));
        assert_eq!(state.bit_count(), 0);

        // without the timeout the partial frame eats into the next one
        let mut state = Ps2State::paddles(Config::default());
        feed(&mut state, partial);
        feed(&mut state, &wave::idle(100));
        feed(&mut state, &wave::byte(0x1d));
        assert_eq!(state.bit_count(), 5);
    }

    #[test]
    fn strict_without_timeout_still_decodes() {
        let mut state = Ps2State::paddles(Config::strict(0));
        let events = feed(&mut state, &wave::byte(0x1d));
        assert_eq!(
            events,
            [Event::Decoded {
                code: 0x1d,
                decoded: Decoded::Press(Paddle::LeftUp.index())
            }]
        );
        assert_eq!(state.keys().as_array(), &[true, false, false, false]);
    }

    #[test]
    fn levels_follow_the_lines() {
        let mut state = Ps2State::paddles(Config::default());
        assert_eq!(state.config(), &Config::default());
        assert_eq!(state.levels(), Lines::IDLE);
        feed(&mut state, &[Lines::new(false, true); 3]);
        assert_eq!(state.levels(), Lines::new(false, true));
        feed(&mut state, &[Lines::new(false, false); 3]);
        assert_eq!(state.levels(), Lines::new(false, false));
        feed(&mut state, &wave::idle(3));
        assert_eq!(state.levels(), Lines::IDLE);
    }

    #[test]
    fn reset_from_any_state() {
        let mut state = Ps2State::paddles(Config::default());
        feed(&mut state, &wave::bytes(&[0x1d, 0x1b, 0x43, 0x42, 0xf0]));
        // and halfway through another frame
        feed(&mut state, &wave::frame(Frame::encode(0x1d))[..7 * 2 * wave::HALF]);
        assert_eq!(state.break_state(), BreakState::PendingBreak);
        assert!(state.bit_count() > 0);

        let out = state.tick(Input::reset());
        assert_eq!(out.keys, KeyStates::released());
        assert_eq!(out.event, None);
        assert_eq!(state, Ps2State::paddles(Config::default()));

        // the break was forgotten, so this is a press
        feed(&mut state, &wave::byte(0x1d));
        assert!(left_up(&state));
    }

    #[test]
    fn reset_holds_while_asserted() {
        let mut state = Ps2State::paddles(Config::default());
        let samples = wave::byte(0x1d);
        for &lines in samples.iter() {
            let out = state.tick(Input {
                lines,
                reset: true,
            });
            assert_eq!(out.event, None);
        }
        assert!(!left_up(&state));
        assert_eq!(state.bit_count(), 0);
    }

    #[test]
    fn clock_glitches_are_not_bits() {
        let mut state = Ps2State::paddles(Config::default());
        let mut samples = wave::idle(8);
        for width in 1..3 {
            samples.extend(std::iter::repeat(Lines::new(false, true)).take(width));
            samples.extend(wave::idle(8));
        }
        feed(&mut state, &samples);
        assert_eq!(state.bit_count(), 0);
    }

    #[test]
    fn delay_line_decodes_clean_signals() {
        let config = Config {
            filter: FilterMode::DelayLine,
            ..Config::default()
        };
        let mut state = Ps2State::paddles(config);
        feed(&mut state, &wave::bytes(&[0x43, 0xf0, 0x43, 0x42]));
        assert!(!state.keys().paddle(Paddle::RightUp));
        assert!(state.keys().paddle(Paddle::RightDown));
    }

    #[test]
    fn next_matches_tick() {
        let samples = wave::bytes(&[0x1d, 0xf0]);
        let mut stepped = Ps2State::paddles(Config::default());
        let mut pure = stepped;
        for &lines in samples.iter() {
            let expected = stepped.tick(lines.into());
            let (state, output) = pure.next(lines.into());
            pure = state;
            assert_eq!(output, expected);
        }
        assert_eq!(pure, stepped);
    }

    #[test]
    fn events_trace() {
        let press = Event::Decoded {
            code: 0x43,
            decoded: Decoded::Press(2),
        };
        assert_eq!(press.trace(), TraceEvent::new(EventKind::Press, 2, 0x43));
        let bad = Event::BadFrame {
            frame: Frame::encode(0x12),
            error: FrameError::Parity,
        };
        assert_eq!(bad.trace(), TraceEvent::new(EventKind::BadFrame, 2, 0x12));
        let ignored = Event::Decoded {
            code: 0x00,
            decoded: Decoded::NoOp {
                code: 0x00,
                after_break: true,
            },
        };
        assert_eq!(ignored.trace().kind, EventKind::IgnoredBreak);
        assert_eq!(
            Event::Resync { dropped: 4 }.trace(),
            TraceEvent::new(EventKind::Resync, 4, 0)
        );
    }
}
