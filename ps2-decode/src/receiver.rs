//! The pipeline, bound to a pair of input pins.

use arraydeque::ArrayDeque;
use embedded_hal::digital::v2::{InputPin, OutputPin};

use crate::config::Config;
use crate::keymap::{KeyStates, Keymap};
use crate::pipeline::{Event, Input, Ps2State};
use crate::sync::Lines;

/// Events held until someone gets around to reading them.
pub const QUEUE_LEN: usize = 16;

/// An event and the tick it happened on.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Record {
    pub tick: u32,
    pub event: Event,
}

/// Samples the PS/2 lines once per [`Receiver::poll`] and keeps the events
/// the pipeline produces in a bounded queue.
///
/// Polling is meant to happen from a timer interrupt. Draining the queue
/// can happen wherever there is time for it; events that arrive while the
/// queue is full are counted and dropped.
pub struct Receiver<CLK, DAT, const N: usize> {
    clock: CLK,
    data: DAT,
    state: Ps2State<N>,
    now: u32,
    events: ArrayDeque<[Record; QUEUE_LEN]>,
    dropped: u32,
}

impl<CLK, DAT, E, const N: usize> Receiver<CLK, DAT, N>
where
    CLK: InputPin<Error = E>,
    DAT: InputPin<Error = E>,
{
    pub fn new(clock: CLK, data: DAT, keymap: Keymap<N>, config: Config) -> Self {
        Receiver {
            clock,
            data,
            state: Ps2State::new(keymap, config),
            now: 0,
            events: ArrayDeque::new(),
            dropped: 0,
        }
    }

    /// Read both lines.
    pub fn sample(&self) -> Result<Lines, E> {
        Ok(Lines {
            clock: self.clock.is_high()?,
            data: self.data.is_high()?,
        })
    }

    /// Run one tick of the pipeline on fresh samples of both lines, and
    /// return the key levels after it.
    pub fn poll(&mut self, reset: bool) -> Result<KeyStates<N>, E> {
        let lines = self.sample()?;
        self.now = self.now.wrapping_add(1);
        let output = self.state.tick(Input { lines, reset });
        if let Some(event) = output.event {
            let record = Record {
                tick: self.now,
                event,
            };
            if self.events.push_back(record).is_err() {
                self.dropped = self.dropped.wrapping_add(1);
            }
        }
        Ok(output.keys)
    }
}

impl<CLK, DAT, const N: usize> Receiver<CLK, DAT, N> {
    /// The oldest event not yet taken.
    pub fn pop_event(&mut self) -> Option<Record> {
        self.events.pop_front()
    }

    /// Events lost to a full queue.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Ticks polled so far, wrapping.
    pub fn now(&self) -> u32 {
        self.now
    }

    pub fn state(&self) -> &Ps2State<N> {
        &self.state
    }

    pub fn keys(&self) -> KeyStates<N> {
        self.state.keys()
    }

    /// Give the pins back.
    pub fn release(self) -> (CLK, DAT) {
        (self.clock, self.data)
    }
}

/// Drive `pin` high or low.
pub fn drive_level<P: OutputPin>(pin: &mut P, high: bool) -> Result<(), P::Error> {
    if high {
        pin.set_high()
    } else {
        pin.set_low()
    }
}
