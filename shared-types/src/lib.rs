#![no_std]
use packed_struct::prelude::*;
use packed_struct::PackingError;

/// Marks the start of a [`TraceLog`] in target RAM. Reads "PS2T" in a
/// little-endian memory dump.
pub const TRACE_MAGIC: u32 = 0x5432_5350;

/// Number of entries in the trace ring.
pub const TRACE_LEN: usize = 64;

/// What happened in the receive pipeline.
#[derive(PrimitiveEnum_u8, Debug, Copy, Clone, PartialEq)]
pub enum EventKind {
    Press = 0,
    Release = 1,
    BreakPrefix = 2,
    /// A code that no key is mapped to, outside of a break sequence
    Ignored = 3,
    /// A code that no key is mapped to, following a break prefix
    IgnoredBreak = 4,
    BadFrame = 5,
    Resync = 6,
}

/// A packed representation of a receive pipeline event, used for observing
/// the decoder with a debugger.
///
/// `arg` depends on `kind`: the key index for presses and releases, the
/// frame error for bad frames and the number of discarded bits for resyncs.
/// `code` is the scan code, or the raw data byte of a bad frame.
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0")]
pub struct TraceEvent {
    #[packed_field(bits = "0..=2", ty = "enum")]
    pub kind: EventKind,
    #[packed_field(bits = "3..=7")]
    pub arg: Integer<u8, packed_bits::Bits5>,
    #[packed_field(bits = "8..=15")]
    pub code: u8,
}

impl TraceEvent {
    pub fn new(kind: EventKind, arg: u8, code: u8) -> Self {
        TraceEvent {
            kind,
            arg: (arg & 0x1f).into(),
            code,
        }
    }
}

/// One slot of the trace ring. Two words, so the host can read it with
/// 32 bit transfers.
#[derive(Debug, Copy, Clone, PartialEq)]
#[repr(C)]
pub struct TraceEntry {
    /// The tick on which the event happened
    pub tick: u32,
    /// A packed [`TraceEvent`], padded to a full word
    pub event: [u8; 4],
}

impl TraceEntry {
    pub const EMPTY: TraceEntry = TraceEntry {
        tick: 0,
        event: [0; 4],
    };

    /// Rebuild an entry from the two words the debugger read.
    pub fn from_words(tick: u32, event: u32) -> Self {
        TraceEntry {
            tick,
            event: event.to_le_bytes(),
        }
    }

    pub fn event(&self) -> Result<TraceEvent, PackingError> {
        TraceEvent::unpack(&[self.event[0], self.event[1]])
    }
}

/// A ring of trace entries that lives in target RAM.
///
/// The firmware only ever writes to it. Reading happens from the host,
/// through a debug probe, while the target runs.
#[derive(Debug)]
#[repr(C)]
pub struct TraceLog {
    magic: u32,
    /// Total number of entries ever recorded. The next slot written is
    /// `head % TRACE_LEN`.
    head: u32,
    /// Events the firmware lost before they reached the log
    dropped: u32,
    entries: [TraceEntry; TRACE_LEN],
}

impl TraceLog {
    pub const fn new() -> Self {
        TraceLog {
            magic: TRACE_MAGIC,
            head: 0,
            dropped: 0,
            entries: [TraceEntry::EMPTY; TRACE_LEN],
        }
    }

    pub fn record(&mut self, tick: u32, event: TraceEvent) -> Result<(), PackingError> {
        let [a, b] = event.pack()?;
        let slot = self.head as usize % TRACE_LEN;
        self.entries[slot] = TraceEntry {
            tick,
            event: [a, b, 0, 0],
        };
        self.head = self.head.wrapping_add(1);
        Ok(())
    }

    pub fn recorded(&self) -> u32 {
        self.head
    }

    pub fn set_dropped(&mut self, dropped: u32) {
        self.dropped = dropped;
    }

    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl Default for TraceLog {
    fn default() -> Self {
        Self::new()
    }
}

/// A trace log found in a dump of target memory.
pub struct FoundLog<'a> {
    /// Word offset of the log within the dump
    pub offset: usize,
    head: u32,
    dropped: u32,
    slots: &'a [u32],
}

impl<'a> FoundLog<'a> {
    /// Total number of entries the firmware has recorded.
    pub fn recorded(&self) -> u32 {
        self.head
    }

    /// Events the firmware lost without recording them.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// The entries still held by the ring, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = TraceEntry> + 'a {
        let held = (self.head as usize).min(TRACE_LEN);
        let first = if (self.head as usize) > TRACE_LEN {
            self.head as usize % TRACE_LEN
        } else {
            0
        };
        let slots = self.slots;
        (0..held).map(move |i| {
            let slot = (first + i) % TRACE_LEN;
            TraceEntry::from_words(slots[slot * 2], slots[slot * 2 + 1])
        })
    }
}

/// Search a word-wise memory dump for a [`TraceLog`].
pub fn find_log(words: &[u32]) -> Option<FoundLog<'_>> {
    const HEADER: usize = 3;
    let needed = HEADER + TRACE_LEN * 2;
    let offset = words.iter().position(|&w| w == TRACE_MAGIC)?;
    let log = words.get(offset..offset + needed)?;
    Some(FoundLog {
        offset,
        head: log[1],
        dropped: log[2],
        slots: &log[HEADER..],
    })
}
