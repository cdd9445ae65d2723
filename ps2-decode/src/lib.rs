//! Receive-only PS/2 keyboard decoding.
//!
//! A PS/2 keyboard clocks its frames out on two open collector lines. This
//! crate turns periodic samples of those lines into key press and release
//! events and a set of pressed/released levels, one per mapped key.
//!
//! The pipeline has four stages, each advanced once per sampling tick:
//!
//! ```text
//! clock, data ─> sync ─> edge ─> frame ─> decode ─> key levels
//!               (3 deep) (falling) (11 bits) (make/break)
//! ```
//!
//! Every stage reads what its upstream stage produced on the previous tick,
//! so a change on the wire takes a handful of ticks to reach the key levels.
//! [`Ps2State`] owns the whole pipeline and [`Receiver`] binds it to a pair
//! of `embedded-hal` input pins.
#![no_std]

pub mod config;
pub mod decode;
pub mod edge;
pub mod frame;
pub mod keymap;
pub mod pipeline;
pub mod receiver;
pub mod sync;

#[cfg(test)]
mod wave;

pub use crate::config::Config;
pub use crate::decode::{BreakState, Decoded, KeyTracker, BREAK_PREFIX};
pub use crate::frame::{Frame, FrameAssembler, FrameError};
pub use crate::keymap::{KeyStates, Keymap, Paddle, PADDLES};
pub use crate::pipeline::{Event, Input, Output, Ps2State};
pub use crate::receiver::{drive_level, Receiver, Record};
pub use crate::sync::{FilterMode, Lines};
