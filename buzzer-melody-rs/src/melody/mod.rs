//! Melody encoding for a single-voice buzzer.
//!
//! A melody is an ordered list of [`MelodyStep`]s, each pairing a frequency
//! (in centihertz, `0` for a rest) with a one-byte duration code. The list
//! always ends with the [`SENTINEL`] step `{0, 0}`, which marks the end of
//! the sequence and is never played.
//!
//! # Duration codes
//!
//! ```text
//!  bit:   7        6    5    4    3    2    1    0
//!       triplet   1/64 1/32 1/16 1/8  1/4  1/2  1/1
//! ```
//!
//! Every set bit in 0–6 contributes one rhythmic figure; several set bits
//! tie the figures together (a quarter plus an eighth is a dotted quarter).
//! Bit 7 shortens every contributing figure to two thirds of its length.
//! [`decode_duration_ms`] turns a code into milliseconds for a given beat,
//! [`encode_duration`] builds a code from a figure expression such as
//! `"t4+8"`.
//!
//! # Textual form
//!
//! ```text
//! 44000:04,0:08,49388:0x0c
//! ```
//!
//! Comma-separated `<frequency>:<hex duration>` tokens, parsed leniently by
//! [`parse`]: tokens that do not match are dropped, the rest keep their
//! order.
//!
//! # `no_std` Compatibility
//!
//! No heap allocation. A [`Melody`] is a fixed-capacity
//! [`heapless::Vec`] sized by [`MELODY_SLOTS`].

mod duration;
mod error;
mod parser;
mod step;

pub use duration::{decode_duration_ms, encode_duration, TRIPLET_FLAG, WHOLE_NOTE_MS_AT_ONE_BPM};
pub use error::MelodyError;
pub use parser::parse;
pub use step::{Melody, MelodyStep, SENTINEL};

/// Maximum number of playable steps in a melody.
pub const MELODY_CAPACITY: usize = 100;

/// Storage slots in a [`Melody`]: the playable steps plus the sentinel.
pub const MELODY_SLOTS: usize = MELODY_CAPACITY + 1;

/// Beat used until a configuration sets another one, in quarter notes per
/// minute.
pub const DEFAULT_BEAT: i32 = 120;
