//! Melody model for a single-voice PWM buzzer.
//!
//! See [`melody`] for the step encoding, the duration decoder and the
//! textual melody parser.

#![no_std]

pub mod melody;
