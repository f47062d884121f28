//! Melody playback controller for a PWM buzzer and a push button.
//!
//! This crate turns a [`Melody`](buzzer::melody::Melody) into sound, one
//! step at a time, on any actuator implementing [`ToneOutput`]. A button
//! toggles play and pause; configuration writes set the beat or load a
//! new melody.
//!
//! The controller, [`MelodyPlayer`], is split the way interrupt-driven
//! drivers are:
//!
//! - edge and timer handlers only stage a request and wake the deferred
//!   task ([`MelodyPlayer::button_edge`], [`MelodyPlayer::timer_expired`]);
//! - the deferred task ([`MelodyPlayer::run`]) is the only code that
//!   touches the actuator, always with the lock released.
//!
//! # Quick Start
//!
//! ```ignore
//! use buzzer_driver::task::{button_task, melody_task};
//! use buzzer_driver::{MelodyPlayer, PlayerConfig};
//!
//! static PLAYER: StaticCell<MelodyPlayer<CriticalSectionRawMutex>> = StaticCell::new();
//!
//! // Thin task wrappers (Embassy tasks cannot be generic):
//! #[embassy_executor::task]
//! async fn melody(player: &'static MelodyPlayer<CriticalSectionRawMutex>, pwm: MyPwmBuzzer) {
//!     melody_task(player, pwm).await;
//! }
//!
//! #[embassy_executor::task]
//! async fn button(player: &'static MelodyPlayer<CriticalSectionRawMutex>, pin: Input<'static>) {
//!     button_task(player, pin).await;
//! }
//!
//! // In your Embassy main:
//! let player = PLAYER.init(MelodyPlayer::new(PlayerConfig::default()));
//! player.write("music 44000:04,49388:04,52325:02")?;
//!
//! spawner.spawn(unwrap!(melody(player, pwm)));
//! spawner.spawn(unwrap!(button(player, button_pin)));
//! ```
//!
//! # Crate Features
//!
//! - **`defmt`** — structured logging via [`defmt`].
//! - **`task`** — embassy-time backed [`PacingTimer`] and task bodies.

#![no_std]

pub mod button;
pub mod config;
pub mod debounce;
pub mod error;
pub mod pacing;
pub mod playback;
pub mod player;
#[cfg(feature = "task")]
pub mod task;
pub mod tone;

// ── Re-exports for convenience ───────────────────────────────────────────

pub use button::button_monitor;
pub use config::{Command, PlayerConfig, ReconfigurePolicy};
pub use debounce::Debouncer;
pub use error::BuzzerError;
pub use pacing::PacingTimer;
pub use playback::{Decision, Pacing, PendingRequest, Playback, PlaybackSnapshot, PlaybackState};
pub use player::{MelodyPlayer, STATUS_LEN};
pub use tone::{apply_tone, period_ns_for, pwm_timing, PwmTiming, Tone, ToneOutput};
