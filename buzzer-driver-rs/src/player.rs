//! The melody player: shared state, event entry points and deferred task.
//!
//! [`MelodyPlayer`] is shared between three kinds of callers:
//!
//! - **Non-blocking contexts** (button edge, timer expiry):
//!   [`button_edge`](MelodyPlayer::button_edge) and
//!   [`timer_expired`](MelodyPlayer::timer_expired) take the lock, stage a
//!   request, signal the deferred task and return. They never touch the
//!   actuator.
//! - **Synchronous writers** (configuration):
//!   [`write`](MelodyPlayer::write) validates and parses outside the lock,
//!   then stages the result under it.
//! - **The deferred task**: [`run`](MelodyPlayer::run) owns the actuator
//!   and the pacing timer. It is the only place that awaits actuator I/O,
//!   always with the lock released.
//!
//! The lock is an `embassy_sync` blocking mutex, so with
//! `CriticalSectionRawMutex` every entry point except `run` is safe to call
//! from an interrupt handler.

use core::cell::RefCell;
use core::fmt::Write;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use heapless::String;

use buzzer::melody::parse;

use crate::config::{Command, PlayerConfig};
use crate::debounce::Debouncer;
use crate::error::BuzzerError;
use crate::pacing::PacingTimer;
use crate::playback::{Pacing, Playback, PlaybackSnapshot};
use crate::tone::{apply_tone, ToneOutput};

/// Capacity of the string returned by [`MelodyPlayer::read`].
pub const STATUS_LEN: usize = 24;

/// Everything guarded by the player's lock.
struct Shared {
    playback: Playback,
    debouncer: Debouncer,
    shutdown: bool,
}

/// Melody playback controller for one buzzer and one button.
///
/// Typically placed in a `static` (via `StaticCell`) and shared by
/// reference between the button task, the configuration source and the
/// task running [`run`](Self::run).
///
/// # Example
///
/// ```ignore
/// use buzzer_driver::{MelodyPlayer, PlayerConfig};
/// use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
///
/// let player: MelodyPlayer<CriticalSectionRawMutex> =
///     MelodyPlayer::new(PlayerConfig::default());
/// player.write("music 44000:04,49388:04,52325:02")?;
///
/// // In the deferred task:
/// let pwm = player.run(pwm, timer).await;
/// ```
pub struct MelodyPlayer<M: RawMutex> {
    shared: Mutex<M, RefCell<Shared>>,
    /// Wakes the deferred task. Signalling twice before it runs wakes it once.
    work: Signal<M, ()>,
    config: PlayerConfig,
}

impl<M: RawMutex> MelodyPlayer<M> {
    /// Create a stopped player with an empty melody and the configured beat.
    pub fn new(config: PlayerConfig) -> Self {
        Self {
            shared: Mutex::new(RefCell::new(Shared {
                playback: Playback::new(config.default_beat),
                debouncer: Debouncer::new(config.debounce_ticks),
                shutdown: false,
            })),
            work: Signal::new(),
            config,
        }
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    // ── Non-blocking entry points ────────────────────────────────────

    /// Handle a rising edge of the button observed at tick `now`.
    ///
    /// Edges inside the debounce window, and every edge after
    /// [`shutdown`](Self::shutdown), are dropped without staging anything.
    /// Returns `true` if the edge staged a request.
    pub fn button_edge(&self, now: u64) -> bool {
        let staged = self.shared.lock(|cell| {
            let mut shared = cell.borrow_mut();
            if shared.shutdown || !shared.debouncer.accept(now) {
                return None;
            }
            Some(shared.playback.stage_button_edge())
        });

        match staged {
            Some(_request) => {
                #[cfg(feature = "defmt")]
                defmt::debug!("Button edge at {}: staged {}", now, _request);
                self.work.signal(());
                true
            }
            None => {
                #[cfg(feature = "defmt")]
                defmt::debug!("Button edge at {} discarded", now);
                false
            }
        }
    }

    /// Post an advance message: the pacing timer delay has elapsed.
    pub fn timer_expired(&self) {
        self.shared
            .lock(|cell| cell.borrow_mut().playback.mark_advance_due());
        self.work.signal(());
    }

    // ── Synchronous configuration ────────────────────────────────────

    /// Apply a configuration write: `beat <int>` or `music <melody>`.
    ///
    /// A beat takes effect for the next step played. A melody is parsed
    /// leniently, swapped in, and forces the player to `Stopped` (or is
    /// refused while playing, depending on
    /// [`PlayerConfig::reconfigure_policy`]). Returns without waiting for
    /// the deferred task.
    ///
    /// Returns the number of bytes consumed, which is always `text.len()`.
    ///
    /// # Errors
    /// * [`BuzzerError::InvalidArgument`]: payload over
    ///   [`PlayerConfig::max_write_len`], unknown command, bad beat.
    /// * [`BuzzerError::CapacityExceeded`]: too many notes.
    /// * [`BuzzerError::Busy`]: playing under the reject policy.
    ///
    /// Nothing is changed when an error is returned.
    pub fn write(&self, text: &str) -> Result<usize, BuzzerError> {
        if text.len() > self.config.max_write_len {
            return Err(BuzzerError::InvalidArgument);
        }

        match Command::parse(text)? {
            Command::Beat(beat) => {
                self.shared
                    .lock(|cell| cell.borrow_mut().playback.set_beat(beat));
                #[cfg(feature = "defmt")]
                defmt::info!("Beat set to {}", beat);
            }
            Command::Music(melody_text) => {
                let (melody, _count) = parse(melody_text)?;
                let policy = self.config.reconfigure_policy;
                self.shared.lock(|cell| {
                    cell.borrow_mut().playback.stage_melody(melody, policy)
                })?;
                #[cfg(feature = "defmt")]
                defmt::info!("Melody loaded: {} steps", _count);
                self.work.signal(());
            }
        }

        Ok(text.len())
    }

    /// Current beat as `"beat=<int>\n"`. No side effects.
    pub fn read(&self) -> String<STATUS_LEN> {
        let beat = self.shared.lock(|cell| cell.borrow().playback.beat());
        let mut status = String::new();
        // "beat=" + 11 chars of i32 + '\n' always fits.
        let _ = writeln!(status, "beat={}", beat);
        status
    }

    /// Copy of the current playback fields.
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.shared.lock(|cell| cell.borrow().playback.snapshot())
    }

    // ── Teardown ─────────────────────────────────────────────────────

    /// Ask [`run`](Self::run) to finish.
    ///
    /// The deferred task completes the coordinator run in progress (if any),
    /// cancels the pacing timer, silences the actuator and hands it back.
    /// Awaiting `run` is what waits for all of that.
    pub fn shutdown(&self) {
        self.shared.lock(|cell| cell.borrow_mut().shutdown = true);
        self.work.signal(());
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.lock(|cell| cell.borrow().shutdown)
    }

    // ── Deferred task ────────────────────────────────────────────────

    /// Run the coordinator once and carry out its decision.
    ///
    /// The transition is computed under the lock; the actuator is driven
    /// after the lock is released. If the actuator fails, the player is
    /// forced to `Stopped`, a best-effort `disable()` is issued, the error
    /// is logged and the timer is cancelled.
    ///
    /// Must not run concurrently with itself; [`run`](Self::run) guarantees
    /// that by owning `output`.
    pub async fn coordinate<T>(&self, output: &mut T) -> Pacing
    where
        T: ToneOutput,
    {
        let (decision, _state) = self.shared.lock(|cell| {
            let mut shared = cell.borrow_mut();
            let decision = shared.playback.coordinate();
            (decision, shared.playback.state())
        });

        #[cfg(feature = "defmt")]
        if decision != crate::playback::Decision::IDLE {
            defmt::info!("Playback {}: {}", _state, decision);
        }

        if let Some(tone) = decision.tone {
            if let Err(_e) = apply_tone(output, tone, self.config.duty_percent).await {
                #[cfg(feature = "defmt")]
                defmt::error!(
                    "Actuator failed, stopping playback: {}",
                    defmt::Debug2Format(&_e)
                );
                self.shared.lock(|cell| cell.borrow_mut().playback.abort());
                let _ = output.disable().await;
                return Pacing::Cancel;
            }
        }

        decision.pacing
    }

    /// Deferred-task loop: the single consumer of work and timer events.
    ///
    /// Waits for either a work signal or the pacing timer. A timer expiry is
    /// posted back as an advance message through
    /// [`timer_expired`](Self::timer_expired) and handled on the next
    /// iteration, exactly like an expiry raised from interrupt context.
    ///
    /// Returns `output`, silenced, after [`shutdown`](Self::shutdown).
    ///
    /// # Control flow
    ///
    /// 1. Wait for work or timer expiry.
    /// 2. Timer expiry: post an advance message, go to 1.
    /// 3. Shutdown requested: leave the loop.
    /// 4. [`coordinate`](Self::coordinate), then arm, cancel or keep the
    ///    timer as decided.
    pub async fn run<T, P>(&self, mut output: T, mut timer: P) -> T
    where
        T: ToneOutput,
        P: PacingTimer,
    {
        #[cfg(feature = "defmt")]
        defmt::info!("Melody player running");

        loop {
            let event = select(self.work.wait(), timer.expired()).await;
            if let Either::Second(()) = event {
                self.timer_expired();
                continue;
            }

            if self.is_shut_down() {
                break;
            }

            match self.coordinate(&mut output).await {
                Pacing::Arm(delay_ms) => timer.arm(delay_ms),
                Pacing::Cancel => timer.cancel(),
                Pacing::Keep => {}
            }
        }

        timer.cancel();
        if let Err(_e) = output.disable().await {
            #[cfg(feature = "defmt")]
            defmt::warn!("Failed to silence actuator on shutdown");
        }

        #[cfg(feature = "defmt")]
        defmt::info!("Melody player stopped");

        output
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────
