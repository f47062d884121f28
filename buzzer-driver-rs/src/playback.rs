//! Playback state and the transition logic of the melody player.
//!
//! [`Playback`] is the data guarded by the player's lock. Every method here
//! is synchronous, allocation-free and does no I/O: callers hold the lock,
//! call one of these, release the lock, and only then act on the returned
//! [`Decision`].
//!
//! # Transitions
//!
//! ```text
//! Stopped --Start--> Playing        cursor <- 0, arm timer 0 ms
//! Paused  --Resume-> Playing        cursor kept, arm timer 0 ms
//! Playing --Pause--> Paused         silence, cancel timer
//! any     --Reconfigure--> Stopped  silence, cancel timer
//! Playing --tick, at sentinel----> Stopped   silence, cancel timer
//! Playing --tick, not at sentinel-> Playing  play step, cursor += 1,
//!                                            arm timer for its duration
//! ```

use core::mem;

use buzzer::melody::{decode_duration_ms, Melody};

use crate::config::ReconfigurePolicy;
use crate::error::BuzzerError;
use crate::tone::Tone;

/// Lifecycle of the player. Starts in `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlaybackState {
    #[default]
    Stopped,
    Paused,
    Playing,
}

/// Request staged by an event source for the next coordinator run.
///
/// Only one is held: a later stage overwrites an earlier one that has not
/// been consumed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PendingRequest {
    #[default]
    None,
    Start,
    Resume,
    Pause,
    Reconfigure,
}

/// What the pacing timer should do after a coordinator run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pacing {
    /// Leave the timer as it is.
    Keep,
    /// (Re)arm the timer to fire after this many milliseconds.
    Arm(u32),
    /// Disarm the timer.
    Cancel,
}

/// Outcome of one coordinator run, computed under the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Decision {
    /// Actuator command to issue, if any.
    pub tone: Option<Tone>,
    pub pacing: Pacing,
}

impl Decision {
    /// Nothing to do.
    pub const IDLE: Decision = Decision {
        tone: None,
        pacing: Pacing::Keep,
    };

    /// Silence the actuator and disarm the timer.
    pub const HALT: Decision = Decision {
        tone: Some(Tone::Silence),
        pacing: Pacing::Cancel,
    };
}

/// Copy of the observable playback fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,
    pub pending: PendingRequest,
    pub cursor: usize,
    pub beat: i32,
    /// Playable steps in the active melody.
    pub step_count: usize,
}

/// Shared playback data.
pub struct Playback {
    state: PlaybackState,
    pending: PendingRequest,
    /// Set by the pacing timer, consumed by the next coordinator run.
    advance_due: bool,
    melody: Melody,
    /// Next step to play. Only meaningful while `Playing` or `Paused`.
    cursor: usize,
    beat: i32,
}

impl Playback {
    /// Stopped, empty melody, the given beat.
    pub fn new(beat: i32) -> Self {
        Self {
            state: PlaybackState::Stopped,
            pending: PendingRequest::None,
            advance_due: false,
            melody: Melody::empty(),
            cursor: 0,
            beat,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn pending(&self) -> PendingRequest {
        self.pending
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn beat(&self) -> i32 {
        self.beat
    }

    pub fn melody(&self) -> &Melody {
        &self.melody
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            state: self.state,
            pending: self.pending,
            cursor: self.cursor,
            beat: self.beat,
            step_count: self.melody.len(),
        }
    }

    // ── Event staging (any context) ──────────────────────────────────

    /// Stage the request a button press means in the current state.
    ///
    /// Stopped starts, Paused resumes, Playing pauses. Returns the staged
    /// request.
    pub fn stage_button_edge(&mut self) -> PendingRequest {
        self.pending = match self.state {
            PlaybackState::Stopped => PendingRequest::Start,
            PlaybackState::Paused => PendingRequest::Resume,
            PlaybackState::Playing => PendingRequest::Pause,
        };
        self.pending
    }

    /// Swap in a new melody and stage [`PendingRequest::Reconfigure`].
    ///
    /// The state is forced to `Stopped` in the same critical section as the
    /// swap, so an advance that runs afterwards never plays the old cursor
    /// against the new melody.
    ///
    /// # Errors
    /// [`BuzzerError::Busy`] if playing under
    /// [`ReconfigurePolicy::RejectWhilePlaying`]. Nothing changes in that
    /// case.
    pub fn stage_melody(
        &mut self,
        melody: Melody,
        policy: ReconfigurePolicy,
    ) -> Result<(), BuzzerError> {
        if policy == ReconfigurePolicy::RejectWhilePlaying
            && self.state == PlaybackState::Playing
        {
            return Err(BuzzerError::Busy);
        }

        self.state = PlaybackState::Stopped;
        self.melody = melody;
        self.cursor = 0;
        self.advance_due = false;
        self.pending = PendingRequest::Reconfigure;
        Ok(())
    }

    /// Set the beat used for every duration decoded from now on.
    pub fn set_beat(&mut self, beat: i32) {
        self.beat = beat;
    }

    /// Record that the pacing timer fired.
    pub fn mark_advance_due(&mut self) {
        self.advance_due = true;
    }

    /// Force `Stopped` after an actuator failure and drop any advance that
    /// was due.
    pub fn abort(&mut self) {
        self.state = PlaybackState::Stopped;
        self.advance_due = false;
    }

    // ── Coordinator ──────────────────────────────────────────────────

    /// Consume the pending request and any due advance, apply the
    /// transition, and return what the actuator and timer must do.
    ///
    /// A staged request takes precedence over a due advance; the advance is
    /// discarded in that case.
    pub fn coordinate(&mut self) -> Decision {
        let request = mem::take(&mut self.pending);
        let advance_due = mem::replace(&mut self.advance_due, false);

        match (self.state, request) {
            (_, PendingRequest::Reconfigure) => {
                self.state = PlaybackState::Stopped;
                Decision::HALT
            }
            (PlaybackState::Stopped, PendingRequest::Start) => {
                self.state = PlaybackState::Playing;
                self.cursor = 0;
                Decision {
                    tone: Some(Tone::Silence),
                    pacing: Pacing::Arm(0),
                }
            }
            (PlaybackState::Paused, PendingRequest::Resume) => {
                self.state = PlaybackState::Playing;
                Decision {
                    tone: None,
                    pacing: Pacing::Arm(0),
                }
            }
            (PlaybackState::Playing, PendingRequest::Pause) => {
                self.state = PlaybackState::Paused;
                Decision::HALT
            }
            (PlaybackState::Playing, _) if advance_due => self.advance(),
            _ => Decision::IDLE,
        }
    }

    /// Play the step under the cursor, or stop at the sentinel.
    fn advance(&mut self) -> Decision {
        let step = self.melody.step(self.cursor);
        if step.is_sentinel() {
            self.state = PlaybackState::Stopped;
            return Decision::HALT;
        }

        self.cursor += 1;
        Decision {
            tone: Some(Tone::for_step(&step)),
            pacing: Pacing::Arm(decode_duration_ms(step.duration, self.beat)),
        }
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────
