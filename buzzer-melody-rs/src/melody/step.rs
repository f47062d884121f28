use heapless::Vec;

use super::error::MelodyError;
use super::{MELODY_CAPACITY, MELODY_SLOTS};

/// One note or rest of a melody.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MelodyStep {
    /// Tone frequency in centihertz (`44000` is A4). `0` is a rest.
    pub frequency: u32,
    /// Encoded duration, see [`decode_duration_ms`](super::decode_duration_ms).
    pub duration: u8,
}

/// End-of-melody marker. Detected, never played.
pub const SENTINEL: MelodyStep = MelodyStep {
    frequency: 0,
    duration: 0,
};

impl MelodyStep {
    pub const fn new(frequency: u32, duration: u8) -> Self {
        Self {
            frequency,
            duration,
        }
    }

    /// Returns `true` for the `{0, 0}` end marker.
    pub fn is_sentinel(&self) -> bool {
        *self == SENTINEL
    }

    /// Returns `true` if this step is silent (frequency `0`).
    pub fn is_rest(&self) -> bool {
        self.frequency == 0
    }
}

/// A sentinel-terminated sequence of at most [`MELODY_CAPACITY`] steps.
///
/// Built once (usually by [`parse`](super::parse)) and then only read.
/// Replacing the melody of a running player swaps the whole value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Melody {
    /// Playable steps followed by exactly one [`SENTINEL`].
    steps: Vec<MelodyStep, MELODY_SLOTS>,
}

impl Default for Melody {
    fn default() -> Self {
        Self::empty()
    }
}

impl Melody {
    /// A melody with no playable steps (just the sentinel).
    pub fn empty() -> Self {
        let mut steps = Vec::new();
        // MELODY_SLOTS >= 1, the sentinel always fits.
        let _ = steps.push(SENTINEL);
        Self { steps }
    }

    /// Build a melody from playable steps, appending the sentinel.
    ///
    /// Sentinel-valued steps in `notes` are skipped since they would end
    /// the melody early.
    ///
    /// Returns [`MelodyError::CapacityExceeded`] if more than
    /// [`MELODY_CAPACITY`] steps remain.
    pub fn from_steps(notes: &[MelodyStep]) -> Result<Self, MelodyError> {
        let mut melody = Self {
            steps: Vec::new(),
        };
        for step in notes.iter().filter(|s| !s.is_sentinel()) {
            melody.push(*step)?;
        }
        melody.terminate();
        Ok(melody)
    }

    /// Number of playable steps, not counting the sentinel.
    pub fn len(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Step at `index`. Any index at or past the end yields the sentinel.
    pub fn step(&self, index: usize) -> MelodyStep {
        self.steps.get(index).copied().unwrap_or(SENTINEL)
    }

    /// Playable steps, without the sentinel.
    pub fn notes(&self) -> &[MelodyStep] {
        &self.steps[..self.len()]
    }

    /// All stored steps, sentinel included.
    pub fn as_slice(&self) -> &[MelodyStep] {
        &self.steps
    }

    // ── Construction helpers (parser) ────────────────────────────────

    /// Append a playable step to an unterminated melody.
    pub(super) fn push(&mut self, step: MelodyStep) -> Result<(), MelodyError> {
        if self.steps.len() >= MELODY_CAPACITY {
            return Err(MelodyError::CapacityExceeded);
        }
        self.steps
            .push(step)
            .map_err(|_| MelodyError::CapacityExceeded)
    }

    /// Start an unterminated melody for [`push`](Self::push).
    pub(super) fn unterminated() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append the sentinel. The slot after `MELODY_CAPACITY` is reserved
    /// for it, so this cannot fail.
    pub(super) fn terminate(&mut self) {
        let _ = self.steps.push(SENTINEL);
    }
}
