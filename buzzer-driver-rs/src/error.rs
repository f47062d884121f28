//! Error types for the melody player.

use core::fmt;

use buzzer::melody::MelodyError;

/// Errors reported synchronously to a configuration writer.
///
/// A write that fails leaves the beat, the melody and the playback state
/// exactly as they were.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BuzzerError {
    /// Unknown command, malformed or non-positive beat, or a payload longer
    /// than [`PlayerConfig::max_write_len`](crate::PlayerConfig::max_write_len).
    InvalidArgument,
    /// A melody load arrived while playing under
    /// [`ReconfigurePolicy::RejectWhilePlaying`](crate::ReconfigurePolicy::RejectWhilePlaying).
    Busy,
    /// The melody has more notes than the player can hold.
    CapacityExceeded,
}

impl From<MelodyError> for BuzzerError {
    fn from(error: MelodyError) -> Self {
        match error {
            MelodyError::CapacityExceeded => BuzzerError::CapacityExceeded,
            MelodyError::InvalidFigure => BuzzerError::InvalidArgument,
        }
    }
}

impl fmt::Display for BuzzerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BuzzerError::InvalidArgument => write!(f, "Invalid argument"),
            BuzzerError::Busy => write!(f, "Melody is playing"),
            BuzzerError::CapacityExceeded => write!(f, "Melody capacity exceeded"),
        }
    }
}
