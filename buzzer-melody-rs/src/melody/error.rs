use core::fmt;

/// Errors produced while building a melody.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MelodyError {
    /// More notes were accepted than fit in [`MELODY_CAPACITY`](super::MELODY_CAPACITY).
    CapacityExceeded,
    /// A figure in a duration expression is not a power of two in `1..=64`.
    InvalidFigure,
}

impl fmt::Display for MelodyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MelodyError::CapacityExceeded => write!(
                f,
                "melody exceeds {} notes",
                super::MELODY_CAPACITY
            ),
            MelodyError::InvalidFigure => {
                write!(f, "figure must be a power of two between 1 and 64")
            }
        }
    }
}
