//! Player configuration and the configuration write commands.

use buzzer::melody::DEFAULT_BEAT;

use crate::error::BuzzerError;

// ── PlayerConfig ─────────────────────────────────────────────────────────

/// What a melody load does when it arrives during playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReconfigurePolicy {
    /// Force the player to `Stopped`, silence it, and swap the melody in.
    #[default]
    StopAndReplace,
    /// Refuse the load with [`BuzzerError::Busy`] and keep playing.
    RejectWhilePlaying,
}

/// Tunables for a [`MelodyPlayer`](crate::MelodyPlayer).
///
/// Defaults: 120 quarter notes per minute, a 20-tick button quiescence
/// window, a 70 % duty cycle and a 4096-byte write limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerConfig {
    /// Beat before any `beat` command, in quarter notes per minute. Default: 120.
    pub default_beat: i32,
    /// Minimum ticks between two accepted button edges. Default: 20.
    ///
    /// Ticks are whatever monotonic clock feeds
    /// [`MelodyPlayer::button_edge`](crate::MelodyPlayer::button_edge);
    /// the embassy wrappers use milliseconds.
    pub debounce_ticks: u64,
    /// PWM duty cycle for sounding notes, in percent. Default: 70.
    pub duty_percent: u8,
    /// Longest accepted configuration write in bytes. Default: 4096.
    pub max_write_len: usize,
    /// Behaviour of a melody load during playback. Default: stop and replace.
    pub reconfigure_policy: ReconfigurePolicy,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_beat: DEFAULT_BEAT,
            debounce_ticks: 20,
            duty_percent: 70,
            max_write_len: 4096,
            reconfigure_policy: ReconfigurePolicy::StopAndReplace,
        }
    }
}

// ── Command ──────────────────────────────────────────────────────────────

/// A parsed configuration write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// `beat <int>`: set the beat used for subsequent notes.
    Beat(i32),
    /// `music <melody>`: load a melody; the text is parsed leniently.
    Music(&'a str),
}

impl<'a> Command<'a> {
    /// Parse `beat <int>` or `music <melody>`.
    ///
    /// Surrounding whitespace (including the newline left by `echo`) is
    /// ignored.
    ///
    /// # Errors
    /// [`BuzzerError::InvalidArgument`] for an unknown keyword or a beat that
    /// is not a positive decimal integer.
    pub fn parse(text: &'a str) -> Result<Self, BuzzerError> {
        let text = text.trim();
        let (keyword, argument) = text
            .split_once(char::is_whitespace)
            .unwrap_or((text, ""));

        match keyword {
            "beat" => {
                let beat: i32 = argument
                    .trim()
                    .parse()
                    .map_err(|_| BuzzerError::InvalidArgument)?;
                if beat <= 0 {
                    return Err(BuzzerError::InvalidArgument);
                }
                Ok(Command::Beat(beat))
            }
            "music" => Ok(Command::Music(argument.trim())),
            _ => Err(BuzzerError::InvalidArgument),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = PlayerConfig::default();
        assert_eq!(config.default_beat, 120);
        assert_eq!(config.debounce_ticks, 20);
        assert_eq!(config.duty_percent, 70);
        assert_eq!(config.max_write_len, 4096);
        assert_eq!(config.reconfigure_policy, ReconfigurePolicy::StopAndReplace);
    }

    #[test]
    fn parse_beat() {
        assert_eq!(Command::parse("beat 90"), Ok(Command::Beat(90)));
        assert_eq!(Command::parse("beat   200\n"), Ok(Command::Beat(200)));
    }

    #[test]
    fn parse_beat_rejects_bad_values() {
        assert_eq!(Command::parse("beat"), Err(BuzzerError::InvalidArgument));
        assert_eq!(Command::parse("beat fast"), Err(BuzzerError::InvalidArgument));
        assert_eq!(Command::parse("beat 0"), Err(BuzzerError::InvalidArgument));
        assert_eq!(Command::parse("beat -60"), Err(BuzzerError::InvalidArgument));
        assert_eq!(Command::parse("beat 12 13"), Err(BuzzerError::InvalidArgument));
    }

    #[test]
    fn parse_music_keeps_melody_text() {
        assert_eq!(
            Command::parse("music 440:04,880:08\n"),
            Ok(Command::Music("440:04,880:08"))
        );
        assert_eq!(Command::parse("music"), Ok(Command::Music("")));
    }

    #[test]
    fn parse_unknown_keyword() {
        assert_eq!(Command::parse("tempo 120"), Err(BuzzerError::InvalidArgument));
        assert_eq!(Command::parse(""), Err(BuzzerError::InvalidArgument));
    }
}
