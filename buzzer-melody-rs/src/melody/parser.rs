use super::error::MelodyError;
use super::step::{Melody, MelodyStep};

/// Parse a comma-separated melody description.
///
/// Each token has the form `<frequency>:<duration>`: a decimal frequency in
/// centihertz and a hexadecimal duration code (an optional `0x` prefix is
/// accepted). Whitespace around tokens and fields is ignored.
///
/// Parsing is lenient: a token that does not match, has a negative
/// frequency, a duration above `0xFF`, or equals the `0:0` sentinel is
/// dropped without affecting the tokens after it. Accepted tokens keep
/// their input order and the sentinel is appended after the last one.
///
/// Returns the melody together with its number of playable steps.
///
/// # Errors
///
/// [`MelodyError::CapacityExceeded`] if more than
/// [`MELODY_CAPACITY`](super::MELODY_CAPACITY) tokens are accepted.
///
/// # Examples
///
/// ```
/// use buzzer::melody::{parse, MelodyStep, SENTINEL};
///
/// let (melody, count) = parse("440:04,garbage,880:08").unwrap();
/// assert_eq!(count, 2);
/// assert_eq!(
///     melody.as_slice(),
///     &[MelodyStep::new(440, 0x04), MelodyStep::new(880, 0x08), SENTINEL]
/// );
/// ```
pub fn parse(text: &str) -> Result<(Melody, usize), MelodyError> {
    let mut melody = Melody::unterminated();

    for token in text.split(',') {
        if let Some(step) = parse_step(token) {
            melody.push(step)?;
        }
    }

    melody.terminate();
    let count = melody.len();
    Ok((melody, count))
}

/// Parse one `<frequency>:<duration>` token, `None` if it does not fit.
fn parse_step(token: &str) -> Option<MelodyStep> {
    let (frequency, duration) = token.trim().split_once(':')?;

    let frequency: i32 = frequency.trim().parse().ok()?;
    let frequency = u32::try_from(frequency).ok()?;
    let duration = parse_hex_byte(duration.trim())?;

    let step = MelodyStep::new(frequency, duration);
    (!step.is_sentinel()).then_some(step)
}

fn parse_hex_byte(field: &str) -> Option<u8> {
    let digits = field
        .strip_prefix("0x")
        .or_else(|| field.strip_prefix("0X"))
        .unwrap_or(field);
    if digits.starts_with(['+', '-']) {
        return None;
    }
    u8::from_str_radix(digits, 16).ok()
}
