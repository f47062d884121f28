use super::error::MelodyError;

/// Bit 7 of a duration code: every figure is played as a triplet.
pub const TRIPLET_FLAG: u8 = 0x80;

/// Bits 0–6 of a duration code: one bit per figure (whole … sixty-fourth).
const FIGURE_MASK: u8 = 0x7F;

/// Largest figure denominator that fits in bits 0–6.
const SHORTEST_FIGURE: u8 = 64;

/// Length of a whole note in milliseconds at one quarter note per minute.
///
/// A whole note lasts four beats, so at `beat` quarters per minute it lasts
/// `4 * 60_000 / beat` ms.
pub const WHOLE_NOTE_MS_AT_ONE_BPM: u64 = 240_000;

/// Decode a duration code into milliseconds.
///
/// Each set bit `i` in 0–6 contributes `240000 / (beat * 2^i)` ms. With
/// [`TRIPLET_FLAG`] set, each figure's denominator is first scaled by
/// `3 / 2` in integer arithmetic, so a triplet whole note stays a whole
/// note. Every contribution is truncated on its own before summing.
///
/// Returns `0` when no figure bit is set, meaning "advance immediately".
/// A non-positive `beat` also yields `0`; the player never stores one.
///
/// # Examples
///
/// ```
/// use buzzer::melody::decode_duration_ms;
///
/// assert_eq!(decode_duration_ms(0x04, 120), 500); // quarter
/// assert_eq!(decode_duration_ms(0x0C, 120), 750); // dotted quarter
/// assert_eq!(decode_duration_ms(0x84, 120), 333); // triplet quarter
/// assert_eq!(decode_duration_ms(0x80, 120), 0);
/// ```
pub fn decode_duration_ms(code: u8, beat: i32) -> u32 {
    if beat <= 0 {
        return 0;
    }

    let triplet = code & TRIPLET_FLAG != 0;
    let mut figures = code & FIGURE_MASK;
    let mut total: u64 = 0;

    while figures != 0 {
        // Lowest remaining figure.
        let figure = figures & figures.wrapping_neg();
        figures &= !figure;

        let mut denominator = u64::from(figure);
        if triplet {
            denominator = denominator * 3 / 2;
        }
        total += WHOLE_NOTE_MS_AT_ONE_BPM / (beat as u64 * denominator);
    }

    // At most seven terms of at most 240000 each.
    total as u32
}

/// Build a duration code from a figure expression.
///
/// The expression is a `+`-separated list of figure denominators (`1`
/// whole, `2` half, `4` quarter … `64`), optionally prefixed by `t` to set
/// the [`TRIPLET_FLAG`]. This is the notation used when transcribing sheet
/// music into melody text.
///
/// # Errors
///
/// [`MelodyError::InvalidFigure`] if a figure is empty, not a number, or not
/// a power of two in `1..=64`.
///
/// # Examples
///
/// ```
/// use buzzer::melody::encode_duration;
///
/// assert_eq!(encode_duration("4"), Ok(0x04));
/// assert_eq!(encode_duration("4+8"), Ok(0x0C));
/// assert_eq!(encode_duration("t4+8"), Ok(0x8C));
/// assert!(encode_duration("3").is_err());
/// ```
pub fn encode_duration(expression: &str) -> Result<u8, MelodyError> {
    let expression = expression.trim();
    let (mut code, figures) = match expression.strip_prefix('t') {
        Some(rest) => (TRIPLET_FLAG, rest),
        None => (0, expression),
    };

    for token in figures.split('+') {
        let figure: u8 = token
            .trim()
            .parse()
            .map_err(|_| MelodyError::InvalidFigure)?;
        if figure == 0 || figure > SHORTEST_FIGURE || !figure.is_power_of_two() {
            return Err(MelodyError::InvalidFigure);
        }
        code |= figure;
    }

    Ok(code)
}
