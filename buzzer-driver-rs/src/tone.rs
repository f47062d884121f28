//! Tone-generating actuator interface.
//!
//! [`ToneOutput`] is the only way the player touches hardware. It follows
//! the `embedded-hal-async` shape (associated error type, async methods)
//! so a PWM slice, a LEDC channel or a test double can sit behind it.

use core::fmt::Debug;

use buzzer::melody::MelodyStep;

/// Nanoseconds in one period of a 1 cHz tone: `1e9 ns * 100`.
const CENTIHERTZ_PERIOD_NS: u64 = 100_000_000_000;

/// A PWM-style actuator that turns a period and a duty cycle into sound.
///
/// Calls may block or sleep, so they are only issued from the player's
/// deferred task, never from an edge or timer context.
#[allow(async_fn_in_trait)]
pub trait ToneOutput {
    /// Error reported by the underlying peripheral.
    type Error: Debug;

    /// Program the waveform period (ns) and duty cycle (percent, 0–100).
    async fn set_period_and_duty(
        &mut self,
        period_ns: u64,
        duty_percent: u8,
    ) -> Result<(), Self::Error>;

    /// Start producing the programmed waveform.
    async fn enable(&mut self) -> Result<(), Self::Error>;

    /// Stop producing sound.
    async fn disable(&mut self) -> Result<(), Self::Error>;
}

/// What the actuator should be doing after a coordinator step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tone {
    /// Actuator disabled (stopped, paused or a rest).
    Silence,
    /// Sound the given frequency in centihertz (never 0).
    Note(u32),
}

impl Tone {
    /// Map a melody step to a tone: frequency 0 is a rest.
    pub fn for_step(step: &MelodyStep) -> Self {
        match step.frequency {
            0 => Tone::Silence,
            f => Tone::Note(f),
        }
    }
}

/// Convert a frequency in centihertz to a PWM period in nanoseconds,
/// rounded to the closest nanosecond. `0` maps to `0` (no waveform).
///
/// # Examples
///
/// ```
/// use buzzer_driver::period_ns_for;
///
/// assert_eq!(period_ns_for(44000), 2_272_727); // A4
/// assert_eq!(period_ns_for(0), 0);
/// ```
pub fn period_ns_for(centihertz: u32) -> u64 {
    if centihertz == 0 {
        return 0;
    }
    let f = u64::from(centihertz);
    (CENTIHERTZ_PERIOD_NS + f / 2) / f
}

/// Clock divider and counter settings for a 16-bit PWM slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmTiming {
    /// Integer clock divider, `1..=255`.
    pub divider: u8,
    /// Counter wrap value; the period is `top + 1` divided clock cycles.
    pub top: u16,
    /// Compare value for the requested duty cycle, at most `u16::MAX`.
    pub compare: u16,
}

/// Compute [`PwmTiming`] for `period_ns` at `duty_percent` on a counter
/// clocked at `clk_hz`.
///
/// Periods too long for a divider of 255 are clamped to the longest one
/// the counter can produce. `duty_percent` above 100 counts as 100.
///
/// # Examples
///
/// ```
/// use buzzer_driver::pwm_timing;
///
/// // A4 at 150 MHz, 70 % duty.
/// let timing = pwm_timing(2_272_727, 70, 150_000_000);
/// assert_eq!((timing.divider, timing.top), (6, 56_817));
/// ```
pub fn pwm_timing(period_ns: u64, duty_percent: u8, clk_hz: u32) -> PwmTiming {
    let cycles = (period_ns.saturating_mul(u64::from(clk_hz)) / 1_000_000_000).max(1);
    let divider = cycles.div_ceil(1 << 16).clamp(1, 255);
    let top = (cycles / divider).saturating_sub(1).min(u64::from(u16::MAX));
    let compare = ((top + 1) * u64::from(duty_percent.min(100)) / 100).min(u64::from(u16::MAX));

    PwmTiming {
        divider: divider as u8,
        top: top as u16,
        compare: compare as u16,
    }
}

/// Drive `output` to `tone`.
///
/// A note disables the output first so that two equal consecutive notes
/// are still heard as two, then programs the period and enables it.
pub async fn apply_tone<T>(output: &mut T, tone: Tone, duty_percent: u8) -> Result<(), T::Error>
where
    T: ToneOutput,
{
    output.disable().await?;
    if let Tone::Note(centihertz) = tone {
        output
            .set_period_and_duty(period_ns_for(centihertz), duty_percent)
            .await?;
        output.enable().await?;
    }
    Ok(())
}
