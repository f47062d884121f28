//! Embassy-time backed pacing timer and task bodies.
//!
//! Enabled by the `task` feature. Both task functions are regular
//! `async fn`s; Embassy tasks cannot be generic, so firmware wraps them in
//! thin concrete tasks:
//!
//! ```ignore
//! #[embassy_executor::task]
//! async fn melody(
//!     player: &'static MelodyPlayer<CriticalSectionRawMutex>,
//!     pwm: PwmBuzzer,
//! ) {
//!     melody_task(player, pwm).await;
//! }
//! ```

use core::future::pending;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Instant, Timer};
use embedded_hal_async::digital::Wait;

use crate::button::button_monitor;
use crate::pacing::PacingTimer;
use crate::player::MelodyPlayer;
use crate::tone::ToneOutput;

// ── Pacing timer ─────────────────────────────────────────────────────────

/// [`PacingTimer`] on top of the embassy-time driver.
#[derive(Debug, Default)]
pub struct EmbassyPacingTimer {
    deadline: Option<Instant>,
}

impl EmbassyPacingTimer {
    pub const fn new() -> Self {
        Self { deadline: None }
    }
}

impl PacingTimer for EmbassyPacingTimer {
    fn arm(&mut self, delay_ms: u32) {
        self.deadline = Some(Instant::now() + Duration::from_millis(u64::from(delay_ms)));
    }

    fn cancel(&mut self) {
        self.deadline = None;
    }

    async fn expired(&mut self) {
        match self.deadline {
            Some(deadline) => {
                Timer::at(deadline).await;
                self.deadline = None;
            }
            None => pending().await,
        }
    }
}

/// Milliseconds since boot, the tick unit used for debouncing.
pub fn now_ms() -> u64 {
    Instant::now().as_millis()
}

// ── Task bodies ──────────────────────────────────────────────────────────

/// Deferred task: drives `output` until [`MelodyPlayer::shutdown`], then
/// returns it silenced.
pub async fn melody_task<M, T>(player: &'static MelodyPlayer<M>, output: T) -> T
where
    M: RawMutex,
    T: ToneOutput,
{
    player.run(output, EmbassyPacingTimer::new()).await
}

/// Button task: forwards rising edges of `button` timestamped with
/// [`now_ms`]. A pin error is logged and ends the task.
pub async fn button_task<M, B>(player: &'static MelodyPlayer<M>, button: B)
where
    M: RawMutex,
    B: Wait,
{
    if let Err(_e) = button_monitor(button, player, now_ms).await {
        #[cfg(feature = "defmt")]
        defmt::error!("Button monitor failed: {}", defmt::Debug2Format(&_e));
    }
}
