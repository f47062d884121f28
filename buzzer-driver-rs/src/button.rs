//! Button edge monitor.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::digital::Wait;

use crate::player::MelodyPlayer;

/// Feed rising edges of `button` to `player`, timestamped by `clock`.
///
/// This is a regular `async fn`, **not** an Embassy `#[task]`; see
/// `task::button_task` (feature `task`) for the embassy-time wrapper.
/// Debouncing happens inside
/// [`MelodyPlayer::button_edge`], so `clock` only has to be monotonic in
/// the same unit as [`PlayerConfig::debounce_ticks`](crate::PlayerConfig).
///
/// Returns `Ok(())` at the first edge seen after
/// [`MelodyPlayer::shutdown`].
///
/// # Errors
///
/// Returns the pin's error if waiting for an edge fails.
pub async fn button_monitor<B, M, C>(
    mut button: B,
    player: &MelodyPlayer<M>,
    mut clock: C,
) -> Result<(), B::Error>
where
    B: Wait,
    M: RawMutex,
    C: FnMut() -> u64,
{
    loop {
        button.wait_for_rising_edge().await?;

        if player.is_shut_down() {
            return Ok(());
        }

        player.button_edge(clock());
    }
}
