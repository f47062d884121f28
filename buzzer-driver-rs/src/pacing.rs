/// A single re-arming one-shot timer that paces melody playback.
///
/// The player arms it after every played step with that step's duration
/// and cancels it when playback pauses or stops. Its only job is to tell
/// the player when the delay is over; [`expired`](Self::expired) resolves
/// once per arming and the timer is disarmed afterwards.
///
/// Arming an armed timer replaces the previous deadline. Awaiting
/// [`expired`](Self::expired) on a disarmed timer never resolves, and
/// dropping that future must leave the deadline untouched so the player
/// can `select` on it in a loop.
#[allow(async_fn_in_trait)]
pub trait PacingTimer {
    /// Fire after `delay_ms`. `0` fires as soon as the timer is awaited.
    fn arm(&mut self, delay_ms: u32);

    /// Disarm without firing.
    fn cancel(&mut self);

    /// Wait for the armed deadline, then disarm.
    async fn expired(&mut self);
}

impl<T: PacingTimer + ?Sized> PacingTimer for &mut T {
    fn arm(&mut self, delay_ms: u32) {
        (**self).arm(delay_ms)
    }

    fn cancel(&mut self) {
        (**self).cancel()
    }

    async fn expired(&mut self) {
        (**self).expired().await
    }
}
