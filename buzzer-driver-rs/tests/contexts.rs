//! Host tests that drive a player from several threads at once.
//!
//! One thread runs the deferred task (`MelodyPlayer::run`); the test thread
//! plays the roles of the button interrupt, the timer interrupt and the
//! configuration writer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use buzzer_driver::{
    button_monitor, BuzzerError, MelodyPlayer, PacingTimer, PendingRequest, PlaybackState,
    PlayerConfig, ReconfigurePolicy, ToneOutput,
};
use embassy_futures::block_on;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_hal::digital::{ErrorKind, ErrorType};
use embedded_hal_async::digital::Wait;

type Player = MelodyPlayer<CriticalSectionRawMutex>;

// ── Test doubles ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Call {
    Period(u64, u8),
    Enable,
    Disable,
}

#[derive(Debug)]
struct PwmFault;

#[derive(Clone, Default)]
struct SharedOutput {
    calls: Arc<Mutex<Vec<Call>>>,
    fail_enable: Arc<AtomicBool>,
}

impl SharedOutput {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn periods(&self) -> Vec<u64> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Period(p, _) => Some(p),
                _ => None,
            })
            .collect()
    }
}

impl ToneOutput for SharedOutput {
    type Error = PwmFault;

    async fn set_period_and_duty(&mut self, period_ns: u64, duty: u8) -> Result<(), PwmFault> {
        self.calls.lock().unwrap().push(Call::Period(period_ns, duty));
        Ok(())
    }

    async fn enable(&mut self) -> Result<(), PwmFault> {
        if self.fail_enable.load(Ordering::SeqCst) {
            return Err(PwmFault);
        }
        self.calls.lock().unwrap().push(Call::Enable);
        Ok(())
    }

    async fn disable(&mut self) -> Result<(), PwmFault> {
        self.calls.lock().unwrap().push(Call::Disable);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerEvent {
    Arm(u32),
    Cancel,
}

/// Records arm/cancel requests. Expiry is raised by the test thread through
/// `MelodyPlayer::timer_expired`, the way a timer interrupt would.
#[derive(Clone, Default)]
struct ManualTimer {
    events: Arc<Mutex<Vec<TimerEvent>>>,
}

impl ManualTimer {
    fn events(&self) -> Vec<TimerEvent> {
        self.events.lock().unwrap().clone()
    }

    fn last(&self) -> Option<TimerEvent> {
        self.events.lock().unwrap().last().copied()
    }

    fn arm_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, TimerEvent::Arm(_)))
            .count()
    }
}

impl PacingTimer for ManualTimer {
    fn arm(&mut self, delay_ms: u32) {
        self.events.lock().unwrap().push(TimerEvent::Arm(delay_ms));
    }

    fn cancel(&mut self) {
        self.events.lock().unwrap().push(TimerEvent::Cancel);
    }

    async fn expired(&mut self) {
        core::future::pending::<()>().await
    }
}

#[derive(Debug)]
struct PinFault;

impl embedded_hal::digital::Error for PinFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Yields the scripted number of rising edges, then fails.
struct ScriptedPin {
    edges: usize,
}

impl ErrorType for ScriptedPin {
    type Error = PinFault;
}

impl Wait for ScriptedPin {
    async fn wait_for_high(&mut self) -> Result<(), PinFault> {
        Ok(())
    }

    async fn wait_for_low(&mut self) -> Result<(), PinFault> {
        Ok(())
    }

    async fn wait_for_rising_edge(&mut self) -> Result<(), PinFault> {
        if self.edges == 0 {
            return Err(PinFault);
        }
        self.edges -= 1;
        Ok(())
    }

    async fn wait_for_falling_edge(&mut self) -> Result<(), PinFault> {
        Ok(())
    }

    async fn wait_for_any_edge(&mut self) -> Result<(), PinFault> {
        self.wait_for_rising_edge().await
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(1));
    }
}

// ── Scenarios ────────────────────────────────────────────────────────────

#[test]
fn play_pause_resume_to_the_end() {
    let player = Player::new(PlayerConfig::default());
    let output = SharedOutput::default();
    let timer = ManualTimer::default();

    player.write("music 44000:04,88000:08,66000:04\n").unwrap();

    thread::scope(|s| {
        let task = {
            let (output, timer) = (output.clone(), timer.clone());
            let player = &player;
            s.spawn(move || block_on(player.run(output, timer)))
        };

        wait_until("reconfigure", || timer.last() == Some(TimerEvent::Cancel));

        // Start.
        assert!(player.button_edge(0));
        wait_until("start", || timer.last() == Some(TimerEvent::Arm(0)));
        assert_eq!(player.snapshot().cursor, 0);

        // First note.
        player.timer_expired();
        wait_until("first note", || timer.last() == Some(TimerEvent::Arm(500)));
        assert_eq!(player.snapshot().cursor, 1);

        // Pause.
        assert!(player.button_edge(100));
        wait_until("pause", || timer.last() == Some(TimerEvent::Cancel));
        let snap = player.snapshot();
        assert_eq!(snap.state, PlaybackState::Paused);
        assert_eq!(snap.cursor, 1);
        assert_eq!(output.calls().last(), Some(&Call::Disable));

        // Resume continues with the second step.
        assert!(player.button_edge(200));
        wait_until("resume", || timer.last() == Some(TimerEvent::Arm(0)));
        player.timer_expired();
        wait_until("second note", || timer.last() == Some(TimerEvent::Arm(250)));
        player.timer_expired();
        wait_until("third note", || timer.last() == Some(TimerEvent::Arm(500)) && timer.arm_count() == 5);

        // Sentinel.
        player.timer_expired();
        wait_until("end of melody", || {
            player.snapshot().state == PlaybackState::Stopped
                && timer.last() == Some(TimerEvent::Cancel)
        });

        player.shutdown();
        let returned = task.join().unwrap();
        assert_eq!(returned.calls().last(), Some(&Call::Disable));
    });

    assert_eq!(output.periods(), vec![2_272_727, 1_136_364, 1_515_152]);
    assert!(output
        .calls()
        .iter()
        .all(|c| !matches!(c, Call::Period(_, duty) if *duty != 70)));
}

#[test]
fn reload_while_playing_restarts_from_new_melody() {
    let player = Player::new(PlayerConfig::default());
    let output = SharedOutput::default();
    let timer = ManualTimer::default();

    player.write("music 44000:04,44000:04,44000:04").unwrap();

    thread::scope(|s| {
        let task = {
            let (output, timer) = (output.clone(), timer.clone());
            let player = &player;
            s.spawn(move || block_on(player.run(output, timer)))
        };

        player.button_edge(0);
        wait_until("start", || timer.last() == Some(TimerEvent::Arm(0)));
        player.timer_expired();
        wait_until("first note", || timer.last() == Some(TimerEvent::Arm(500)));

        assert_eq!(player.write("music 88000:08,66000:08"), Ok(23));
        // Stopped synchronously, before the deferred task has run.
        let snap = player.snapshot();
        assert_eq!(snap.state, PlaybackState::Stopped);
        assert_eq!(snap.step_count, 2);
        wait_until("silenced", || timer.last() == Some(TimerEvent::Cancel));

        // The old timer firing late plays nothing.
        player.timer_expired();

        player.button_edge(100);
        wait_until("restart", || timer.last() == Some(TimerEvent::Arm(0)));
        assert_eq!(player.snapshot().cursor, 0);
        player.timer_expired();
        wait_until("new first note", || timer.last() == Some(TimerEvent::Arm(250)));

        player.shutdown();
        task.join().unwrap();
    });

    assert_eq!(output.periods(), vec![2_272_727, 1_136_364]);
}

#[test]
fn beat_change_applies_to_next_step() {
    let player = Player::new(PlayerConfig::default());
    let timer = ManualTimer::default();

    player.write("music 44000:04,44000:04").unwrap();

    thread::scope(|s| {
        let task = {
            let timer = timer.clone();
            let player = &player;
            s.spawn(move || block_on(player.run(SharedOutput::default(), timer)))
        };

        player.button_edge(0);
        wait_until("start", || timer.last() == Some(TimerEvent::Arm(0)));
        player.timer_expired();
        wait_until("first note", || timer.last() == Some(TimerEvent::Arm(500)));

        assert_eq!(player.write("beat 60"), Ok(7));
        assert_eq!(player.read().as_str(), "beat=60\n");
        assert_eq!(player.snapshot().state, PlaybackState::Playing);

        player.timer_expired();
        wait_until("second note", || timer.last() == Some(TimerEvent::Arm(1000)));

        player.shutdown();
        task.join().unwrap();
    });
}

#[test]
fn actuator_failure_stops_playback() {
    let player = Player::new(PlayerConfig::default());
    let output = SharedOutput::default();
    let timer = ManualTimer::default();

    player.write("music 44000:04,44000:04").unwrap();

    thread::scope(|s| {
        let task = {
            let (output, timer) = (output.clone(), timer.clone());
            let player = &player;
            s.spawn(move || block_on(player.run(output, timer)))
        };

        player.button_edge(0);
        wait_until("start", || timer.last() == Some(TimerEvent::Arm(0)));

        output.fail_enable.store(true, Ordering::SeqCst);
        player.timer_expired();
        wait_until("abort", || timer.last() == Some(TimerEvent::Cancel));
        assert_eq!(player.snapshot().state, PlaybackState::Stopped);

        // The player is still usable once the actuator recovers.
        output.fail_enable.store(false, Ordering::SeqCst);
        player.button_edge(100);
        wait_until("restart", || timer.last() == Some(TimerEvent::Arm(0)));
        assert_eq!(player.snapshot().cursor, 0);

        player.shutdown();
        task.join().unwrap();
    });
}

#[test]
fn rejected_writes_leave_everything_untouched() {
    let config = PlayerConfig {
        reconfigure_policy: ReconfigurePolicy::RejectWhilePlaying,
        ..PlayerConfig::default()
    };
    let player = Player::new(config);
    let timer = ManualTimer::default();

    player.write("music 44000:04,44000:04").unwrap();

    thread::scope(|s| {
        let task = {
            let timer = timer.clone();
            let player = &player;
            s.spawn(move || block_on(player.run(SharedOutput::default(), timer)))
        };

        player.button_edge(0);
        wait_until("start", || timer.last() == Some(TimerEvent::Arm(0)));
        let before = player.snapshot();

        assert_eq!(player.write("music 88000:08"), Err(BuzzerError::Busy));
        assert_eq!(player.write("tempo 90"), Err(BuzzerError::InvalidArgument));
        assert_eq!(player.write("beat -5"), Err(BuzzerError::InvalidArgument));
        assert_eq!(player.snapshot(), before);
        assert_eq!(player.read().as_str(), "beat=120\n");

        player.shutdown();
        task.join().unwrap();
    });
}

#[test]
fn concurrent_writers_and_edges() {
    let player = Player::new(PlayerConfig {
        debounce_ticks: 0,
        ..PlayerConfig::default()
    });
    let timer = ManualTimer::default();

    thread::scope(|s| {
        let task = {
            let timer = timer.clone();
            let player = &player;
            s.spawn(move || block_on(player.run(SharedOutput::default(), timer)))
        };

        let writers: Vec<_> = (0..4)
            .map(|n| {
                let player = &player;
                s.spawn(move || {
                    for i in 0..50u64 {
                        if i % 10 == 0 {
                            player.write("music 44000:10,0:10,52325:10").unwrap();
                        }
                        player.write("beat 90").unwrap();
                        player.button_edge(n * 1000 + i);
                        player.timer_expired();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        player.shutdown();
        task.join().unwrap();
    });

    let snap = player.snapshot();
    assert_eq!(snap.beat, 90);
    assert_eq!(snap.step_count, 3);
    assert!(snap.cursor <= snap.step_count);
}

// ── Button monitor ───────────────────────────────────────────────────────

#[test]
fn button_monitor_debounces_edges() {
    let player = Player::new(PlayerConfig::default());
    let mut ticks = [0u64, 5, 19].into_iter();

    let result = block_on(button_monitor(ScriptedPin { edges: 3 }, &player, || {
        ticks.next().unwrap_or(0)
    }));

    // The pin fails after its scripted edges; only the first edge counted.
    assert!(result.is_err());
    assert_eq!(player.snapshot().pending, PendingRequest::Start);
}

#[test]
fn button_monitor_returns_after_shutdown() {
    let player = Player::new(PlayerConfig::default());
    player.shutdown();

    let result = block_on(button_monitor(ScriptedPin { edges: 1 }, &player, || 0));

    assert!(result.is_ok());
    assert_eq!(player.snapshot().pending, PendingRequest::None);
}
