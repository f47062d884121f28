//! buzzer-hw-interface
//!
//! Button → MelodyPlayer → PWM buzzer firmware for the Raspberry Pi Pico 2.
//!
//! 1. A demo melody is loaded into the shared player at boot.
//! 2. Pressing the button (rising edge on GP22) stages start, pause or
//!    resume, depending on the current state.
//! 3. The melody task plays one step per pacing-timer expiry, reprogramming
//!    PWM slice 0 for every note and disabling it for rests.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::block::ImageDef;
use embassy_rp::clocks::clk_sys_freq;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::pwm::{self, Pwm};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use buzzer_driver::task::{button_task, melody_task};
use buzzer_driver::{pwm_timing, MelodyPlayer, PlayerConfig, ToneOutput};

// ---------------------------------------------------------------------------
// Boot block
// ---------------------------------------------------------------------------

/// Tell the RP2350 Boot ROM about our application.
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = embassy_rp::block::ImageDef::secure_exe();

// ---------------------------------------------------------------------------
// Static storage
// ---------------------------------------------------------------------------

type Player = MelodyPlayer<CriticalSectionRawMutex>;

/// Shared melody player: written by `main` and the button task, driven by
/// the melody task.
static PLAYER: StaticCell<Player> = StaticCell::new();

/// First bars of "Ode to Joy" at the default beat.
const DEMO_MELODY: &str = "music 32963:4,32963:4,34923:4,39200:4,\
                           39200:4,34923:4,32963:4,29366:4,\
                           26163:4,26163:4,29366:4,32963:4,\
                           32963:c,29366:8,29366:2";

// ---------------------------------------------------------------------------
// PWM buzzer
// ---------------------------------------------------------------------------

/// Piezo buzzer on one PWM channel.
///
/// The RP2350 PWM counter is 16 bits wide with an integer clock divider of
/// up to 255, so at 150 MHz the lowest reachable note is about 9 Hz. Longer
/// periods are clamped.
struct PwmBuzzer {
    pwm: Pwm<'static>,
    config: pwm::Config,
}

impl PwmBuzzer {
    fn new(pwm: Pwm<'static>) -> Self {
        let mut config = pwm::Config::default();
        config.enable = false;
        Self { pwm, config }
    }
}

impl ToneOutput for PwmBuzzer {
    type Error = core::convert::Infallible;

    async fn set_period_and_duty(
        &mut self,
        period_ns: u64,
        duty_percent: u8,
    ) -> Result<(), Self::Error> {
        let timing = pwm_timing(period_ns, duty_percent, clk_sys_freq());

        self.config.divider = timing.divider.into();
        self.config.top = timing.top;
        self.config.compare_a = timing.compare;
        self.pwm.set_config(&self.config);

        debug!("PWM: period={}ns {}", period_ns, timing);
        Ok(())
    }

    async fn enable(&mut self) -> Result<(), Self::Error> {
        self.config.enable = true;
        self.pwm.set_config(&self.config);
        Ok(())
    }

    async fn disable(&mut self) -> Result<(), Self::Error> {
        self.config.enable = false;
        self.pwm.set_config(&self.config);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Thin wrapper that monomorphises the generic `melody_task` so it can be
/// spawned as a concrete Embassy task.
#[embassy_executor::task]
async fn melody(player: &'static Player, buzzer: PwmBuzzer) {
    let _buzzer = melody_task(player, buzzer).await;
    warn!("Melody task exited");
}

/// Thin wrapper around the generic `button_task`.
#[embassy_executor::task]
async fn button(player: &'static Player, pin: Input<'static>) {
    button_task(player, pin).await;
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("buzzer-hw-interface starting");

    // —— Pin assignments ————————————————————————————————————————————————————
    // BUZZER → GP0   (p.PIN_0)   PWM slice 0, channel A
    // BUTTON → GP22  (p.PIN_22)  active-high, pull-down enabled
    // ———————————————————————————————————————————————————————————————————————

    let pwm = Pwm::new_output_a(p.PWM_SLICE0, p.PIN_0, pwm::Config::default());
    let buzzer = PwmBuzzer::new(pwm);

    let button_pin = Input::new(p.PIN_22, Pull::Down);

    let player = PLAYER.init(MelodyPlayer::new(PlayerConfig::default()));

    // —— Demo melody —————————————————————————————————————————————————————————

    match player.write(DEMO_MELODY) {
        Ok(_) => info!("Demo melody loaded ({} steps)", player.snapshot().step_count),
        Err(e) => error!("Failed to load demo melody: {}", e),
    }

    // —— Spawn tasks ————————————————————————————————————————————————————————

    spawner.spawn(unwrap!(melody(player, buzzer)));
    spawner.spawn(unwrap!(button(player, button_pin)));

    info!("All tasks spawned");
}
