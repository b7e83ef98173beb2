//! Pushbutton inputs.
//!
//! Each button has its own task which only reports presses; the control loop applies them between cycles so that all
//! instrument state is mutated in one place.

use defmt::*;
use embassy_stm32::exti::ExtiInput;
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use embassy_time::{Duration, Timer};

/// Presses are ignored for this long after one is reported.
const DEBOUNCE: Duration = Duration::from_millis(20);

/// The performer's buttons.
#[derive(Clone, Copy, Format)]
pub enum Button {
    /// Steps through the melody mute modes.
    MelodyMute,
    /// Steps through the drone/trompette mute modes.
    DroneMute,
    /// Mutes or unmutes the drone alone.
    DroneToggle,
    /// Mutes or unmutes the trompette (and buzz) alone.
    TrompetteToggle,
    /// Steps through the screen types.
    ScreenType,
}

/// Presses not yet applied by the control loop.
pub static PRESSES: Channel<CriticalSectionRawMutex, Button, 8> = Channel::new();

/// Handles presses of one button.
#[embassy_executor::task(pool_size = 5)]
pub async fn button_task(mut input: ExtiInput<'static>, button: Button) -> ! {
    loop {
        input.wait_for_rising_edge().await;
        if PRESSES.try_send(button).is_err() {
            warn!("Dropped {} press; too many pending", button);
        }
        Timer::after(DEBOUNCE).await;
    }
}
