//! The buzz indicator LED.

use embassy_stm32::gpio::Output;
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};

/// Latest state the buzz LED should show.
pub static BUZZ_LED: Signal<CriticalSectionRawMutex, bool> = Signal::new();

/// Lights the LED while the buzz sounds.
#[embassy_executor::task]
pub async fn buzz_led_task(mut led: Output<'static>) -> ! {
    loop {
        if BUZZ_LED.wait().await {
            led.set_high();
        } else {
            led.set_low();
        }
    }
}
