//! Produces one crank sample per control cycle from whichever sensor the build targets.

use crate::analog::Analog;
use embassy_time::Duration;

/// The library and the HAL use different `embassy-time` releases; durations cross between them as microseconds.
#[cfg(not(feature = "geared-crank"))]
fn to_lib(duration: Duration) -> crank_gurdy_lib::Duration {
    crank_gurdy_lib::Duration::from_micros(duration.as_micros())
}

fn from_lib(duration: crank_gurdy_lib::Duration) -> Duration {
    Duration::from_micros(duration.as_micros())
}

#[cfg(not(feature = "geared-crank"))]
mod optical {
    use super::*;
    use crank_gurdy_lib::crank::{OpticalCrank, OpticalSample};
    use embassy_stm32::exti::ExtiInput;
    use embassy_time::{Instant, Timer, with_timeout};

    /// An optical sensor watching the crank's slotted wheel.
    pub struct CrankSensor {
        input: ExtiInput<'static>,
        last_edge: Instant,
        last_sample: Instant,
    }

    impl CrankSensor {
        /// Constructs a [`CrankSensor`].
        pub fn new(input: ExtiInput<'static>) -> Self {
            let now = Instant::now();
            Self {
                input,
                last_edge: now,
                last_sample: now,
            }
        }

        /// Waits out the rest of the minimum sample period, then for the next edge, for no longer than the crank's
        /// wait budget. Edges during the minimum period (sensor bounce) are never seen.
        pub async fn read(&mut self, crank: &OpticalCrank, analog: &mut Analog) -> OpticalSample {
            Timer::at(self.last_sample + from_lib(crank.config().sample_interval)).await;

            let budget = from_lib(crank.wait_budget());
            let edge = match with_timeout(budget, self.input.wait_for_any_edge()).await {
                Ok(()) => {
                    let now = Instant::now();
                    let interval = now - self.last_edge;
                    self.last_edge = now;
                    Some(to_lib(interval))
                }
                Err(_) => None,
            };

            let now = Instant::now();
            let elapsed = now - self.last_sample;
            self.last_sample = now;

            OpticalSample {
                elapsed: to_lib(elapsed),
                edge,
                buzz_knob: analog.buzz_knob(),
            }
        }
    }
}
#[cfg(not(feature = "geared-crank"))]
pub use optical::CrankSensor;

#[cfg(feature = "geared-crank")]
mod geared {
    use super::*;
    use crank_gurdy_lib::{configuration::GearedConfig, crank::GearedSample};
    use embassy_time::Ticker;

    /// A geared motor whose output voltage is read through the ADC.
    pub struct CrankSensor {
        ticker: Ticker,
        samples: u16,
    }

    impl CrankSensor {
        /// Constructs a [`CrankSensor`] sampling at the configured rate.
        pub fn new(config: &GearedConfig) -> Self {
            Self {
                ticker: Ticker::every(from_lib(config.sample_interval)),
                samples: config.spin_samples,
            }
        }

        /// Waits for the next sample period, then reads the oversampled crank voltage.
        pub async fn read(&mut self, analog: &mut Analog) -> GearedSample {
            self.ticker.next().await;
            GearedSample {
                voltage: analog.crank_voltage(self.samples),
                buzz_knob: analog.buzz_knob(),
            }
        }
    }
}
#[cfg(feature = "geared-crank")]
pub use geared::CrankSensor;
