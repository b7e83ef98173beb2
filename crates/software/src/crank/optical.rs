//! Velocity estimation for cranks fitted with an optical sensor watching a slotted wheel.
//!
//! The sensor layer waits for the next edge (for no longer than [`OpticalCrank::wait_budget`]) and reports either the
//! interval since the previous edge or that the wait timed out. An edge yields an instantaneous velocity; a timeout
//! counts as a missed cycle and decays the velocity toward zero.

use super::{CrankPhase, VelocityEstimator};
use crate::{configuration::OpticalConfig, expression::ExpressionMapper};
use embassy_time::Duration;

/// Velocities below this many RPM are treated as a stopped crank.
const STOPPED_RPM: f32 = 0.01;

/// Full-scale reading of the 10-bit knob inputs.
const KNOB_FULL_SCALE: u16 = 1023;

/// One reading from the optical sensor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OpticalSample {
    /// Time since the previous sample.
    pub elapsed: Duration,
    /// Interval since the previous edge, or `None` if the wait for an edge timed out.
    pub edge: Option<Duration>,
    /// Raw buzz knob reading, 0–1023.
    pub buzz_knob: u16,
}

/// [`VelocityEstimator`] for optical cranks. Effort is the crank speed in RPM.
#[derive(Clone, Debug, PartialEq)]
pub struct OpticalCrank {
    config: OpticalConfig,
    mapper: ExpressionMapper,
    /// Current velocity in RPM.
    velocity: f32,
    last_interval: Option<Duration>,
    /// Whether the latest sample contained an edge.
    fresh: bool,
    /// How long sound has been active, if it is.
    sounding_for: Option<Duration>,
    /// How long the buzz has been active, if it is.
    buzzing_for: Option<Duration>,
}

impl OpticalCrank {
    /// Constructs an [`OpticalCrank`] at rest.
    pub fn new(config: OpticalConfig) -> Self {
        Self {
            mapper: ExpressionMapper::from(&config),
            config,
            velocity: 0.0,
            last_interval: None,
            fresh: false,
            sounding_for: None,
            buzzing_for: None,
        }
    }

    /// Getter.
    pub fn config(&self) -> &OpticalConfig {
        &self.config
    }

    /// How long the sensor layer should wait for the next edge before reporting a missed cycle.
    ///
    /// Twice the last edge interval, so a crank slowing down is still followed, but never shorter than the sample
    /// interval nor longer than the configured maximum wait.
    pub fn wait_budget(&self) -> Duration {
        self.last_interval
            .map_or(self.config.max_wait, |interval| interval * 2)
            .min(self.config.max_wait)
            .max(self.config.sample_interval)
    }

    /// The crank speed at which buzzing starts for a given knob reading: the knob sweeps from the sound threshold
    /// (fully counter-clockwise) to the speed of peak expression (fully clockwise).
    pub fn buzz_threshold(&self, buzz_knob: u16) -> f32 {
        let fraction = f32::from(buzz_knob.min(KNOB_FULL_SCALE)) / f32::from(KNOB_FULL_SCALE);
        self.config.v_threshold + fraction * (self.config.expression_vmax - self.config.v_threshold)
    }

    fn velocity_for(&self, interval: Duration) -> f32 {
        let micros = interval.as_micros();
        if micros == 0 {
            return self.config.max_rpm;
        }
        let micros_per_revolution = micros as f32 * self.config.edges_per_revolution() as f32;
        (60_000_000.0 / micros_per_revolution).min(self.config.max_rpm)
    }

    fn update_sound(&mut self, elapsed: Duration) {
        self.sounding_for = match self.sounding_for {
            None if self.velocity >= self.config.v_threshold => {
                debug!("Crank started sounding at {} RPM", self.velocity);
                Some(Duration::from_ticks(0))
            }
            None => None,
            Some(sounding_for) => {
                let sounding_for = sounding_for + elapsed;
                if self.velocity < self.config.v_threshold
                    && sounding_for >= self.config.min_sound
                {
                    debug!(
                        "Crank stopped sounding after {} us",
                        sounding_for.as_micros()
                    );
                    None
                } else {
                    Some(sounding_for)
                }
            }
        };
    }

    fn update_buzz(&mut self, elapsed: Duration, buzz_knob: u16) {
        let fast_enough = self.velocity >= self.buzz_threshold(buzz_knob);
        self.buzzing_for = match self.buzzing_for {
            _ if self.sounding_for.is_none() => None,
            None if fast_enough => Some(Duration::from_ticks(0)),
            None => None,
            Some(buzzing_for) => {
                let buzzing_for = buzzing_for + elapsed;
                if !fast_enough && buzzing_for >= self.config.min_buzz {
                    None
                } else {
                    Some(buzzing_for)
                }
            }
        };
    }
}

impl VelocityEstimator for OpticalCrank {
    type Sample = OpticalSample;

    fn sample(&mut self, sample: OpticalSample) -> f32 {
        match sample.edge {
            Some(interval) if interval < self.config.sample_interval => {
                trace!("Ignoring edge {} us after the previous one", interval.as_micros());
            }
            Some(interval) => {
                self.velocity = self.velocity_for(interval);
                self.last_interval = Some(interval);
                self.fresh = true;
            }
            None => {
                self.velocity *= self.config.decay_factor;
                if self.velocity < STOPPED_RPM {
                    self.velocity = 0.0;
                    self.last_interval = None;
                }
                self.fresh = false;
            }
        }
        self.velocity = self.velocity.clamp(0.0, self.config.max_rpm);
        trace!("Optical crank velocity: {} RPM", self.velocity);

        self.update_sound(sample.elapsed);
        self.update_buzz(sample.elapsed, sample.buzz_knob);
        self.velocity
    }

    fn effort(&self) -> f32 {
        self.velocity
    }

    fn is_active(&self) -> bool {
        self.sounding_for.is_some()
    }

    fn is_buzzing(&self) -> bool {
        self.buzzing_for.is_some()
    }

    fn phase(&self) -> CrankPhase {
        match (self.fresh, self.is_active()) {
            (true, true) => CrankPhase::Sustain,
            (true, false) => CrankPhase::Rising,
            (false, sounding) if sounding || self.velocity > 0.0 => CrankPhase::Decaying,
            (false, _) => CrankPhase::Idle,
        }
    }

    fn mapper(&self) -> &ExpressionMapper {
        &self.mapper
    }
}
