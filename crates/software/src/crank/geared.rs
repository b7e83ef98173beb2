//! Velocity estimation for cranks driving a geared motor used as a generator.
//!
//! The motor's voltage arrives as a staircase of pulses rather than a smooth curve, so motion is integrated into a
//! "spin" accumulator: samples above a small voltage threshold add a large weight, samples below it subtract a much
//! smaller decay. Sound starts and stops at two different spin levels so that hovering near one boundary does not
//! flicker the instrument on and off.

use super::{CrankPhase, VelocityEstimator};
use crate::{configuration::GearedConfig, expression::ExpressionMapper};

/// One reading from the geared crank's sensors, on the 10-bit scale (0 is 0 V, 1023 is 3.3 V).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GearedSample {
    /// Crank voltage, already averaged over the configured number of ADC reads.
    pub voltage: u16,
    /// Buzz knob voltage. The buzz triggers whenever the crank voltage exceeds it.
    pub buzz_knob: u16,
}

/// [`VelocityEstimator`] for geared-motor cranks. Effort is the spin accumulator.
#[derive(Clone, Debug, PartialEq)]
pub struct GearedCrank {
    config: GearedConfig,
    mapper: ExpressionMapper,
    spin: u16,
    /// Buzz smoothing counter; the buzz sounds while it is positive.
    buzz: u16,
    sounding: bool,
    /// Whether the latest sample showed motion.
    moving: bool,
}

impl GearedCrank {
    /// Constructs a [`GearedCrank`] at rest.
    pub fn new(config: GearedConfig) -> Self {
        Self {
            mapper: ExpressionMapper::from(&config),
            config,
            spin: 0,
            buzz: 0,
            sounding: false,
            moving: false,
        }
    }

    /// Getter.
    pub fn config(&self) -> &GearedConfig {
        &self.config
    }

    /// Current value of the spin accumulator.
    pub fn spin(&self) -> u16 {
        self.spin
    }

    /// Current value of the buzz smoothing counter.
    pub fn buzz_counter(&self) -> u16 {
        self.buzz
    }

    fn update_spin(&mut self, voltage: u16) {
        self.moving = voltage > self.config.voltage_threshold;
        self.spin = if self.moving {
            self.spin
                .saturating_add(self.config.spin_weight)
                .min(self.config.max_spin)
        } else {
            self.spin.saturating_sub(self.config.spin_decay)
        };
    }

    fn update_sound(&mut self) {
        if !self.sounding && self.spin >= self.config.spin_threshold {
            debug!("Crank started sounding at spin {}", self.spin);
            self.sounding = true;
        } else if self.sounding && self.spin < self.config.spin_stop_threshold {
            debug!("Crank stopped sounding at spin {}", self.spin);
            self.sounding = false;
        }
    }

    fn update_buzz(&mut self, sample: &GearedSample) {
        self.buzz = if sample.voltage > sample.buzz_knob {
            self.config.buzz_smoothing
        } else {
            self.buzz.saturating_sub(self.config.buzz_decay)
        };
    }
}

impl VelocityEstimator for GearedCrank {
    type Sample = GearedSample;

    fn sample(&mut self, sample: GearedSample) -> f32 {
        self.update_spin(sample.voltage);
        self.update_sound();
        self.update_buzz(&sample);
        trace!("Geared crank spin: {}, buzz: {}", self.spin, self.buzz);
        self.effort()
    }

    fn effort(&self) -> f32 {
        f32::from(self.spin)
    }

    fn is_active(&self) -> bool {
        self.sounding
    }

    fn is_buzzing(&self) -> bool {
        self.buzz > 0
    }

    fn phase(&self) -> CrankPhase {
        match (self.moving, self.sounding) {
            (true, true) => CrankPhase::Sustain,
            (true, false) => CrankPhase::Rising,
            (false, sounding) if sounding || self.spin > 0 => CrankPhase::Decaying,
            (false, _) => CrankPhase::Idle,
        }
    }

    fn mapper(&self) -> &ExpressionMapper {
        &self.mapper
    }
}
