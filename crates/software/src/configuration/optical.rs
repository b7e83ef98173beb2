use super::ConfigError;
use embassy_time::Duration;
use wmidi::U7;

/// Tuning for cranks which report motion through an optical sensor watching a slotted wheel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OpticalConfig {
    /// The number of spokes (black, light-blocking bars) on the wheel. Each spoke produces two edges per revolution.
    pub spokes: u16,
    /// Crank speed in RPM at which sound begins.
    pub v_threshold: f32,
    /// Crank speed in RPM at which expression maxes out.
    pub expression_vmax: f32,
    /// The lowest expression (MIDI CC11) sent while sound is active.
    pub expression_floor: U7,
    /// Ceiling for the velocity estimate, in RPM. Protects against absurd readings from sensor glitches.
    pub max_rpm: f32,
    /// Minimum period between crank samples. Edges arriving sooner than this after the previous one are treated as
    /// sensor bounce and ignored.
    pub sample_interval: Duration,
    /// Upper bound on how long a single sample waits for an edge before counting as a missed cycle.
    pub max_wait: Duration,
    /// Multiplier applied to the velocity for every missed cycle, in `[0.0, 1.0]`.
    ///
    /// Smaller values silence the instrument more quickly once the crank stops; `0.0` cuts sound after one missed cycle.
    pub decay_factor: f32,
    /// Sound lasts at least this long once started.
    pub min_sound: Duration,
    /// Buzzing lasts at least this long once started. Increase if buzzing feels jittery, decrease if it feels sluggish.
    pub min_buzz: Duration,
}

impl Default for OpticalConfig {
    fn default() -> Self {
        Self {
            spokes: 80,
            v_threshold: 5.5,
            expression_vmax: 120.0,
            expression_floor: U7::from_u8_lossy(90),
            max_rpm: 300.0,
            sample_interval: Duration::from_micros(100),
            max_wait: Duration::from_micros(40_000),
            decay_factor: 0.0,
            min_sound: Duration::from_millis(50),
            min_buzz: Duration::from_millis(100),
        }
    }
}

impl OpticalConfig {
    /// Number of edges the sensor reports for one full turn of the crank.
    pub fn edges_per_revolution(&self) -> u32 {
        u32::from(self.spokes) * 2
    }

    /// Checks the configuration for values the optical estimator cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spokes == 0 {
            return Err(ConfigError::NoSpokes);
        }
        if !(0.0..=1.0).contains(&self.decay_factor) {
            return Err(ConfigError::DecayFactorOutOfRange(self.decay_factor));
        }
        if self.expression_vmax <= self.v_threshold {
            return Err(ConfigError::EmptyExpressionRange);
        }
        Ok(())
    }
}
