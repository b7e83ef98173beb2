use super::ConfigError;
use embassy_time::Duration;
use wmidi::U7;

/// Tuning for cranks built around a geared motor used as a generator.
///
/// Voltages are on the 10-bit scale the sensor layer reports: 0 is 0 V and 1023 is the ADC reference (3.3 V).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GearedConfig {
    /// Number of raw ADC reads averaged into one voltage sample, rejecting electrical noise.
    pub spin_samples: u16,
    /// Voltage above which the crank counts as moving. Set as low as possible without registering phantom cranking.
    pub voltage_threshold: u16,
    /// Cap on the spin accumulator.
    pub max_spin: u16,
    /// Spin added for every sample showing motion.
    pub spin_weight: u16,
    /// Spin removed for every sample without motion. Keep well below `spin_weight`: the motor induces voltage in
    /// steps, and the asymmetry smooths over the gaps between them.
    pub spin_decay: u16,
    /// Spin at which sound starts.
    pub spin_threshold: u16,
    /// Spin below which sound stops. Significantly lower than `spin_threshold`.
    pub spin_stop_threshold: u16,
    /// Value the buzz counter is reset to whenever the crank voltage exceeds the buzz knob's voltage.
    pub buzz_smoothing: u16,
    /// Amount subtracted from the buzz counter on every sample without a buzz trigger.
    pub buzz_decay: u16,
    /// The lowest expression (MIDI CC11) sent while sound is active.
    pub expression_floor: U7,
    /// Period of the control loop.
    pub sample_interval: Duration,
}

impl Default for GearedConfig {
    fn default() -> Self {
        Self {
            spin_samples: 700,
            voltage_threshold: 5,
            max_spin: 7600,
            spin_weight: 2500,
            spin_decay: 200,
            spin_threshold: 5001,
            spin_stop_threshold: 1000,
            buzz_smoothing: 250,
            buzz_decay: 1,
            expression_floor: U7::from_u8_lossy(90),
            sample_interval: Duration::from_micros(500),
        }
    }
}

impl GearedConfig {
    /// Checks the configuration for values the geared estimator cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spin_stop_threshold >= self.spin_threshold {
            return Err(ConfigError::InvertedHysteresis {
                start: self.spin_threshold,
                stop: self.spin_stop_threshold,
            });
        }
        if self.spin_threshold > self.max_spin {
            return Err(ConfigError::UnreachableThreshold {
                start: self.spin_threshold,
                max: self.max_spin,
            });
        }
        if self.spin_threshold == self.max_spin {
            return Err(ConfigError::EmptyExpressionRange);
        }
        if self.spin_decay >= self.spin_weight {
            return Err(ConfigError::DecayNotBelowWeight {
                weight: self.spin_weight,
                decay: self.spin_decay,
            });
        }
        Ok(())
    }
}
