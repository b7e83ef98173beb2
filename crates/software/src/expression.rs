//! Conversions from sensor-level quantities into MIDI controller values.

use crate::configuration::{GearedConfig, OpticalConfig};
use wmidi::U7;

const CC_MAX: f32 = 127.0;

/// Maps crank effort onto MIDI expression (CC11).
///
/// The mapping is linear between the effort at which sound starts (which maps to `floor`) and the effort at which
/// expression peaks (which maps to 127). Both crank strategies build one from their configuration, so consumers never
/// need to know which sensor is fitted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExpressionMapper {
    start: f32,
    max: f32,
    floor: U7,
}

impl ExpressionMapper {
    /// Constructs an [`ExpressionMapper`].
    pub fn new(start: f32, max: f32, floor: U7) -> Self {
        Self { start, max, floor }
    }

    /// Returns the expression for `effort`, or `None` when the effort is too low to sound.
    pub fn map(&self, effort: f32) -> Option<U7> {
        if effort < self.start {
            return None;
        }
        let floor = f32::from(u8::from(self.floor));
        let span = self.max - self.start;
        let fraction = if span > 0.0 {
            ((effort - self.start) / span).min(1.0)
        } else {
            1.0
        };
        Some(U7::from_u8_lossy((floor + fraction * (CC_MAX - floor)) as u8))
    }
}

impl From<&OpticalConfig> for ExpressionMapper {
    fn from(config: &OpticalConfig) -> Self {
        Self::new(
            config.v_threshold,
            config.expression_vmax,
            config.expression_floor,
        )
    }
}

impl From<&GearedConfig> for ExpressionMapper {
    fn from(config: &GearedConfig) -> Self {
        Self::new(
            f32::from(config.spin_threshold),
            f32::from(config.max_spin),
            config.expression_floor,
        )
    }
}

/// A potentiometer controlling melody vibrato (MIDI CC1).
///
/// Readings are on the 10-bit sensor scale. Knobs rarely reach the full reference voltage, so the reading treated as
/// full vibrato is configurable; anything above it saturates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VibratoKnob {
    max_reading: u16,
}

impl VibratoKnob {
    /// Constructs a [`VibratoKnob`] reaching full vibrato at `max_reading`.
    pub fn new(max_reading: u16) -> Self {
        Self { max_reading }
    }

    /// Returns the vibrato for a raw knob reading.
    pub fn vibrato(&self, reading: u16) -> U7 {
        if self.max_reading == 0 {
            return U7::from_u8_lossy(0);
        }
        let scaled = u32::from(reading.min(self.max_reading)) * 127 / u32::from(self.max_reading);
        U7::from_u8_lossy(scaled as u8)
    }
}

impl Default for VibratoKnob {
    fn default() -> Self {
        Self::new(658)
    }
}
