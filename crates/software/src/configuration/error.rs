use core::fmt;

/// Reasons a crank configuration cannot drive the instrument sensibly.
///
/// Configuration is checked once at startup; nothing on the control path returns errors.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// The optical wheel must have at least one spoke to produce edges.
    NoSpokes,
    /// The optical decay factor must lie in `[0.0, 1.0]`.
    DecayFactorOutOfRange(f32),
    /// The level at which sound starts must not lie below the level at which expression peaks.
    EmptyExpressionRange,
    /// Sound must stop at a materially lower level than the one it starts at.
    InvertedHysteresis {
        /// Level at which sound starts.
        start: u16,
        /// Level below which sound stops.
        stop: u16,
    },
    /// The geared crank can never reach its start threshold because the cap is lower.
    UnreachableThreshold {
        /// Level at which sound starts.
        start: u16,
        /// Maximum level the accumulator is allowed to reach.
        max: u16,
    },
    /// Spin must be added faster than it decays or the accumulator cannot smooth the motor's pulses.
    DecayNotBelowWeight {
        /// Amount added per sample showing motion.
        weight: u16,
        /// Amount removed per sample without motion.
        decay: u16,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSpokes => write!(f, "optical crank wheel has no spokes"),
            Self::DecayFactorOutOfRange(factor) => {
                write!(f, "decay factor {factor} is outside 0.0..=1.0")
            }
            Self::EmptyExpressionRange => {
                write!(f, "expression maximum is not above the start threshold")
            }
            Self::InvertedHysteresis { start, stop } => write!(
                f,
                "stop threshold {stop} is not below start threshold {start}"
            ),
            Self::UnreachableThreshold { start, max } => {
                write!(f, "start threshold {start} exceeds maximum spin {max}")
            }
            Self::DecayNotBelowWeight { weight, decay } => {
                write!(f, "spin decay {decay} is not below spin weight {weight}")
            }
        }
    }
}
