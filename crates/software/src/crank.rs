//! Crank velocity estimation.
//!
//! Two physically distinct sensors can report crank motion. Each has a [`VelocityEstimator`] which smooths raw samples
//! into an "effort" value, decides whether the instrument should sound, and tracks the buzz. The firmware picks one at
//! build time; everything downstream only sees the trait.

mod geared;
pub use geared::*;

mod optical;
pub use optical::*;

use crate::expression::ExpressionMapper;
use wmidi::U7;

/// Coarse description of what the crank is doing, shared by both estimators.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CrankPhase {
    /// No effort; silent.
    #[default]
    Idle,
    /// Motion detected but not yet enough to sound.
    Rising,
    /// Sounding, with fresh evidence of motion.
    Sustain,
    /// No fresh evidence of motion; effort is falling. Sound may continue until it drops far enough.
    Decaying,
}

/// Turns raw sensor samples into crank effort and sound decisions.
pub trait VelocityEstimator {
    /// One reading from the sensor.
    type Sample;

    /// Incorporates a sample and returns the updated effort.
    fn sample(&mut self, sample: Self::Sample) -> f32;

    /// Current effort; never negative and never above the estimator's cap.
    fn effort(&self) -> f32;

    /// Returns `true` while the instrument should sound.
    fn is_active(&self) -> bool;

    /// Returns `true` while the buzz should sound. Only meaningful while [`is_active`](Self::is_active).
    fn is_buzzing(&self) -> bool;

    /// Getter.
    fn phase(&self) -> CrankPhase;

    /// The mapping from this estimator's effort to MIDI expression.
    fn mapper(&self) -> &ExpressionMapper;

    /// Expression for the current effort; `None` when the effort is below the start threshold.
    fn expression(&self) -> Option<U7> {
        self.mapper().map(self.effort())
    }
}
