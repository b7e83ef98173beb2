//! This crate contains architecture-agnostic logic for Crank Gurdy, firmware for a crank-driven
//! [hurdy-gurdy](https://en.wikipedia.org/wiki/Hurdy-gurdy) emulator. Turning the crank produces a velocity signal which
//! decides when the instrument's "strings" sound and how loudly; the strings themselves are voiced by an external sound
//! module reached over [MIDI](https://midi.org/midi-1-0) or an audio-trigger board.
//!
//! The pieces, leaf first:
//! - [`voice::StringVoice`] tracks one string's note, volume, mute and playing state and issues commands through a
//!   [`voice::SoundTransport`].
//! - [`mute`] holds the enumerated mute modes of the melody and drone/trompette pairs and applies them to a [`Gurdy`].
//! - [`crank`] provides the two interchangeable [`crank::VelocityEstimator`]s: optical edge timing and geared-motor
//!   voltage integration.
//! - [`expression::ExpressionMapper`] turns crank effort into a MIDI expression value.
//! - [`dispatch::SoundDispatcher`] runs once per control cycle and starts, updates and stops the voices.

#![deny(missing_docs)]
#![no_std]

#[cfg(test)]
extern crate std;

#[macro_use]
mod fmt;

pub mod configuration;
pub mod crank;
pub mod dispatch;
pub mod display;
pub mod expression;
pub mod mute;
pub mod voice;

mod gurdy;
pub use gurdy::*;

#[cfg(test)]
pub(crate) mod testing;

/// Elapsed-time type used throughout the crate.
///
/// Re-exported so that callers built against a different `embassy-time` release can convert into it.
pub use embassy_time::Duration;
