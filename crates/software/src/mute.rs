//! Mute modes for the two pairs of strings and the operations a performer's buttons trigger on them.
//!
//! Modes are small closed enums whose declaration order is the order a button press steps through them (see
//! [`CycleConfig`]). Applying a mode sets every affected voice's mute flag and re-sounds the voices whose flag changed
//! while they were playing, so a change is audible immediately rather than at the next note. Every operation ends by
//! refreshing the display.

use crate::{
    Gurdy,
    configuration::CycleConfig,
    display::Display,
    voice::{SoundTransport, StringVoice},
};
use num_derive::{FromPrimitive, ToPrimitive};

/// Which melody strings sound. There is deliberately no mode muting both: a hurdy-gurdy without melody is not much
/// of an instrument.
#[derive(Debug, Default, Copy, Clone, ToPrimitive, FromPrimitive, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MelodyMute {
    /// Both melody strings sound.
    #[default]
    BothOn,
    /// Only the high melody string sounds.
    HighOnly,
    /// Only the low melody string sounds.
    LowOnly,
}
impl CycleConfig for MelodyMute {}

impl MelodyMute {
    /// Mute flags for the high and low melody strings, in that order.
    pub fn mutes(self) -> (bool, bool) {
        match self {
            Self::BothOn => (false, false),
            Self::HighOnly => (false, true),
            Self::LowOnly => (true, false),
        }
    }
}

/// Which of the drone and trompette strings sound. The buzz always follows the trompette.
#[derive(Debug, Default, Copy, Clone, ToPrimitive, FromPrimitive, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DroneMute {
    /// Neither string sounds.
    BothOff,
    /// Only the drone sounds.
    DroneOnly,
    /// Only the trompette (and buzz) sound.
    TrompOnly,
    /// Both strings sound.
    #[default]
    BothOn,
}
impl CycleConfig for DroneMute {}

impl DroneMute {
    /// The mode matching the given mute flags.
    pub fn from_mutes(drone_muted: bool, trompette_muted: bool) -> Self {
        match (drone_muted, trompette_muted) {
            (true, true) => Self::BothOff,
            (false, true) => Self::DroneOnly,
            (true, false) => Self::TrompOnly,
            (false, false) => Self::BothOn,
        }
    }

    /// Mute flags for the drone and trompette, in that order.
    pub fn mutes(self) -> (bool, bool) {
        match self {
            Self::BothOff => (true, true),
            Self::DroneOnly => (false, true),
            Self::TrompOnly => (true, false),
            Self::BothOn => (false, false),
        }
    }

    /// Flips the drone while leaving the trompette as it is.
    pub fn toggle_drone(self) -> Self {
        match self {
            Self::BothOff => Self::DroneOnly,
            Self::DroneOnly => Self::BothOff,
            Self::TrompOnly => Self::BothOn,
            Self::BothOn => Self::TrompOnly,
        }
    }

    /// Flips the trompette while leaving the drone as it is.
    pub fn toggle_trompette(self) -> Self {
        match self {
            Self::BothOff => Self::TrompOnly,
            Self::TrompOnly => Self::BothOff,
            Self::DroneOnly => Self::BothOn,
            Self::BothOn => Self::DroneOnly,
        }
    }
}

/// Sets a voice's mute flag, re-sounding it if the flag changed while it was playing.
fn apply(voice: &mut StringVoice, mute: bool, transport: &mut impl SoundTransport) {
    if voice.mute() == mute {
        return;
    }
    voice.set_mute(mute);
    if voice.is_playing() {
        voice.resound(transport);
    }
}

impl Gurdy {
    fn apply_melody_mute(&mut self, mode: MelodyMute, transport: &mut impl SoundTransport) {
        let (high, low) = mode.mutes();
        apply(&mut self.high_melody, high, transport);
        apply(&mut self.low_melody, low, transport);
        self.melody_mute = mode;
    }

    fn apply_drone_mute(&mut self, mode: DroneMute, transport: &mut impl SoundTransport) {
        let (drone, trompette) = mode.mutes();
        apply(&mut self.drone, drone, transport);
        apply(&mut self.trompette, trompette, transport);
        apply(&mut self.buzz, trompette, transport);
        self.drone_mute = mode;
    }

    /// Steps the melody strings through both on, high only, low only, and back.
    pub fn cycle_melody_mute(
        &mut self,
        transport: &mut impl SoundTransport,
        display: &mut impl Display,
    ) {
        let mode = self.melody_mute.cycle();
        info!("Melody mute: {}", mode);
        self.apply_melody_mute(mode, transport);
        self.refresh_display(display, false);
    }

    /// Steps the drone and trompette through both off, drone only, trompette only, both on, and back.
    pub fn cycle_drone_mute(
        &mut self,
        transport: &mut impl SoundTransport,
        display: &mut impl Display,
    ) {
        let mode = self.drone_mute.cycle();
        info!("Drone/trompette mute: {}", mode);
        self.apply_drone_mute(mode, transport);
        self.refresh_display(display, false);
    }

    /// Mutes or unmutes the drone alone.
    pub fn toggle_drone_mute(
        &mut self,
        transport: &mut impl SoundTransport,
        display: &mut impl Display,
    ) {
        let mode = self.drone_mute.toggle_drone();
        info!("Drone/trompette mute: {}", mode);
        self.apply_drone_mute(mode, transport);
        self.refresh_display(display, false);
    }

    /// Mutes or unmutes the trompette (and with it the buzz) alone.
    pub fn toggle_trompette_mute(
        &mut self,
        transport: &mut impl SoundTransport,
        display: &mut impl Display,
    ) {
        let mode = self.drone_mute.toggle_trompette();
        info!("Drone/trompette mute: {}", mode);
        self.apply_drone_mute(mode, transport);
        self.refresh_display(display, false);
    }
}
