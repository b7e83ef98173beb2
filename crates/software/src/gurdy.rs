//! Provides [`Gurdy`], the explicitly owned state of the whole instrument.

use crate::{
    configuration::{CycleConfig, GurdyConfig, ScreenType},
    display::{Display, IdleStatus},
    mute::{DroneMute, MelodyMute},
    voice::{StringVoice, offset_note},
};
use wmidi::{Note, U7};

/// Every voice of the instrument along with the modes the performer has selected.
///
/// The dispatcher and the mute operations take this by mutable reference; nothing about the instrument lives in
/// module-level state.
#[derive(Clone, Debug, PartialEq)]
pub struct Gurdy {
    /// The lead melody string.
    pub high_melody: StringVoice,
    /// The second melody string.
    pub low_melody: StringVoice,
    /// The drone string.
    pub drone: StringVoice,
    /// The trompette string.
    pub trompette: StringVoice,
    /// The buzz layered over the trompette. Its mute flag always mirrors the trompette's.
    pub buzz: StringVoice,
    pub(crate) melody_mute: MelodyMute,
    pub(crate) drone_mute: DroneMute,
    screen_type: ScreenType,
    melody_vibrato: U7,
    transpose: i8,
    capo: i8,
    offset: i8,
}

impl Gurdy {
    /// Constructs a [`Gurdy`] with every voice silent and unmuted.
    pub fn new(config: &GurdyConfig) -> Self {
        Self {
            high_melody: StringVoice::new(&config.high_melody),
            low_melody: StringVoice::new(&config.low_melody),
            drone: StringVoice::new(&config.drone),
            trompette: StringVoice::new(&config.trompette),
            buzz: StringVoice::new(&config.buzz),
            melody_mute: MelodyMute::default(),
            drone_mute: DroneMute::default(),
            screen_type: ScreenType::default(),
            melody_vibrato: config.melody_vibrato,
            transpose: 0,
            capo: 0,
            offset: 0,
        }
    }

    /// Returns the current melody mute mode.
    pub fn melody_mute(&self) -> MelodyMute {
        self.melody_mute
    }

    /// Returns the current drone/trompette mute mode.
    pub fn drone_mute(&self) -> DroneMute {
        self.drone_mute
    }

    /// Getter.
    pub fn screen_type(&self) -> ScreenType {
        self.screen_type
    }

    /// Modulation melody notes are started with.
    pub fn melody_vibrato(&self) -> U7 {
        self.melody_vibrato
    }

    /// Getter.
    pub fn transpose(&self) -> i8 {
        self.transpose
    }

    /// Transposes every string by `semitones`. Takes effect on the next note.
    pub fn set_transpose(&mut self, semitones: i8) {
        self.transpose = semitones;
    }

    /// Getter.
    pub fn capo(&self) -> i8 {
        self.capo
    }

    /// Raises the drone strings (drone, trompette and buzz) by `semitones`. Takes effect on the next note.
    pub fn set_capo(&mut self, semitones: i8) {
        self.capo = semitones;
    }

    /// Semitones the keybox raised the melody by when it was last dispatched.
    pub fn offset(&self) -> i8 {
        self.offset
    }

    pub(crate) fn set_offset(&mut self, offset: i8) {
        self.offset = offset;
    }

    /// Offset melody strings are sounded at: transposition plus the pressed key.
    pub fn melody_offset(&self) -> i8 {
        self.transpose.saturating_add(self.offset)
    }

    /// Offset the drone, trompette and buzz are sounded at: transposition plus capo.
    pub fn drone_offset(&self) -> i8 {
        self.transpose.saturating_add(self.capo)
    }

    /// The melody note the performer hears, i.e., the one the play screen shows.
    pub fn effective_note(&self) -> Note {
        offset_note(self.high_melody.open_note(), self.melody_offset())
    }

    /// The four strings, in display order.
    pub fn strings(&self) -> [&StringVoice; 4] {
        [
            &self.high_melody,
            &self.low_melody,
            &self.drone,
            &self.trompette,
        ]
    }

    /// Summarizes the strings for the idle screen.
    pub fn idle_status(&self) -> IdleStatus {
        let strings = self.strings();
        IdleStatus {
            notes: strings.map(StringVoice::open_note),
            transpose: self.transpose,
            capo: self.capo,
            offset: self.offset,
            mutes: strings.map(StringVoice::mute),
        }
    }

    /// Shows the play screen if the lead melody string is sounding, otherwise the idle status.
    pub fn refresh_display(&self, display: &mut impl Display, redraw: bool) {
        if self.high_melody.is_playing() {
            display.draw_play_screen(self.effective_note(), self.screen_type, redraw);
        } else {
            display.print_idle_status(&self.idle_status());
        }
    }

    /// Advances to the next [`ScreenType`] and repaints.
    pub fn cycle_screen_type(&mut self, display: &mut impl Display) {
        self.screen_type = self.screen_type.cycle();
        info!("Screen type is now {}", self.screen_type);
        self.refresh_display(display, true);
    }
}

impl Default for Gurdy {
    fn default() -> Self {
        Self::new(&GurdyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Screen, Screens, midi};

    #[test]
    fn offsets_combine_transpose_capo_and_key() {
        let mut gurdy = Gurdy::default();
        gurdy.set_transpose(-2);
        gurdy.set_capo(5);
        gurdy.set_offset(4);

        assert_eq!(2, gurdy.melody_offset());
        assert_eq!(3, gurdy.drone_offset());
        assert_eq!(Note::A4, gurdy.effective_note());
    }

    #[test]
    fn idle_status_lists_strings_in_order() {
        let mut gurdy = Gurdy::default();
        gurdy.drone.set_mute(true);

        assert_eq!(
            IdleStatus {
                notes: [Note::G4, Note::G3, Note::C3, Note::C4],
                transpose: 0,
                capo: 0,
                offset: 0,
                mutes: [false, false, true, false],
            },
            gurdy.idle_status(),
            "Expected left but got right"
        );
    }

    #[test]
    fn refresh_display_follows_lead_melody() {
        let mut gurdy = Gurdy::default();
        let mut display = Screens::default();
        let mut transport = midi();

        gurdy.refresh_display(&mut display, false);
        assert_eq!(
            Some(&Screen::Idle(gurdy.idle_status())),
            display.last()
        );

        gurdy
            .high_melody
            .sound_on(&mut transport, 0, U7::from_u8_lossy(0));
        gurdy.refresh_display(&mut display, false);
        assert_eq!(
            Some(&Screen::Play {
                note: Note::G4,
                screen_type: ScreenType::Note,
                redraw: false
            }),
            display.last()
        );
    }

    #[test]
    fn cycle_screen_type_redraws() {
        let mut gurdy = Gurdy::default();
        let mut display = Screens::default();

        gurdy.cycle_screen_type(&mut display);
        assert_eq!(ScreenType::NoteAndStrings, gurdy.screen_type());
        gurdy.cycle_screen_type(&mut display);
        assert_eq!(ScreenType::Note, gurdy.screen_type());
        assert_eq!(2, display.0.len());
    }
}
