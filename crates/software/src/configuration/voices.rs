use wmidi::{Channel, Note, U7};

/// Static description of one string voice: where it is sent, what it plays open, how loud, and what it is called.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoiceConfig {
    /// MIDI channel the voice sounds on. Also selects the track bank on audio-trigger boards.
    pub channel: Channel,
    /// The note the string plays with no key pressed.
    pub open_note: Note,
    /// MIDI volume (note velocity).
    pub volume: U7,
    /// Label shown on the display.
    pub name: &'static str,
}

/// The layout of every voice on the instrument.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GurdyConfig {
    /// The lead melody string; its note is the one displayed while playing.
    pub high_melody: VoiceConfig,
    /// The second melody string, typically an octave below the first.
    pub low_melody: VoiceConfig,
    /// The continuously sounding drone.
    pub drone: VoiceConfig,
    /// The trompette, the drone string the buzzing bridge sits on.
    pub trompette: VoiceConfig,
    /// The percussive buzz layered over the trompette.
    pub buzz: VoiceConfig,
    /// Modulation (MIDI CC1) sent with melody notes to give them a gentle vibrato. Zero disables it.
    pub melody_vibrato: U7,
}

impl Default for GurdyConfig {
    fn default() -> Self {
        Self {
            high_melody: VoiceConfig {
                channel: Channel::Ch1,
                open_note: Note::G4,
                volume: U7::from_u8_lossy(56),
                name: "Hi Melody",
            },
            low_melody: VoiceConfig {
                channel: Channel::Ch2,
                open_note: Note::G3,
                volume: U7::from_u8_lossy(56),
                name: "Low Melody",
            },
            trompette: VoiceConfig {
                channel: Channel::Ch3,
                open_note: Note::C4,
                volume: U7::from_u8_lossy(56),
                name: "Trompette",
            },
            drone: VoiceConfig {
                channel: Channel::Ch4,
                open_note: Note::C3,
                volume: U7::from_u8_lossy(56),
                name: "Drone",
            },
            buzz: VoiceConfig {
                channel: Channel::Ch5,
                open_note: Note::C3,
                volume: U7::from_u8_lossy(56),
                name: "Buzz",
            },
            melody_vibrato: U7::from_u8_lossy(16),
        }
    }
}
