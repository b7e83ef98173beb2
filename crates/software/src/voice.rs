//! Provides [`StringVoice`], which manages turning one "string" of the instrument on and off, determining its note,
//! and talking to the sound layer through a [`SoundTransport`].

mod transport;
pub use transport::*;

use crate::configuration::VoiceConfig;
use wmidi::{Channel, ControlFunction, Note, PitchBend, ProgramNumber, U7};

/// CC 1: Modulation Wheel, used for vibrato.
const MODULATION: ControlFunction = ControlFunction(U7::from_u8_lossy(1));
/// CC 11: Expression.
const EXPRESSION: ControlFunction = ControlFunction(U7::from_u8_lossy(11));

/// Raises or lowers `note` by `offset` semitones, pinning the result to the MIDI note range.
pub fn offset_note(note: Note, offset: i8) -> Note {
    let raised = (i16::from(u8::from(note)) + i16::from(offset)).clamp(0, 127);
    Note::from(U7::from_u8_lossy(raised as u8))
}

/// One independently mutable, independently sounding string.
///
/// At most one note is active per voice: starting a note while another is playing stops the old one first.
///
/// Muting only suppresses the audible effect of [`sound_on`](Self::sound_on). The voice still records that it is
/// playing, so the mute flag can be flipped at any time and re-applied by re-sounding the voice (see
/// [`resound`](Self::resound)); note-offs are always sent so that nothing is left hanging.
#[derive(Clone, Debug, PartialEq)]
pub struct StringVoice {
    channel: Channel,
    open_note: Note,
    /// The note last started, which is the one `sound_off` releases.
    note_being_played: Note,
    /// The modulation last started with.
    modulation: U7,
    volume: U7,
    trigger_gain: TriggerGain,
    muted: bool,
    playing: bool,
    name: &'static str,
}

impl StringVoice {
    /// Constructs a silent, unmuted [`StringVoice`].
    pub fn new(config: &VoiceConfig) -> Self {
        Self {
            channel: config.channel,
            open_note: config.open_note,
            note_being_played: config.open_note,
            modulation: U7::from_u8_lossy(0),
            volume: config.volume,
            trigger_gain: TriggerGain::from_volume(config.volume),
            muted: false,
            playing: false,
            name: config.name,
        }
    }

    fn voicing(&self) -> Voicing {
        Voicing {
            channel: self.channel,
            note: self.note_being_played,
            volume: self.volume,
            gain: self.trigger_gain,
        }
    }

    fn start(&mut self, transport: &mut impl SoundTransport, note: Note, modulation: U7) {
        self.note_being_played = note;
        self.modulation = modulation;
        if !self.muted {
            transport.note_on(&self.voicing());
            if u8::from(modulation) > 0 {
                transport.control_change(self.channel, MODULATION, modulation);
            }
        }
        self.playing = true;
    }

    /// Starts sound at the open note raised by `offset` semitones, with optional `modulation` (MIDI CC1, 0 for none).
    ///
    /// Any note already playing on this voice is stopped first.
    pub fn sound_on(&mut self, transport: &mut impl SoundTransport, offset: i8, modulation: U7) {
        if self.playing {
            debug!(
                "{=str} started while playing note {=u8}; stopping it first",
                self.name,
                u8::from(self.note_being_played)
            );
            self.sound_off(transport);
        }
        self.start(transport, offset_note(self.open_note, offset), modulation);
    }

    /// Stops the note currently playing, gently. Sent even when muted.
    pub fn sound_off(&mut self, transport: &mut impl SoundTransport) {
        transport.note_off(&self.voicing());
        self.playing = false;
    }

    /// Kills all sound on the voice's channel. Meant for abrupt silence rather than routine stops (see
    /// [`sound_off`](Self::sound_off)). On audio-trigger boards this stops every track, not only this voice's.
    pub fn sound_kill(&mut self, transport: &mut impl SoundTransport) {
        transport.kill(self.channel);
        self.playing = false;
    }

    /// Stops and immediately restarts the current note, applying a changed mute flag without waiting for the next
    /// note event.
    pub fn resound(&mut self, transport: &mut impl SoundTransport) {
        let (note, modulation) = (self.note_being_played, self.modulation);
        self.sound_off(transport);
        self.start(transport, note, modulation);
    }

    /// Returns the string's open (base) note.
    pub fn open_note(&self) -> Note {
        self.open_note
    }

    /// Sets a new open note. Takes effect on the next [`sound_on`](Self::sound_on).
    pub fn set_open_note(&mut self, note: Note) {
        self.open_note = note;
    }

    /// Returns the note last started, which may differ from the open note by the offset it was started with.
    pub fn note_being_played(&self) -> Note {
        self.note_being_played
    }

    /// Returns the string's MIDI volume.
    pub fn volume(&self) -> U7 {
        self.volume
    }

    /// Sets a new volume, recomputing its audio-trigger gain. Takes effect on the next [`sound_on`](Self::sound_on).
    pub fn set_volume(&mut self, volume: U7) {
        self.volume = volume;
        self.trigger_gain = TriggerGain::from_volume(volume);
    }

    /// Getter.
    pub fn trigger_gain(&self) -> TriggerGain {
        self.trigger_gain
    }

    /// Returns `true` when muted.
    pub fn mute(&self) -> bool {
        self.muted
    }

    /// Mutes or unmutes the string. Sends nothing; re-sound the voice to apply the change to a playing note.
    pub fn set_mute(&mut self, mute: bool) {
        self.muted = mute;
    }

    /// Returns `true` while a note is (logically) playing, muted or not.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Getter.
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Returns the label shown on the display.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Sends MIDI CC11 (Expression).
    pub fn set_expression(&self, transport: &mut impl SoundTransport, expression: U7) {
        transport.control_change(self.channel, EXPRESSION, expression);
    }

    /// Bends the channel's pitch; 8192 is no bend.
    pub fn set_pitch_bend(&self, transport: &mut impl SoundTransport, bend: PitchBend) {
        transport.pitch_bend(self.channel, bend);
    }

    /// Sets the amount of vibrato via MIDI CC1, the "mod wheel". Later re-sounds of the current note keep it.
    pub fn set_vibrato(&mut self, transport: &mut impl SoundTransport, vibrato: U7) {
        self.modulation = vibrato;
        transport.control_change(self.channel, MODULATION, vibrato);
    }

    /// Sends a program change to select the sound the channel plays.
    pub fn set_program(&self, transport: &mut impl SoundTransport, program: ProgramNumber) {
        transport.program_change(self.channel, program);
    }
}
