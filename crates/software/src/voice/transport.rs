//! Provides the [`SoundTransport`] seam between string voices and the device that actually makes sound, along with
//! its two implementations: [`MidiTransport`] for MIDI synthesizers and samplers, and [`TrackTransport`] for
//! audio-trigger boards which play looped WAV tracks and only understand gain.

use wmidi::{
    Channel, ControlFunction, ControlValue, MidiMessage, Note, PitchBend, ProgramNumber, U7,
};

/// CC 123: All Notes Off.
const ALL_NOTES_OFF: ControlFunction = ControlFunction(U7::from_u8_lossy(123));

/// Length of the fade applied when a gain-only voice is released.
const RELEASE_FADE_MS: u16 = 200;

/// Gain in dB for audio-trigger tracks, on the boards' -70..=+10 scale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TriggerGain(i16);

impl TriggerGain {
    /// Silence on audio-trigger boards.
    pub const SILENT: Self = Self(-70);

    /// Translates a MIDI volume onto the trigger gain scale. MIDI volume 112 corresponds to line level (0 dB).
    pub fn from_volume(volume: U7) -> Self {
        // truncates toward zero
        let db = (i32::from(u8::from(volume)) * 80 - 70 * 128) / 128;
        Self(db as i16)
    }

    /// The gain in dB.
    pub fn db(&self) -> i16 {
        self.0
    }

    /// The gain a track fades to when its note is released: 10 dB quieter, or silent when already near silence.
    pub fn release(&self) -> Self {
        if self.0 > -60 {
            Self(self.0 - 10)
        } else {
            Self::SILENT
        }
    }
}

/// Everything a transport needs to know to start or stop a voice's note.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Voicing {
    /// Channel the voice sounds on.
    pub channel: Channel,
    /// The note being started or stopped.
    pub note: Note,
    /// MIDI volume of the voice.
    pub volume: U7,
    /// The voice's volume expressed on the trigger gain scale.
    pub gain: TriggerGain,
}

impl Voicing {
    /// Audio-trigger boards hold 128 tracks per channel, one per MIDI note.
    pub fn track(&self) -> u16 {
        u16::from(u8::from(self.note)) + 128 * u16::from(self.channel.index())
    }
}

/// A device that turns voice commands into sound.
///
/// Exactly one transport family is in use per build; string voices route every command through it. Transports whose
/// hardware lacks a concept (e.g., pitch bend on a WAV player) ignore the command.
pub trait SoundTransport {
    /// Starts the given note.
    fn note_on(&mut self, voicing: &Voicing);

    /// Stops the given note gently.
    fn note_off(&mut self, voicing: &Voicing);

    /// Abruptly silences everything on the channel (or, on hardware without channels, everything).
    fn kill(&mut self, channel: Channel);

    /// Sends a continuous controller value.
    fn control_change(&mut self, channel: Channel, function: ControlFunction, value: ControlValue);

    /// Selects an instrument program.
    fn program_change(&mut self, channel: Channel, program: ProgramNumber);

    /// Bends the pitch of the channel; 8192 is centre.
    fn pitch_bend(&mut self, channel: Channel, bend: PitchBend);
}

/// Destination for outgoing MIDI messages, e.g., a USB-MIDI endpoint or a serial port.
pub trait MidiSink {
    /// Queues or sends a single message.
    fn send(&mut self, message: MidiMessage<'static>);
}

/// A [`SoundTransport`] speaking MIDI.
#[derive(Debug, Default)]
pub struct MidiTransport<S> {
    sink: S,
}

impl<S: MidiSink> MidiTransport<S> {
    /// Constructs a [`MidiTransport`] writing to `sink`.
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Access to the sink, e.g., to flush queued messages.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

impl<S: MidiSink> SoundTransport for MidiTransport<S> {
    fn note_on(&mut self, voicing: &Voicing) {
        self.sink.send(MidiMessage::NoteOn(
            voicing.channel,
            voicing.note,
            voicing.volume,
        ));
    }

    fn note_off(&mut self, voicing: &Voicing) {
        self.sink.send(MidiMessage::NoteOff(
            voicing.channel,
            voicing.note,
            voicing.volume,
        ));
    }

    fn kill(&mut self, channel: Channel) {
        self.sink.send(MidiMessage::ControlChange(
            channel,
            ALL_NOTES_OFF,
            U7::from_u8_lossy(0),
        ));
    }

    fn control_change(&mut self, channel: Channel, function: ControlFunction, value: ControlValue) {
        self.sink
            .send(MidiMessage::ControlChange(channel, function, value));
    }

    fn program_change(&mut self, channel: Channel, program: ProgramNumber) {
        self.sink.send(MidiMessage::ProgramChange(channel, program));
    }

    fn pitch_bend(&mut self, channel: Channel, bend: PitchBend) {
        self.sink.send(MidiMessage::PitchBendChange(channel, bend));
    }
}

/// Command set of WAV Trigger and Tsunami style audio-trigger boards.
pub trait TrackSink {
    /// Sets the gain of a track in dB.
    fn track_gain(&mut self, track: u16, gain: TriggerGain);

    /// Starts a track without stopping others.
    fn track_play_poly(&mut self, track: u16, lock: bool);

    /// Enables or disables looping for a track.
    fn track_loop(&mut self, track: u16, enable: bool);

    /// Fades a track to `gain` over `ms` milliseconds, optionally stopping it at the end.
    fn track_fade(&mut self, track: u16, gain: TriggerGain, ms: u16, stop: bool);

    /// Stops every playing track.
    fn stop_all_tracks(&mut self);
}

/// A [`SoundTransport`] for audio-trigger boards, where each (channel, note) pair is a looping track.
#[derive(Debug, Default)]
pub struct TrackTransport<S> {
    sink: S,
}

impl<S: TrackSink> TrackTransport<S> {
    /// Constructs a [`TrackTransport`] writing to `sink`.
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Access to the underlying board.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

impl<S: TrackSink> SoundTransport for TrackTransport<S> {
    fn note_on(&mut self, voicing: &Voicing) {
        let track = voicing.track();
        self.sink.track_gain(track, voicing.gain);
        self.sink.track_play_poly(track, true);
        self.sink.track_loop(track, true);
    }

    fn note_off(&mut self, voicing: &Voicing) {
        self.sink.track_fade(
            voicing.track(),
            voicing.gain.release(),
            RELEASE_FADE_MS,
            true,
        );
    }

    fn kill(&mut self, _channel: Channel) {
        self.sink.stop_all_tracks();
    }

    fn control_change(&mut self, _: Channel, _: ControlFunction, _: ControlValue) {}

    fn program_change(&mut self, _: Channel, _: ProgramNumber) {}

    fn pitch_bend(&mut self, _: Channel, _: PitchBend) {}
}
