//! Recording doubles for the crate's external collaborators.

use crate::{
    configuration::ScreenType,
    display::{Display, IdleStatus},
    voice::{MidiSink, MidiTransport, TrackSink, TriggerGain},
};
use std::vec::Vec;
use wmidi::{MidiMessage, Note};

/// Every MIDI message sent, in order.
#[derive(Debug, Default)]
pub struct MidiLog(pub Vec<MidiMessage<'static>>);

impl MidiSink for MidiLog {
    fn send(&mut self, message: MidiMessage<'static>) {
        self.0.push(message);
    }
}

impl MidiTransport<MidiLog> {
    /// Returns and forgets everything sent so far.
    pub fn take(&mut self) -> Vec<MidiMessage<'static>> {
        core::mem::take(&mut self.sink_mut().0)
    }
}

#[derive(Debug, PartialEq)]
pub enum BoardCommand {
    Gain(u16, TriggerGain),
    PlayPoly(u16),
    Loop(u16, bool),
    Fade(u16, TriggerGain, u16, bool),
    StopAll,
}

/// Every audio-trigger command sent, in order.
#[derive(Debug, Default)]
pub struct Board(pub Vec<BoardCommand>);

impl TrackSink for Board {
    fn track_gain(&mut self, track: u16, gain: TriggerGain) {
        self.0.push(BoardCommand::Gain(track, gain));
    }

    fn track_play_poly(&mut self, track: u16, _lock: bool) {
        self.0.push(BoardCommand::PlayPoly(track));
    }

    fn track_loop(&mut self, track: u16, enable: bool) {
        self.0.push(BoardCommand::Loop(track, enable));
    }

    fn track_fade(&mut self, track: u16, gain: TriggerGain, ms: u16, stop: bool) {
        self.0.push(BoardCommand::Fade(track, gain, ms, stop));
    }

    fn stop_all_tracks(&mut self) {
        self.0.push(BoardCommand::StopAll);
    }
}

#[derive(Debug, PartialEq)]
pub enum Screen {
    Play {
        note: Note,
        screen_type: ScreenType,
        redraw: bool,
    },
    Idle(IdleStatus),
}

/// Every screen drawn, in order.
#[derive(Debug, Default)]
pub struct Screens(pub Vec<Screen>);

impl Screens {
    pub fn last(&self) -> Option<&Screen> {
        self.0.last()
    }
}

impl Display for Screens {
    fn draw_play_screen(&mut self, note: Note, screen_type: ScreenType, redraw: bool) {
        self.0.push(Screen::Play {
            note,
            screen_type,
            redraw,
        });
    }

    fn print_idle_status(&mut self, status: &IdleStatus) {
        self.0.push(Screen::Idle(*status));
    }
}

/// A MIDI transport recording into memory.
pub fn midi() -> MidiTransport<MidiLog> {
    MidiTransport::new(MidiLog::default())
}
