//! The interface to whatever shows the performer the instrument's state. Rendering is left to implementors.

use crate::configuration::ScreenType;
use wmidi::Note;

/// A snapshot of the instrument shown while the crank is at rest.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IdleStatus {
    /// Open notes of the high melody, low melody, drone and trompette strings, in that order.
    pub notes: [Note; 4],
    /// Semitones the whole instrument is transposed by.
    pub transpose: i8,
    /// Semitones the drone strings are raised by.
    pub capo: i8,
    /// Semitones the keybox currently raises the melody by.
    pub offset: i8,
    /// Mute flags in the same order as `notes`.
    pub mutes: [bool; 4],
}

/// Receives screen updates after every change in voice or mute state.
pub trait Display {
    /// Shows the note being played while the crank turns. `redraw` requests a full repaint rather than an update.
    fn draw_play_screen(&mut self, note: Note, screen_type: ScreenType, redraw: bool);

    /// Shows the state of every string while the crank is at rest.
    fn print_idle_status(&mut self, status: &IdleStatus);
}
