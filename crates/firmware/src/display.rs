//! A [`Display`] that writes to the debug log, standing in for a screen.

use crank_gurdy_lib::{
    configuration::ScreenType,
    display::{Display, IdleStatus},
};
use defmt::*;
use wmidi::Note;

/// Logs every screen the instrument would draw.
pub struct LogDisplay;

impl Display for LogDisplay {
    fn draw_play_screen(&mut self, note: Note, screen_type: ScreenType, redraw: bool) {
        if redraw {
            info!("[{}] Playing {}", screen_type, note.to_str());
        } else {
            info!("Playing {}", note.to_str());
        }
    }

    fn print_idle_status(&mut self, status: &IdleStatus) {
        let [high, low, drone, trompette] = status.notes;
        info!(
            "Hi {} Lo {} Dr {} Tr {} | transpose {} capo {} offset {} | muted {}",
            high.to_str(),
            low.to_str(),
            drone.to_str(),
            trompette.to_str(),
            status.transpose,
            status.capo,
            status.offset,
            status.mutes
        );
    }
}
