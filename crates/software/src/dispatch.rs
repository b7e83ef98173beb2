//! Provides [`SoundDispatcher`], which runs once per control cycle and turns the crank's state into voice commands.

use crate::{Gurdy, crank::VelocityEstimator, display::Display, voice::SoundTransport};
use bitmask_enum::bitmask;
use wmidi::U7;

/// What changed during a dispatch cycle.
#[bitmask(u8)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transition {
    /// The strings started sounding.
    SoundStart,
    /// The strings stopped sounding.
    SoundStop,
    /// The melody strings moved to a new note.
    NoteChange,
    /// Expression or vibrato was updated on sounding strings.
    ExpressionChange,
    /// The buzz started.
    BuzzStart,
    /// The buzz stopped.
    BuzzStop,
}

impl Transition {
    /// The state a buzz indicator should switch to after this cycle, or `None` if the buzz did not change.
    pub fn buzz_indicator(self) -> Option<bool> {
        if self.contains(Self::BuzzStart) {
            Some(true)
        } else if self.contains(Self::BuzzStop) {
            Some(false)
        } else {
            None
        }
    }
}

/// Performer input gathered alongside each crank sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleInput {
    /// Semitones the pressed key raises the melody by; 0 when no key is pressed.
    pub offset: i8,
    /// Melody vibrato from a knob, if one is fitted. Otherwise the [`Gurdy`]'s configured vibrato is used.
    pub vibrato: Option<U7>,
}

/// Decides, cycle by cycle, when the strings start, change and stop.
///
/// The dispatcher remembers only what it last sent; the voices themselves live in the [`Gurdy`] so that the mute
/// operations can act on them between cycles.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SoundDispatcher {
    sounding: bool,
    buzzing: bool,
    expression: Option<U7>,
    vibrato: U7,
}

impl SoundDispatcher {
    /// Returns `true` while the strings are sounding.
    pub fn is_sounding(&self) -> bool {
        self.sounding
    }

    /// Returns `true` while the buzz is sounding.
    pub fn is_buzzing(&self) -> bool {
        self.buzzing
    }

    /// Brings the voices in line with the (already updated) crank and returns what changed.
    ///
    /// Sound starts and stops with [`VelocityEstimator::is_active`]. While it lasts, a new keybox offset re-sounds the
    /// melody strings and changes in expression or vibrato are sent as controllers without re-triggering anything.
    /// The buzz follows [`VelocityEstimator::is_buzzing`] but never sounds without the strings.
    pub fn dispatch(
        &mut self,
        gurdy: &mut Gurdy,
        crank: &impl VelocityEstimator,
        input: CycleInput,
        transport: &mut impl SoundTransport,
        display: &mut impl Display,
    ) -> Transition {
        let mut transition = Transition::none();
        let active = crank.is_active();
        let buzz = active && crank.is_buzzing();
        let vibrato = input.vibrato.unwrap_or(gurdy.melody_vibrato());

        if self.buzzing && !buzz {
            gurdy.buzz.sound_off(transport);
            self.buzzing = false;
            transition |= Transition::BuzzStop;
        }

        match (self.sounding, active) {
            (false, true) => {
                self.start(gurdy, crank, input, vibrato, transport);
                gurdy.refresh_display(display, true);
                transition |= Transition::SoundStart;
            }
            (true, true) => {
                if input.offset != gurdy.offset() {
                    gurdy.set_offset(input.offset);
                    let offset = gurdy.melody_offset();
                    gurdy.high_melody.sound_on(transport, offset, vibrato);
                    gurdy.low_melody.sound_on(transport, offset, vibrato);
                    self.vibrato = vibrato;
                    gurdy.refresh_display(display, false);
                    transition |= Transition::NoteChange;
                }
                transition |= self.update_controllers(gurdy, crank, vibrato, transport);
            }
            (true, false) => {
                self.stop(gurdy, transport);
                gurdy.refresh_display(display, false);
                transition |= Transition::SoundStop;
            }
            (false, false) => {}
        }

        if buzz && !self.buzzing {
            let offset = gurdy.drone_offset();
            gurdy.buzz.sound_on(transport, offset, U7::from_u8_lossy(0));
            self.buzzing = true;
            transition |= Transition::BuzzStart;
        }

        if !transition.is_none() {
            debug!("Dispatch transition: {}", transition.bits());
        }
        transition
    }

    /// Kills every voice at once, for when something has gone wrong downstream (e.g., the sound module went away).
    pub fn silence_all(
        &mut self,
        gurdy: &mut Gurdy,
        transport: &mut impl SoundTransport,
        display: &mut impl Display,
    ) {
        info!("Silencing all voices");
        for voice in [
            &mut gurdy.high_melody,
            &mut gurdy.low_melody,
            &mut gurdy.drone,
            &mut gurdy.trompette,
            &mut gurdy.buzz,
        ] {
            voice.sound_kill(transport);
        }
        *self = Self::default();
        gurdy.refresh_display(display, false);
    }

    fn start(
        &mut self,
        gurdy: &mut Gurdy,
        crank: &impl VelocityEstimator,
        input: CycleInput,
        vibrato: U7,
        transport: &mut impl SoundTransport,
    ) {
        gurdy.set_offset(input.offset);
        let melody_offset = gurdy.melody_offset();
        let drone_offset = gurdy.drone_offset();
        let none = U7::from_u8_lossy(0);

        gurdy.high_melody.sound_on(transport, melody_offset, vibrato);
        gurdy.low_melody.sound_on(transport, melody_offset, vibrato);
        gurdy.drone.sound_on(transport, drone_offset, none);
        gurdy.trompette.sound_on(transport, drone_offset, none);

        self.expression = crank.expression();
        if let Some(expression) = self.expression {
            for voice in gurdy.strings() {
                voice.set_expression(transport, expression);
            }
        }
        self.vibrato = vibrato;
        self.sounding = true;
        info!(
            "Sound started at melody offset {}, drone offset {}",
            melody_offset, drone_offset
        );
    }

    fn update_controllers(
        &mut self,
        gurdy: &mut Gurdy,
        crank: &impl VelocityEstimator,
        vibrato: U7,
        transport: &mut impl SoundTransport,
    ) -> Transition {
        let mut transition = Transition::none();

        // inside a hysteresis band the effort can sit below the start threshold; hold the last expression there
        if let Some(expression) = crank.expression() {
            if self.expression != Some(expression) {
                for voice in gurdy.strings() {
                    voice.set_expression(transport, expression);
                }
                self.expression = Some(expression);
                transition |= Transition::ExpressionChange;
            }
        }

        if vibrato != self.vibrato {
            gurdy.high_melody.set_vibrato(transport, vibrato);
            gurdy.low_melody.set_vibrato(transport, vibrato);
            self.vibrato = vibrato;
            transition |= Transition::ExpressionChange;
        }

        transition
    }

    fn stop(&mut self, gurdy: &mut Gurdy, transport: &mut impl SoundTransport) {
        for voice in [
            &mut gurdy.high_melody,
            &mut gurdy.low_melody,
            &mut gurdy.drone,
            &mut gurdy.trompette,
            &mut gurdy.buzz,
        ] {
            if voice.is_playing() {
                voice.sound_off(transport);
            }
        }
        self.sounding = false;
        self.expression = None;
        info!("Sound stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        crank::CrankPhase,
        expression::ExpressionMapper,
        testing::{MidiLog, Screen, Screens, midi},
        voice::MidiTransport,
    };
    use std::{vec, vec::Vec};
    use wmidi::{Channel, ControlFunction, MidiMessage, Note};

    /// A crank whose state is set directly.
    struct Crank {
        effort: f32,
        active: bool,
        buzzing: bool,
        mapper: ExpressionMapper,
    }

    impl Crank {
        fn new() -> Self {
            Self {
                effort: 0.0,
                active: false,
                buzzing: false,
                mapper: ExpressionMapper::new(10.0, 110.0, u7(90)),
            }
        }

        fn turning(effort: f32) -> Self {
            Self {
                effort,
                active: true,
                ..Self::new()
            }
        }
    }

    impl VelocityEstimator for Crank {
        type Sample = f32;

        fn sample(&mut self, sample: f32) -> f32 {
            self.effort = sample;
            sample
        }

        fn effort(&self) -> f32 {
            self.effort
        }

        fn is_active(&self) -> bool {
            self.active
        }

        fn is_buzzing(&self) -> bool {
            self.buzzing
        }

        fn phase(&self) -> CrankPhase {
            CrankPhase::Sustain
        }

        fn mapper(&self) -> &ExpressionMapper {
            &self.mapper
        }
    }

    fn u7(value: u8) -> U7 {
        U7::from_u8_lossy(value)
    }

    fn expression(channel: Channel, value: u8) -> MidiMessage<'static> {
        MidiMessage::ControlChange(channel, ControlFunction(u7(11)), u7(value))
    }

    fn modulation(channel: Channel, value: u8) -> MidiMessage<'static> {
        MidiMessage::ControlChange(channel, ControlFunction(u7(1)), u7(value))
    }

    struct Rig {
        gurdy: Gurdy,
        dispatcher: SoundDispatcher,
        transport: MidiTransport<MidiLog>,
        display: Screens,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                gurdy: Gurdy::default(),
                dispatcher: SoundDispatcher::default(),
                transport: midi(),
                display: Screens::default(),
            }
        }

        fn cycle(&mut self, crank: &Crank, offset: i8) -> Transition {
            self.dispatcher.dispatch(
                &mut self.gurdy,
                crank,
                CycleInput {
                    offset,
                    vibrato: None,
                },
                &mut self.transport,
                &mut self.display,
            )
        }

        fn sent(&mut self) -> Vec<MidiMessage<'static>> {
            self.transport.take()
        }
    }

    mod start {
        use super::*;

        #[test]
        fn sounds_all_strings_then_expression() {
            let mut rig = Rig::new();
            let transition = rig.cycle(&Crank::turning(110.0), 2);

            assert_eq!(Transition::SoundStart, transition);
            assert_eq!(
                vec![
                    MidiMessage::NoteOn(Channel::Ch1, Note::A4, u7(56)),
                    modulation(Channel::Ch1, 16),
                    MidiMessage::NoteOn(Channel::Ch2, Note::A3, u7(56)),
                    modulation(Channel::Ch2, 16),
                    MidiMessage::NoteOn(Channel::Ch4, Note::C3, u7(56)),
                    MidiMessage::NoteOn(Channel::Ch3, Note::C4, u7(56)),
                    expression(Channel::Ch1, 127),
                    expression(Channel::Ch2, 127),
                    expression(Channel::Ch4, 127),
                    expression(Channel::Ch3, 127),
                ],
                rig.sent(),
                "Expected left but got right"
            );
            assert!(rig.dispatcher.is_sounding());
            assert_eq!(
                Some(&Screen::Play {
                    note: Note::A4,
                    screen_type: Default::default(),
                    redraw: true
                }),
                rig.display.last()
            );
        }

        #[test]
        fn drones_follow_capo_not_keybox() {
            let mut rig = Rig::new();
            rig.gurdy.set_capo(2);
            rig.cycle(&Crank::turning(110.0), 5);

            assert_eq!(Note::C5, rig.gurdy.high_melody.note_being_played());
            assert_eq!(Note::D3, rig.gurdy.drone.note_being_played());
            assert_eq!(Note::D4, rig.gurdy.trompette.note_being_played());
        }

        #[test]
        fn muted_strings_stay_silent_but_playing() {
            let mut rig = Rig::new();
            rig.gurdy.drone.set_mute(true);
            rig.cycle(&Crank::turning(110.0), 0);

            assert!(rig.gurdy.drone.is_playing());
            assert!(
                !rig.sent()
                    .iter()
                    .any(|message| matches!(message, MidiMessage::NoteOn(Channel::Ch4, ..)))
            );
        }

        #[test]
        fn knob_vibrato_overrides_configured() {
            let mut rig = Rig::new();
            rig.dispatcher.dispatch(
                &mut rig.gurdy,
                &Crank::turning(110.0),
                CycleInput {
                    offset: 0,
                    vibrato: Some(u7(40)),
                },
                &mut rig.transport,
                &mut rig.display,
            );

            let sent = rig.sent();
            assert_eq!(modulation(Channel::Ch1, 40), sent[1]);
            assert_eq!(modulation(Channel::Ch2, 40), sent[3]);
        }
    }

    mod sustain {
        use super::*;

        #[test]
        fn steady_crank_sends_nothing() {
            let mut rig = Rig::new();
            rig.cycle(&Crank::turning(110.0), 0);
            rig.sent();

            let transition = rig.cycle(&Crank::turning(110.0), 0);
            assert_eq!(Transition::none(), transition);
            assert_eq!(Vec::<MidiMessage>::new(), rig.sent());
        }

        #[test]
        fn expression_change_updates_every_string() {
            let mut rig = Rig::new();
            rig.cycle(&Crank::turning(110.0), 0);
            rig.sent();

            let transition = rig.cycle(&Crank::turning(10.0), 0);
            assert_eq!(Transition::ExpressionChange, transition);
            assert_eq!(
                vec![
                    expression(Channel::Ch1, 90),
                    expression(Channel::Ch2, 90),
                    expression(Channel::Ch4, 90),
                    expression(Channel::Ch3, 90),
                ],
                rig.sent(),
                "Expected left but got right"
            );
        }

        #[test]
        fn expression_held_below_start_threshold() {
            let mut rig = Rig::new();
            rig.cycle(&Crank::turning(110.0), 0);
            rig.sent();

            let transition = rig.cycle(&Crank::turning(5.0), 0);
            assert_eq!(Transition::none(), transition);
            assert!(rig.sent().is_empty());
        }

        #[test]
        fn vibrato_change_updates_melody_only() {
            let mut rig = Rig::new();
            rig.cycle(&Crank::turning(110.0), 0);
            rig.sent();

            let transition = rig.dispatcher.dispatch(
                &mut rig.gurdy,
                &Crank::turning(110.0),
                CycleInput {
                    offset: 0,
                    vibrato: Some(u7(64)),
                },
                &mut rig.transport,
                &mut rig.display,
            );
            assert_eq!(Transition::ExpressionChange, transition);
            assert_eq!(
                vec![modulation(Channel::Ch1, 64), modulation(Channel::Ch2, 64)],
                rig.sent(),
                "Expected left but got right"
            );
        }

        #[test]
        fn mute_change_keeps_knob_vibrato() {
            let mut rig = Rig::new();
            let crank = Crank::turning(110.0);
            for vibrato in [16, 100] {
                rig.dispatcher.dispatch(
                    &mut rig.gurdy,
                    &crank,
                    CycleInput {
                        offset: 0,
                        vibrato: Some(u7(vibrato)),
                    },
                    &mut rig.transport,
                    &mut rig.display,
                );
            }
            // both on -> high only -> low only
            rig.gurdy
                .cycle_melody_mute(&mut rig.transport, &mut rig.display);
            rig.gurdy
                .cycle_melody_mute(&mut rig.transport, &mut rig.display);
            rig.sent();

            // low only -> both on re-sounds the high string
            rig.gurdy
                .cycle_melody_mute(&mut rig.transport, &mut rig.display);
            assert_eq!(
                vec![
                    MidiMessage::NoteOff(Channel::Ch1, Note::G4, u7(56)),
                    MidiMessage::NoteOn(Channel::Ch1, Note::G4, u7(56)),
                    modulation(Channel::Ch1, 100),
                ],
                rig.sent(),
                "Expected left but got right"
            );

            let transition = rig.dispatcher.dispatch(
                &mut rig.gurdy,
                &crank,
                CycleInput {
                    offset: 0,
                    vibrato: Some(u7(100)),
                },
                &mut rig.transport,
                &mut rig.display,
            );
            assert_eq!(Transition::none(), transition);
            assert!(rig.sent().is_empty());
        }

        #[test]
        fn keybox_change_resounds_melody() {
            let mut rig = Rig::new();
            rig.cycle(&Crank::turning(110.0), 0);
            rig.sent();

            let transition = rig.cycle(&Crank::turning(110.0), 2);
            assert_eq!(Transition::NoteChange, transition);
            assert_eq!(
                vec![
                    MidiMessage::NoteOff(Channel::Ch1, Note::G4, u7(56)),
                    MidiMessage::NoteOn(Channel::Ch1, Note::A4, u7(56)),
                    modulation(Channel::Ch1, 16),
                    MidiMessage::NoteOff(Channel::Ch2, Note::G3, u7(56)),
                    MidiMessage::NoteOn(Channel::Ch2, Note::A3, u7(56)),
                    modulation(Channel::Ch2, 16),
                ],
                rig.sent(),
                "Expected left but got right"
            );
            assert_eq!(
                Some(&Screen::Play {
                    note: Note::A4,
                    screen_type: Default::default(),
                    redraw: false
                }),
                rig.display.last()
            );
        }
    }

    mod stop {
        use super::*;

        #[test]
        fn releases_every_playing_voice() {
            let mut rig = Rig::new();
            let mut crank = Crank::turning(110.0);
            crank.buzzing = true;
            rig.cycle(&crank, 0);
            rig.sent();

            let transition = rig.cycle(&Crank::new(), 0);
            assert_eq!(Transition::SoundStop | Transition::BuzzStop, transition);
            assert_eq!(
                vec![
                    MidiMessage::NoteOff(Channel::Ch5, Note::C3, u7(56)),
                    MidiMessage::NoteOff(Channel::Ch1, Note::G4, u7(56)),
                    MidiMessage::NoteOff(Channel::Ch2, Note::G3, u7(56)),
                    MidiMessage::NoteOff(Channel::Ch4, Note::C3, u7(56)),
                    MidiMessage::NoteOff(Channel::Ch3, Note::C4, u7(56)),
                ],
                rig.sent(),
                "Expected left but got right"
            );
            assert!(!rig.dispatcher.is_sounding());
            assert!(!rig.dispatcher.is_buzzing());
            assert_eq!(
                Some(&Screen::Idle(rig.gurdy.idle_status())),
                rig.display.last()
            );
        }

        #[test]
        fn idle_crank_does_nothing() {
            let mut rig = Rig::new();
            assert_eq!(Transition::none(), rig.cycle(&Crank::new(), 3));
            assert!(rig.sent().is_empty());
            assert!(rig.display.0.is_empty());
        }

        #[test]
        fn restart_resends_expression() {
            let mut rig = Rig::new();
            rig.cycle(&Crank::turning(110.0), 0);
            rig.cycle(&Crank::new(), 0);
            rig.sent();

            rig.cycle(&Crank::turning(110.0), 0);
            assert!(rig.sent().contains(&expression(Channel::Ch1, 127)));
        }
    }

    mod buzz {
        use super::*;

        #[test]
        fn follows_crank_while_sounding() {
            let mut rig = Rig::new();
            let mut crank = Crank::turning(110.0);
            rig.cycle(&crank, 0);
            rig.sent();

            crank.buzzing = true;
            assert_eq!(Transition::BuzzStart, rig.cycle(&crank, 0));
            assert_eq!(
                vec![MidiMessage::NoteOn(Channel::Ch5, Note::C3, u7(56))],
                rig.sent(),
                "Expected left but got right"
            );

            crank.buzzing = false;
            assert_eq!(Transition::BuzzStop, rig.cycle(&crank, 0));
            assert_eq!(
                vec![MidiMessage::NoteOff(Channel::Ch5, Note::C3, u7(56))],
                rig.sent(),
                "Expected left but got right"
            );
        }

        #[test]
        fn starts_after_strings() {
            let mut rig = Rig::new();
            let mut crank = Crank::turning(110.0);
            crank.buzzing = true;

            let transition = rig.cycle(&crank, 0);
            assert_eq!(Transition::SoundStart | Transition::BuzzStart, transition);
            assert_eq!(
                Some(&MidiMessage::NoteOn(Channel::Ch5, Note::C3, u7(56))),
                rig.sent().last()
            );
        }

        #[test]
        fn gated_on_sound() {
            let mut rig = Rig::new();
            let mut crank = Crank::new();
            crank.buzzing = true;

            assert_eq!(Transition::none(), rig.cycle(&crank, 0));
            assert!(!rig.gurdy.buzz.is_playing());
        }

        #[test]
        fn muted_with_trompette() {
            let mut rig = Rig::new();
            rig.gurdy
                .toggle_trompette_mute(&mut rig.transport, &mut rig.display);
            let mut crank = Crank::turning(110.0);
            crank.buzzing = true;
            rig.cycle(&crank, 0);

            assert!(rig.gurdy.buzz.is_playing());
            assert!(
                !rig.sent()
                    .iter()
                    .any(|message| matches!(message, MidiMessage::NoteOn(Channel::Ch5, ..)))
            );
        }
    }

    #[test]
    fn buzz_indicator_follows_buzz_transitions() {
        let mut rig = Rig::new();
        let mut crank = Crank::turning(110.0);

        assert_eq!(None, rig.cycle(&crank, 0).buzz_indicator());
        crank.buzzing = true;
        assert_eq!(Some(true), rig.cycle(&crank, 0).buzz_indicator());
        assert_eq!(None, rig.cycle(&crank, 0).buzz_indicator());
        assert_eq!(
            Some(false),
            rig.cycle(&Crank::new(), 0).buzz_indicator(),
            "Stopping the strings turns the indicator off too"
        );
    }

    #[test]
    fn silence_all_kills_every_channel() {
        let mut rig = Rig::new();
        let mut crank = Crank::turning(110.0);
        crank.buzzing = true;
        rig.cycle(&crank, 0);
        rig.sent();

        rig.dispatcher
            .silence_all(&mut rig.gurdy, &mut rig.transport, &mut rig.display);
        let all_notes_off =
            |channel| MidiMessage::ControlChange(channel, ControlFunction(u7(123)), u7(0));
        assert_eq!(
            vec![
                all_notes_off(Channel::Ch1),
                all_notes_off(Channel::Ch2),
                all_notes_off(Channel::Ch4),
                all_notes_off(Channel::Ch3),
                all_notes_off(Channel::Ch5),
            ],
            rig.sent(),
            "Expected left but got right"
        );
        assert_eq!(SoundDispatcher::default(), rig.dispatcher);
        assert!(rig.gurdy.strings().iter().all(|voice| !voice.is_playing()));

        // the next turn starts from scratch
        assert_eq!(Transition::SoundStart | Transition::BuzzStart, rig.cycle(&crank, 0));
    }
}
