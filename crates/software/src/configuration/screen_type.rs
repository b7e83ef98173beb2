use num_derive::{FromPrimitive, ToPrimitive};

/// Determines what the display shows while the crank is turning.
#[derive(Debug, Default, Copy, Clone, ToPrimitive, FromPrimitive, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScreenType {
    /// The sounding melody note, as large as the display allows.
    #[default]
    Note,
    /// The sounding melody note alongside the mute status of every string.
    NoteAndStrings,
}
impl super::CycleConfig for ScreenType {}
