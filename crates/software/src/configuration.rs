//! This module contains the instrument's compile-time tuning (one struct per crank strategy plus the string layout),
//! user-cycled settings (implemented as enums) and traits to make them easier to work with in code.
//!
//! The tuning structs are read-only at runtime. Their [`Default`] impls carry values which suit the reference hardware;
//! builders of other instruments are expected to adjust them.

mod error;
pub use error::*;

mod geared;
pub use geared::*;

mod optical;
pub use optical::*;

mod screen_type;
pub use screen_type::*;

mod voices;
pub use voices::*;

use num_traits::{FromPrimitive, ToPrimitive};

/// A trait which allows infinite cycling of an enum's variants.
///
/// Useful for pushbutton user interfaces, allowing presses to advance from the current to the next variant,
/// cycling back to the beginning when all variants have been exhausted. Variants are visited in declaration order,
/// so enums implementing this trait declare their variants in the order a performer should step through them.
pub trait CycleConfig {
    /// Return the next variant, cycling back to the beginning as needed.
    fn cycle(self) -> Self
    where
        Self: FromPrimitive + ToPrimitive + Sized,
    {
        let index = self
            .to_u8()
            .expect("enum variants should be castable to u8");
        match <Self as FromPrimitive>::from_u8(index + 1) {
            Some(new_selection) => new_selection,
            None => FromPrimitive::from_u8(0).expect("enum should not be empty"),
        }
    }
}
