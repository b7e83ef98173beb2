//! Analog inputs, all on ADC1 and reported on the 10-bit scale the instrument logic expects.

use embassy_stm32::{
    adc::{Adc, AnyAdcChannel, SampleTime},
    peripherals::ADC1,
};

/// The ADC reads 12 bits; the instrument logic works in 10.
const RESOLUTION_SHIFT: u16 = 2;

/// The ADC and every analog pin wired to it.
pub struct Analog {
    adc: Adc<'static, ADC1>,
    buzz_knob: AnyAdcChannel<ADC1>,
    vibrato_knob: AnyAdcChannel<ADC1>,
    #[cfg(feature = "geared-crank")]
    crank: AnyAdcChannel<ADC1>,
}

impl Analog {
    /// Constructs an [`Analog`].
    pub fn new(
        mut adc: Adc<'static, ADC1>,
        buzz_knob: AnyAdcChannel<ADC1>,
        vibrato_knob: AnyAdcChannel<ADC1>,
        #[cfg(feature = "geared-crank")] crank: AnyAdcChannel<ADC1>,
    ) -> Self {
        adc.set_sample_time(SampleTime::CYCLES15);
        Self {
            adc,
            buzz_knob,
            vibrato_knob,
            #[cfg(feature = "geared-crank")]
            crank,
        }
    }

    /// Reads the buzz sensitivity knob.
    pub fn buzz_knob(&mut self) -> u16 {
        read(&mut self.adc, &mut self.buzz_knob)
    }

    /// Reads the vibrato knob.
    pub fn vibrato_knob(&mut self) -> u16 {
        read(&mut self.adc, &mut self.vibrato_knob)
    }

    /// Reads the geared crank's voltage `samples` times and returns the mean, which smooths out the motor's pulses.
    #[cfg(feature = "geared-crank")]
    pub fn crank_voltage(&mut self, samples: u16) -> u16 {
        let samples = samples.max(1);
        let total: u32 = (0..samples)
            .map(|_| u32::from(read(&mut self.adc, &mut self.crank)))
            .sum();
        (total / u32::from(samples)) as u16
    }
}

fn read(adc: &mut Adc<'static, ADC1>, channel: &mut AnyAdcChannel<ADC1>) -> u16 {
    adc.blocking_read(channel) >> RESOLUTION_SHIFT
}
