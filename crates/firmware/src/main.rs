//! Crank Gurdy is [Embassy](https://embassy.dev)-based firmware for a crank-driven
//! [hurdy-gurdy](https://en.wikipedia.org/wiki/Hurdy-gurdy) emulator. The firmware runs on the [Nucleo-F767ZI
//! development board](https://www.st.com/en/evaluation-tools/nucleo-f767zi.html), which is powered by an F7-series
//! STM32 microcontroller.
//!
//! Turning the crank is the instrument's "bow": a sensor on the crank drives every string. The strings are voiced by
//! whatever sound module the board is plugged into over USB-MIDI. Two crank sensors are supported; an optical sensor
//! watching a slotted wheel is the default, and the `geared-crank` feature switches to a geared motor used as a
//! generator. Knobs set the buzz sensitivity and melody vibrato, and pushbuttons cycle the mute modes.
//!
//! All instrument logic lives in `crank_gurdy_lib`; this crate only wires it to the hardware.

#![no_std]
#![no_main]

mod analog;
mod buttons;
mod crank_sensor;
mod display;
mod led;
mod midi_out;

use crate::{
    analog::Analog,
    buttons::{Button, PRESSES, button_task},
    crank_sensor::CrankSensor,
    display::LogDisplay,
    led::{BUZZ_LED, buzz_led_task},
    midi_out::{DISCONNECTED, UsbDriver, UsbMidiSink, midi_task},
};
use crank_gurdy_lib::{
    Gurdy,
    configuration::GurdyConfig,
    crank::VelocityEstimator,
    dispatch::{CycleInput, SoundDispatcher},
    expression::VibratoKnob,
    voice::MidiTransport,
};
use defmt::*;
use embassy_executor::Spawner;
use embassy_stm32::{
    Config,
    adc::{Adc, AdcChannel},
    bind_interrupts,
    exti::ExtiInput,
    gpio::{Level, Output, Pull, Speed},
    peripherals,
    time::Hertz,
    usb,
};
use embassy_usb::{Builder, UsbDevice, class::midi::MidiClass};
use static_cell::StaticCell;

#[cfg(feature = "geared-crank")]
use crank_gurdy_lib::{configuration::GearedConfig, crank::GearedCrank};
#[cfg(not(feature = "geared-crank"))]
use crank_gurdy_lib::{configuration::OpticalConfig, crank::OpticalCrank};

use {defmt_rtt as _, panic_probe as _};

bind_interrupts!(
    #[doc(hidden)]
    struct Irqs {
        OTG_FS => usb::InterruptHandler<peripherals::USB_OTG_FS>;
    }
);

#[cfg(not(feature = "geared-crank"))]
type Crank = OpticalCrank;
#[cfg(feature = "geared-crank")]
type Crank = GearedCrank;

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Initializing Crank Gurdy");

    let mut config = Config::default();
    {
        use embassy_stm32::rcc::*;
        // hse: high-speed external clock
        config.rcc.hse = Some(Hse {
            freq: Hertz(8_000_000),
            mode: HseMode::Bypass,
        });

        // pll: phase-locked loop, crucial for dividing clock
        config.rcc.pll_src = PllSource::HSE;
        config.rcc.pll = Some(Pll {
            prediv: PllPreDiv::DIV4,
            mul: PllMul::MUL216,
            divp: Some(PllPDiv::DIV2), // 8mhz / 4 * 216 / 2 = 216Mhz
            // the 48MHz clock used for USB OTG FS is derived from the main PLL VCO (PLLQ clock)
            divq: Some(PllQDiv::DIV9), // 8mhz / 4 * 216 / 9 = 48Mhz
            divr: None,
        });
        config.rcc.ahb_pre = AHBPrescaler::DIV1;
        config.rcc.apb1_pre = APBPrescaler::DIV4;
        config.rcc.apb2_pre = APBPrescaler::DIV2;
        config.rcc.sys = Sysclk::PLL1_P;
        config.rcc.mux.clk48sel = mux::Clk48sel::PLL1_Q;
    }
    let p = embassy_stm32::init(config);

    // the on-board user button has an external pull-down; the others are wired to ground
    let buttons = [
        (ExtiInput::new(p.PD0, p.EXTI0, Pull::Up), Button::MelodyMute),
        (ExtiInput::new(p.PD1, p.EXTI1, Pull::Up), Button::DroneMute),
        (ExtiInput::new(p.PE2, p.EXTI2, Pull::Up), Button::DroneToggle),
        (ExtiInput::new(p.PE3, p.EXTI3, Pull::Up), Button::TrompetteToggle),
        (ExtiInput::new(p.PC13, p.EXTI13, Pull::None), Button::ScreenType),
    ];
    for (input, button) in buttons {
        unwrap!(spawner.spawn(button_task(input, button)));
    }

    // the blue user LED doubles as the buzz indicator
    let blue_led = Output::new(p.PB7, Level::Low, Speed::Low);
    unwrap!(spawner.spawn(buzz_led_task(blue_led)));

    // Create the driver, from the HAL.
    static ENDPOINT_OUT_BUFFER: StaticCell<[u8; 256]> = StaticCell::new();
    let mut config = embassy_stm32::usb::Config::default();

    // USB devices which are self-powered (i.e., that can stay powered on if unplugged from the host)
    // need to enable vbus_detection to comply with the USB spec. Per section 6.10 of the Nucleo board
    // manual (UM1974), CN13 (the USB port) cannot power the board; external power is necessary.
    config.vbus_detection = true;

    let driver = usb::Driver::new_fs(
        p.USB_OTG_FS,
        Irqs,
        p.PA12,
        p.PA11,
        ENDPOINT_OUT_BUFFER.init([0; 256]),
        config,
    );

    // per https://pid.codes, FOSS projects can apply to be listed under the vendor ID owned by InterBiometrics
    let vendor_id = 0x1209;
    // one of the pid.codes test IDs, until a product ID is allocated
    let product_id = 0x0001;

    let mut config = embassy_usb::Config::new(vendor_id, product_id);
    config.manufacturer = Some("Crank Gurdy");
    config.product = Some("Crank Gurdy");
    config.self_powered = true;
    config.max_power = 0;

    // Create embassy-usb DeviceBuilder using the driver and config.
    // It needs some buffers for building the descriptors.
    static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
    static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
    static CONTROL_BUFFER: StaticCell<[u8; 64]> = StaticCell::new();

    let mut builder = Builder::new(
        driver,
        config,
        CONFIG_DESCRIPTOR.init([0; 256]),
        BOS_DESCRIPTOR.init([0; 256]),
        &mut [], // no msos descriptors
        CONTROL_BUFFER.init([0; 64]),
    );

    let class = MidiClass::new(&mut builder, 1, 1, 64);
    let usb = builder.build();

    unwrap!(spawner.spawn(usb_task(usb)));
    unwrap!(spawner.spawn(midi_task(class)));

    // per UM1974, PC0 and PC3 are on the Arduino-compatible analog header; PA3 sits beside them
    let adc = Adc::new(p.ADC1);

    #[cfg(not(feature = "geared-crank"))]
    let (crank, sensor, analog) = {
        let config = OpticalConfig::default();
        unwrap!(config.validate());
        let input = ExtiInput::new(p.PE9, p.EXTI9, Pull::None);
        (
            OpticalCrank::new(config),
            CrankSensor::new(input),
            Analog::new(adc, p.PC0.degrade_adc(), p.PC3.degrade_adc()),
        )
    };

    #[cfg(feature = "geared-crank")]
    let (crank, sensor, analog) = {
        let config = GearedConfig::default();
        unwrap!(config.validate());
        let sensor = CrankSensor::new(&config);
        (
            GearedCrank::new(config),
            sensor,
            Analog::new(
                adc,
                p.PC0.degrade_adc(),
                p.PC3.degrade_adc(),
                p.PA3.degrade_adc(),
            ),
        )
    };

    unwrap!(spawner.spawn(control_task(crank, sensor, analog)));
}

#[embassy_executor::task]
async fn usb_task(mut usb: UsbDevice<'static, UsbDriver>) -> ! {
    usb.run().await
}

/// Task which owns the instrument and runs one dispatch per crank sample.
///
/// Button presses and USB disconnects are picked up between samples, so nothing else ever touches the voices.
#[embassy_executor::task]
async fn control_task(mut crank: Crank, mut sensor: CrankSensor, mut analog: Analog) -> ! {
    let mut gurdy = Gurdy::new(&GurdyConfig::default());
    let mut dispatcher = SoundDispatcher::default();
    let mut transport = MidiTransport::new(UsbMidiSink);
    let mut display = LogDisplay;
    let vibrato_knob = VibratoKnob::default();

    gurdy.refresh_display(&mut display, true);

    loop {
        if DISCONNECTED.try_take().is_some() {
            dispatcher.silence_all(&mut gurdy, &mut transport, &mut display);
            BUZZ_LED.signal(false);
        }

        while let Ok(button) = PRESSES.try_receive() {
            info!("{} pressed", button);
            match button {
                Button::MelodyMute => gurdy.cycle_melody_mute(&mut transport, &mut display),
                Button::DroneMute => gurdy.cycle_drone_mute(&mut transport, &mut display),
                Button::DroneToggle => gurdy.toggle_drone_mute(&mut transport, &mut display),
                Button::TrompetteToggle => {
                    gurdy.toggle_trompette_mute(&mut transport, &mut display)
                }
                Button::ScreenType => gurdy.cycle_screen_type(&mut display),
            }
        }

        #[cfg(not(feature = "geared-crank"))]
        let sample = sensor.read(&crank, &mut analog).await;
        #[cfg(feature = "geared-crank")]
        let sample = sensor.read(&mut analog).await;
        crank.sample(sample);

        // no keybox is fitted, so the melody always plays at its open note
        let input = CycleInput {
            offset: 0,
            vibrato: Some(vibrato_knob.vibrato(analog.vibrato_knob())),
        };
        let transition =
            dispatcher.dispatch(&mut gurdy, &crank, input, &mut transport, &mut display);
        if let Some(lit) = transition.buzz_indicator() {
            BUZZ_LED.signal(lit);
        }
    }
}
