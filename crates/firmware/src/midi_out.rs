//! Outgoing USB-MIDI.
//!
//! The control loop must never wait on the USB peripheral, so voice commands are encoded into USB-MIDI Event Packets
//! and queued. [`midi_task`] drains the queue into the MIDI class endpoint whenever the host is listening.

use crank_gurdy_lib::voice::MidiSink;
use defmt::{panic, *};
use embassy_stm32::{peripherals, usb};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel, signal::Signal};
use embassy_usb::{class::midi::MidiClass, driver::EndpointError};
use tinyvec::ArrayVec;
use wmidi::MidiMessage;

/// The USB driver the MIDI class runs on.
pub type UsbDriver = usb::Driver<'static, peripherals::USB_OTG_FS>;

/// Largest write accepted by the MIDI class endpoint.
const MAX_PACKET_SIZE: usize = 64;
/// Each USB-MIDI Event Packet is 32 bits long.
const EVENT_PACKET_SIZE: usize = 4;
const QUEUE_DEPTH: usize = 32;

type EventPacket = [u8; EVENT_PACKET_SIZE];

/// Event packets waiting to be written to the host.
static OUTGOING: Channel<CriticalSectionRawMutex, EventPacket, QUEUE_DEPTH> = Channel::new();

/// Raised when the host goes away, so the control loop can reset its voices.
pub static DISCONNECTED: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// A [`MidiSink`] which queues messages for [`midi_task`].
pub struct UsbMidiSink;

impl MidiSink for UsbMidiSink {
    fn send(&mut self, message: MidiMessage<'static>) {
        let Some(packet) = event_packet(&message) else {
            warn!("Cannot encode MIDI message as a single event packet; dropping it");
            return;
        };
        if OUTGOING.try_send(packet).is_err() {
            warn!("Outgoing MIDI queue is full; dropping {}", packet);
        }
    }
}

/// Encodes a channel message as a USB-MIDI Event Packet on cable 0.
///
/// For channel messages the Code Index Number is the high nibble of the status byte.
fn event_packet(message: &MidiMessage) -> Option<EventPacket> {
    let mut bytes = [0_u8; 3];
    match message.copy_to_slice(&mut bytes) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some([bytes[0] >> 4, bytes[0], bytes[1], bytes[2]]),
    }
}

#[doc(hidden)]
struct Disconnected {}

impl From<EndpointError> for Disconnected {
    fn from(val: EndpointError) -> Self {
        match val {
            EndpointError::BufferOverflow => panic!("Buffer overflow"),
            EndpointError::Disabled => Disconnected {},
        }
    }
}

/// Task responsible for writing queued MIDI to the host.
#[embassy_executor::task]
pub async fn midi_task(mut class: MidiClass<'static, UsbDriver>) -> ! {
    loop {
        class.wait_connection().await;
        info!("USB connected");
        // anything queued while nobody was listening is stale
        OUTGOING.clear();
        let _ = forward_midi(&mut class).await;
        info!("USB disconnected");
        DISCONNECTED.signal(());
    }
}

/// Helper function which batches queued event packets into as few writes as possible.
async fn forward_midi<'d, T: usb::Instance + 'd>(
    class: &mut MidiClass<'d, usb::Driver<'d, T>>,
) -> Result<(), Disconnected> {
    loop {
        let mut batch: ArrayVec<[u8; MAX_PACKET_SIZE]> = ArrayVec::new();
        batch.extend_from_slice(&OUTGOING.receive().await);
        while batch.len() + EVENT_PACKET_SIZE <= MAX_PACKET_SIZE {
            match OUTGOING.try_receive() {
                Ok(packet) => batch.extend_from_slice(&packet),
                Err(_) => break,
            }
        }
        class.write_packet(&batch).await?;
    }
}
