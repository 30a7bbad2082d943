//! ESP-NOW transport for badge frames
//!
//! Every frame is broadcast; group filtering happens on receive, so the
//! group set through [`RadioLink::set_group`] is shared with the receive
//! task via [`ACTIVE_GROUP`].

use core::sync::atomic::{AtomicU8, Ordering};

use esp_radio::esp_now::{BROADCAST_ADDRESS, EspNowError, EspNowReceiver, EspNowSender};
use log::debug;

use thermo_badge_core::events::post;
use thermo_badge_core::radio::FrameError;
use thermo_badge_core::{BadgeEvent, EventChannel, RadioFrame, RadioLink, RadioPacket};

/// Group this badge currently listens and sends on.
pub static ACTIVE_GROUP: AtomicU8 = AtomicU8::new(0);

#[derive(Debug)]
pub enum RadioError {
    Frame(FrameError),
    EspNow(EspNowError),
}

impl From<FrameError> for RadioError {
    fn from(e: FrameError) -> Self {
        Self::Frame(e)
    }
}

impl From<EspNowError> for RadioError {
    fn from(e: EspNowError) -> Self {
        Self::EspNow(e)
    }
}

pub struct EspNowLink {
    sender: EspNowSender<'static>,
}

impl EspNowLink {
    pub fn new(sender: EspNowSender<'static>) -> Self {
        Self { sender }
    }
}

impl RadioLink for EspNowLink {
    type Error = RadioError;

    fn set_group(&mut self, group: u8) -> Result<(), Self::Error> {
        ACTIVE_GROUP.store(group, Ordering::Relaxed);
        Ok(())
    }

    fn send_number(&mut self, value: f64) -> Result<(), Self::Error> {
        let group = ACTIVE_GROUP.load(Ordering::Relaxed);
        let bytes = RadioFrame::new(group, RadioPacket::Number(value)).to_vec()?;
        self.sender.send(&BROADCAST_ADDRESS, &bytes)?.wait()?;
        debug!("Broadcast {} on group {}", value, group);
        Ok(())
    }
}

/// Receive frames forever, posting those for the active group as events.
pub async fn run_receiver(
    mut receiver: EspNowReceiver<'static>,
    events: &'static EventChannel,
) -> ! {
    loop {
        let received = receiver.receive_async().await;
        let group = ACTIVE_GROUP.load(Ordering::Relaxed);
        match RadioFrame::decode_for_group(received.data(), group) {
            Ok(packet) => {
                if let Some(event) = BadgeEvent::from_packet(packet) {
                    post(events, event);
                }
            }
            Err(e) => debug!("Dropping radio frame: {}", e),
        }
    }
}
