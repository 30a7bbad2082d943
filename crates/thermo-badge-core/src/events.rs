//! Events dispatched to the badge handlers
//!
//! Interrupt-side producers (button edges, the radio receive path) post
//! events into an [`EventChannel`]; the [`crate::Runtime`] drains it from
//! the main loop in arrival order.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::radio::{RadioPacket, ValueMessage};

/// Pending events the channel can hold before new ones are dropped.
pub const EVENT_QUEUE_DEPTH: usize = 8;

pub type EventChannel = Channel<CriticalSectionRawMutex, BadgeEvent, EVENT_QUEUE_DEPTH>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BadgeEvent {
    ButtonA,
    ButtonB,
    /// A `(name, value)` pair heard on the radio group
    Radio(ValueMessage),
    /// The reminder interval elapsed
    TimerTick,
}

impl BadgeEvent {
    /// Map an inbound radio packet to an event.
    ///
    /// Bare numbers carry no name index and are not dispatched.
    pub fn from_packet(packet: RadioPacket) -> Option<Self> {
        match packet {
            RadioPacket::Value(message) => Some(Self::Radio(message)),
            RadioPacket::Number(value) => {
                log::debug!("Ignoring bare number {} from radio", value);
                None
            }
        }
    }
}

/// Queue an event without waiting. Returns `false` if the queue was full
/// and the event was dropped.
pub fn post(channel: &EventChannel, event: BadgeEvent) -> bool {
    match channel.try_send(event) {
        Ok(()) => true,
        Err(_) => {
            log::warn!("Event queue full, dropping {:?}", event);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_packet_becomes_radio_event() {
        let message = ValueMessage::new(1, Some(5.0));
        assert_eq!(
            BadgeEvent::from_packet(RadioPacket::Value(message)),
            Some(BadgeEvent::Radio(message))
        );
        assert_eq!(BadgeEvent::from_packet(RadioPacket::Number(20.0)), None);
    }

    #[test]
    fn test_post_drops_when_full() {
        let channel = EventChannel::new();
        for _ in 0..EVENT_QUEUE_DEPTH {
            assert!(post(&channel, BadgeEvent::ButtonA));
        }
        assert!(!post(&channel, BadgeEvent::ButtonB));
        assert_eq!(channel.try_receive(), Ok(BadgeEvent::ButtonA));
    }
}
