//! Radio packets, frame codec and the radio port
//!
//! Badges share a broadcast domain selected by a numeric group. There is no
//! addressing, sender identity or delivery guarantee: every frame is a
//! postcard-encoded [`RadioFrame`] carrying the sender's group, and
//! receivers drop frames for other groups.

use core::fmt::Debug;

use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

/// Field names a value message may refer to, looked up by name index.
pub const ALLOWED_NAMES: [&str; 3] = ["temperature", "upperLimit", "lowerLimit"];

/// Largest encoded frame. Fits an ESP-NOW payload with room to spare.
pub const MAX_FRAME_LEN: usize = 32;

/// Resolve a name index to its field name.
pub fn allowed_name(index: u8) -> Option<&'static str> {
    ALLOWED_NAMES.get(usize::from(index)).copied()
}

/// A `(name, value)` pair sent by a peer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueMessage {
    /// Index into [`ALLOWED_NAMES`]
    pub name: u8,
    pub value: Option<f64>,
}

impl ValueMessage {
    pub const fn new(name: u8, value: Option<f64>) -> Self {
        Self { name, value }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RadioPacket {
    /// A bare number, as broadcast at startup
    Number(f64),
    /// A named value
    Value(ValueMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadioFrame {
    pub group: u8,
    pub packet: RadioPacket,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame does not fit the buffer")]
    Encode,
    #[error("malformed frame")]
    Decode,
    #[error("frame for group {got}, listening on {expected}")]
    WrongGroup { expected: u8, got: u8 },
}

impl RadioFrame {
    pub const fn new(group: u8, packet: RadioPacket) -> Self {
        Self { group, packet }
    }

    /// Encode into `buf`, returning the used prefix.
    pub fn encode<'b>(&self, buf: &'b mut [u8]) -> Result<&'b mut [u8], FrameError> {
        postcard::to_slice(self, buf).map_err(|_| FrameError::Encode)
    }

    /// Encode into a fixed-size frame buffer.
    pub fn to_vec(&self) -> Result<heapless::Vec<u8, MAX_FRAME_LEN>, FrameError> {
        let mut buf = [0u8; MAX_FRAME_LEN];
        let used = self.encode(&mut buf)?;
        heapless::Vec::from_slice(used).map_err(|_| FrameError::Encode)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        postcard::from_bytes(bytes).map_err(|_| FrameError::Decode)
    }

    /// Decode a frame and accept it only if it was sent on `group`.
    pub fn decode_for_group(bytes: &[u8], group: u8) -> Result<RadioPacket, FrameError> {
        let frame = Self::decode(bytes)?;
        if frame.group != group {
            return Err(FrameError::WrongGroup {
                expected: group,
                got: frame.group,
            });
        }
        Ok(frame.packet)
    }
}

/// Port for the outbound side of the radio.
///
/// Inbound packets arrive as events (see [`crate::events::BadgeEvent`]).
pub trait RadioLink {
    type Error: Debug;

    /// Join a broadcast group. Only badges on the same group hear each other.
    fn set_group(&mut self, group: u8) -> Result<(), Self::Error>;

    /// Broadcast a single number to the current group.
    fn send_number(&mut self, value: f64) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_names_by_index() {
        assert_eq!(allowed_name(0), Some("temperature"));
        assert_eq!(allowed_name(1), Some("upperLimit"));
        assert_eq!(allowed_name(2), Some("lowerLimit"));
        assert_eq!(allowed_name(3), None);
        assert_eq!(allowed_name(255), None);
    }

    #[test]
    fn test_frame_for_own_group() {
        let frame = RadioFrame::new(
            21,
            RadioPacket::Value(ValueMessage::new(0, Some(24.0))),
        );
        let bytes = frame.to_vec().unwrap();
        assert!(bytes.len() <= MAX_FRAME_LEN);
        assert_eq!(
            RadioFrame::decode_for_group(&bytes, 21),
            Ok(RadioPacket::Value(ValueMessage::new(0, Some(24.0))))
        );
    }

    #[test]
    fn test_frame_for_other_group_is_rejected() {
        let bytes = RadioFrame::new(7, RadioPacket::Number(19.0)).to_vec().unwrap();
        assert_eq!(
            RadioFrame::decode_for_group(&bytes, 21),
            Err(FrameError::WrongGroup {
                expected: 21,
                got: 7
            })
        );
    }

    #[test]
    fn test_malformed_frame() {
        assert_eq!(RadioFrame::decode(&[]), Err(FrameError::Decode));
        // group byte followed by an unknown packet variant
        assert_eq!(RadioFrame::decode(&[21, 9]), Err(FrameError::Decode));
    }

    #[test]
    fn test_encode_into_short_buffer() {
        let frame = RadioFrame::new(21, RadioPacket::Number(1.0));
        let mut buf = [0u8; 2];
        assert_eq!(frame.encode(&mut buf), Err(FrameError::Encode));
    }
}
