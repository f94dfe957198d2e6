//! # CRSF Protocol Constants and Types
//!
//! Core protocol definitions for CRSF (Crossfire) `RC_CHANNELS_PACKED` frames.
//!
//! ```text
//! +------+--------+------+------------------+-------+
//! | 0xC8 | 0x18   | 0x16 | 22-byte payload  | CRC8  |
//! | sync | length | type | 16 x 11-bit LSB  |       |
//! +------+--------+------+------------------+-------+
//! ```

use crate::error::{RcLinkError, Result};

/// CRSF frame sync byte (always 0xC8)
pub const CRSF_SYNC_BYTE: u8 = 0xC8;

/// RC Channels packet type
pub const CRSF_FRAMETYPE_RC_CHANNELS_PACKED: u8 = 0x16;

/// Maximum CRSF payload size
/// Frame structure: sync(1) + length(1) + type(1) + payload(N) + crc(1)
/// Maximum frame size is 64 bytes, so max payload = 64 - 4 = 60 bytes
pub const CRSF_MAX_PAYLOAD_SIZE: usize = 60;

/// RC channels payload size (22 bytes for 16 channels × 11 bits)
pub const CRSF_RC_CHANNELS_PAYLOAD_SIZE: usize = 22;

/// RC channels frame length field (type + payload + crc)
pub const CRSF_RC_CHANNELS_FRAME_LENGTH: u8 = 0x18; // 24 bytes

/// Complete RC channels frame on the wire
pub const CRSF_RC_CHANNELS_FRAME_SIZE: usize = 26;

/// Number of RC channels
pub const CRSF_NUM_CHANNELS: usize = 16;

/// Bits per packed channel
pub const CRSF_CHANNEL_BITS: u32 = 11;

/// Legal channel range (988us..2012us)
pub const CRSF_CHANNEL_VALUE_MIN: u16 = 191;
pub const CRSF_CHANNEL_VALUE_MAX: u16 = 1792;
/// Stick center (1500us)
pub const CRSF_CHANNEL_VALUE_CENTER: u16 = 992;

/// Stick half-span: -1.0..1.0 maps to 192..1792
pub const CRSF_STICK_SPAN: f32 = 800.0;

/// Throttle span: 0.0..1.0 maps to 191..1791
pub const CRSF_THROTTLE_SPAN: f32 = 1600.0;

/// Switch values
pub const CRSF_SWITCH_OFF: u16 = CRSF_CHANNEL_VALUE_MIN;
pub const CRSF_SWITCH_ON: u16 = CRSF_CHANNEL_VALUE_MAX;

/// RC channels array type (16 channels, 11-bit values)
pub type RcChannels = [u16; CRSF_NUM_CHANNELS];

/// Channel slots in an RC channels frame
pub mod channels {
    pub const ROLL: usize = 0;
    pub const PITCH: usize = 1;
    pub const YAW: usize = 2;
    pub const THROTTLE: usize = 3;
    /// Arm switch
    pub const AUX1: usize = 4;
}

/// A validated CRSF frame (type + payload)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrsfFrame {
    /// Frame type
    pub frame_type: u8,

    /// Payload data
    pub payload: Vec<u8>,
}

impl CrsfFrame {
    /// # Errors
    ///
    /// Returns error if payload exceeds CRSF_MAX_PAYLOAD_SIZE (60 bytes)
    pub fn new(frame_type: u8, payload: Vec<u8>) -> Result<Self> {
        if payload.len() > CRSF_MAX_PAYLOAD_SIZE {
            return Err(RcLinkError::CrsfProtocol(format!(
                "Payload size {} exceeds maximum {}",
                payload.len(),
                CRSF_MAX_PAYLOAD_SIZE
            )));
        }

        Ok(Self {
            frame_type,
            payload,
        })
    }

    /// Value of the length byte (type + payload + crc)
    pub fn length(&self) -> u8 {
        (1 + self.payload.len() + 1) as u8
    }
}
