//! # CRSF Packet Encoder
//!
//! Maps gated axes to CRSF channel values and packs them into an
//! `RC_CHANNELS_PACKED` frame.
//!
//! ## Channel mapping
//!
//! | Slot | Armed | Disarmed |
//! |------|-------|----------|
//! | 0 Roll | `992 + v*800` | 992 |
//! | 1 Pitch | `992 + v*800` | 992 |
//! | 2 Yaw | `992 + v*800` | 992 |
//! | 3 Throttle | `191 + v*1600` | 191 |
//! | 4 AUX1 (arm) | 1792 | 191 (configurable) |
//! | 5-15 | 191 | 191 |
//!
//! Every value is clamped to 191..=1792 before packing.

use bytes::{BufMut, BytesMut};

use super::crc::Crc8;
use super::protocol::*;
use crate::control::GatedAxes;
use crate::error::{RcLinkError, Result};
use crate::frame::{ChannelFrame, WireFrame};

/// CRSF channel mapper and serializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrsfEncoder {
    aux_disarmed: u16,
}

impl Default for CrsfEncoder {
    fn default() -> Self {
        Self {
            aux_disarmed: CRSF_SWITCH_OFF,
        }
    }
}

impl CrsfEncoder {
    /// # Arguments
    ///
    /// * `aux_disarmed` - AUX1 value while disarmed, defaults to 191
    ///
    /// # Errors
    ///
    /// Returns error if `aux_disarmed` is outside 191..=1792
    pub fn new(aux_disarmed: Option<u16>) -> Result<Self> {
        let aux_disarmed = aux_disarmed.unwrap_or(CRSF_SWITCH_OFF);
        if !(CRSF_CHANNEL_VALUE_MIN..=CRSF_CHANNEL_VALUE_MAX).contains(&aux_disarmed) {
            return Err(RcLinkError::CrsfProtocol(format!(
                "aux_disarmed {} outside {}..={}",
                aux_disarmed, CRSF_CHANNEL_VALUE_MIN, CRSF_CHANNEL_VALUE_MAX
            )));
        }
        Ok(Self { aux_disarmed })
    }

    /// Maps gated axes to 16 clamped channel values.
    #[must_use]
    pub fn map_channels(&self, axes: &GatedAxes) -> ChannelFrame {
        let mut frame = ChannelFrame::filled(CRSF_SWITCH_OFF, CRSF_NUM_CHANNELS);

        if axes.armed {
            frame.set(channels::ROLL, stick_to_crsf(axes.roll));
            frame.set(channels::PITCH, stick_to_crsf(axes.pitch));
            frame.set(channels::YAW, stick_to_crsf(axes.yaw));
            frame.set(channels::THROTTLE, throttle_to_crsf(axes.throttle));
            frame.set(channels::AUX1, CRSF_SWITCH_ON);
        } else {
            frame.set(channels::ROLL, CRSF_CHANNEL_VALUE_CENTER);
            frame.set(channels::PITCH, CRSF_CHANNEL_VALUE_CENTER);
            frame.set(channels::YAW, CRSF_CHANNEL_VALUE_CENTER);
            frame.set(channels::THROTTLE, CRSF_CHANNEL_VALUE_MIN);
            frame.set(channels::AUX1, self.aux_disarmed);
        }

        frame.clamp_all(CRSF_CHANNEL_VALUE_MIN, CRSF_CHANNEL_VALUE_MAX);
        frame
    }

    /// Packs a channel frame. Missing slots are sent as 191.
    #[must_use]
    pub fn serialize(&self, frame: &ChannelFrame) -> WireFrame {
        let mut channels: RcChannels = [CRSF_CHANNEL_VALUE_MIN; CRSF_NUM_CHANNELS];
        for (dst, &src) in channels.iter_mut().zip(frame.as_slice()) {
            *dst = src;
        }
        encode_rc_channels_frame(&channels)
    }
}

/// Scales a -1..1 stick value. NaN maps to center.
#[must_use]
pub fn stick_to_crsf(value: f32) -> u16 {
    scale(value, CRSF_CHANNEL_VALUE_CENTER, CRSF_STICK_SPAN, CRSF_CHANNEL_VALUE_CENTER)
}

/// Scales a 0..1 throttle value. NaN maps to the floor.
#[must_use]
pub fn throttle_to_crsf(value: f32) -> u16 {
    scale(value, CRSF_CHANNEL_VALUE_MIN, CRSF_THROTTLE_SPAN, CRSF_CHANNEL_VALUE_MIN)
}

fn scale(value: f32, base: u16, span: f32, nan_value: u16) -> u16 {
    if value.is_nan() {
        return nan_value;
    }
    let v = base as f32 + value * span;
    v.clamp(CRSF_CHANNEL_VALUE_MIN as f32, CRSF_CHANNEL_VALUE_MAX as f32) as u16
}

/// Clamp a channel value to the legal CRSF range (191-1792)
#[inline]
pub fn clamp_channel_value(value: u16) -> u16 {
    value.clamp(CRSF_CHANNEL_VALUE_MIN, CRSF_CHANNEL_VALUE_MAX)
}

/// Encode RC channels into a complete CRSF frame
///
/// # Returns
///
/// 26 bytes: sync + length + type + 22-byte payload + crc
///
/// # Examples
///
/// ```
/// use rc_link::crsf::encoder::encode_rc_channels_frame;
///
/// let frame = encode_rc_channels_frame(&[992u16; 16]);
/// assert_eq!(frame.len(), 26);
/// assert_eq!(frame[1], 24);
/// ```
pub fn encode_rc_channels_frame(channels: &RcChannels) -> WireFrame {
    let payload = encode_rc_channels_payload(channels);

    let mut crc = Crc8::new();
    crc.update(&[CRSF_FRAMETYPE_RC_CHANNELS_PACKED]);
    crc.update(&payload);

    let mut frame = BytesMut::with_capacity(CRSF_RC_CHANNELS_FRAME_SIZE);
    frame.put_u8(CRSF_SYNC_BYTE);
    frame.put_u8(CRSF_RC_CHANNELS_FRAME_LENGTH);
    frame.put_u8(CRSF_FRAMETYPE_RC_CHANNELS_PACKED);
    frame.put_slice(&payload);
    frame.put_u8(crc.finish());
    frame.freeze()
}

/// Packs 16 channels into 22 bytes.
///
/// Values are clamped to 191..=1792 and written as one continuous
/// little-endian bitstream, 11 bits per channel, no padding:
///
/// ```text
/// Byte 0: Ch1[0:7]
/// Byte 1: Ch1[8:10] | Ch2[0:4]
/// Byte 2: Ch2[5:10] | Ch3[0:1]
/// ...
/// ```
pub fn encode_rc_channels_payload(channels: &RcChannels) -> [u8; CRSF_RC_CHANNELS_PAYLOAD_SIZE] {
    let mut payload = [0u8; CRSF_RC_CHANNELS_PAYLOAD_SIZE];
    let mut acc: u32 = 0;
    let mut acc_bits: u32 = 0;
    let mut out = 0;

    for &channel in channels {
        acc |= u32::from(clamp_channel_value(channel)) << acc_bits;
        acc_bits += CRSF_CHANNEL_BITS;

        while acc_bits >= 8 {
            payload[out] = acc as u8;
            acc >>= 8;
            acc_bits -= 8;
            out += 1;
        }
    }

    payload
}
