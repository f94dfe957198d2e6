//! # MSP Packet Encoder
//!
//! Maps gated axes to MSP channel values and frames them as an
//! `MSP_SET_RAW_RC` request.

use bytes::{BufMut, BytesMut};
use serde::Deserialize;

use super::protocol::*;
use crate::control::GatedAxes;
use crate::error::{RcLinkError, Result};
use crate::frame::{ChannelFrame, WireFrame};

/// Slot order of the four primary axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    /// roll, pitch, throttle, yaw (Betaflight default rcmap)
    #[default]
    Aetr,
    /// roll, pitch, yaw, throttle
    Rpyt,
}

impl ChannelOrder {
    /// Slots of (roll, pitch, yaw, throttle).
    pub fn slots(self) -> (usize, usize, usize, usize) {
        match self {
            ChannelOrder::Aetr => (0, 1, 3, 2),
            ChannelOrder::Rpyt => (0, 1, 2, 3),
        }
    }
}

/// Arm switch slot, right after the four primary axes
pub const AUX1_SLOT: usize = 4;

/// MSP channel mapper and serializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MspEncoder {
    channel_count: usize,
    order: ChannelOrder,
    aux_disarmed: u16,
}

impl Default for MspEncoder {
    fn default() -> Self {
        Self {
            channel_count: 8,
            order: ChannelOrder::default(),
            aux_disarmed: MSP_SWITCH_OFF,
        }
    }
}

impl MspEncoder {
    /// # Errors
    ///
    /// Returns error if `channel_count` is not 8 or 16, or `aux_disarmed`
    /// lies outside 1000..=2000.
    pub fn new(channel_count: usize, order: ChannelOrder, aux_disarmed: Option<u16>) -> Result<Self> {
        if !MSP_CHANNEL_COUNTS.contains(&channel_count) {
            return Err(RcLinkError::MspProtocol(format!(
                "channel count {} not supported (expected 8 or 16)",
                channel_count
            )));
        }

        let aux_disarmed = aux_disarmed.unwrap_or(MSP_SWITCH_OFF);
        if !(MSP_CHANNEL_VALUE_MIN..=MSP_CHANNEL_VALUE_MAX).contains(&aux_disarmed) {
            return Err(RcLinkError::MspProtocol(format!(
                "aux_disarmed {} outside {}..={}",
                aux_disarmed, MSP_CHANNEL_VALUE_MIN, MSP_CHANNEL_VALUE_MAX
            )));
        }

        Ok(Self {
            channel_count,
            order,
            aux_disarmed,
        })
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    /// Maps gated axes to `channel_count` clamped channel values.
    #[must_use]
    pub fn map_channels(&self, axes: &GatedAxes) -> ChannelFrame {
        let (roll, pitch, yaw, throttle) = self.order.slots();
        let mut frame = ChannelFrame::filled(MSP_SWITCH_OFF, self.channel_count);

        if axes.armed {
            frame.set(roll, stick_to_msp(axes.roll));
            frame.set(pitch, stick_to_msp(axes.pitch));
            frame.set(yaw, stick_to_msp(axes.yaw));
            frame.set(throttle, throttle_to_msp(axes.throttle));
            frame.set(AUX1_SLOT, MSP_SWITCH_ON);
        } else {
            frame.set(roll, MSP_CHANNEL_VALUE_CENTER);
            frame.set(pitch, MSP_CHANNEL_VALUE_CENTER);
            frame.set(yaw, MSP_CHANNEL_VALUE_CENTER);
            frame.set(throttle, MSP_CHANNEL_VALUE_MIN);
            frame.set(AUX1_SLOT, self.aux_disarmed);
        }

        frame.clamp_all(MSP_CHANNEL_VALUE_MIN, MSP_CHANNEL_VALUE_MAX);
        frame
    }

    /// Frames channel values as `MSP_SET_RAW_RC`. Values are clamped again
    /// on the way out.
    #[must_use]
    pub fn serialize(&self, frame: &ChannelFrame) -> WireFrame {
        let mut payload = BytesMut::with_capacity(frame.len() * 2);
        for &value in frame.as_slice() {
            payload.put_u16_le(value.clamp(MSP_CHANNEL_VALUE_MIN, MSP_CHANNEL_VALUE_MAX));
        }
        encode_msp_v1(MSP_SET_RAW_RC, &payload)
    }
}

/// Scales a -1..1 stick value. NaN maps to center.
#[must_use]
pub fn stick_to_msp(value: f32) -> u16 {
    scale(value, MSP_CHANNEL_VALUE_CENTER, MSP_STICK_SPAN, MSP_CHANNEL_VALUE_CENTER)
}

/// Scales a 0..1 throttle value. NaN maps to the floor.
#[must_use]
pub fn throttle_to_msp(value: f32) -> u16 {
    scale(value, MSP_CHANNEL_VALUE_MIN, MSP_THROTTLE_SPAN, MSP_CHANNEL_VALUE_MIN)
}

fn scale(value: f32, base: u16, span: f32, nan_value: u16) -> u16 {
    if value.is_nan() {
        return nan_value;
    }
    let v = base as f32 + value * span;
    v.clamp(MSP_CHANNEL_VALUE_MIN as f32, MSP_CHANNEL_VALUE_MAX as f32) as u16
}

/// XOR of the length byte, the id and every payload byte.
#[must_use]
pub fn msp_checksum(id: u8, payload: &[u8]) -> u8 {
    payload
        .iter()
        .fold((payload.len() as u8) ^ id, |acc, &b| acc ^ b)
}

/// Builds a `$M<` request.
///
/// Payloads longer than 255 bytes cannot be described by the v1 length
/// byte; callers stay well below that (32 bytes at 16 channels).
///
/// ```
/// use rc_link::msp::encoder::encode_msp_v1;
///
/// let packet = encode_msp_v1(200, &[0xDC, 0x05]);
/// assert_eq!(&packet[..], &[b'$', b'M', b'<', 2, 200, 0xDC, 0x05, 2 ^ 200 ^ 0xDC ^ 0x05]);
/// ```
#[must_use]
pub fn encode_msp_v1(id: u8, payload: &[u8]) -> WireFrame {
    let mut packet = BytesMut::with_capacity(MSP_OVERHEAD + payload.len());
    packet.put_slice(MSP_HEADER_REQUEST);
    packet.put_u8(payload.len() as u8);
    packet.put_u8(id);
    packet.put_slice(payload);
    packet.put_u8(msp_checksum(id, payload));
    packet.freeze()
}
