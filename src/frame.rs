//! # Frame Encoding
//!
//! Protocol-independent frame types and the encoder selected at startup.
//!
//! Each transmitter tick goes:
//!
//! ```text
//! GatedAxes --map_channels--> ChannelFrame --serialize--> WireFrame
//! ```
//!
//! ```
//! use rc_link::control::GatedAxes;
//! use rc_link::crsf::encoder::CrsfEncoder;
//! use rc_link::frame::FrameEncoder;
//!
//! let encoder = FrameEncoder::Crsf(CrsfEncoder::default());
//! let wire = encoder.encode(&GatedAxes::SAFE);
//! assert_eq!(wire.len(), 26);
//! ```

use bytes::Bytes;
use serde::Deserialize;

use crate::config::LinkConfig;
use crate::control::GatedAxes;
use crate::crsf::encoder::CrsfEncoder;
use crate::error::Result;
use crate::msp::encoder::MspEncoder;

/// Largest channel count any supported protocol carries.
pub const MAX_CHANNELS: usize = 16;

/// Bytes ready for the serial port. Built once per tick and discarded.
pub type WireFrame = Bytes;

/// Wire protocol spoken to the flight controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Crsf,
    Msp,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Crsf => f.write_str("CRSF"),
            Protocol::Msp => f.write_str("MSP"),
        }
    }
}

impl std::str::FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "crsf" => Ok(Protocol::Crsf),
            "msp" => Ok(Protocol::Msp),
            other => Err(format!("unknown protocol '{}' (expected crsf or msp)", other)),
        }
    }
}

/// Fixed-length, ordered channel pulse values for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelFrame {
    values: [u16; MAX_CHANNELS],
    len: usize,
}

impl ChannelFrame {
    /// `len` channels all set to `value`. `len` is capped at [`MAX_CHANNELS`].
    #[must_use]
    pub fn filled(value: u16, len: usize) -> Self {
        Self {
            values: [value; MAX_CHANNELS],
            len: len.min(MAX_CHANNELS),
        }
    }

    /// Copies up to [`MAX_CHANNELS`] values.
    #[must_use]
    pub fn from_slice(values: &[u16]) -> Self {
        let mut frame = Self::filled(0, values.len());
        frame.values[..frame.len].copy_from_slice(&values[..frame.len]);
        frame
    }

    #[inline]
    pub fn as_slice(&self) -> &[u16] {
        &self.values[..self.len]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> Option<u16> {
        self.as_slice().get(index).copied()
    }

    /// Sets a slot. Out-of-range indices are ignored.
    pub fn set(&mut self, index: usize, value: u16) {
        if index < self.len {
            self.values[index] = value;
        }
    }

    /// Clamps every slot into `min..=max`.
    pub fn clamp_all(&mut self, min: u16, max: u16) {
        for v in &mut self.values[..self.len] {
            *v = (*v).clamp(min, max);
        }
    }
}

/// Protocol encoder chosen once from configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameEncoder {
    Crsf(CrsfEncoder),
    Msp(MspEncoder),
}

impl FrameEncoder {
    /// Builds the encoder the link section asks for.
    pub fn from_config(link: &LinkConfig) -> Result<Self> {
        match link.protocol {
            Protocol::Crsf => Ok(FrameEncoder::Crsf(CrsfEncoder::new(link.aux_disarmed)?)),
            Protocol::Msp => Ok(FrameEncoder::Msp(MspEncoder::new(
                link.msp_channel_count,
                link.msp_channel_order,
                link.aux_disarmed,
            )?)),
        }
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            FrameEncoder::Crsf(_) => Protocol::Crsf,
            FrameEncoder::Msp(_) => Protocol::Msp,
        }
    }

    /// Maps gated axes to clamped channel values.
    #[must_use]
    pub fn map_channels(&self, axes: &GatedAxes) -> ChannelFrame {
        match self {
            FrameEncoder::Crsf(enc) => enc.map_channels(axes),
            FrameEncoder::Msp(enc) => enc.map_channels(axes),
        }
    }

    /// Serializes channel values into wire bytes.
    #[must_use]
    pub fn serialize(&self, frame: &ChannelFrame) -> WireFrame {
        match self {
            FrameEncoder::Crsf(enc) => enc.serialize(frame),
            FrameEncoder::Msp(enc) => enc.serialize(frame),
        }
    }

    #[must_use]
    pub fn encode(&self, axes: &GatedAxes) -> WireFrame {
        self.serialize(&self.map_channels(axes))
    }

    /// The disarmed frame sent on shutdown.
    #[must_use]
    pub fn safe_frame(&self) -> WireFrame {
        self.encode(&GatedAxes::SAFE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msp::encoder::ChannelOrder;

    #[test]
    fn test_channel_frame_filled_caps_len() {
        let frame = ChannelFrame::filled(1500, 40);
        assert_eq!(frame.len(), MAX_CHANNELS);
        assert!(frame.as_slice().iter().all(|&v| v == 1500));
    }

    #[test]
    fn test_channel_frame_set_and_get() {
        let mut frame = ChannelFrame::filled(0, 8);
        frame.set(3, 1234);
        frame.set(12, 999); // past len, ignored
        assert_eq!(frame.get(3), Some(1234));
        assert_eq!(frame.get(12), None);
        assert_eq!(frame.len(), 8);
    }

    #[test]
    fn test_channel_frame_clamp_all() {
        let mut frame = ChannelFrame::from_slice(&[0, 1500, 5000]);
        frame.clamp_all(1000, 2000);
        assert_eq!(frame.as_slice(), &[1000, 1500, 2000]);
    }

    #[test]
    fn test_protocol_from_str() {
        assert_eq!("crsf".parse::<Protocol>(), Ok(Protocol::Crsf));
        assert_eq!("MSP".parse::<Protocol>(), Ok(Protocol::Msp));
        assert!("sbus".parse::<Protocol>().is_err());
    }

    #[test]
    fn test_from_config_selects_protocol() {
        let mut link = LinkConfig::default();
        link.protocol = Protocol::Msp;
        let encoder = FrameEncoder::from_config(&link).unwrap();
        assert_eq!(encoder.protocol(), Protocol::Msp);
        assert_eq!(encoder.map_channels(&GatedAxes::SAFE).len(), 8);

        link.protocol = Protocol::Crsf;
        let encoder = FrameEncoder::from_config(&link).unwrap();
        assert_eq!(encoder.protocol(), Protocol::Crsf);
        assert_eq!(encoder.map_channels(&GatedAxes::SAFE).len(), 16);
    }

    #[test]
    fn test_safe_frames_differ_by_protocol() {
        let crsf = FrameEncoder::Crsf(CrsfEncoder::default());
        let msp = FrameEncoder::Msp(MspEncoder::new(8, ChannelOrder::Aetr, None).unwrap());

        assert_eq!(crsf.safe_frame()[0], 0xC8);
        assert_eq!(&msp.safe_frame()[..3], b"$M<");
    }
}
