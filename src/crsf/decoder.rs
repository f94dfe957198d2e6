//! # CRSF Packet Decoder
//!
//! Validates CRSF frames and unpacks `RC_CHANNELS_PACKED` payloads. Used to
//! check what actually goes out on the wire.

use super::crc::Crc8;
use super::protocol::*;
use crate::error::{RcLinkError, Result};

/// Decode a complete CRSF frame
///
/// # Arguments
///
/// * `frame` - Complete CRSF frame bytes (including sync, length, type, payload, crc)
///
/// # Errors
///
/// Returns error if:
/// - Frame is too short
/// - Sync byte is incorrect
/// - Length byte disagrees with the buffer
/// - CRC check fails
pub fn decode_frame(frame: &[u8]) -> Result<CrsfFrame> {
    // sync(1) + length(1) + type(1) + crc(1)
    if frame.len() < 4 {
        return Err(RcLinkError::CrsfProtocol("Frame too short".to_string()));
    }

    if frame[0] != CRSF_SYNC_BYTE {
        return Err(RcLinkError::CrsfProtocol(format!(
            "Invalid sync byte: 0x{:02X}",
            frame[0]
        )));
    }

    let length = frame[1] as usize;
    if length < 2 || frame.len() < 2 + length {
        return Err(RcLinkError::CrsfProtocol(format!(
            "Frame too short: expected {} bytes, got {}",
            2 + length,
            frame.len()
        )));
    }

    // Type + payload, sync and length excluded
    let checked = &frame[2..1 + length];
    let received_crc = frame[1 + length];

    let mut crc = Crc8::new();
    crc.update(checked);
    let calculated_crc = crc.finish();

    if calculated_crc != received_crc {
        return Err(RcLinkError::CrsfProtocol(format!(
            "CRC mismatch: expected 0x{:02X}, got 0x{:02X}",
            calculated_crc, received_crc
        )));
    }

    CrsfFrame::new(checked[0], checked[1..].to_vec())
}

/// Unpacks 16 11-bit channels from a 22-byte payload.
pub fn unpack_rc_channels(payload: &[u8]) -> Result<RcChannels> {
    if payload.len() < CRSF_RC_CHANNELS_PAYLOAD_SIZE {
        return Err(RcLinkError::CrsfProtocol(format!(
            "RC channels payload too short: {} bytes",
            payload.len()
        )));
    }

    let mut channels: RcChannels = [0; CRSF_NUM_CHANNELS];
    let mut acc: u32 = 0;
    let mut acc_bits: u32 = 0;
    let mut bytes = payload.iter();

    for ch in channels.iter_mut() {
        while acc_bits < CRSF_CHANNEL_BITS {
            // Length checked above
            let byte = bytes.next().copied().unwrap_or(0);
            acc |= u32::from(byte) << acc_bits;
            acc_bits += 8;
        }
        *ch = (acc & 0x07FF) as u16;
        acc >>= CRSF_CHANNEL_BITS;
        acc_bits -= CRSF_CHANNEL_BITS;
    }

    Ok(channels)
}

/// Decodes a full `RC_CHANNELS_PACKED` frame back into channel values.
pub fn decode_rc_channels_frame(frame: &[u8]) -> Result<RcChannels> {
    let decoded = decode_frame(frame)?;
    if decoded.frame_type != CRSF_FRAMETYPE_RC_CHANNELS_PACKED {
        return Err(RcLinkError::CrsfProtocol(format!(
            "Unexpected frame type: 0x{:02X}",
            decoded.frame_type
        )));
    }
    unpack_rc_channels(&decoded.payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crsf::encoder::encode_rc_channels_frame;

    #[test]
    fn test_decode_frame_too_short() {
        let frame = [CRSF_SYNC_BYTE, 0x03];
        assert!(decode_frame(&frame).is_err());
    }

    #[test]
    fn test_decode_frame_invalid_sync() {
        let frame = [0xFF, 0x03, 0x16, 0x00];
        assert!(decode_frame(&frame).is_err());
    }

    #[test]
    fn test_decode_frame_truncated() {
        let frame = encode_rc_channels_frame(&[CRSF_CHANNEL_VALUE_CENTER; CRSF_NUM_CHANNELS]);
        assert!(decode_frame(&frame[..20]).is_err());
    }

    #[test]
    fn test_decode_valid_rc_channels_frame() {
        let channels = [CRSF_CHANNEL_VALUE_CENTER; CRSF_NUM_CHANNELS];
        let frame = encode_rc_channels_frame(&channels);

        let decoded = decode_frame(&frame).unwrap();
        assert_eq!(decoded.frame_type, CRSF_FRAMETYPE_RC_CHANNELS_PACKED);
        assert_eq!(decoded.payload.len(), 22);
        assert_eq!(decoded.length(), CRSF_RC_CHANNELS_FRAME_LENGTH);
    }

    #[test]
    fn test_decode_frame_crc_error() {
        let channels = [CRSF_CHANNEL_VALUE_CENTER; CRSF_NUM_CHANNELS];
        let mut frame = encode_rc_channels_frame(&channels).to_vec();

        // Corrupt CRC
        frame[25] ^= 0xFF;
        assert!(decode_frame(&frame).is_err());
    }

    #[test]
    fn test_decode_frame_payload_corruption() {
        let mut frame = encode_rc_channels_frame(&[1200; CRSF_NUM_CHANNELS]).to_vec();
        frame[10] ^= 0x01;
        assert!(decode_rc_channels_frame(&frame).is_err());
    }

    #[test]
    fn test_crc_excludes_length_byte() {
        let frame = encode_rc_channels_frame(&[CRSF_CHANNEL_VALUE_CENTER; CRSF_NUM_CHANNELS]);
        let expected = crate::crsf::crc::crc8_dvb_s2(&frame[2..25]);
        assert_eq!(frame[25], expected);
    }

    #[test]
    fn test_unpack_short_payload() {
        assert!(unpack_rc_channels(&[0u8; 21]).is_err());
    }

    #[test]
    fn test_wrong_frame_type_rejected() {
        // type 0x14 (link statistics) with a valid CRC
        let mut frame = vec![CRSF_SYNC_BYTE, 0x04, 0x14, 0x01, 0x02];
        let crc = crate::crsf::crc::crc8_dvb_s2(&frame[2..5]);
        frame.push(crc);
        assert!(decode_frame(&frame).is_ok());
        assert!(decode_rc_channels_frame(&frame).is_err());
    }
}
