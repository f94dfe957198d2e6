//! # MSP Packet Decoder
//!
//! Validates MSP v1 packets in either direction and unpacks
//! `MSP_SET_RAW_RC` payloads.

use super::encoder::msp_checksum;
use super::protocol::*;
use crate::error::{RcLinkError, Result};

/// A validated MSP v1 packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MspPacket {
    /// `true` for `$M<`, `false` for `$M>`
    pub request: bool,
    pub id: u8,
    pub payload: Vec<u8>,
}

/// Decode one complete MSP v1 packet
///
/// # Errors
///
/// Returns error if:
/// - Packet is shorter than header + length + id + checksum
/// - Header is neither `$M<` nor `$M>`
/// - Length byte disagrees with the buffer
/// - Checksum check fails
pub fn decode_packet(packet: &[u8]) -> Result<MspPacket> {
    if packet.len() < MSP_OVERHEAD {
        return Err(RcLinkError::MspProtocol("Packet too short".to_string()));
    }

    let request = match &packet[..3] {
        h if h == MSP_HEADER_REQUEST => true,
        h if h == MSP_HEADER_RESPONSE => false,
        h => {
            return Err(RcLinkError::MspProtocol(format!(
                "Invalid header: {:02X?}",
                h
            )))
        }
    };

    let length = packet[3] as usize;
    if packet.len() != MSP_OVERHEAD + length {
        return Err(RcLinkError::MspProtocol(format!(
            "Length mismatch: expected {} bytes, got {}",
            MSP_OVERHEAD + length,
            packet.len()
        )));
    }

    let id = packet[4];
    let payload = &packet[5..5 + length];
    let received = packet[5 + length];
    let calculated = msp_checksum(id, payload);

    if calculated != received {
        return Err(RcLinkError::MspProtocol(format!(
            "Checksum mismatch: expected 0x{:02X}, got 0x{:02X}",
            calculated, received
        )));
    }

    Ok(MspPacket {
        request,
        id,
        payload: payload.to_vec(),
    })
}

/// Decodes an `MSP_SET_RAW_RC` packet into its channel values.
pub fn decode_raw_rc(packet: &[u8]) -> Result<Vec<u16>> {
    let decoded = decode_packet(packet)?;
    if decoded.id != MSP_SET_RAW_RC {
        return Err(RcLinkError::MspProtocol(format!(
            "Unexpected message id: {}",
            decoded.id
        )));
    }
    if decoded.payload.len() % 2 != 0 {
        return Err(RcLinkError::MspProtocol(format!(
            "Odd RC payload length: {}",
            decoded.payload.len()
        )));
    }

    Ok(decoded
        .payload
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}
