//! # CRSF Protocol Module
//!
//! Crossfire (CRSF) `RC_CHANNELS_PACKED` frames for ExpressLRS receivers and
//! flight controllers.
//!
//! This module handles:
//! - Mapping gated axes onto 16 CRSF channels (`encoder`)
//! - 11-bit channel packing and frame assembly (`encoder`)
//! - CRC8-DVB-S2 checksum calculation (`crc`)
//! - Frame validation and channel unpacking (`decoder`)

pub mod protocol;
pub mod encoder;
pub mod decoder;
pub mod crc;
