//! # MSP v1 Protocol Constants
//!
//! ```text
//! +-----+-----+-----+--------+------+-------------------+----------+
//! | '$' | 'M' | '<' | length | id   | payload (length)  | checksum |
//! +-----+-----+-----+--------+------+-------------------+----------+
//! ```
//!
//! `checksum = length ^ id ^ payload[0] ^ ... ^ payload[n-1]`

/// Request header (host to flight controller)
pub const MSP_HEADER_REQUEST: &[u8; 3] = b"$M<";

/// Response header (flight controller to host)
pub const MSP_HEADER_RESPONSE: &[u8; 3] = b"$M>";

/// Set raw RC channels
pub const MSP_SET_RAW_RC: u8 = 200;

/// header(3) + length(1) + id(1) + checksum(1)
pub const MSP_OVERHEAD: usize = 6;

/// Largest payload a v1 length byte can describe
pub const MSP_MAX_PAYLOAD_SIZE: usize = 255;

/// Legal channel range (microseconds)
pub const MSP_CHANNEL_VALUE_MIN: u16 = 1000;
pub const MSP_CHANNEL_VALUE_MAX: u16 = 2000;
pub const MSP_CHANNEL_VALUE_CENTER: u16 = 1500;

/// Stick half-span: -1.0..1.0 maps to 1000..2000
pub const MSP_STICK_SPAN: f32 = 500.0;

/// Throttle span: 0.0..1.0 maps to 1000..2000
pub const MSP_THROTTLE_SPAN: f32 = 1000.0;

/// Switch values
pub const MSP_SWITCH_OFF: u16 = MSP_CHANNEL_VALUE_MIN;
pub const MSP_SWITCH_ON: u16 = MSP_CHANNEL_VALUE_MAX;

/// Supported channel counts
pub const MSP_CHANNEL_COUNTS: [usize; 2] = [8, 16];
