//! # MSP Protocol Module
//!
//! MultiWii Serial Protocol v1 `MSP_SET_RAW_RC` packets for Betaflight-style
//! flight controllers.
//!
//! This module handles:
//! - Mapping gated axes onto 8 or 16 MSP channels (`encoder`)
//! - `$M<` packet framing and XOR checksum (`encoder`)
//! - Packet validation and channel unpacking (`decoder`)

pub mod protocol;
pub mod encoder;
pub mod decoder;
