//! # FSLP Protocol Module
//!
//! Implementation of the Boson serial link protocol (FSLP) used to control
//! and query the thermal sensor over its byte-oriented command channel.
//!
//! This module handles:
//! - Command frame construction (preamble, body, value, CRC, terminator)
//! - Byte-stuffing of the three reserved marker values
//! - CRC-16 checksum calculation with the protocol seed
//! - Scanning the multiplexed response stream for start/end markers

pub mod protocol;
pub mod crc;
pub mod escape;
pub mod encoder;
pub mod decoder;
