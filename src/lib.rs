//! # Thermal Bridge Library
//!
//! Control and query a Boson thermal imaging sensor over its byte-oriented
//! command channel.
//!
//! This library implements the sensor's serial link protocol — frame
//! construction, byte-stuffing of reserved marker values, CRC-16 integrity,
//! and the reset/send/receive choreography needed because the sensor
//! multiplexes telemetry and command replies over one channel — plus a typed
//! high-level command API on top.

pub mod config;
pub mod error;
pub mod fslp;
pub mod bus;
pub mod camera;
