//! # Error Types
//!
//! Custom error types for Thermal Bridge using `thiserror`.

use thiserror::Error;

/// Main error type for Thermal Bridge
#[derive(Debug, Error)]
pub enum ThermalBridgeError {
    /// No terminator cell pair was found within the frame bound
    #[error("framing error: no terminator within {0} cells")]
    NoTerminator(usize),

    /// Fewer bytes were captured than the minimum response layout requires
    #[error("truncated response: got {got} bytes, need {need}")]
    Truncated { got: usize, need: usize },

    /// The device's status word was non-zero; raw code preserved
    #[error("device returned status 0x{0:08X}")]
    Device(u32),

    /// A hexadecimal command body string could not be parsed
    #[error("invalid command body: {0}")]
    InvalidCommandBody(String),

    /// Bus channel write/read failure with context
    #[error("bus error: {0}")]
    Bus(String),

    /// None of the candidate serial device paths could be opened
    #[error("serial port not found, tried: {0}")]
    PortNotFound(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Thermal Bridge
pub type Result<T> = std::result::Result<T, ThermalBridgeError>;
