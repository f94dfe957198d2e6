//! # Error Types
//!
//! Custom error types for RC Link using `thiserror`.

use thiserror::Error;

/// Main error type for RC Link
#[derive(Debug, Error)]
pub enum RcLinkError {
    /// Configuration value out of range or inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port open/write errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// None of the candidate serial paths could be opened
    #[error("No serial device could be opened (tried: {0})")]
    SerialPortNotFound(String),

    /// Input device errors
    #[error("Controller error: {0}")]
    Controller(String),

    /// No matching input device
    #[error("Controller not found: {0}")]
    ControllerNotFound(String),

    /// CRSF protocol errors
    #[error("CRSF protocol error: {0}")]
    CrsfProtocol(String),

    /// MSP protocol errors
    #[error("MSP protocol error: {0}")]
    MspProtocol(String),
}

/// Result type alias for RC Link
pub type Result<T> = std::result::Result<T, RcLinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RcLinkError::SerialPortNotFound("/dev/ttyACM0, /dev/ttyUSB0".to_string());
        assert_eq!(
            err.to_string(),
            "No serial device could be opened (tried: /dev/ttyACM0, /dev/ttyUSB0)"
        );

        let err = RcLinkError::Config("alpha must be in (0, 1]".to_string());
        assert!(err.to_string().starts_with("Configuration error"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let err: RcLinkError = io.into();
        assert!(matches!(err, RcLinkError::Io(_)));
    }
}
