//! Trait abstraction for serial port operations to enable testing

use async_trait::async_trait;
use std::io;
use tokio_serial::{SerialPort, SerialPortBuilderExt};
use tracing::debug;

use crate::error::{RcLinkError, Result};

/// Trait for serial port I/O operations
#[async_trait]
pub trait SerialPortIO: Send {
    /// Write all data to the port
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flush the output buffer
    async fn flush(&mut self) -> io::Result<()>;
}

/// Opens one candidate path. Implemented by the real tokio-serial opener
/// and by test doubles.
#[cfg_attr(test, mockall::automock)]
pub trait PortOpener: Send {
    fn open(&self, path: &str, baud_rate: u32) -> Result<Box<dyn SerialPortIO>>;
}

/// Wrapper around tokio_serial::SerialStream that implements SerialPortIO
pub struct TokioSerialPort {
    port: tokio_serial::SerialStream,
}

impl TokioSerialPort {
    pub fn new(port: tokio_serial::SerialStream) -> Self {
        Self { port }
    }
}

#[async_trait]
impl SerialPortIO for TokioSerialPort {
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        use tokio::io::AsyncWriteExt;
        self.port.write_all(data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        use tokio::io::AsyncWriteExt;
        self.port.flush().await
    }
}

/// Opens real devices: 8N1, no flow control, DTR and RTS asserted.
///
/// Must be called from inside a tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPortOpener;

impl PortOpener for TokioPortOpener {
    fn open(&self, path: &str, baud_rate: u32) -> Result<Box<dyn SerialPortIO>> {
        let mut port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| RcLinkError::Serial(format!("Failed to open {}: {}", path, e)))?;

        // Some USB CDC bridges only pass data with these lines up
        if let Err(e) = port.write_data_terminal_ready(true) {
            debug!("Could not assert DTR on {}: {}", path, e);
        }
        if let Err(e) = port.write_request_to_send(true) {
            debug!("Could not assert RTS on {}: {}", path, e);
        }

        Ok(Box::new(TokioSerialPort::new(port)))
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock serial port for testing
    #[derive(Clone)]
    pub struct MockSerialPort {
        pub written_data: Arc<Mutex<Vec<Vec<u8>>>>,
        pub write_error: Arc<Mutex<Option<io::ErrorKind>>>,
        pub flush_error: Arc<Mutex<Option<io::ErrorKind>>>,
    }

    impl MockSerialPort {
        pub fn new() -> Self {
            Self {
                written_data: Arc::new(Mutex::new(Vec::new())),
                write_error: Arc::new(Mutex::new(None)),
                flush_error: Arc::new(Mutex::new(None)),
            }
        }

        pub fn get_written_data(&self) -> Vec<Vec<u8>> {
            self.written_data.lock().unwrap().clone()
        }

        pub fn set_write_error(&self, error: io::ErrorKind) {
            *self.write_error.lock().unwrap() = Some(error);
        }

        pub fn clear_write_error(&self) {
            *self.write_error.lock().unwrap() = None;
        }

        pub fn set_flush_error(&self, error: io::ErrorKind) {
            *self.flush_error.lock().unwrap() = Some(error);
        }
    }

    #[async_trait]
    impl SerialPortIO for MockSerialPort {
        async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
            if let Some(error) = *self.write_error.lock().unwrap() {
                return Err(io::Error::new(error, "Mock write error"));
            }
            self.written_data.lock().unwrap().push(data.to_vec());
            Ok(())
        }

        async fn flush(&mut self) -> io::Result<()> {
            if let Some(error) = *self.flush_error.lock().unwrap() {
                return Err(io::Error::new(error, "Mock flush error"));
            }
            Ok(())
        }
    }

    /// Port whose writes never complete, like a CDC device nobody drains.
    pub struct StalledPort;

    #[async_trait]
    impl SerialPortIO for StalledPort {
        async fn write_all(&mut self, _data: &[u8]) -> io::Result<()> {
            std::future::pending().await
        }

        async fn flush(&mut self) -> io::Result<()> {
            std::future::pending().await
        }
    }

    /// Opener that always hands out clones of one shared mock port.
    pub fn opener_for(port: &MockSerialPort) -> MockPortOpener {
        let port = port.clone();
        let mut opener = MockPortOpener::new();
        opener
            .expect_open()
            .returning(move |_, _| Ok(Box::new(port.clone()) as Box<dyn SerialPortIO>));
        opener
    }
}
