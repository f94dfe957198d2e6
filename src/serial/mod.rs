//! # Serial Communication Module
//!
//! Owns the link to the flight controller (or ELRS module) over USB serial.
//!
//! This module handles:
//! - Trying an ordered list of candidate device paths
//! - Keeping at most one port open
//! - Dropping the port on any write error or stalled write so the next tick reopens it
//! - Logging open failures at reduced frequency

pub mod port_trait;

use crate::config::Config;
use crate::error::{RcLinkError, Result};
use port_trait::{PortOpener, SerialPortIO, TokioPortOpener};
use std::time::Duration;
use tokio::time;
use tracing::{debug, info, trace, warn};

/// Write budget when none is configured.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(100);

/// Serial link with reconnect-on-failure.
///
/// Nothing here retries on its own: the transmitter calls
/// [`SerialTransport::ensure_open`] every tick.
pub struct SerialTransport<O: PortOpener = TokioPortOpener> {
    opener: O,
    candidates: Vec<String>,
    baud_rate: u32,
    port: Option<Box<dyn SerialPortIO>>,
    device_path: Option<String>,
    consecutive_failures: u64,
    log_every: u64,
    write_timeout: Duration,
}

impl<O: PortOpener> std::fmt::Debug for SerialTransport<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("candidates", &self.candidates)
            .field("baud_rate", &self.baud_rate)
            .field("device_path", &self.device_path)
            .field("write_timeout", &self.write_timeout)
            .finish_non_exhaustive()
    }
}

impl SerialTransport<TokioPortOpener> {
    /// Transport over real devices using the `[serial]` section.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            TokioPortOpener,
            config.candidate_ports(),
            config.serial.baud_rate,
            config.serial.open_failure_log_every,
        )
        .with_write_timeout(Duration::from_millis(config.serial.write_timeout_ms))
    }
}

impl<O: PortOpener> SerialTransport<O> {
    /// # Arguments
    ///
    /// * `opener` - Opens one path
    /// * `candidates` - Paths tried in order; duplicates are dropped
    /// * `baud_rate` - Line speed
    /// * `log_every` - After the first warning, warn again every N consecutive failures
    pub fn new(opener: O, candidates: Vec<String>, baud_rate: u32, log_every: u64) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(candidates.len());
        for path in candidates {
            if !unique.contains(&path) {
                unique.push(path);
            }
        }

        Self {
            opener,
            candidates: unique,
            baud_rate,
            port: None,
            device_path: None,
            consecutive_failures: 0,
            log_every: log_every.max(1),
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    /// Caps how long one [`SerialTransport::write_frame`] may take.
    #[must_use]
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout.max(Duration::from_millis(1));
        self
    }

    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    /// Opens the first candidate that works. No-op when already open.
    ///
    /// # Errors
    ///
    /// Returns `SerialPortNotFound` listing every path tried when none open
    pub fn ensure_open(&mut self) -> Result<()> {
        if self.port.is_some() {
            return Ok(());
        }

        let mut last_error = None;
        for path in &self.candidates {
            trace!("Trying to open serial port: {}", path);

            match self.opener.open(path, self.baud_rate) {
                Ok(port) => {
                    if self.consecutive_failures > 0 {
                        info!(
                            "Opened serial device {} after {} failed attempts",
                            path, self.consecutive_failures
                        );
                    } else {
                        info!("Opened serial device {} at {} baud", path, self.baud_rate);
                    }
                    self.port = Some(port);
                    self.device_path = Some(path.clone());
                    self.consecutive_failures = 0;
                    return Ok(());
                }
                Err(e) => {
                    trace!("Failed to open {}: {}", path, e);
                    last_error = Some(e);
                }
            }
        }

        self.consecutive_failures += 1;
        let tried = self.candidates.join(", ");
        let reason = last_error.map_or_else(|| "no candidates".to_string(), |e| e.to_string());

        if self.consecutive_failures == 1 {
            warn!("No serial device available (tried: {}): {}", tried, reason);
        } else if self.consecutive_failures % self.log_every == 0 {
            warn!(
                "Still no serial device after {} attempts (tried: {}): {}",
                self.consecutive_failures, tried, reason
            );
        }

        Err(RcLinkError::SerialPortNotFound(tried))
    }

    /// Writes and flushes one frame within the write timeout.
    ///
    /// Any I/O error or timeout closes the port; the frame is not retried.
    pub async fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        let port = self
            .port
            .as_mut()
            .ok_or_else(|| RcLinkError::Serial("port not open".to_string()))?;

        let write = async {
            match port.write_all(frame).await {
                Ok(()) => port.flush().await,
                Err(e) => Err(e),
            }
        };

        let reason = match time::timeout(self.write_timeout, write).await {
            Ok(Ok(())) => {
                trace!("Sent frame ({} bytes)", frame.len());
                return Ok(());
            }
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("write stalled for {:?}", self.write_timeout),
        };

        let path = self.device_path.clone().unwrap_or_default();
        warn!("Write to {} failed, closing port: {}", path, reason);
        self.close();
        Err(RcLinkError::Serial(format!("Failed to write to {}: {}", path, reason)))
    }

    /// Drops the port handle, if any.
    pub fn close(&mut self) {
        if self.port.take().is_some() {
            debug!(
                "Closed serial device {}",
                self.device_path.as_deref().unwrap_or("?")
            );
        }
        self.device_path = None;
    }

    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    /// Path of the open device.
    pub fn device_path(&self) -> Option<&str> {
        self.device_path.as_deref()
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn consecutive_open_failures(&self) -> u64 {
        self.consecutive_failures
    }
}
