//! # Transmitter
//!
//! Fixed-rate loop turning the live control state into serial frames.
//!
//! Each tick:
//! 1. Snapshot the control state and resolve it through the arming gate
//! 2. `ensure_open()` on the transport, skipping the tick if nothing opens
//! 3. Encode and write one frame
//!
//! On shutdown the state is forced disarmed and one safe frame is sent
//! before the port is closed.

use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::control::{ControlHandle, GatedAxes};
use crate::frame::FrameEncoder;
use crate::serial::port_trait::PortOpener;
use crate::serial::SerialTransport;
use crate::shutdown::Shutdown;

/// Counters kept over the life of the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransmitterStats {
    /// Frames written and flushed
    pub frames_sent: u64,
    /// Writes that failed and closed the port
    pub write_failures: u64,
    /// Ticks skipped because no port could be opened
    pub open_failures: u64,
}

/// What the shutdown sequence achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Counters, including the final frame when delivered
    pub stats: TransmitterStats,
    pub final_frame_delivered: bool,
}

impl ShutdownReport {
    /// The flight controller saw a live link that never got the disarm frame.
    pub fn left_link_unsafe(&self) -> bool {
        !self.final_frame_delivered && self.stats.frames_sent > 0
    }
}

/// Point-in-time view logged by the heartbeat.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkStatus {
    pub frames_sent: u64,
    /// What the next frame will carry
    pub axes: GatedAxes,
    pub port: Option<String>,
}

/// Fixed-rate sender. Owns the serial transport exclusively.
pub struct Transmitter<O: PortOpener> {
    control: ControlHandle,
    encoder: FrameEncoder,
    transport: SerialTransport<O>,
    period: Duration,
    heartbeat_interval: Duration,
    stats: TransmitterStats,
}

impl<O: PortOpener> Transmitter<O> {
    /// # Arguments
    ///
    /// * `rate_hz` - Frames per second, at least 1
    /// * `heartbeat_interval` - How often to log a status line
    pub fn new(
        control: ControlHandle,
        encoder: FrameEncoder,
        transport: SerialTransport<O>,
        rate_hz: u32,
        heartbeat_interval: Duration,
    ) -> Self {
        let period = Duration::from_secs_f64(1.0 / f64::from(rate_hz.max(1)));
        Self {
            control,
            encoder,
            transport,
            period,
            heartbeat_interval: heartbeat_interval.max(Duration::from_millis(1)),
            stats: TransmitterStats::default(),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn stats(&self) -> TransmitterStats {
        self.stats
    }

    pub fn status(&self) -> LinkStatus {
        LinkStatus {
            frames_sent: self.stats.frames_sent,
            axes: self.control.gated(),
            port: self.transport.device_path().map(str::to_string),
        }
    }

    /// Runs until the control handle's shutdown token fires, then performs
    /// the disarm-and-close sequence.
    pub async fn run(mut self) -> ShutdownReport {
        let shutdown: Shutdown = self.control.shutdown().clone();

        let mut ticker = time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut heartbeat =
            time::interval_at(Instant::now() + self.heartbeat_interval, self.heartbeat_interval);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut frames_at_heartbeat = 0u64;

        info!(
            "Transmitter started: {} at {:.1} Hz",
            self.encoder.protocol(),
            1.0 / self.period.as_secs_f64()
        );

        loop {
            tokio::select! {
                biased;

                _ = shutdown.wait() => break,

                _ = ticker.tick() => {
                    if shutdown.is_triggered() {
                        break;
                    }
                    self.tick().await;
                }

                _ = heartbeat.tick() => {
                    let status = self.status();
                    info!(
                        frames = status.frames_sent - frames_at_heartbeat,
                        total = status.frames_sent,
                        armed = status.axes.armed,
                        roll = status.axes.roll,
                        pitch = status.axes.pitch,
                        yaw = status.axes.yaw,
                        throttle = status.axes.throttle,
                        port = status.port.as_deref().unwrap_or("none"),
                        "heartbeat"
                    );
                    frames_at_heartbeat = status.frames_sent;
                }
            }
        }

        self.shutdown_sequence().await
    }

    /// One transmission attempt.
    pub async fn tick(&mut self) {
        let axes = self.control.gated();

        if self.transport.ensure_open().is_err() {
            self.stats.open_failures += 1;
            return;
        }

        let frame = self.encoder.encode(&axes);
        match self.transport.write_frame(&frame).await {
            Ok(()) => {
                self.stats.frames_sent += 1;
                trace!(armed = axes.armed, "frame {:02X?}", &frame[..]);
            }
            Err(e) => {
                self.stats.write_failures += 1;
                debug!("Frame not delivered: {}", e);
            }
        }
    }

    /// Forces disarm, sends one safe frame best-effort, closes the port.
    pub async fn shutdown_sequence(mut self) -> ShutdownReport {
        self.control.disarm();

        let frame = self.encoder.safe_frame();
        let final_frame_delivered = match self.transport.ensure_open() {
            Ok(()) => self.transport.write_frame(&frame).await.is_ok(),
            Err(_) => false,
        };

        if final_frame_delivered {
            self.stats.frames_sent += 1;
            info!("Final disarm frame sent");
        } else {
            warn!("Final disarm frame could not be delivered");
        }

        self.transport.close();
        info!(
            "Transmitter stopped: {} frames sent, {} write failures, {} skipped ticks",
            self.stats.frames_sent, self.stats.write_failures, self.stats.open_failures
        );

        ShutdownReport {
            stats: self.stats,
            final_frame_delivered,
        }
    }
}
