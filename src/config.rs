//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every key has a default, so an empty file (or no file at all) gives a
//! working CRSF link on `/dev/ttyACM0` at 50 Hz.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::control::{AxisKind, ButtonBindings, ControlSettings, DisarmReset};
use crate::error::{RcLinkError, Result};
use crate::frame::{FrameEncoder, Protocol};
use crate::msp::encoder::ChannelOrder;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub serial: SerialConfig,
    pub link: LinkConfig,
    pub filter: FilterConfig,
    pub safety: SafetyConfig,
    pub controller: ControllerConfig,
    pub logging: LoggingConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_fallback_ports")]
    pub fallback_ports: Vec<String>,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Log every Nth consecutive open failure after the first
    #[serde(default = "default_open_failure_log_every")]
    pub open_failure_log_every: u64,

    /// Longest a single frame write may take before the port is dropped
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
}

/// Wire protocol and transmit cadence
#[derive(Debug, Deserialize, Clone)]
pub struct LinkConfig {
    #[serde(default)]
    pub protocol: Protocol,

    #[serde(default = "default_rate_hz")]
    pub rate_hz: u32,

    #[serde(default = "default_heartbeat_interval_s")]
    pub heartbeat_interval_s: u64,

    #[serde(default = "default_msp_channel_count")]
    pub msp_channel_count: usize,

    #[serde(default)]
    pub msp_channel_order: ChannelOrder,

    /// AUX1 while disarmed, in the selected protocol's units
    #[serde(default)]
    pub aux_disarmed: Option<u16>,
}

/// Axis normalization and smoothing
#[derive(Debug, Deserialize, Clone)]
pub struct FilterConfig {
    #[serde(default = "default_alpha")]
    pub alpha: f32,

    #[serde(default = "default_deadzone")]
    pub deadzone: f32,
}

/// Safety configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SafetyConfig {
    /// Highest filtered throttle that still allows arming
    #[serde(default = "default_arm_throttle_max")]
    pub arm_throttle_max: f32,

    /// Armed throttle is scaled by this
    #[serde(default = "default_throttle_limit")]
    pub throttle_limit: f32,

    #[serde(default)]
    pub disarm_reset: DisarmReset,
}

/// One gamepad axis feeding one control axis
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct AxisBinding {
    /// Linux absolute axis name, e.g. `ABS_RX`
    pub code: String,

    #[serde(default)]
    pub invert: bool,

    #[serde(default)]
    pub kind: AxisKind,
}

impl AxisBinding {
    fn new(code: &str, invert: bool, kind: AxisKind) -> Self {
        Self {
            code: code.to_string(),
            invert,
            kind,
        }
    }

    /// Numeric `ABS_*` code, `None` if the name is unknown.
    pub fn abs_code(&self) -> Option<u16> {
        abs_code_from_name(&self.code)
    }
}

/// Controller configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControllerConfig {
    /// Explicit evdev node; scanned by name when unset
    #[serde(default)]
    pub device_path: Option<PathBuf>,

    #[serde(default = "default_device_name")]
    pub device_name: String,

    #[serde(default = "default_roll_binding")]
    pub roll: AxisBinding,

    #[serde(default = "default_pitch_binding")]
    pub pitch: AxisBinding,

    #[serde(default = "default_yaw_binding")]
    pub yaw: AxisBinding,

    #[serde(default = "default_throttle_binding")]
    pub throttle: AxisBinding,

    #[serde(default)]
    pub buttons: ButtonBindings,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Daily rolling log files go here when set
    #[serde(default)]
    pub file_dir: Option<PathBuf>,
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyACM0".to_string() }
fn default_fallback_ports() -> Vec<String> {
    vec![
        "/dev/ttyACM1".to_string(),
        "/dev/ttyUSB0".to_string(),
        "/dev/ttyUSB1".to_string(),
    ]
}
fn default_baud_rate() -> u32 { 115200 }
fn default_open_failure_log_every() -> u64 { 250 }
fn default_write_timeout_ms() -> u64 { 100 }

fn default_rate_hz() -> u32 { 50 }
fn default_heartbeat_interval_s() -> u64 { 10 }
fn default_msp_channel_count() -> usize { 8 }

fn default_alpha() -> f32 { crate::control::filter::DEFAULT_ALPHA }
fn default_deadzone() -> f32 { crate::control::filter::DEFAULT_DEADZONE }

fn default_arm_throttle_max() -> f32 { crate::control::arming::DEFAULT_ARM_THROTTLE_MAX }
fn default_throttle_limit() -> f32 { 1.0 }

fn default_device_name() -> String { "Wireless Controller".to_string() }
fn default_roll_binding() -> AxisBinding { AxisBinding::new("ABS_RX", false, AxisKind::Stick) }
fn default_pitch_binding() -> AxisBinding { AxisBinding::new("ABS_RY", true, AxisKind::Stick) }
fn default_yaw_binding() -> AxisBinding { AxisBinding::new("ABS_X", false, AxisKind::Stick) }
fn default_throttle_binding() -> AxisBinding { AxisBinding::new("ABS_RZ", false, AxisKind::Trigger) }

fn default_log_level() -> String { "info".to_string() }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            fallback_ports: default_fallback_ports(),
            baud_rate: default_baud_rate(),
            open_failure_log_every: default_open_failure_log_every(),
            write_timeout_ms: default_write_timeout_ms(),
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::default(),
            rate_hz: default_rate_hz(),
            heartbeat_interval_s: default_heartbeat_interval_s(),
            msp_channel_count: default_msp_channel_count(),
            msp_channel_order: ChannelOrder::default(),
            aux_disarmed: None,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            deadzone: default_deadzone(),
        }
    }
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            arm_throttle_max: default_arm_throttle_max(),
            throttle_limit: default_throttle_limit(),
            disarm_reset: DisarmReset::default(),
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            device_path: None,
            device_name: default_device_name(),
            roll: default_roll_binding(),
            pitch: default_pitch_binding(),
            yaw: default_yaw_binding(),
            throttle: default_throttle_binding(),
            buttons: ButtonBindings::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_dir: None,
        }
    }
}

/// Linux `ABS_*` names accepted in axis bindings.
const ABS_CODES: &[(&str, u16)] = &[
    ("ABS_X", 0x00),
    ("ABS_Y", 0x01),
    ("ABS_Z", 0x02),
    ("ABS_RX", 0x03),
    ("ABS_RY", 0x04),
    ("ABS_RZ", 0x05),
    ("ABS_THROTTLE", 0x06),
    ("ABS_RUDDER", 0x07),
    ("ABS_WHEEL", 0x08),
    ("ABS_GAS", 0x09),
    ("ABS_BRAKE", 0x0a),
    ("ABS_HAT0X", 0x10),
    ("ABS_HAT0Y", 0x11),
];

/// Looks up an `ABS_*` name, case-insensitively.
pub fn abs_code_from_name(name: &str) -> Option<u16> {
    ABS_CODES
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|&(_, code)| code)
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rc_link::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        // Serial
        if self.serial.port.is_empty() {
            return Err(RcLinkError::Config("serial port cannot be empty".to_string()));
        }

        if self.serial.fallback_ports.iter().any(|p| p.is_empty()) {
            return Err(RcLinkError::Config("fallback_ports entries cannot be empty".to_string()));
        }

        if self.serial.baud_rate == 0 {
            return Err(RcLinkError::Config("baud_rate must be greater than 0".to_string()));
        }

        if self.serial.open_failure_log_every == 0 {
            return Err(RcLinkError::Config(
                "open_failure_log_every must be greater than 0".to_string(),
            ));
        }

        if self.serial.write_timeout_ms == 0 || self.serial.write_timeout_ms > 5000 {
            return Err(RcLinkError::Config(
                "write_timeout_ms must be between 1 and 5000".to_string(),
            ));
        }

        // Link
        if self.link.rate_hz == 0 || self.link.rate_hz > 500 {
            return Err(RcLinkError::Config("rate_hz must be between 1 and 500".to_string()));
        }

        if self.link.heartbeat_interval_s == 0 || self.link.heartbeat_interval_s > 3600 {
            return Err(RcLinkError::Config(
                "heartbeat_interval_s must be between 1 and 3600".to_string(),
            ));
        }

        // Channel count and aux sentinel are checked by the encoder itself
        FrameEncoder::from_config(&self.link).map_err(|e| RcLinkError::Config(e.to_string()))?;

        // Filter
        if !(self.filter.alpha > 0.0 && self.filter.alpha <= 1.0) {
            return Err(RcLinkError::Config("alpha must be in (0.0, 1.0]".to_string()));
        }

        if !(self.filter.deadzone >= 0.0 && self.filter.deadzone < 0.5) {
            return Err(RcLinkError::Config("deadzone must be in [0.0, 0.5)".to_string()));
        }

        // Safety
        if !(0.0..=1.0).contains(&self.safety.arm_throttle_max) {
            return Err(RcLinkError::Config(
                "arm_throttle_max must be between 0.0 and 1.0".to_string(),
            ));
        }

        if !(self.safety.throttle_limit > 0.0 && self.safety.throttle_limit <= 1.0) {
            return Err(RcLinkError::Config("throttle_limit must be in (0.0, 1.0]".to_string()));
        }

        // Controller
        if self.controller.device_path.is_none() && self.controller.device_name.is_empty() {
            return Err(RcLinkError::Config(
                "controller needs either device_path or device_name".to_string(),
            ));
        }

        for (name, binding) in self.axis_bindings() {
            if binding.abs_code().is_none() {
                return Err(RcLinkError::Config(format!(
                    "{} axis code '{}' is not a known ABS_* name",
                    name, binding.code
                )));
            }
        }

        // Logging
        if self.logging.level.trim().is_empty() {
            return Err(RcLinkError::Config("logging level cannot be empty".to_string()));
        }

        Ok(())
    }

    /// Primary port followed by fallbacks, in the order written.
    ///
    /// Duplicates are kept here; [`crate::serial::SerialTransport`] drops them.
    pub fn candidate_ports(&self) -> Vec<String> {
        std::iter::once(&self.serial.port)
            .chain(&self.serial.fallback_ports)
            .cloned()
            .collect()
    }

    /// Tunables for [`crate::control::ControlHandle`].
    pub fn control_settings(&self) -> ControlSettings {
        ControlSettings {
            deadzone: self.filter.deadzone,
            alpha: self.filter.alpha,
            arm_throttle_max: self.safety.arm_throttle_max,
            throttle_limit: self.safety.throttle_limit,
            disarm_reset: self.safety.disarm_reset,
            buttons: self.controller.buttons,
        }
    }

    fn axis_bindings(&self) -> [(&'static str, &AxisBinding); 4] {
        [
            ("roll", &self.controller.roll),
            ("pitch", &self.controller.pitch),
            ("yaw", &self.controller.yaw),
            ("throttle", &self.controller.throttle),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::Button;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.serial.baud_rate, 115200);
        assert_eq!(config.link.rate_hz, 50);
        assert_eq!(config.link.protocol, Protocol::Crsf);
        assert_eq!(config.filter.alpha, 0.25);
        assert_eq!(config.filter.deadzone, 0.05);
    }

    #[test]
    fn test_empty_file_equals_default() {
        let parsed = Config::from_toml("").unwrap();
        let default = Config::default();
        assert_eq!(parsed.serial.port, default.serial.port);
        assert_eq!(parsed.serial.fallback_ports, default.serial.fallback_ports);
        assert_eq!(parsed.link.msp_channel_count, default.link.msp_channel_count);
        assert_eq!(parsed.controller.pitch, default.controller.pitch);
        assert_eq!(parsed.logging.level, default.logging.level);
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[serial]
port = "/dev/ttyUSB0"
fallback_ports = []

[link]
protocol = "msp"
rate_hz = 100
msp_channel_count = 16
msp_channel_order = "rpyt"

[filter]
alpha = 0.5

[safety]
throttle_limit = 0.25
disarm_reset = "decay"

[controller]
device_path = "/dev/input/event7"
throttle = { code = "ABS_Y", invert = true, kind = "stick" }

[controller.buttons]
arm = "cross"

[logging]
level = "debug"
file_dir = "/tmp/rc-link-logs"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.serial.port, "/dev/ttyUSB0");
        assert!(config.serial.fallback_ports.is_empty());
        assert_eq!(config.link.protocol, Protocol::Msp);
        assert_eq!(config.link.rate_hz, 100);
        assert_eq!(config.link.msp_channel_count, 16);
        assert_eq!(config.link.msp_channel_order, ChannelOrder::Rpyt);
        assert_eq!(config.filter.alpha, 0.5);
        assert_eq!(config.filter.deadzone, 0.05);
        assert_eq!(config.safety.throttle_limit, 0.25);
        assert_eq!(config.safety.disarm_reset, DisarmReset::Decay);
        assert_eq!(
            config.controller.device_path,
            Some(PathBuf::from("/dev/input/event7"))
        );
        assert_eq!(config.controller.throttle.kind, AxisKind::Stick);
        assert!(config.controller.throttle.invert);
        assert_eq!(config.controller.buttons.arm, Button::Cross);
        assert_eq!(config.controller.buttons.kill, Button::Ps);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/rc-link.toml");
        assert!(matches!(result, Err(RcLinkError::Io(_))));
    }

    #[test]
    fn test_parse_error() {
        let result = Config::from_toml("[link]\nrate_hz = \"fast\"");
        assert!(matches!(result, Err(RcLinkError::ConfigParse(_))));
    }

    #[test]
    fn test_unknown_protocol_rejected() {
        assert!(Config::from_toml("[link]\nprotocol = \"sbus\"").is_err());
    }

    #[test]
    fn test_empty_serial_port() {
        let mut config = Config::default();
        config.serial.port = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_log_every() {
        let mut config = Config::default();
        config.serial.open_failure_log_every = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_write_timeout_bounds() {
        let mut config = Config::default();
        assert_eq!(config.serial.write_timeout_ms, 100);
        config.serial.write_timeout_ms = 0;
        assert!(config.validate().is_err());
        config.serial.write_timeout_ms = 5001;
        assert!(config.validate().is_err());
        config.serial.write_timeout_ms = 5000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rate_hz_bounds() {
        let mut config = Config::default();
        config.link.rate_hz = 0;
        assert!(config.validate().is_err());
        config.link.rate_hz = 501;
        assert!(config.validate().is_err());
        config.link.rate_hz = 500;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_heartbeat_bounds() {
        let mut config = Config::default();
        config.link.heartbeat_interval_s = 0;
        assert!(config.validate().is_err());
        config.link.heartbeat_interval_s = 3601;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_msp_channel_count() {
        let mut config = Config::default();
        config.link.protocol = Protocol::Msp;
        config.link.msp_channel_count = 10;
        assert!(matches!(config.validate(), Err(RcLinkError::Config(_))));
        config.link.msp_channel_count = 16;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_aux_disarmed_checked_against_protocol() {
        let mut config = Config::default();
        config.link.aux_disarmed = Some(1000);
        // 1000 is fine for CRSF (191..=1792) and MSP (1000..=2000)
        assert!(config.validate().is_ok());
        config.link.aux_disarmed = Some(191);
        assert!(config.validate().is_ok());
        config.link.protocol = Protocol::Msp;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_alpha_bounds() {
        let mut config = Config::default();
        config.filter.alpha = 0.0;
        assert!(config.validate().is_err());
        config.filter.alpha = 1.0;
        assert!(config.validate().is_ok());
        config.filter.alpha = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deadzone_bounds() {
        let mut config = Config::default();
        config.filter.deadzone = -0.01;
        assert!(config.validate().is_err());
        config.filter.deadzone = 0.5;
        assert!(config.validate().is_err());
        config.filter.deadzone = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_safety_bounds() {
        let mut config = Config::default();
        config.safety.arm_throttle_max = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.safety.throttle_limit = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_axis_code() {
        let mut config = Config::default();
        config.controller.roll.code = "ABS_NOPE".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_controller_needs_path_or_name() {
        let mut config = Config::default();
        config.controller.device_name = String::new();
        assert!(config.validate().is_err());
        config.controller.device_path = Some(PathBuf::from("/dev/input/event0"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_abs_code_lookup() {
        assert_eq!(abs_code_from_name("ABS_X"), Some(0));
        assert_eq!(abs_code_from_name("abs_rz"), Some(5));
        assert_eq!(abs_code_from_name("ABS_HAT0Y"), Some(0x11));
        assert_eq!(abs_code_from_name("KEY_A"), None);
    }

    #[test]
    fn test_candidate_ports_primary_first() {
        let config = Config::default();
        assert_eq!(
            config.candidate_ports(),
            vec!["/dev/ttyACM0", "/dev/ttyACM1", "/dev/ttyUSB0", "/dev/ttyUSB1"]
        );
    }

    #[test]
    fn test_control_settings_follow_config() {
        let mut config = Config::default();
        config.filter.alpha = 0.5;
        config.safety.disarm_reset = DisarmReset::Decay;
        let settings = config.control_settings();
        assert_eq!(settings.alpha, 0.5);
        assert_eq!(settings.deadzone, 0.05);
        assert_eq!(settings.disarm_reset, DisarmReset::Decay);
        assert_eq!(settings.buttons, ButtonBindings::default());
    }
}
