use std::path::Path;
use std::time::Duration;

use crate::error::CaptureError;

const DEFAULT_CONFIG_PATH: &str = "/etc/packet-inspector.conf";
const DEFAULT_BUFFER_SIZE: usize = 4096;
const DEFAULT_READ_TIMEOUT_MS: u64 = 100;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Largest frame a single read can return.
pub const MAX_BUFFER_SIZE: usize = 65536;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Interface to bind to; `None` captures on every interface.
    pub interface: Option<String>,
    pub buffer_size: usize,
    /// `None` blocks until a frame arrives.
    pub read_timeout: Option<Duration>,
    pub log_level: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interface: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
            read_timeout: Some(Duration::from_millis(DEFAULT_READ_TIMEOUT_MS)),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl CaptureConfig {
    /// Load from `PACKET_INSPECTOR_CONFIG` (or the default path), then apply
    /// environment overrides.
    pub fn load() -> Result<Self, CaptureError> {
        let config_path = std::env::var("PACKET_INSPECTOR_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut config = Self::load_from(Path::new(&config_path))?;
        config.apply_env()?;
        Ok(config)
    }

    /// Load from a config file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, CaptureError> {
        let mut config = Self::default();

        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            for line in content.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    config.set(key.trim(), value.trim())?;
                }
            }
        }

        Ok(config)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CaptureError> {
        match key {
            "interface" => {
                self.interface = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            "buffer_size" => {
                self.buffer_size = value
                    .parse()
                    .map_err(|_| CaptureError::Config(format!("Invalid buffer_size: {}", value)))?;
            }
            "read_timeout_ms" => {
                let ms: u64 = value.parse().map_err(|_| {
                    CaptureError::Config(format!("Invalid read_timeout_ms: {}", value))
                })?;
                self.read_timeout = (ms > 0).then(|| Duration::from_millis(ms));
            }
            "log_level" => self.log_level = value.to_string(),
            _ => {}
        }
        Ok(())
    }

    fn apply_env(&mut self) -> Result<(), CaptureError> {
        let overrides = [
            ("PACKET_INSPECTOR_INTERFACE", "interface"),
            ("PACKET_INSPECTOR_BUFFER_SIZE", "buffer_size"),
            ("PACKET_INSPECTOR_READ_TIMEOUT_MS", "read_timeout_ms"),
            ("PACKET_INSPECTOR_LOG_LEVEL", "log_level"),
        ];
        for (var, key) in overrides {
            if let Ok(val) = std::env::var(var) {
                self.set(key, val.trim())
                    .map_err(|_| CaptureError::Config(format!("Invalid {}: {}", var, val)))?;
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), CaptureError> {
        if self.buffer_size == 0 || self.buffer_size > MAX_BUFFER_SIZE {
            return Err(CaptureError::Config(format!(
                "buffer_size must be between 1 and {}, got {}",
                MAX_BUFFER_SIZE, self.buffer_size
            )));
        }
        Ok(())
    }

    /// Filter directive for the tracing subscriber.
    pub fn tracing_filter(&self) -> String {
        format!("packet_inspector={}", self.log_level)
    }
}
