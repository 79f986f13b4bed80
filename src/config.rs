//! Gateway configuration parameters
//!
//! All tunable timing parameters for the ClimaLink bridge.  Values are
//! validated before use — a zero interval is rejected, never clamped.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Core gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    // --- Driver ---
    /// Climate driver poll interval (milliseconds)
    pub poll_interval_ms: u32,
    /// Maximum age at which a stored measurement may still be served (milliseconds)
    pub staleness_threshold_ms: u32,

    // --- Host bus ---
    /// Host-bus request poll interval (milliseconds)
    pub bus_poll_interval_ms: u32,

    // --- Timing ---
    /// Telemetry report interval (seconds)
    pub telemetry_interval_secs: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            // Driver
            poll_interval_ms: 2_000,        // DHT22 minimum sampling period
            staleness_threshold_ms: 25_000, // ~12 missed polls before data is refused

            // Host bus
            bus_poll_interval_ms: 500,

            // Timing
            telemetry_interval_secs: 60, // 1/min
        }
    }
}

impl GatewayConfig {
    /// Range-check every field.  Called by the gateway constructor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.staleness_threshold_ms == 0 {
            return Err(ConfigError::ZeroStalenessThreshold);
        }
        if self.bus_poll_interval_ms == 0 {
            return Err(ConfigError::ZeroBusPollInterval);
        }
        if self.telemetry_interval_secs == 0 {
            return Err(ConfigError::ZeroTelemetryInterval);
        }
        Ok(())
    }
}
