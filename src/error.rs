//! Unified error types for the ClimaLink firmware.
//!
//! Follows embedded best practice: a single `Error` enum that every subsystem
//! can convert into, keeping the top-level loop's error handling uniform.
//! All variants are `Copy` so they can be cheaply passed around without
//! allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration is invalid.
    Config(ConfigError),
    /// The climate driver could not complete a transaction.
    Driver(DriverReadError),
    /// A stored measurement is too old to serve.
    Stale(StaleDataError),
    /// Startup wiring is incomplete.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Driver(e) => write!(f, "driver: {e}"),
            Self::Stale(e) => write!(f, "stale: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Invalid configuration values.  Fatal at construction or setter time —
/// the offending value is rejected, never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// `poll_interval_ms` must be greater than zero.
    ZeroPollInterval,
    /// `staleness_threshold_ms` must be greater than zero.
    ZeroStalenessThreshold,
    /// `bus_poll_interval_ms` must be greater than zero.
    ZeroBusPollInterval,
    /// `telemetry_interval_secs` must be greater than zero.
    ZeroTelemetryInterval,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroPollInterval => write!(f, "poll interval must be > 0 ms"),
            Self::ZeroStalenessThreshold => write!(f, "staleness threshold must be > 0 ms"),
            Self::ZeroBusPollInterval => write!(f, "bus poll interval must be > 0 ms"),
            Self::ZeroTelemetryInterval => write!(f, "telemetry interval must be > 0 s"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Driver errors
// ---------------------------------------------------------------------------

/// Transient sensor transaction failures.  Recovered by skipping the
/// update and retrying on the next poll; never surfaced to readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverReadError {
    /// The sensor did not answer within the protocol timing budget.
    Timeout,
    /// The received frame failed checksum validation.
    ChecksumMismatch,
    /// GPIO read or write returned an error.
    Gpio,
    /// The decoded values are outside the sensor's physical range.
    InvalidReading,
}

impl fmt::Display for DriverReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "sensor timed out"),
            Self::ChecksumMismatch => write!(f, "frame checksum mismatch"),
            Self::Gpio => write!(f, "GPIO access failed"),
            Self::InvalidReading => write!(f, "reading out of range"),
        }
    }
}

impl From<DriverReadError> for Error {
    fn from(e: DriverReadError) -> Self {
        Self::Driver(e)
    }
}

// ---------------------------------------------------------------------------
// Staleness errors
// ---------------------------------------------------------------------------

/// Returned to a caller requesting a measurement older than the
/// staleness threshold.  Recoverable — callers treat it as "no data".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleDataError {
    /// No successful driver read has happened yet.
    NoMeasurement,
    /// The last measurement is older than the staleness threshold.
    Expired {
        /// Age of the stored measurement when the read was attempted.
        age_ms: u64,
    },
}

impl fmt::Display for StaleDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMeasurement => write!(f, "no measurement yet"),
            Self::Expired { age_ms } => write!(f, "measurement expired ({age_ms} ms old)"),
        }
    }
}

impl From<StaleDataError> for Error {
    fn from(e: StaleDataError) -> Self {
        Self::Stale(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
