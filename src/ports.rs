//! Port traits — the boundary between the gateway core and the outside world.
//!
//! ```text
//!   ClimateDriver ──▶ ┌───────────────────┐ ──▶ MeasurementSink
//!                     │   SensorGateway   │
//!         HostBus ◀──▶└───────────────────┘
//! ```
//!
//! Driven adapters (the DHT22 driver, the single-wire host link, log or
//! telemetry channels) implement these traits.  The gateway consumes
//! them through shared handles, so the domain core never touches
//! hardware directly and the whole pipeline runs against mocks on the
//! host.

use crate::error::DriverReadError;
use crate::wire::ClimateFrame;

/// One successful sensor transaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

// ───────────────────────────────────────────────────────────────
// Climate driver (driven adapter: sensor → gateway)
// ───────────────────────────────────────────────────────────────

/// Pull-based climate sensor driver.
pub trait ClimateDriver {
    /// Perform one synchronous sensor transaction.
    ///
    /// Must complete without suspending the caller; a transaction that
    /// cannot finish inside the protocol timing budget fails with
    /// [`DriverReadError::Timeout`] and the gateway keeps serving the
    /// previous value.
    fn try_read(&mut self) -> Result<ClimateReading, DriverReadError>;
}

// ───────────────────────────────────────────────────────────────
// Measurement channel (driven adapter: gateway → consumers)
// ───────────────────────────────────────────────────────────────

/// Publish-only sink for the latest measurement of one kind.
///
/// The gateway never reads a sink back — staleness decisions are made
/// against its own stored measurements.
pub trait MeasurementSink {
    fn publish(&mut self, value: f32);
}

// ───────────────────────────────────────────────────────────────
// Host bus (driven adapter: gateway ◀▶ legacy host)
// ───────────────────────────────────────────────────────────────

/// Single-wire link to the legacy host controller.
///
/// Implementations own the GPIO line.  Line-level failures are handled
/// inside the adapter (logged, request dropped) — the host retries on
/// its own cadence, so there is nothing useful to surface.
pub trait HostBus {
    /// Listen briefly for a host request pulse.  Bounded; returns
    /// `false` when no valid request was seen inside the window.
    fn poll_request(&mut self) -> bool;

    /// Transmit one response frame.
    fn send_frame(&mut self, frame: &ClimateFrame);
}
