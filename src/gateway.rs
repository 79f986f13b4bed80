//! Sensor gateway — the domain core of the bridge.
//!
//! Owns the single-wire host bus, optionally polls an attached climate
//! driver on a fixed cadence, publishes fresh readings to measurement
//! channels, and answers host requests only with readings younger than
//! the staleness threshold.
//!
//! ```text
//!  ClimateDriver ──▶ ┌───────────────────┐ ──▶ MeasurementSink (×2)
//!                    │   SensorGateway   │
//!      HostBus ◀──▶  │  cadence · age    │
//!                    └───────────────────┘
//! ```
//!
//! Everything runs on one logical thread (the cooperative main loop);
//! collaborators owned elsewhere are shared through `Rc<RefCell<…>>`
//! handles, resolved once at wiring time.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info, warn};

use crate::cadence::Cadence;
use crate::config::GatewayConfig;
use crate::error::{ConfigError, Error, Result, StaleDataError};
use crate::ports::{ClimateDriver, ClimateReading, HostBus, MeasurementSink};
use crate::wire::ClimateFrame;

/// Shared single-threaded handle to a driver owned elsewhere.
pub type SharedDriver = Rc<RefCell<dyn ClimateDriver>>;
/// Shared single-threaded handle to a measurement sink owned elsewhere.
pub type SharedSink = Rc<RefCell<dyn MeasurementSink>>;

// ───────────────────────────────────────────────────────────────
// Measurement
// ───────────────────────────────────────────────────────────────

/// A value plus the monotonic timestamp it was captured at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub value: f32,
    pub captured_at_ms: u64,
}

impl Measurement {
    /// Age at `now_ms`, saturating on clock anomalies.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.captured_at_ms)
    }

    /// A measurement is servable while `age <= threshold`.
    pub fn is_fresh(&self, now_ms: u64, threshold_ms: u32) -> bool {
        self.age_ms(now_ms) <= u64::from(threshold_ms)
    }
}

/// Counters exposed for telemetry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatewayStats {
    /// Driver transactions attempted.
    pub driver_polls: u32,
    /// Driver transactions that failed or returned garbage.
    pub driver_failures: u32,
    /// Host requests answered with a frame.
    pub responses_sent: u32,
}

// ───────────────────────────────────────────────────────────────
// SensorGateway
// ───────────────────────────────────────────────────────────────

/// The gateway core.  Constructed once at startup, wired, started, then
/// ticked for the life of the process.
pub struct SensorGateway {
    bus: Option<Box<dyn HostBus>>,
    driver: Option<SharedDriver>,
    temperature_channel: Option<SharedSink>,
    humidity_channel: Option<SharedSink>,

    staleness_threshold_ms: u32,
    poll_cadence: Cadence,
    bus_cadence: Cadence,

    temperature: Option<Measurement>,
    humidity: Option<Measurement>,
    stats: GatewayStats,
}

impl SensorGateway {
    /// Construct from configuration.  Invalid timing values are fatal
    /// here — nothing is clamped or defaulted behind the caller's back.
    pub fn new(config: &GatewayConfig) -> core::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            bus: None,
            driver: None,
            temperature_channel: None,
            humidity_channel: None,
            staleness_threshold_ms: config.staleness_threshold_ms,
            poll_cadence: Cadence::new(config.poll_interval_ms),
            bus_cadence: Cadence::new(config.bus_poll_interval_ms),
            temperature: None,
            humidity: None,
            stats: GatewayStats::default(),
        })
    }

    // ── Wiring ────────────────────────────────────────────────
    //
    // The bus is owned exclusively; driver and channels are optional
    // shared handles — an absent handle means "feature disabled", never
    // an error.

    /// Bind the single-wire host bus (which owns the GPIO line).
    pub fn set_bus(&mut self, bus: Box<dyn HostBus>) {
        self.bus = Some(bus);
    }

    /// Bind the climate driver to poll.  Without a driver the gateway
    /// never updates its measurements.
    pub fn set_driver(&mut self, driver: SharedDriver) {
        self.driver = Some(driver);
    }

    /// Bind the sink that receives every fresh temperature.
    pub fn set_temperature_channel(&mut self, sink: SharedSink) {
        self.temperature_channel = Some(sink);
    }

    /// Bind the sink that receives every fresh humidity value.
    pub fn set_humidity_channel(&mut self, sink: SharedSink) {
        self.humidity_channel = Some(sink);
    }

    /// Change the driver poll interval.  Zero is rejected and the
    /// previous interval is kept.
    pub fn set_poll_interval_ms(&mut self, ms: u32) -> core::result::Result<(), ConfigError> {
        if ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        self.poll_cadence.set_interval_ms(ms);
        Ok(())
    }

    /// Change the staleness threshold.  Zero is rejected and the
    /// previous threshold is kept.
    pub fn set_staleness_threshold_ms(&mut self, ms: u32) -> core::result::Result<(), ConfigError> {
        if ms == 0 {
            return Err(ConfigError::ZeroStalenessThreshold);
        }
        self.staleness_threshold_ms = ms;
        Ok(())
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Verify the wiring and log the configuration summary.  The bus is
    /// the one mandatory binding — a bridge with no host line is a
    /// build mistake, not a disabled feature.
    pub fn start(&self) -> Result<()> {
        if self.bus.is_none() {
            return Err(Error::Init("host bus not bound"));
        }

        info!("SensorGateway:");
        info!(
            "  Driver: {}",
            if self.driver.is_some() { "bound" } else { "none (polling disabled)" }
        );
        info!("  Poll interval: {} ms", self.poll_cadence.interval_ms());
        info!("  Bus poll interval: {} ms", self.bus_cadence.interval_ms());
        info!("  Staleness threshold: {} ms", self.staleness_threshold_ms);
        info!(
            "  Temperature channel: {}",
            if self.temperature_channel.is_some() { "bound" } else { "none" }
        );
        info!(
            "  Humidity channel: {}",
            if self.humidity_channel.is_some() { "bound" } else { "none" }
        );
        Ok(())
    }

    // ── Scheduler callbacks ───────────────────────────────────

    /// Poll the driver when the poll interval has elapsed.
    ///
    /// The host loop may call this at any faster granularity; the
    /// cadence gate makes extra calls free.  A failed read is logged
    /// and skipped — previous measurements stay untouched (and keep
    /// ageing) and the next attempt happens at the next interval, not
    /// before.
    pub fn on_tick(&mut self, now_ms: u64) {
        let Some(driver) = self.driver.clone() else {
            return;
        };
        if !self.poll_cadence.poll(now_ms) {
            return;
        }

        self.stats.driver_polls = self.stats.driver_polls.saturating_add(1);
        match driver.borrow_mut().try_read() {
            Ok(reading) if reading.temperature_c.is_finite() && reading.humidity_pct.is_finite() => {
                self.store(reading, now_ms);
            }
            Ok(reading) => {
                self.stats.driver_failures = self.stats.driver_failures.saturating_add(1);
                warn!(
                    "driver returned non-finite reading (T={}, RH={}) — keeping previous values",
                    reading.temperature_c, reading.humidity_pct
                );
            }
            Err(e) => {
                self.stats.driver_failures = self.stats.driver_failures.saturating_add(1);
                warn!("driver read failed: {e} — keeping previous values");
            }
        }
    }

    /// Service the host bus: rate-limited listen, answer with fresh data.
    ///
    /// When either measurement is stale the request goes unanswered;
    /// the host treats a missing response as a failed read and retries
    /// on its own schedule.
    pub fn service_bus(&mut self, now_ms: u64) {
        if self.bus.is_none() {
            return;
        }
        if !self.bus_cadence.poll(now_ms) {
            return;
        }

        let saw_request = match self.bus.as_mut() {
            Some(bus) => bus.poll_request(),
            None => return,
        };
        if !saw_request {
            return;
        }

        let (temperature, humidity) =
            match (self.read_temperature(now_ms), self.read_humidity(now_ms)) {
                (Ok(t), Ok(h)) => (t, h),
                (t, h) => {
                    if let Err(e) = t {
                        warn!("host request ignored: temperature {e}");
                    }
                    if let Err(e) = h {
                        warn!("host request ignored: humidity {e}");
                    }
                    return;
                }
            };

        let frame = ClimateFrame::encode(temperature, humidity);
        if let Some(bus) = self.bus.as_mut() {
            bus.send_frame(&frame);
            self.stats.responses_sent = self.stats.responses_sent.saturating_add(1);
            debug!("answered host request: T={temperature:.1} °C, RH={humidity:.1} %");
        }
    }

    // ── Reads ─────────────────────────────────────────────────

    /// Latest temperature, if younger than the staleness threshold.
    pub fn read_temperature(&self, now_ms: u64) -> core::result::Result<f32, StaleDataError> {
        Self::fresh_value(self.temperature, now_ms, self.staleness_threshold_ms)
    }

    /// Latest humidity, if younger than the staleness threshold.
    pub fn read_humidity(&self, now_ms: u64) -> core::result::Result<f32, StaleDataError> {
        Self::fresh_value(self.humidity, now_ms, self.staleness_threshold_ms)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn stats(&self) -> GatewayStats {
        self.stats
    }

    pub fn poll_interval_ms(&self) -> u32 {
        self.poll_cadence.interval_ms()
    }

    pub fn staleness_threshold_ms(&self) -> u32 {
        self.staleness_threshold_ms
    }

    // ── Internal ──────────────────────────────────────────────

    fn store(&mut self, reading: ClimateReading, now_ms: u64) {
        self.temperature = Some(Measurement {
            value: reading.temperature_c,
            captured_at_ms: now_ms,
        });
        self.humidity = Some(Measurement {
            value: reading.humidity_pct,
            captured_at_ms: now_ms,
        });

        if let Some(sink) = &self.temperature_channel {
            sink.borrow_mut().publish(reading.temperature_c);
        }
        if let Some(sink) = &self.humidity_channel {
            sink.borrow_mut().publish(reading.humidity_pct);
        }
        debug!(
            "measurements updated: T={:.1} °C, RH={:.1} %",
            reading.temperature_c, reading.humidity_pct
        );
    }

    fn fresh_value(
        slot: Option<Measurement>,
        now_ms: u64,
        threshold_ms: u32,
    ) -> core::result::Result<f32, StaleDataError> {
        match slot {
            None => Err(StaleDataError::NoMeasurement),
            Some(m) if m.is_fresh(now_ms, threshold_ms) => Ok(m.value),
            Some(m) => Err(StaleDataError::Expired {
                age_ms: m.age_ms(now_ms),
            }),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
//
// Full gateway flows (driver, channels, bus) run against mock adapters
// in tests/integration/.  The module tests below cover the pieces that
// need no collaborators: freshness arithmetic, wiring-free reads, and
// setter validation.
