//! ClimaLink Firmware — Main Entry Point
//!
//! Bridges a DHT22 sensor to a legacy host controller that expects an
//! SI7021-style single-wire sensor, publishing every fresh reading to
//! log channels along the way.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  Si7021Link        Dht22            LogChannel   Monotonic   │
//! │  (HostBus)         (ClimateDriver)  (Sink ×2)    Clock       │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ───────────────        │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────┐      │
//! │  │            SensorGateway (pure logic)              │      │
//! │  │  poll cadence · staleness gate · frame building    │      │
//! │  └────────────────────────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Module declarations ───────────────────────────────────────
mod adapters;
mod cadence;
pub mod config;
mod drivers;
mod error;
mod gateway;
mod pins;
mod ports;
mod wire;

// ── Imports ───────────────────────────────────────────────────
use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use log::info;

use adapters::log_channel::LogChannel;
use adapters::time::MonotonicClock;
use cadence::Cadence;
use config::GatewayConfig;
use gateway::SensorGateway;

/// Main-loop granularity.  Every periodic activity is gated by its own
/// cadence inside the gateway, so the loop only needs to run at or
/// below the shortest interval (the 500 ms bus poll).
const LOOP_GRANULARITY_MS: u32 = 50;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    #[cfg(target_os = "espidf")]
    {
        esp_idf_svc::sys::link_patches();
        esp_idf_logger::init()?;
    }

    info!("ClimaLink v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration ──────────────────────────────────────
    // Compile-time defaults; re-validated by the gateway constructor.
    let config = GatewayConfig::default();

    // ── 3. Gateway + adapters ─────────────────────────────────
    let mut gateway = SensorGateway::new(&config)
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    attach_hardware(&mut gateway)?;

    gateway.set_temperature_channel(Rc::new(RefCell::new(LogChannel::new("temperature", "°C"))));
    gateway.set_humidity_channel(Rc::new(RefCell::new(LogChannel::new("humidity", "%"))));

    gateway
        .start()
        .map_err(|e| anyhow::anyhow!("gateway start failed: {e}"))?;

    // ── 4. Cooperative loop ───────────────────────────────────
    let clock = MonotonicClock::new();
    let mut telemetry = Cadence::new(config.telemetry_interval_secs.saturating_mul(1_000));

    info!("System ready. Entering main loop.");

    loop {
        #[cfg(target_os = "espidf")]
        esp_idf_hal::delay::FreeRtos::delay_ms(LOOP_GRANULARITY_MS);
        #[cfg(not(target_os = "espidf"))]
        std::thread::sleep(std::time::Duration::from_millis(u64::from(
            LOOP_GRANULARITY_MS,
        )));

        let now_ms = clock.now_ms();
        gateway.on_tick(now_ms);
        gateway.service_bus(now_ms);

        if telemetry.poll(now_ms) {
            log_telemetry(&gateway, now_ms);
        }
    }
}

// ── Hardware wiring ───────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn attach_hardware(gateway: &mut SensorGateway) -> Result<()> {
    use drivers::dht22::Dht22;
    use drivers::si7021_link::Si7021Link;
    use esp_idf_hal::delay::Ets;
    use esp_idf_hal::gpio::{AnyIOPin, PinDriver};

    // SAFETY: each GPIO is claimed exactly once, here, at startup.
    let bus_pin = PinDriver::input_output_od(unsafe { AnyIOPin::new(pins::HOST_BUS_GPIO) })?;
    let dht_pin = PinDriver::input_output_od(unsafe { AnyIOPin::new(pins::DHT22_DATA_GPIO) })?;

    gateway.set_bus(Box::new(Si7021Link::new(bus_pin, Ets)));
    gateway.set_driver(Rc::new(RefCell::new(Dht22::new(dht_pin, Ets))));
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
fn attach_hardware(gateway: &mut SensorGateway) -> Result<()> {
    use drivers::sim::{NullBus, SimulatedDriver};
    use log::warn;

    warn!("simulation build — fixed readings, no host attached");
    gateway.set_bus(Box::new(NullBus));
    gateway.set_driver(Rc::new(RefCell::new(SimulatedDriver::new())));
    Ok(())
}

// ── Telemetry ─────────────────────────────────────────────────

fn log_telemetry(gateway: &SensorGateway, now_ms: u64) {
    let stats = gateway.stats();
    let describe = |r: core::result::Result<f32, error::StaleDataError>, unit: &str| match r {
        Ok(v) => format!("{v:.1} {unit}"),
        Err(e) => e.to_string(),
    };

    info!(
        "TELEM | T: {} | RH: {} | polls={} failures={} responses={}",
        describe(gateway.read_temperature(now_ms), "°C"),
        describe(gateway.read_humidity(now_ms), "%"),
        stats.driver_polls,
        stats.driver_failures,
        stats.responses_sent,
    );
}
