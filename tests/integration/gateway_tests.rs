//! Integration tests for the gateway → channels / host-bus pipeline.
//!
//! These drive the full tick/read/respond flow with scripted mocks and
//! an explicit test clock (plain millisecond numbers), so every
//! staleness boundary is exact.

use std::cell::RefCell;
use std::rc::Rc;

use climalink::config::GatewayConfig;
use climalink::error::{DriverReadError, StaleDataError};
use climalink::gateway::SensorGateway;
use climalink::wire::ClimateFrame;

use crate::mocks::{RecordingSink, ScriptedBus, ScriptedDriver};

/// Default poll interval used by these tests (matches the config default).
const POLL_MS: u64 = 2_000;

fn gateway() -> SensorGateway {
    SensorGateway::new(&GatewayConfig::default()).unwrap()
}

fn shared_driver() -> Rc<RefCell<ScriptedDriver>> {
    Rc::new(RefCell::new(ScriptedDriver::new()))
}

// ── Staleness gating ──────────────────────────────────────────

#[test]
fn reads_are_stale_until_a_successful_tick() {
    let mut gw = gateway();
    let driver = shared_driver();
    driver.borrow_mut().push_err(DriverReadError::Timeout);
    gw.set_driver(driver.clone());

    assert_eq!(gw.read_temperature(0), Err(StaleDataError::NoMeasurement));

    // A failed tick is not a successful tick.
    gw.on_tick(0);
    assert_eq!(gw.read_temperature(0), Err(StaleDataError::NoMeasurement));
    assert_eq!(gw.read_humidity(0), Err(StaleDataError::NoMeasurement));
}

#[test]
fn staleness_threshold_is_inclusive() {
    let mut gw = gateway();
    let driver = shared_driver();
    driver.borrow_mut().push_ok(21.5, 48.0);
    gw.set_driver(driver);

    gw.on_tick(0);

    assert_eq!(gw.read_temperature(24_999), Ok(21.5));
    assert_eq!(gw.read_temperature(25_000), Ok(21.5));
    assert_eq!(
        gw.read_temperature(25_001),
        Err(StaleDataError::Expired { age_ms: 25_001 })
    );
    assert_eq!(gw.read_humidity(24_999), Ok(48.0));
    assert_eq!(
        gw.read_humidity(25_001),
        Err(StaleDataError::Expired { age_ms: 25_001 })
    );
}

#[test]
fn failed_read_keeps_previous_measurement_and_timestamp() {
    let mut gw = gateway();
    let driver = shared_driver();
    {
        let mut d = driver.borrow_mut();
        d.push_ok(20.0, 40.0);
        d.push_err(DriverReadError::ChecksumMismatch);
    }
    gw.set_driver(driver);

    gw.on_tick(0);
    gw.on_tick(POLL_MS); // fails — previous value and timestamp survive

    assert_eq!(gw.read_temperature(POLL_MS), Ok(20.0));
    // The value keeps ageing from t=0, not from the failed poll.
    assert_eq!(
        gw.read_temperature(25_001),
        Err(StaleDataError::Expired { age_ms: 25_001 })
    );

    let stats = gw.stats();
    assert_eq!(stats.driver_polls, 2);
    assert_eq!(stats.driver_failures, 1);
}

#[test]
fn non_finite_reading_counts_as_failure() {
    let mut gw = gateway();
    let driver = shared_driver();
    {
        let mut d = driver.borrow_mut();
        d.push_ok(20.0, 40.0);
        d.push_ok(f32::NAN, 50.0);
    }
    gw.set_driver(driver);

    gw.on_tick(0);
    gw.on_tick(POLL_MS);

    assert_eq!(gw.read_temperature(POLL_MS), Ok(20.0));
    assert_eq!(gw.read_humidity(POLL_MS), Ok(40.0));
    assert_eq!(gw.stats().driver_failures, 1);
}

// ── Channel publishing ────────────────────────────────────────

#[test]
fn successful_tick_publishes_to_both_channels() {
    let mut gw = gateway();
    let driver = shared_driver();
    driver.borrow_mut().push_ok(22.5, 55.0);
    gw.set_driver(driver);

    let temp_sink = Rc::new(RefCell::new(RecordingSink::new()));
    let hum_sink = Rc::new(RefCell::new(RecordingSink::new()));
    gw.set_temperature_channel(temp_sink.clone());
    gw.set_humidity_channel(hum_sink.clone());

    gw.on_tick(0);

    assert_eq!(temp_sink.borrow().published, vec![22.5]);
    assert_eq!(hum_sink.borrow().published, vec![55.0]);
}

#[test]
fn unbound_temperature_channel_does_not_affect_humidity() {
    let mut gw = gateway();
    let driver = shared_driver();
    driver.borrow_mut().push_ok(22.5, 55.0);
    gw.set_driver(driver);

    let hum_sink = Rc::new(RefCell::new(RecordingSink::new()));
    gw.set_humidity_channel(hum_sink.clone());

    gw.on_tick(0);

    assert_eq!(hum_sink.borrow().published, vec![55.0]);
    // The internal measurement is still stored and readable.
    assert_eq!(gw.read_temperature(0), Ok(22.5));
}

#[test]
fn failed_tick_publishes_nothing() {
    let mut gw = gateway();
    let driver = shared_driver();
    driver.borrow_mut().push_err(DriverReadError::Timeout);
    gw.set_driver(driver);

    let temp_sink = Rc::new(RefCell::new(RecordingSink::new()));
    gw.set_temperature_channel(temp_sink.clone());

    gw.on_tick(0);
    assert!(temp_sink.borrow().published.is_empty());
}

// ── Poll cadence ──────────────────────────────────────────────

#[test]
fn ticks_faster_than_the_interval_read_once_per_interval() {
    let mut gw = gateway();
    let driver = shared_driver();
    for _ in 0..4 {
        driver.borrow_mut().push_ok(20.0, 40.0);
    }
    gw.set_driver(driver.clone());

    // 50 ms loop granularity for 2.1 s.
    let mut now = 0u64;
    while now <= 2_100 {
        gw.on_tick(now);
        now += 50;
    }

    // First tick reads immediately, second read at the 2 s mark.
    assert_eq!(driver.borrow().reads, 2);
}

#[test]
fn failed_read_waits_for_the_next_interval() {
    let mut gw = gateway();
    let driver = shared_driver();
    {
        let mut d = driver.borrow_mut();
        d.push_err(DriverReadError::Timeout);
        d.push_ok(20.0, 40.0);
    }
    gw.set_driver(driver.clone());

    gw.on_tick(0); // fails
    gw.on_tick(100); // gated — no immediate retry
    assert_eq!(driver.borrow().reads, 1);

    gw.on_tick(POLL_MS); // next interval — retry happens
    assert_eq!(driver.borrow().reads, 2);
    assert_eq!(gw.read_temperature(POLL_MS), Ok(20.0));
}

#[test]
fn no_driver_means_no_polling() {
    let mut gw = gateway();
    gw.on_tick(0);
    gw.on_tick(POLL_MS);
    assert_eq!(gw.stats().driver_polls, 0);
    assert_eq!(gw.read_temperature(POLL_MS), Err(StaleDataError::NoMeasurement));
}

// ── Host bus ──────────────────────────────────────────────────

#[test]
fn fresh_data_answers_a_host_request() {
    let mut gw = gateway();
    let driver = shared_driver();
    driver.borrow_mut().push_ok(21.5, 48.0);
    gw.set_driver(driver);

    let (bus, bus_state) = ScriptedBus::new();
    gw.set_bus(Box::new(bus));
    gw.start().unwrap();

    gw.on_tick(0);
    bus_state.borrow_mut().pending_requests = 1;
    gw.service_bus(100);

    let state = bus_state.borrow();
    assert_eq!(state.frames.len(), 1);
    assert_eq!(state.frames[0], ClimateFrame::encode(21.5, 48.0));
    assert_eq!(gw.stats().responses_sent, 1);
}

#[test]
fn stale_data_leaves_a_host_request_unanswered() {
    let mut gw = gateway();
    let driver = shared_driver();
    driver.borrow_mut().push_ok(21.5, 48.0);
    gw.set_driver(driver);

    let (bus, bus_state) = ScriptedBus::new();
    gw.set_bus(Box::new(bus));

    gw.on_tick(0);
    bus_state.borrow_mut().pending_requests = 1;
    gw.service_bus(30_000); // both measurements expired

    assert!(bus_state.borrow().frames.is_empty());
    assert_eq!(gw.stats().responses_sent, 0);
}

#[test]
fn request_before_any_measurement_is_unanswered() {
    let mut gw = gateway();
    let (bus, bus_state) = ScriptedBus::new();
    gw.set_bus(Box::new(bus));

    bus_state.borrow_mut().pending_requests = 1;
    gw.service_bus(0);

    assert!(bus_state.borrow().frames.is_empty());
}

#[test]
fn bus_listening_is_rate_limited() {
    let mut gw = gateway();
    let (bus, bus_state) = ScriptedBus::new();
    gw.set_bus(Box::new(bus));

    gw.service_bus(0);
    gw.service_bus(100); // inside the 500 ms bus poll interval
    gw.service_bus(499);
    assert_eq!(bus_state.borrow().polls, 1);

    gw.service_bus(500);
    assert_eq!(bus_state.borrow().polls, 2);
}

#[test]
fn no_bus_means_service_is_a_no_op() {
    let mut gw = gateway();
    gw.service_bus(0);
    assert_eq!(gw.stats().responses_sent, 0);
}
