//! DHT22/AM2302 climate sensor driver.
//!
//! Bit-banged over a dedicated open-drain line with pull-up — the read
//! side of the frame format in [`crate::wire`].  One transaction:
//!
//! ```text
//! host:   LOW ≥1 ms, release
//! sensor: LOW 80 µs, HIGH 80 µs            (presence)
//! sensor: 40 × (LOW 50 µs, HIGH 26/70 µs)  (data bits, 0/1)
//! sensor: LOW 50 µs, release               (tail)
//! ```
//!
//! The sensor needs ≥2 s between transactions; the gateway's poll
//! cadence (default 2000 ms) provides that spacing, so the driver does
//! not track it itself.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::error::DriverReadError;
use crate::ports::{ClimateDriver, ClimateReading};
use crate::wire::{self, ClimateFrame};

/// Host start signal: hold LOW past the 1 ms minimum, then release.
const START_LOW_US: u32 = 1_100;
const START_RELEASE_US: u32 = 40;
/// Each presence phase is nominally 80 µs.
const PRESENCE_TIMEOUT_US: u32 = 120;
/// Bit preamble LOW is nominally 50 µs.
const BIT_LOW_TIMEOUT_US: u32 = 80;
/// A HIGH phase longer than this is a 1 (nominal: 26 µs = 0, 70 µs = 1).
const BIT_ONE_THRESHOLD_US: u32 = 40;
const BIT_HIGH_TIMEOUT_US: u32 = 100;

/// AM2302 physical limits, applied after checksum validation.
const TEMPERATURE_MIN_C: f32 = -40.0;
const TEMPERATURE_MAX_C: f32 = 80.0;
const HUMIDITY_MAX_PCT: f32 = 100.0;

pub struct Dht22<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> Dht22<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// `pin` must be configured open-drain; the line idles released.
    pub fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }

    /// Busy-wait until the line reaches `high`, returning the time
    /// waited in µs, or [`DriverReadError::Timeout`] past `timeout_us`.
    fn wait_level(&mut self, high: bool, timeout_us: u32) -> Result<u32, DriverReadError> {
        let mut waited: u32 = 0;
        loop {
            let level = self.pin.is_high().map_err(|_| DriverReadError::Gpio)?;
            if level == high {
                return Ok(waited);
            }
            if waited >= timeout_us {
                return Err(DriverReadError::Timeout);
            }
            self.delay.delay_us(1);
            waited += 1;
        }
    }

    fn read_frame(&mut self) -> Result<[u8; wire::FRAME_LEN], DriverReadError> {
        // Start signal.
        self.pin.set_low().map_err(|_| DriverReadError::Gpio)?;
        self.delay.delay_us(START_LOW_US);
        self.pin.set_high().map_err(|_| DriverReadError::Gpio)?;
        self.delay.delay_us(START_RELEASE_US);

        // Presence answer, then the HIGH→LOW edge that opens bit 1.
        self.wait_level(false, PRESENCE_TIMEOUT_US)?;
        self.wait_level(true, PRESENCE_TIMEOUT_US)?;
        self.wait_level(false, PRESENCE_TIMEOUT_US)?;

        // 40 data bits.  At loop entry the line is LOW (bit preamble).
        let mut bytes = [0u8; wire::FRAME_LEN];
        for byte in &mut bytes {
            for _ in 0..8 {
                self.wait_level(true, BIT_LOW_TIMEOUT_US)?;
                let high_us = self.wait_level(false, BIT_HIGH_TIMEOUT_US)?;
                *byte = (*byte << 1) | u8::from(high_us > BIT_ONE_THRESHOLD_US);
            }
        }
        Ok(bytes)
    }
}

impl<P, D> ClimateDriver for Dht22<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    fn try_read(&mut self) -> Result<ClimateReading, DriverReadError> {
        let bytes = self.read_frame()?;
        let (temperature_c, humidity_pct) =
            ClimateFrame::decode(&bytes).map_err(|_| DriverReadError::ChecksumMismatch)?;

        if !(TEMPERATURE_MIN_C..=TEMPERATURE_MAX_C).contains(&temperature_c)
            || !(0.0..=HUMIDITY_MAX_PCT).contains(&humidity_pct)
        {
            return Err(DriverReadError::InvalidReading);
        }

        Ok(ClimateReading {
            temperature_c,
            humidity_pct,
        })
    }
}
