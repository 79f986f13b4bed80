//! Host-build simulation stand-ins for the hardware adapters.
//!
//! Lets the binary run on a development machine with no GPIO attached:
//! the driver reports a fixed room climate and the bus never sees a
//! host.  Integration tests use their own scripted mocks instead.

use log::debug;

use crate::error::DriverReadError;
use crate::ports::{ClimateDriver, ClimateReading, HostBus};
use crate::wire::ClimateFrame;

/// Driver stand-in reporting a fixed 25.0 °C / 50.0 % RH.
pub struct SimulatedDriver {
    reading: ClimateReading,
}

impl SimulatedDriver {
    pub fn new() -> Self {
        Self {
            reading: ClimateReading {
                temperature_c: 25.0,
                humidity_pct: 50.0,
            },
        }
    }

    pub fn set_reading(&mut self, temperature_c: f32, humidity_pct: f32) {
        self.reading = ClimateReading {
            temperature_c,
            humidity_pct,
        };
    }
}

impl Default for SimulatedDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl ClimateDriver for SimulatedDriver {
    fn try_read(&mut self) -> Result<ClimateReading, DriverReadError> {
        Ok(self.reading)
    }
}

/// Bus stand-in: no host attached, frames are dropped with a log line.
pub struct NullBus;

impl HostBus for NullBus {
    fn poll_request(&mut self) -> bool {
        false
    }

    fn send_frame(&mut self, frame: &ClimateFrame) {
        debug!("sim bus: frame {:02X?} dropped (no host)", frame.as_bytes());
    }
}
