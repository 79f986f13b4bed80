//! Log-backed measurement channel.
//!
//! Implements [`MeasurementSink`] by writing each published measurement
//! to the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! An MQTT or display channel would implement the same trait.

use log::info;

use crate::ports::MeasurementSink;

/// Adapter that logs every published measurement.
pub struct LogChannel {
    label: &'static str,
    unit: &'static str,
    last: Option<f32>,
}

impl LogChannel {
    pub fn new(label: &'static str, unit: &'static str) -> Self {
        Self {
            label,
            unit,
            last: None,
        }
    }

    /// Last value published through this channel, for telemetry.
    pub fn last(&self) -> Option<f32> {
        self.last
    }
}

impl MeasurementSink for LogChannel {
    fn publish(&mut self, value: f32) {
        info!("{} | {:.1} {}", self.label, value, self.unit);
        self.last = Some(value);
    }
}
