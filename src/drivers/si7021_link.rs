//! Bit-banged SI7021/DHT response link to the legacy host.
//!
//! Owns the single-wire line shared with the host (open-drain with an
//! external pull-up; `set_high` releases the line).  Idle state is
//! input.  A host read request is a nominally 500 µs LOW pulse; the
//! answer is a 5-byte frame in DHT bit timing (see [`crate::wire`]).
//!
//! Pulse widths are measured by 1 µs polling against `DelayNs` — the
//! same technique DHT client drivers use on their read side.  The
//! request listen window blocks for up to ~30 ms, which is why the
//! gateway rate-limits bus servicing to its own cadence.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::{debug, warn};

use crate::ports::HostBus;
use crate::wire::{self, ClimateFrame};

/// How long one `poll_request` call listens for a request pulse.
const LISTEN_WINDOW_US: u32 = 30_000;
/// Sampling period while listening.
const SAMPLE_PERIOD_US: u32 = 10;
/// Upper bound while timing a LOW pulse; the host never holds the line
/// anywhere near this long for a request.
const RELEASE_TIMEOUT_US: u32 = 2_000;

pub struct Si7021Link<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> Si7021Link<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// `pin` must be configured open-drain; the line idles released.
    pub fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }

    /// Listen for HIGH → LOW → HIGH with a LOW phase inside the valid
    /// request window.  An out-of-window pulse (line noise, a foreign
    /// transaction) restarts detection within the same window.
    fn listen(&mut self) -> Result<bool, P::Error> {
        let mut elapsed: u32 = 0;
        let mut seen_high = false;
        while elapsed < LISTEN_WINDOW_US {
            let level_high = self.pin.is_high()?;
            if !seen_high {
                seen_high = level_high;
            } else if !level_high {
                let pulse_us = self.time_low_phase()?;
                elapsed += pulse_us;
                if wire::is_request_pulse(pulse_us) {
                    debug!("request pulse {pulse_us} µs");
                    return Ok(true);
                }
                debug!("pulse {pulse_us} µs outside request window — ignored");
                seen_high = false;
            }
            self.delay.delay_us(SAMPLE_PERIOD_US);
            elapsed += SAMPLE_PERIOD_US;
        }
        Ok(false)
    }

    /// Measure how long the line stays LOW, bounded by
    /// [`RELEASE_TIMEOUT_US`].
    fn time_low_phase(&mut self) -> Result<u32, P::Error> {
        let mut pulse_us: u32 = 0;
        while self.pin.is_low()? {
            if pulse_us >= RELEASE_TIMEOUT_US {
                break;
            }
            self.delay.delay_us(1);
            pulse_us += 1;
        }
        Ok(pulse_us)
    }

    fn write_frame(&mut self, frame: &ClimateFrame) -> Result<(), P::Error> {
        // Presence header: LOW, then release HIGH.
        self.pin.set_low()?;
        self.delay.delay_us(wire::PRESENCE_LOW_US);
        self.pin.set_high()?;
        self.delay.delay_us(wire::PRESENCE_HIGH_US);

        for byte in frame.as_bytes() {
            for bit in (0..8).rev() {
                self.pin.set_low()?;
                self.delay.delay_us(wire::BIT_PREAMBLE_LOW_US);
                self.pin.set_high()?;
                let high_us = if (byte >> bit) & 1 == 1 {
                    wire::BIT_ONE_HIGH_US
                } else {
                    wire::BIT_ZERO_HIGH_US
                };
                self.delay.delay_us(high_us);
            }
        }

        // Tail: LOW, then release the line back to idle.
        self.pin.set_low()?;
        self.delay.delay_us(wire::FRAME_TAIL_LOW_US);
        self.pin.set_high()?;
        Ok(())
    }
}

impl<P, D> HostBus for Si7021Link<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    fn poll_request(&mut self) -> bool {
        match self.listen() {
            Ok(seen) => seen,
            Err(e) => {
                warn!("host-bus line read failed: {e:?}");
                false
            }
        }
    }

    fn send_frame(&mut self, frame: &ClimateFrame) {
        self.delay.delay_us(wire::RESPONSE_SETUP_US);

        // Bit timing must not be stretched by an ISR mid-frame.
        #[cfg(target_os = "espidf")]
        let result = esp_idf_hal::interrupt::free(|| self.write_frame(frame));
        #[cfg(not(target_os = "espidf"))]
        let result = self.write_frame(frame);

        if let Err(e) = result {
            warn!("host-bus frame transmit failed: {e:?} — releasing line");
            let _ = self.pin.set_high();
        }
    }
}
