//! Mock collaborators for integration tests.
//!
//! Records every interaction so tests can assert on the full history
//! without touching real GPIO lines.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use climalink::error::DriverReadError;
use climalink::ports::{ClimateDriver, ClimateReading, HostBus, MeasurementSink};
use climalink::wire::ClimateFrame;

// ── ScriptedDriver ────────────────────────────────────────────

/// Driver whose reads are scripted in advance.  An exhausted script
/// reads as a timeout.
pub struct ScriptedDriver {
    script: VecDeque<Result<ClimateReading, DriverReadError>>,
    pub reads: u32,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            reads: 0,
        }
    }

    pub fn push_ok(&mut self, temperature_c: f32, humidity_pct: f32) {
        self.script.push_back(Ok(ClimateReading {
            temperature_c,
            humidity_pct,
        }));
    }

    pub fn push_err(&mut self, e: DriverReadError) {
        self.script.push_back(Err(e));
    }
}

impl Default for ScriptedDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl ClimateDriver for ScriptedDriver {
    fn try_read(&mut self) -> Result<ClimateReading, DriverReadError> {
        self.reads += 1;
        self.script
            .pop_front()
            .unwrap_or(Err(DriverReadError::Timeout))
    }
}

// ── RecordingSink ─────────────────────────────────────────────

/// Sink that records every published value.
pub struct RecordingSink {
    pub published: Vec<f32>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            published: Vec::new(),
        }
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasurementSink for RecordingSink {
    fn publish(&mut self, value: f32) {
        self.published.push(value);
    }
}

// ── ScriptedBus ───────────────────────────────────────────────

/// State shared between a [`ScriptedBus`] (moved into the gateway) and
/// the test that inspects it.
#[derive(Default)]
pub struct BusState {
    /// Requests the bus will report, one per `poll_request` call.
    pub pending_requests: u32,
    /// How many times the gateway listened.
    pub polls: u32,
    /// Frames the gateway transmitted.
    pub frames: Vec<ClimateFrame>,
}

pub struct ScriptedBus {
    state: Rc<RefCell<BusState>>,
}

impl ScriptedBus {
    /// Returns the bus (to hand to the gateway) and the shared state
    /// handle (for the test to script and inspect).
    pub fn new() -> (Self, Rc<RefCell<BusState>>) {
        let state = Rc::new(RefCell::new(BusState::default()));
        (
            Self {
                state: state.clone(),
            },
            state,
        )
    }
}

impl HostBus for ScriptedBus {
    fn poll_request(&mut self) -> bool {
        let mut state = self.state.borrow_mut();
        state.polls += 1;
        if state.pending_requests > 0 {
            state.pending_requests -= 1;
            true
        } else {
            false
        }
    }

    fn send_frame(&mut self, frame: &ClimateFrame) {
        self.state.borrow_mut().frames.push(*frame);
    }
}
