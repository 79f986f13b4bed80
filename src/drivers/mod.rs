//! Hardware drivers for the two single-wire lines.
//!
//! Both are bit-banged over `embedded-hal` pin/delay traits so they
//! compile for any target; `main.rs` instantiates them with ESP-IDF
//! pin drivers on hardware.  `sim` provides host-build stand-ins.

pub mod dht22;
pub mod si7021_link;

#[cfg(not(target_os = "espidf"))]
pub mod sim;
