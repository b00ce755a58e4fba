//! Core traits and types shared by the chip crates.
//!
//! Chips never hold references to each other. A CPU is handed a `Bus` for
//! the duration of one `step()`, and the console aggregate decides what
//! sits behind that bus.

mod bus;
mod cpu;
mod observable;

pub use bus::{Bus, SimpleBus};
pub use cpu::Cpu;
pub use observable::{Observable, Value, parse_address};
