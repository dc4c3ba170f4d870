//! Sample sources for reflectance sensor rows.
//!
//! `SimulatedArray` is always available; the `hardware` feature adds the
//! Raspberry Pi backends.

pub mod error;
pub mod sim;
pub mod util;

#[cfg(feature = "hardware")]
pub mod hardware;

pub use error::HwError;
pub use sim::{LineHandle, SIM_RAW_MAX, SimulatedArray};

#[cfg(feature = "hardware")]
pub use hardware::{Mcp3008Source, RcDischargeSource};
