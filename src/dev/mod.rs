//! The device module contains the register maps and drivers for each of the supported chips.
//!
//! In most cases you will not need anything from here explicitly, the exposed types at the root of
//! the crate should be enough.

pub mod ads1115;
pub mod mcp23008;
pub mod mcp23017;
