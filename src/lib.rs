//! Cached, monitored pin access for I2C port expanders.
//!
//! A provider owns one chip.  It remembers the last known attributes of every pin, turns
//! single-pin requests into byte-wide register writes, and runs a background monitor while
//! listeners are registered:
//!
//! - [`GpioExpander`] ([`Mcp23008`], [`Mcp23017`]) scans the interrupt flags of its ports,
//! - [`AnalogExpander`] ([`Ads1115`]) polls the conversion of each analog input.
//!
//! ```no_run
//! use port_expander_monitor::{Mcp23017, Pin, PinEvent, PinMode, Port, Provider};
//! # fn run(i2c: impl embedded_hal::i2c::I2c + Send + 'static) -> port_expander_monitor::Result<()> {
//! let mcp = Mcp23017::new_i2c(i2c, false, false, false)?;
//! let button = Pin::new(Port::A, 2);
//! mcp.set_mode(button, PinMode::DigitalInput)?;
//! mcp.add_listener(button, |event: PinEvent| println!("{:?}", event))?;
//! # Ok(())
//! # }
//! ```

mod adc;
mod bus;
mod cache;
mod codec;
mod common;
pub mod dev;
mod error;
mod gpio;
mod listener;
pub mod monitor;
mod pin;
mod provider;

#[cfg(test)]
mod test_util;

pub use adc::{AnalogChip, AnalogExpander};
pub use bus::{Access, I2cRegisters, RegisterTransport, TransportError};
pub use cache::PinAttributes;
pub use codec::{Register, RegisterMap, ShadowRegisters};
pub use common::{Direction, PinMode, PinState, PullResistance};
pub use error::{Error, Result};
pub use gpio::GpioExpander;
pub use listener::{ListenerId, PinEvent, PinListener};
pub use monitor::{Cadence, MonitorConfig, MonitorState};
pub use pin::{Pin, Port};
pub use provider::Provider;

pub use dev::ads1115::Ads1115;
pub use dev::mcp23008::Mcp23008;
pub use dev::mcp23017::Mcp23017;
