//! Support for the `MCP23008` "8-Bit I/O Expander with Serial Interface"
//!
//! Datasheet: https://ww1.microchip.com/downloads/en/DeviceDoc/21919e.pdf
//!
//! The MCP23008 offers a single eight-bit GPIO port.  It has three address pins, so eight devices
//! can coexist on an I2C bus.
use crate::codec::{Register, RegisterMap};
use crate::{GpioExpander, I2cRegisters, Port};

/// `MCP23008` with its port monitored through the interrupt-flag register.
pub type Mcp23008<T> = GpioExpander<T, Mcp23008Regs>;

impl<I2C> Mcp23008<I2cRegisters<I2C>>
where
    I2C: embedded_hal::i2c::I2c + Send + 'static,
{
    /// Create a new instance of the MCP23008 with the default monitor configuration.
    pub fn new_i2c(i2c: I2C, a0: bool, a1: bool, a2: bool) -> crate::Result<Self> {
        let addr = crate::bus::hardware_address(0x20, a0, a1, a2);
        Self::new(I2cRegisters::new(i2c, addr))
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Regs {
    Iodir = 0x00,
    Ipol = 0x01,
    Gpinten = 0x02,
    Defval = 0x03,
    Intcon = 0x04,
    Iocon = 0x05,
    Gppu = 0x06,
    Intf = 0x07,
    Intcap = 0x08,
    Gpio = 0x09,
    Olat = 0x0a,
}

impl From<Regs> for u8 {
    fn from(r: Regs) -> u8 {
        r as u8
    }
}

/// Register map of the MCP23008.
#[derive(Debug)]
pub struct Mcp23008Regs;

impl RegisterMap for Mcp23008Regs {
    const PORTS: &'static [Port] = &[Port::A];
    const INTERRUPTS: bool = true;

    fn address(register: Register, _port: Port) -> u8 {
        match register {
            Register::Direction => Regs::Iodir,
            Register::InterruptEnable => Regs::Gpinten,
            Register::DefaultValue => Regs::Defval,
            Register::InterruptControl => Regs::Intcon,
            Register::PullUp => Regs::Gppu,
            Register::InterruptFlags => Regs::Intf,
            Register::State => Regs::Gpio,
        }
        .into()
    }
}
