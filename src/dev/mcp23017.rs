//! Support for the `MCP23017` "16-Bit I/O Expander with Serial Interface"
//!
//! Datasheet: https://ww1.microchip.com/downloads/en/devicedoc/20001952c.pdf
//!
//! The MCP23017 offers two eight-bit GPIO ports, A and B.  It has three address pins, so eight
//! devices can coexist on an I2C bus.  Registers of port B sit one address above their port A
//! counterpart.
use crate::codec::{Register, RegisterMap};
use crate::{GpioExpander, I2cRegisters, Port};

/// `MCP23017` with both ports monitored through the interrupt-flag registers.
pub type Mcp23017<T> = GpioExpander<T, Mcp23017Regs>;

impl<I2C> Mcp23017<I2cRegisters<I2C>>
where
    I2C: embedded_hal::i2c::I2c + Send + 'static,
{
    /// Create a new instance of the MCP23017 with the default monitor configuration.
    pub fn new_i2c(i2c: I2C, a0: bool, a1: bool, a2: bool) -> crate::Result<Self> {
        let addr = crate::bus::hardware_address(0x20, a0, a1, a2);
        Self::new(I2cRegisters::new(i2c, addr))
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// N.B.: These values are for BANK=0, which is the reset state of
/// the chip (and this driver does not change).
///
/// For all registers, the reset value is 0x00, except for
/// IODIR{A,B} which are 0xFF (making all pins inputs) at reset.
enum Regs {
    /// IODIR: input/output direction: 0=output; 1=input
    IODIRA = 0x00,
    IODIRB = 0x01,
    /// IPOL: input polarity: 0=register values match input pins; 1=opposite
    IPOLA = 0x02,
    IPOLB = 0x03,
    /// GPINTEN: interrupt-on-change: 0=disable; 1=enable
    GPINTENA = 0x04,
    GPINTENB = 0x05,
    /// DEFVAL: default values for interrupt-on-change
    DEFVALA = 0x06,
    DEFVALB = 0x07,
    /// INTCON: interrupt-on-change config: 0=compare to previous pin value;
    ///   1=compare to corresponding bit in DEFVAL
    INTCONA = 0x08,
    INTCONB = 0x09,
    /// IOCON: configuration register, shared by both ports
    IOCON = 0x0a,
    /// GPPU: weak internal pull-ups on pins configured as inputs
    GPPUA = 0x0c,
    GPPUB = 0x0d,
    /// INTF: interrupt flags: 1=corresponding pin caused the interrupt
    INTFA = 0x0e,
    INTFB = 0x0f,
    /// INTCAP: value of each pin at the time it caused an interrupt
    INTCAPA = 0x10,
    INTCAPB = 0x11,
    /// GPIO: reflects logic level on pins, writes go to the output latch
    GPIOA = 0x12,
    GPIOB = 0x13,
    /// OLAT: output latches
    OLATA = 0x14,
    OLATB = 0x15,
}

impl From<Regs> for u8 {
    fn from(r: Regs) -> u8 {
        r as u8
    }
}

/// Distance between a port A register and its port B counterpart.
const PORT_STRIDE: u8 = Regs::IODIRB as u8 - Regs::IODIRA as u8;

/// Register map of the MCP23017.
#[derive(Debug)]
pub struct Mcp23017Regs;

impl RegisterMap for Mcp23017Regs {
    const PORTS: &'static [Port] = &[Port::A, Port::B];
    const INTERRUPTS: bool = true;

    fn address(register: Register, port: Port) -> u8 {
        let base: u8 = match register {
            Register::Direction => Regs::IODIRA,
            Register::InterruptEnable => Regs::GPINTENA,
            Register::DefaultValue => Regs::DEFVALA,
            Register::InterruptControl => Regs::INTCONA,
            Register::PullUp => Regs::GPPUA,
            Register::InterruptFlags => Regs::INTFA,
            Register::State => Regs::GPIOA,
        }
        .into();
        match port {
            Port::A => base,
            Port::B => base + PORT_STRIDE,
        }
    }
}
