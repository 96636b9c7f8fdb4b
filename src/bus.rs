use core::fmt;
use embedded_hal::i2c as hal_i2c;
use embedded_hal::i2c::Error as _;

/// Byte-wide register access to a single device.
///
/// Implementations are synchronous and keep at most one operation in flight.  Failures are
/// reported as [`TransportError`], naming the register that could not be accessed.
pub trait RegisterTransport {
    fn read_reg(&mut self, reg: u8) -> Result<u8, TransportError>;
    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), TransportError>;
}

/// Which half of a register access failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// A register read or write failed on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportError {
    pub register: u8,
    pub access: Access,
    pub kind: hal_i2c::ErrorKind,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let access = match self.access {
            Access::Read => "read",
            Access::Write => "write",
        };
        write!(
            f,
            "{} of register {:#04x} failed: {:?}",
            access, self.register, self.kind
        )
    }
}

impl std::error::Error for TransportError {}

/// [`RegisterTransport`] for a device at a fixed address on an `embedded-hal` I2C bus.
pub struct I2cRegisters<I2C> {
    i2c: I2C,
    addr: u8,
}

impl<I2C> I2cRegisters<I2C> {
    pub fn new(i2c: I2C, addr: u8) -> Self {
        Self { i2c, addr }
    }

    pub fn address(&self) -> u8 {
        self.addr
    }

    /// Give back the wrapped bus.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: hal_i2c::I2c> RegisterTransport for I2cRegisters<I2C> {
    fn read_reg(&mut self, reg: u8) -> Result<u8, TransportError> {
        let mut buf = [0x00];
        self.i2c
            .write_read(self.addr, &[reg], &mut buf)
            .map_err(|e| TransportError {
                register: reg,
                access: Access::Read,
                kind: e.kind(),
            })?;
        Ok(buf[0])
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), TransportError> {
        self.i2c
            .write(self.addr, &[reg, value])
            .map_err(|e| TransportError {
                register: reg,
                access: Access::Write,
                kind: e.kind(),
            })
    }
}

/// Compute the 7-bit address of a chip with a fixed base and three address pins.
pub(crate) fn hardware_address(base: u8, a0: bool, a1: bool, a2: bool) -> u8 {
    base | ((a2 as u8) << 2) | ((a1 as u8) << 1) | (a0 as u8)
}
