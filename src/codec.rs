//! Translation of pin-level intents into byte-wide register writes.
//!
//! Every register that is written bit by bit has a shadow byte per port holding the value last
//! written to the device.  Single-pin updates modify the shadow and write the whole byte, so
//! sibling pins sharing the register are never disturbed and the device never has to be read
//! back.  A failed write restores the shadow, keeping it equal to the device content.
use core::marker::PhantomData;

use log::error;

use crate::{Direction, Pin, PinState, Port, RegisterTransport, TransportError};

/// Logical registers of an MCP230xx-style expander, independent of their address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    /// IODIR: 1 = input, 0 = output
    Direction,
    /// GPINTEN: 1 = interrupt-on-change enabled
    InterruptEnable,
    /// DEFVAL: comparison value for interrupt-on-change
    DefaultValue,
    /// INTCON: 0 = compare against previous value, 1 = against DEFVAL
    InterruptControl,
    /// GPPU: 1 = weak pull-up enabled
    PullUp,
    /// INTF: 1 = pin caused the pending interrupt
    InterruptFlags,
    /// GPIO: pin levels on read, output latch on write
    State,
}

/// Register layout of one chip variant.
pub trait RegisterMap {
    /// Ports of the chip, in notification order.
    const PORTS: &'static [Port];

    /// Whether the chip arms interrupt-on-change for every input pin.
    const INTERRUPTS: bool;

    /// Device address of `register` in the bank of `port`.
    fn address(register: Register, port: Port) -> u8;
}

/// Process-held copies of the bit-wise written registers of one port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShadowRegisters {
    pub direction: u8,
    pub interrupt_enable: u8,
    pub pull_up: u8,
    pub output: u8,
}

impl ShadowRegisters {
    fn get_mut(&mut self, register: Register) -> &mut u8 {
        match register {
            Register::Direction => &mut self.direction,
            Register::InterruptEnable => &mut self.interrupt_enable,
            Register::PullUp => &mut self.pull_up,
            Register::State => &mut self.output,
            Register::DefaultValue | Register::InterruptControl | Register::InterruptFlags => {
                unreachable!("{:?} is not shadowed", register)
            }
        }
    }
}

pub(crate) struct PortCodec<T, R> {
    transport: T,
    shadows: [ShadowRegisters; 2],
    _r: PhantomData<fn() -> R>,
}

impl<T: RegisterTransport, R: RegisterMap> PortCodec<T, R> {
    /// Bring the chip into a known configuration.
    ///
    /// All pins become outputs latched at their current level, interrupts compare against the
    /// previous value and pull-ups are disabled.  Returns the pin levels read before
    /// reconfiguring, indexed by [`Port::index`].
    pub fn initialize(mut transport: T) -> Result<(Self, [u8; 2]), TransportError> {
        let mut initial = [0u8; 2];
        for &port in R::PORTS {
            initial[port.index()] = transport.read_reg(R::address(Register::State, port))?;
        }

        let mut shadows = [ShadowRegisters::default(); 2];
        for &port in R::PORTS {
            let shadow = &mut shadows[port.index()];
            shadow.output = initial[port.index()];

            transport.write_reg(R::address(Register::Direction, port), shadow.direction)?;
            if R::INTERRUPTS {
                transport.write_reg(
                    R::address(Register::InterruptEnable, port),
                    shadow.interrupt_enable,
                )?;
                transport.write_reg(R::address(Register::DefaultValue, port), 0x00)?;
                transport.write_reg(R::address(Register::InterruptControl, port), 0x00)?;
            }
            transport.write_reg(R::address(Register::State, port), shadow.output)?;
            transport.write_reg(R::address(Register::PullUp, port), shadow.pull_up)?;
        }

        Ok((
            Self {
                transport,
                shadows,
                _r: PhantomData,
            },
            initial,
        ))
    }

    pub fn shadow(&self, port: Port) -> ShadowRegisters {
        self.shadows[port.index()]
    }

    /// Whether any pin of `port` is currently programmed as an input.
    pub fn has_inputs(&self, port: Port) -> bool {
        self.shadows[port.index()].direction != 0
    }

    /// Program the direction of `pin` and arm or disarm its interrupt with it.
    ///
    /// If arming fails, the previous direction byte is written back so both registers keep
    /// agreeing.
    pub fn set_direction(&mut self, pin: Pin, dir: Direction) -> Result<(), TransportError> {
        let input = dir == Direction::Input;
        let previous = self.shadows[pin.port().index()].direction;
        self.write_bit(Register::Direction, pin, input)?;
        if R::INTERRUPTS {
            // inputs are exactly the pins armed for interrupt-on-change
            if let Err(e) = self.write_bit(Register::InterruptEnable, pin, input) {
                self.restore(Register::Direction, pin.port(), previous);
                return Err(e);
            }
        }
        Ok(())
    }

    pub fn set_pull_up(&mut self, pin: Pin, enable: bool) -> Result<(), TransportError> {
        self.write_bit(Register::PullUp, pin, enable)
    }

    pub fn set_output_state(&mut self, pin: Pin, state: PinState) -> Result<(), TransportError> {
        self.write_bit(Register::State, pin, state.is_high())
    }

    pub fn read_port_state(&mut self, port: Port) -> Result<u8, TransportError> {
        self.transport.read_reg(R::address(Register::State, port))
    }

    pub fn read_interrupt_flags(&mut self, port: Port) -> Result<u8, TransportError> {
        self.transport
            .read_reg(R::address(Register::InterruptFlags, port))
    }

    /// Update the shadowed bit of `pin` in `register` and write the whole byte.
    fn write_bit(&mut self, register: Register, pin: Pin, set: bool) -> Result<(), TransportError> {
        let shadow = self.shadows[pin.port().index()].get_mut(register);
        let previous = *shadow;
        if set {
            *shadow |= pin.mask();
        } else {
            *shadow &= !pin.mask();
        }
        let value = *shadow;

        let result = self
            .transport
            .write_reg(R::address(register, pin.port()), value);
        if result.is_err() {
            *self.shadows[pin.port().index()].get_mut(register) = previous;
        }
        result
    }

    /// Write `value` back to `register`.  The shadow follows only if the device accepted it.
    fn restore(&mut self, register: Register, port: Port, value: u8) {
        match self.transport.write_reg(R::address(register, port), value) {
            Ok(()) => *self.shadows[port.index()].get_mut(register) = value,
            Err(e) => error!("restoring {:?} of port {:?} failed: {}", register, port, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PortCodec, Register};
    use crate::dev::{mcp23008::Mcp23008Regs, mcp23017::Mcp23017Regs};
    use crate::{Direction, I2cRegisters, Pin, PinState, Port};
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c as mock_i2c;

    type Codec17 = PortCodec<I2cRegisters<mock_i2c::Mock>, Mcp23017Regs>;
    type Codec08 = PortCodec<I2cRegisters<mock_i2c::Mock>, Mcp23008Regs>;

    fn init_mcp23017(initial_a: u8, initial_b: u8) -> Vec<mock_i2c::Transaction> {
        vec![
            mock_i2c::Transaction::write_read(0x20, vec![0x12], vec![initial_a]),
            mock_i2c::Transaction::write_read(0x20, vec![0x13], vec![initial_b]),
            // port A
            mock_i2c::Transaction::write(0x20, vec![0x00, 0x00]),
            mock_i2c::Transaction::write(0x20, vec![0x04, 0x00]),
            mock_i2c::Transaction::write(0x20, vec![0x06, 0x00]),
            mock_i2c::Transaction::write(0x20, vec![0x08, 0x00]),
            mock_i2c::Transaction::write(0x20, vec![0x12, initial_a]),
            mock_i2c::Transaction::write(0x20, vec![0x0c, 0x00]),
            // port B
            mock_i2c::Transaction::write(0x20, vec![0x01, 0x00]),
            mock_i2c::Transaction::write(0x20, vec![0x05, 0x00]),
            mock_i2c::Transaction::write(0x20, vec![0x07, 0x00]),
            mock_i2c::Transaction::write(0x20, vec![0x09, 0x00]),
            mock_i2c::Transaction::write(0x20, vec![0x13, initial_b]),
            mock_i2c::Transaction::write(0x20, vec![0x0d, 0x00]),
        ]
    }

    #[test]
    fn mcp23017_initialize() {
        let expectations = init_mcp23017(0x81, 0x42);
        let mut bus = mock_i2c::Mock::new(&expectations);

        let (codec, initial) = Codec17::initialize(I2cRegisters::new(bus.clone(), 0x20)).unwrap();
        assert_eq!(initial, [0x81, 0x42]);
        assert_eq!(codec.shadow(Port::A).output, 0x81);
        assert_eq!(codec.shadow(Port::B).output, 0x42);
        assert!(!codec.has_inputs(Port::A));

        bus.done();
    }

    #[test]
    fn direction_arms_interrupts() {
        let mut expectations = init_mcp23017(0x00, 0x00);
        expectations.extend([
            // gpa2 input
            mock_i2c::Transaction::write(0x20, vec![0x00, 0x04]),
            mock_i2c::Transaction::write(0x20, vec![0x04, 0x04]),
            // gpa7 input
            mock_i2c::Transaction::write(0x20, vec![0x00, 0x84]),
            mock_i2c::Transaction::write(0x20, vec![0x04, 0x84]),
            // gpb0 input
            mock_i2c::Transaction::write(0x20, vec![0x01, 0x01]),
            mock_i2c::Transaction::write(0x20, vec![0x05, 0x01]),
            // gpa2 back to output
            mock_i2c::Transaction::write(0x20, vec![0x00, 0x80]),
            mock_i2c::Transaction::write(0x20, vec![0x04, 0x80]),
        ]);
        let mut bus = mock_i2c::Mock::new(&expectations);

        let (mut codec, _) = Codec17::initialize(I2cRegisters::new(bus.clone(), 0x20)).unwrap();
        codec
            .set_direction(Pin::new(Port::A, 2), Direction::Input)
            .unwrap();
        codec
            .set_direction(Pin::new(Port::A, 7), Direction::Input)
            .unwrap();
        codec
            .set_direction(Pin::new(Port::B, 0), Direction::Input)
            .unwrap();
        codec
            .set_direction(Pin::new(Port::A, 2), Direction::Output)
            .unwrap();

        assert_eq!(codec.shadow(Port::A).direction, 0x80);
        assert_eq!(codec.shadow(Port::A).interrupt_enable, 0x80);
        assert_eq!(codec.shadow(Port::B).direction, 0x01);
        assert!(codec.has_inputs(Port::B));

        bus.done();
    }

    #[test]
    fn sibling_pins_are_isolated() {
        let mut expectations = init_mcp23017(0x00, 0x00);
        expectations.extend([
            mock_i2c::Transaction::write(0x20, vec![0x0c, 0x01]),
            mock_i2c::Transaction::write(0x20, vec![0x0c, 0x09]),
            mock_i2c::Transaction::write(0x20, vec![0x0c, 0x08]),
            mock_i2c::Transaction::write(0x20, vec![0x12, 0x20]),
            mock_i2c::Transaction::write(0x20, vec![0x13, 0x20]),
        ]);
        let mut bus = mock_i2c::Mock::new(&expectations);

        let (mut codec, _) = Codec17::initialize(I2cRegisters::new(bus.clone(), 0x20)).unwrap();
        codec.set_pull_up(Pin::new(Port::A, 0), true).unwrap();
        codec.set_pull_up(Pin::new(Port::A, 3), true).unwrap();
        codec.set_pull_up(Pin::new(Port::A, 0), false).unwrap();
        codec
            .set_output_state(Pin::new(Port::A, 5), PinState::High)
            .unwrap();
        codec
            .set_output_state(Pin::new(Port::B, 5), PinState::High)
            .unwrap();

        assert_eq!(codec.shadow(Port::A).pull_up, 0x08);
        assert_eq!(codec.shadow(Port::B).pull_up, 0x00);
        assert_eq!(codec.shadow(Port::A).output, 0x20);

        bus.done();
    }

    #[test]
    fn failed_write_rolls_back_shadow() {
        let mut expectations = init_mcp23017(0x00, 0x00);
        expectations.extend([
            mock_i2c::Transaction::write(0x20, vec![0x00, 0x01]),
            mock_i2c::Transaction::write(0x20, vec![0x04, 0x01]),
            // gpa1 input: direction write fails
            mock_i2c::Transaction::write(0x20, vec![0x00, 0x03]).with_error(ErrorKind::Other),
            // gpa2 input: the failed bit must not reappear
            mock_i2c::Transaction::write(0x20, vec![0x00, 0x05]),
            // interrupt-enable write fails, direction is written back
            mock_i2c::Transaction::write(0x20, vec![0x04, 0x05]).with_error(ErrorKind::Bus),
            mock_i2c::Transaction::write(0x20, vec![0x00, 0x01]),
            // gpa3 input: arming fails and so does the write-back
            mock_i2c::Transaction::write(0x20, vec![0x00, 0x09]),
            mock_i2c::Transaction::write(0x20, vec![0x04, 0x09]).with_error(ErrorKind::Bus),
            mock_i2c::Transaction::write(0x20, vec![0x00, 0x01]).with_error(ErrorKind::Other),
            // gpa0 pull-up fails
            mock_i2c::Transaction::write(0x20, vec![0x0c, 0x01]).with_error(ErrorKind::Other),
        ]);
        let mut bus = mock_i2c::Mock::new(&expectations);

        let (mut codec, _) = Codec17::initialize(I2cRegisters::new(bus.clone(), 0x20)).unwrap();
        codec
            .set_direction(Pin::new(Port::A, 0), Direction::Input)
            .unwrap();

        let err = codec
            .set_direction(Pin::new(Port::A, 1), Direction::Input)
            .unwrap_err();
        assert_eq!(err.register, 0x00);
        assert_eq!(codec.shadow(Port::A).direction, 0x01);
        assert_eq!(codec.shadow(Port::A).interrupt_enable, 0x01);

        let err = codec
            .set_direction(Pin::new(Port::A, 2), Direction::Input)
            .unwrap_err();
        assert_eq!(err.register, 0x04);
        assert_eq!(codec.shadow(Port::A).direction, 0x01);
        assert_eq!(codec.shadow(Port::A).interrupt_enable, 0x01);

        let err = codec
            .set_direction(Pin::new(Port::A, 3), Direction::Input)
            .unwrap_err();
        assert_eq!(err.register, 0x04);
        // the device still holds the new direction
        assert_eq!(codec.shadow(Port::A).direction, 0x09);
        assert_eq!(codec.shadow(Port::A).interrupt_enable, 0x01);

        assert!(codec.set_pull_up(Pin::new(Port::A, 0), true).is_err());
        assert_eq!(codec.shadow(Port::A).pull_up, 0x00);

        bus.done();
    }

    #[test]
    fn raw_reads() {
        let mut expectations = init_mcp23017(0x00, 0x00);
        expectations.extend([
            mock_i2c::Transaction::write_read(0x20, vec![0x0f], vec![0x10]),
            mock_i2c::Transaction::write_read(0x20, vec![0x13], vec![0x30]),
        ]);
        let mut bus = mock_i2c::Mock::new(&expectations);

        let (mut codec, _) = Codec17::initialize(I2cRegisters::new(bus.clone(), 0x20)).unwrap();
        assert_eq!(codec.read_interrupt_flags(Port::B).unwrap(), 0x10);
        assert_eq!(codec.read_port_state(Port::B).unwrap(), 0x30);

        bus.done();
    }

    #[test]
    fn mcp23008_single_port() {
        let expectations = [
            mock_i2c::Transaction::write_read(0x27, vec![0x09], vec![0x0f]),
            mock_i2c::Transaction::write(0x27, vec![0x00, 0x00]),
            mock_i2c::Transaction::write(0x27, vec![0x02, 0x00]),
            mock_i2c::Transaction::write(0x27, vec![0x03, 0x00]),
            mock_i2c::Transaction::write(0x27, vec![0x04, 0x00]),
            mock_i2c::Transaction::write(0x27, vec![0x09, 0x0f]),
            mock_i2c::Transaction::write(0x27, vec![0x06, 0x00]),
            // gp6 input
            mock_i2c::Transaction::write(0x27, vec![0x00, 0x40]),
            mock_i2c::Transaction::write(0x27, vec![0x02, 0x40]),
            mock_i2c::Transaction::write(0x27, vec![0x06, 0x40]),
            mock_i2c::Transaction::write(0x27, vec![0x09, 0x0e]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let (mut codec, initial) =
            Codec08::initialize(I2cRegisters::new(bus.clone(), 0x27)).unwrap();
        assert_eq!(initial[0], 0x0f);

        let gp6 = Pin::new(Port::A, 6);
        codec.set_direction(gp6, Direction::Input).unwrap();
        codec.set_pull_up(gp6, true).unwrap();
        codec
            .set_output_state(Pin::new(Port::A, 0), PinState::Low)
            .unwrap();

        bus.done();
    }

    #[test]
    fn register_addresses() {
        use super::RegisterMap;
        assert_eq!(Mcp23017Regs::address(Register::InterruptFlags, Port::A), 0x0e);
        assert_eq!(Mcp23017Regs::address(Register::InterruptFlags, Port::B), 0x0f);
        assert_eq!(Mcp23017Regs::address(Register::State, Port::B), 0x13);
        assert_eq!(Mcp23008Regs::address(Register::InterruptFlags, Port::A), 0x07);
        assert_eq!(Mcp23008Regs::address(Register::PullUp, Port::A), 0x06);
    }
}
