//! Support for the `ADS1115` "16-Bit, 860-SPS, 4-Channel, Delta-Sigma ADC"
//!
//! Datasheet: https://www.ti.com/lit/ds/symlink/ads1115.pdf
//!
//! Every input is converted single-ended in single-shot mode against the ±4.096 V range at
//! 860 samples per second, with the comparator disabled.  Negative readings are clamped to zero,
//! so values span 0 to 32767.
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, I2c};

use crate::{Access, AnalogChip, AnalogExpander, Pin, PinMode, Port, TransportError};

pub const AIN0: Pin = Pin::new(Port::A, 0);
pub const AIN1: Pin = Pin::new(Port::A, 1);
pub const AIN2: Pin = Pin::new(Port::A, 2);
pub const AIN3: Pin = Pin::new(Port::A, 3);

/// `ADS1115` with its four inputs polled by the monitor.
pub type Ads1115<I2C, D> = AnalogExpander<Ads1115Chip<I2C, D>>;

/// Level of the ADDR pin, selecting one of four bus addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrPin {
    Gnd,
    Vdd,
    Sda,
    Scl,
}

impl AddrPin {
    fn address(self) -> u8 {
        0x48 | match self {
            AddrPin::Gnd => 0,
            AddrPin::Vdd => 1,
            AddrPin::Sda => 2,
            AddrPin::Scl => 3,
        }
    }
}

impl<I2C, D> Ads1115<I2C, D>
where
    I2C: I2c + Send + 'static,
    D: DelayNs + Send + 'static,
{
    pub fn new_i2c(i2c: I2C, delay: D, addr: AddrPin) -> Self {
        Self::new(Ads1115Chip {
            i2c,
            delay,
            addr: addr.address(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Regs {
    Conversion = 0x00,
    Config = 0x01,
}

impl From<Regs> for u8 {
    fn from(r: Regs) -> u8 {
        r as u8
    }
}

/// OS: write 1 to start a conversion, reads 1 when no conversion is in progress
const OS: u16 = 0x8000;
/// MUX: AINn against GND is 0b100 + n
const MUX_SINGLE_ENDED: u16 = 0b100 << 12;
/// PGA: ±4.096 V
const PGA_4_096V: u16 = 0b001 << 9;
const MODE_SINGLE_SHOT: u16 = 1 << 8;
const DR_860_SPS: u16 = 0b111 << 5;
const COMP_QUE_DISABLE: u16 = 0b11;

/// Worst-case conversion time at 860 SPS, with margin.
const CONVERSION_TIME_US: u32 = 1_200;

/// Register access to an `ADS1115`.
pub struct Ads1115Chip<I2C, D> {
    i2c: I2C,
    delay: D,
    addr: u8,
}

impl<I2C: I2c, D> Ads1115Chip<I2C, D> {
    fn write_reg(&mut self, reg: Regs, value: u16) -> Result<(), TransportError> {
        let [hi, lo] = value.to_be_bytes();
        self.i2c
            .write(self.addr, &[reg.into(), hi, lo])
            .map_err(|e| TransportError {
                register: reg.into(),
                access: Access::Write,
                kind: e.kind(),
            })
    }

    fn read_reg(&mut self, reg: Regs) -> Result<u16, TransportError> {
        let mut buf = [0x00; 2];
        self.i2c
            .write_read(self.addr, &[reg.into()], &mut buf)
            .map_err(|e| TransportError {
                register: reg.into(),
                access: Access::Read,
                kind: e.kind(),
            })?;
        Ok(u16::from_be_bytes(buf))
    }
}

fn config_for(pin: Pin) -> u16 {
    let mux = MUX_SINGLE_ENDED | (u16::from(pin.bit()) << 12);
    OS | mux | PGA_4_096V | MODE_SINGLE_SHOT | DR_860_SPS | COMP_QUE_DISABLE
}

impl<I2C, D> AnalogChip for Ads1115Chip<I2C, D>
where
    I2C: I2c + Send,
    D: DelayNs + Send,
{
    const PINS: &'static [(Pin, PinMode)] = &[
        (AIN0, PinMode::AnalogInput),
        (AIN1, PinMode::AnalogInput),
        (AIN2, PinMode::AnalogInput),
        (AIN3, PinMode::AnalogInput),
    ];
    const MIN_VALUE: u16 = 0;
    const MAX_VALUE: u16 = i16::MAX as u16;
    const DEFAULT_THRESHOLD: Option<u16> = Some(100);

    fn read_conversion(&mut self, pin: Pin) -> Result<Option<u16>, TransportError> {
        self.write_reg(Regs::Config, config_for(pin))?;
        self.delay.delay_us(CONVERSION_TIME_US);

        if self.read_reg(Regs::Config)? & OS == 0 {
            return Ok(None);
        }
        let raw = self.read_reg(Regs::Conversion)? as i16;
        Ok(Some(raw.max(0) as u16))
    }
}
