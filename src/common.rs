use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Direction of a digital pin as programmed into the direction register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// Operating mode of a pin.  Governs which accessors are legal for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PinMode {
    DigitalInput,
    DigitalOutput,
    AnalogInput,
    AnalogOutput,
}

impl PinMode {
    pub fn is_digital(self) -> bool {
        matches!(self, PinMode::DigitalInput | PinMode::DigitalOutput)
    }

    pub fn is_analog(self) -> bool {
        matches!(self, PinMode::AnalogInput | PinMode::AnalogOutput)
    }

    /// The register direction backing a digital mode.
    pub(crate) fn direction(self) -> Option<Direction> {
        match self {
            PinMode::DigitalInput => Some(Direction::Input),
            PinMode::DigitalOutput => Some(Direction::Output),
            PinMode::AnalogInput | PinMode::AnalogOutput => None,
        }
    }
}

impl fmt::Display for PinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PinMode::DigitalInput => "digital input",
            PinMode::DigitalOutput => "digital output",
            PinMode::AnalogInput => "analog input",
            PinMode::AnalogOutput => "analog output",
        })
    }
}

/// Logic level of a digital pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PinState {
    #[default]
    Low,
    High,
}

impl PinState {
    pub fn is_high(self) -> bool {
        self == PinState::High
    }

    /// Decode the bit selected by `mask` from a port-wide register value.
    pub(crate) fn from_bits(bits: u8, mask: u8) -> Self {
        if bits & mask != 0 {
            PinState::High
        } else {
            PinState::Low
        }
    }
}

impl From<bool> for PinState {
    fn from(high: bool) -> Self {
        if high {
            PinState::High
        } else {
            PinState::Low
        }
    }
}

/// Internal pull resistor configuration of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PullResistance {
    #[default]
    Off,
    PullUp,
    PullDown,
}

impl fmt::Display for PullResistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PullResistance::Off => "off",
            PullResistance::PullUp => "pull-up",
            PullResistance::PullDown => "pull-down",
        })
    }
}
