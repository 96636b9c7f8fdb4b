use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One 8-bit bank of pins.  Chips with a single bank only use [`Port::A`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Port {
    A,
    B,
}

impl Port {
    pub(crate) fn index(self) -> usize {
        match self {
            Port::A => 0,
            Port::B => 1,
        }
    }
}

/// Identity of a port-expander pin: its port and a one-hot mask within that port.
///
/// A `Pin` carries no state.  Everything that is known about a pin lives in the provider that
/// owns it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pin {
    port: Port,
    mask: u8,
}

impl Pin {
    pub const fn new(port: Port, bit: u8) -> Self {
        assert!(bit < 8);
        Self {
            port,
            mask: 1 << bit,
        }
    }

    pub fn port(&self) -> Port {
        self.port
    }

    pub fn mask(&self) -> u8 {
        self.mask
    }

    pub fn bit(&self) -> u8 {
        self.mask.trailing_zeros() as u8
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pin({:?}{})", self.port, self.bit())
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}{}", self.port, self.bit())
    }
}

/// All eight pins of `port`, in ascending bit order.
pub(crate) fn port_pins(port: Port) -> impl Iterator<Item = Pin> {
    (0..8).map(move |bit| Pin::new(port, bit))
}
