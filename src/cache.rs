//! Last known attributes of every pin of a provider.
//!
//! The cache is the only place pin values are remembered.  It is written by the background
//! monitor and by direct calls alike; every operation takes the cache lock exactly once, so a
//! reader never observes a partially applied update.
use std::collections::HashMap;

use parking_lot::Mutex;

use crate::{Error, Pin, PinMode, PinState, PullResistance, Result};

/// Snapshot of everything the cache knows about one pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinAttributes {
    mode: PinMode,
    state: PinState,
    value: u16,
    pull_resistance: PullResistance,
    threshold: Option<u16>,
}

impl PinAttributes {
    pub(crate) fn digital(mode: PinMode, state: PinState) -> Self {
        Self {
            mode,
            state,
            value: 0,
            pull_resistance: PullResistance::Off,
            threshold: None,
        }
    }

    pub(crate) fn analog(mode: PinMode, threshold: Option<u16>) -> Self {
        Self {
            mode,
            state: PinState::Low,
            value: 0,
            pull_resistance: PullResistance::Off,
            threshold,
        }
    }

    pub fn mode(&self) -> PinMode {
        self.mode
    }

    /// Digital state, `None` unless the pin is in a digital mode.
    pub fn state(&self) -> Option<PinState> {
        self.mode.is_digital().then_some(self.state)
    }

    /// Analog value, `None` unless the pin is in an analog mode.
    pub fn value(&self) -> Option<u16> {
        self.mode.is_analog().then_some(self.value)
    }

    pub fn pull_resistance(&self) -> PullResistance {
        self.pull_resistance
    }

    pub fn threshold(&self) -> Option<u16> {
        self.threshold
    }
}

pub(crate) struct PinCache {
    entries: Mutex<HashMap<Pin, PinAttributes>>,
}

impl PinCache {
    pub fn new(entries: impl IntoIterator<Item = (Pin, PinAttributes)>) -> Self {
        Self {
            entries: Mutex::new(entries.into_iter().collect()),
        }
    }

    /// Run `f` on the entry for `pin` under the cache lock.
    fn with_entry<R>(&self, pin: Pin, f: impl FnOnce(&mut PinAttributes) -> Result<R>) -> Result<R> {
        let mut entries = self.entries.lock();
        let entry = entries.get_mut(&pin).ok_or(Error::InvalidPin(pin))?;
        f(entry)
    }

    pub fn snapshot(&self, pin: Pin) -> Result<PinAttributes> {
        self.with_entry(pin, |entry| Ok(*entry))
    }

    pub fn mode(&self, pin: Pin) -> Result<PinMode> {
        self.with_entry(pin, |entry| Ok(entry.mode))
    }

    pub fn set_mode(&self, pin: Pin, mode: PinMode) -> Result<()> {
        self.with_entry(pin, |entry| {
            entry.mode = mode;
            Ok(())
        })
    }

    pub fn state(&self, pin: Pin) -> Result<PinState> {
        self.with_entry(pin, |entry| {
            require_digital(pin, entry, "read the state of")?;
            Ok(entry.state)
        })
    }

    /// Store `state` and report whether it differs from the previously cached state.
    pub fn update_state(&self, pin: Pin, state: PinState) -> Result<bool> {
        self.with_entry(pin, |entry| {
            require_digital(pin, entry, "set the state of")?;
            let changed = entry.state != state;
            entry.state = state;
            Ok(changed)
        })
    }

    pub fn value(&self, pin: Pin) -> Result<u16> {
        self.with_entry(pin, |entry| {
            require_analog(pin, entry, "read the value of")?;
            Ok(entry.value)
        })
    }

    /// Store `value` only if it moved further than the pin's threshold away from the cached value.
    ///
    /// Without a threshold every reading is stored and reported.
    pub fn update_value_beyond_threshold(&self, pin: Pin, value: u16) -> Result<bool> {
        self.with_entry(pin, |entry| {
            require_analog(pin, entry, "update the value of")?;
            let exceeded = match entry.threshold {
                Some(threshold) => entry.value.abs_diff(value) > threshold,
                None => true,
            };
            if exceeded {
                entry.value = value;
            }
            Ok(exceeded)
        })
    }

    /// Store `value` unconditionally and report whether it changed.
    pub fn store_value(&self, pin: Pin, value: u16) -> Result<bool> {
        self.with_entry(pin, |entry| {
            require_analog(pin, entry, "set the value of")?;
            let changed = entry.value != value;
            entry.value = value;
            Ok(changed)
        })
    }

    pub fn pull_resistance(&self, pin: Pin) -> Result<PullResistance> {
        self.with_entry(pin, |entry| Ok(entry.pull_resistance))
    }

    pub fn set_pull_resistance(&self, pin: Pin, resistance: PullResistance) -> Result<()> {
        self.with_entry(pin, |entry| {
            require_digital(pin, entry, "configure the pull resistance of")?;
            entry.pull_resistance = resistance;
            Ok(())
        })
    }

    pub fn threshold(&self, pin: Pin) -> Result<Option<u16>> {
        self.with_entry(pin, |entry| {
            require_analog(pin, entry, "read the threshold of")?;
            Ok(entry.threshold)
        })
    }

    pub fn set_threshold(&self, pin: Pin, threshold: Option<u16>) -> Result<()> {
        self.with_entry(pin, |entry| {
            require_analog(pin, entry, "set the threshold of")?;
            entry.threshold = threshold;
            Ok(())
        })
    }
}

fn require_digital(pin: Pin, entry: &PinAttributes, operation: &'static str) -> Result<()> {
    if entry.mode.is_digital() {
        Ok(())
    } else {
        Err(Error::InvalidMode {
            pin,
            mode: entry.mode,
            operation,
        })
    }
}

fn require_analog(pin: Pin, entry: &PinAttributes, operation: &'static str) -> Result<()> {
    if entry.mode.is_analog() {
        Ok(())
    } else {
        Err(Error::InvalidMode {
            pin,
            mode: entry.mode,
            operation,
        })
    }
}
