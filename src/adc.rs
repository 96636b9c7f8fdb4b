//! Analog expanders polled input by input.
use std::sync::{Arc, Weak};
use std::time::Duration;

use log::{debug, error};
use parking_lot::Mutex;

use crate::cache::{PinAttributes, PinCache};
use crate::monitor::{CancelToken, Executor, MonitorConfig, Supervisor, Tick};
use crate::{Error, Pin, PinEvent, PinMode, Provider, Result, TransportError};

/// Conversion access to an analog chip.
pub trait AnalogChip: Send {
    /// Pins of the chip with their fixed mode, in polling order.
    const PINS: &'static [(Pin, PinMode)];
    const MIN_VALUE: u16;
    const MAX_VALUE: u16;
    /// Change threshold of every analog pin when the expander is created.
    const DEFAULT_THRESHOLD: Option<u16>;

    /// Perform one conversion of `pin`.
    ///
    /// `Ok(None)` means the chip has no valid result right now, e.g. because a conversion is
    /// still in progress.
    fn read_conversion(&mut self, pin: Pin) -> core::result::Result<Option<u16>, TransportError>;

    /// Drive an analog output.  Only called for pins declared as [`PinMode::AnalogOutput`].
    fn write_output(&mut self, pin: Pin, value: u16) -> core::result::Result<(), TransportError> {
        let _ = (pin, value);
        Ok(())
    }
}

/// An analog chip whose inputs are polled by the monitor.
///
/// Each tick converts every analog input in turn.  A reading is stored and reported only if it
/// moved further than the pin's threshold away from the cached value.  When the chip has no
/// valid conversion, the remaining inputs are skipped until the next tick.
///
/// Dropping the expander stops its monitor and forgets all listeners.
pub struct AnalogExpander<A> {
    inner: Arc<Inner<A>>,
}

struct Inner<A> {
    chip: Mutex<A>,
    cache: PinCache,
    supervisor: Supervisor,
    conversion_delay: Mutex<Duration>,
}

impl<A: AnalogChip + 'static> AnalogExpander<A> {
    /// Wrap `chip`.  The monitor is enabled with the default configuration and starts with the
    /// first listener.
    pub fn new(chip: A) -> Self {
        let pins: Vec<Pin> = A::PINS.iter().map(|&(pin, _)| pin).collect();
        let cache = PinCache::new(
            A::PINS
                .iter()
                .map(|&(pin, mode)| (pin, PinAttributes::analog(mode, A::DEFAULT_THRESHOLD))),
        );

        let inner = Arc::new_cyclic(|weak: &Weak<Inner<A>>| {
            let weak = weak.clone();
            let tick: Tick = Arc::new(move |token: &CancelToken| {
                if let Some(inner) = weak.upgrade() {
                    if let Err(e) = inner.poll(token) {
                        error!("analog poll failed: {}", e);
                    }
                }
            });
            Inner {
                chip: Mutex::new(chip),
                cache,
                supervisor: Supervisor::new(pins, tick),
                conversion_delay: Mutex::new(Duration::ZERO),
            }
        });

        Self { inner }
    }

    pub fn with_monitor(
        chip: A,
        executor: Option<Arc<dyn Executor>>,
        config: MonitorConfig,
    ) -> Self {
        let expander = Self::new(chip);
        expander.enable_monitor(executor, config);
        expander
    }

    pub fn mode(&self, pin: Pin) -> Result<PinMode> {
        self.inner.cache.mode(pin)
    }

    /// Value of `pin`.
    ///
    /// While the monitor runs, inputs report the last reading that crossed the threshold.
    /// Otherwise every call converts the input anew.
    pub fn value(&self, pin: Pin) -> Result<u16> {
        if self.inner.cache.mode(pin)? == PinMode::AnalogInput && !self.is_monitor_running() {
            return self.immediate_value(pin);
        }
        self.inner.cache.value(pin)
    }

    /// Convert the input `pin` now, bypassing the cache.
    pub fn immediate_value(&self, pin: Pin) -> Result<u16> {
        let mode = self.inner.cache.mode(pin)?;
        if mode != PinMode::AnalogInput {
            return Err(Error::InvalidMode {
                pin,
                mode,
                operation: "convert",
            });
        }
        self.inner
            .chip
            .lock()
            .read_conversion(pin)?
            .ok_or(Error::ConversionUnavailable(pin))
    }

    /// [`value`](Self::value) as a percentage of the chip's range.
    pub fn percent_value(&self, pin: Pin) -> Result<f32> {
        let value = self.value(pin)?;
        let span = f32::from(A::MAX_VALUE - A::MIN_VALUE);
        Ok(f32::from(value.saturating_sub(A::MIN_VALUE)) / span * 100.0)
    }

    /// Drive the analog output `pin`, clamped to the chip's range.
    pub fn set_value(&self, pin: Pin, value: u16) -> Result<()> {
        let inner = &*self.inner;
        let mode = inner.cache.mode(pin)?;
        if mode != PinMode::AnalogOutput {
            return Err(Error::InvalidMode {
                pin,
                mode,
                operation: "set the value of",
            });
        }

        let value = value.clamp(A::MIN_VALUE, A::MAX_VALUE);
        let changed = {
            let mut chip = inner.chip.lock();
            chip.write_output(pin, value)?;
            inner.cache.store_value(pin, value)?
        };
        if changed {
            inner.supervisor.notify(PinEvent::Analog { pin, value });
        }
        Ok(())
    }

    pub fn threshold(&self, pin: Pin) -> Result<Option<u16>> {
        self.inner.cache.threshold(pin)
    }

    /// `None` reports every reading.
    pub fn set_threshold(&self, pin: Pin, threshold: Option<u16>) -> Result<()> {
        self.inner.cache.set_threshold(pin, threshold)
    }

    pub fn conversion_delay(&self) -> Duration {
        *self.inner.conversion_delay.lock()
    }

    /// Pause between the conversions of consecutive inputs within one tick.
    pub fn set_conversion_delay(&self, delay: Duration) {
        *self.inner.conversion_delay.lock() = delay;
    }

    pub fn attributes(&self, pin: Pin) -> Result<PinAttributes> {
        self.inner.cache.snapshot(pin)
    }

    /// Run one monitor tick on the calling thread.
    pub fn poll(&self) -> Result<()> {
        self.inner.poll(&CancelToken::default())
    }

    /// Stop the monitor for good and forget all listeners.
    pub fn shutdown(&self) {
        self.inner.supervisor.shutdown();
    }
}

impl<A: AnalogChip> Inner<A> {
    fn poll(&self, token: &CancelToken) -> Result<()> {
        let inputs = A::PINS
            .iter()
            .filter(|(_, mode)| *mode == PinMode::AnalogInput);
        for &(pin, _) in inputs {
            let value = match self.chip.lock().read_conversion(pin) {
                Ok(Some(value)) => value,
                Ok(None) => {
                    debug!("no conversion available for {}, ending tick", pin);
                    return Ok(());
                }
                Err(e) => {
                    error!("converting {} failed: {}", pin, e);
                    continue;
                }
            };

            if self.cache.update_value_beyond_threshold(pin, value)? {
                self.supervisor.notify(PinEvent::Analog { pin, value });
            }

            let delay = *self.conversion_delay.lock();
            if !delay.is_zero() && !token.sleep(delay) {
                return Ok(());
            }
        }
        Ok(())
    }
}

impl<A> Provider for AnalogExpander<A> {
    fn supervisor(&self) -> &Supervisor {
        &self.inner.supervisor
    }
}

impl<A> Drop for AnalogExpander<A> {
    fn drop(&mut self) {
        self.inner.supervisor.shutdown();
    }
}
