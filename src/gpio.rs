//! Digital expanders monitored through their interrupt-flag registers.
use std::sync::{Arc, Weak};

use log::{debug, error};
use parking_lot::Mutex;

use crate::cache::{PinAttributes, PinCache};
use crate::codec::{PortCodec, RegisterMap, ShadowRegisters};
use crate::monitor::{CancelToken, Executor, MonitorConfig, Supervisor, Tick};
use crate::pin::port_pins;
use crate::{
    Error, Pin, PinEvent, PinMode, PinState, Port, Provider, PullResistance, RegisterTransport,
    Result,
};

/// A digital port expander with register layout `R`, reached through transport `T`.
///
/// All pins start as outputs latched at the level they had before the expander was created.
/// A pin configured as [`PinMode::DigitalInput`] is armed for interrupt-on-change; while the
/// monitor runs, every tick checks the interrupt flags and reports changed pins to their
/// listeners.  Without a running monitor, reading an input goes to the device.
///
/// Dropping the expander stops its monitor and forgets all listeners.
pub struct GpioExpander<T, R> {
    inner: Arc<Inner<T, R>>,
}

struct Inner<T, R> {
    codec: Mutex<PortCodec<T, R>>,
    cache: PinCache,
    supervisor: Supervisor,
}

impl<T, R> GpioExpander<T, R>
where
    T: RegisterTransport + Send + 'static,
    R: RegisterMap + 'static,
{
    /// Initialize the chip behind `transport`.
    ///
    /// The monitor is enabled with the default configuration and starts with the first
    /// listener.
    pub fn new(transport: T) -> Result<Self> {
        let (codec, initial) = PortCodec::<T, R>::initialize(transport)?;

        let pins: Vec<Pin> = R::PORTS.iter().flat_map(|&port| port_pins(port)).collect();
        let cache = PinCache::new(pins.iter().map(|&pin| {
            let state = PinState::from_bits(initial[pin.port().index()], pin.mask());
            (pin, PinAttributes::digital(PinMode::DigitalOutput, state))
        }));

        let inner = Arc::new_cyclic(|weak: &Weak<Inner<T, R>>| {
            let weak = weak.clone();
            let tick: Tick = Arc::new(move |_: &CancelToken| {
                if let Some(inner) = weak.upgrade() {
                    if let Err(e) = inner.scan() {
                        error!("interrupt scan failed: {}", e);
                    }
                }
            });
            Inner {
                codec: Mutex::new(codec),
                cache,
                supervisor: Supervisor::new(pins, tick),
            }
        });
        debug!("initialized expander with {} pins", inner.supervisor.pins().len());

        Ok(Self { inner })
    }

    /// Initialize the chip and configure its monitor.
    pub fn with_monitor(
        transport: T,
        executor: Option<Arc<dyn Executor>>,
        config: MonitorConfig,
    ) -> Result<Self> {
        let expander = Self::new(transport)?;
        expander.enable_monitor(executor, config);
        Ok(expander)
    }

    pub fn mode(&self, pin: Pin) -> Result<PinMode> {
        self.inner.cache.mode(pin)
    }

    /// Switch `pin` between digital input and digital output.
    pub fn set_mode(&self, pin: Pin, mode: PinMode) -> Result<()> {
        self.inner.supervisor.require_pin(pin)?;
        let direction = mode
            .direction()
            .ok_or(Error::UnsupportedMode { pin, mode })?;

        let mut codec = self.inner.codec.lock();
        codec.set_direction(pin, direction)?;
        self.inner.cache.set_mode(pin, mode)
    }

    /// Current level of `pin`.
    ///
    /// Outputs report the level last set.  Inputs report the cached level while the monitor
    /// runs and are read from the device otherwise.
    pub fn state(&self, pin: Pin) -> Result<PinState> {
        let inner = &*self.inner;
        if inner.cache.mode(pin)? == PinMode::DigitalInput && !self.is_monitor_running() {
            let bits = inner.codec.lock().read_port_state(pin.port())?;
            let state = PinState::from_bits(bits, pin.mask());
            if inner.cache.update_state(pin, state)? {
                inner.supervisor.notify(PinEvent::Digital { pin, state });
            }
            return Ok(state);
        }
        inner.cache.state(pin)
    }

    /// Drive the output `pin` to `state`.  Listeners of `pin` are told if the level changed.
    pub fn set_state(&self, pin: Pin, state: PinState) -> Result<()> {
        let inner = &*self.inner;
        let mode = inner.cache.mode(pin)?;
        if mode != PinMode::DigitalOutput {
            return Err(Error::InvalidMode {
                pin,
                mode,
                operation: "set the state of",
            });
        }

        let changed = {
            let mut codec = inner.codec.lock();
            codec.set_output_state(pin, state)?;
            inner.cache.update_state(pin, state)?
        };
        if changed {
            inner.supervisor.notify(PinEvent::Digital { pin, state });
        }
        Ok(())
    }

    pub fn pull_resistance(&self, pin: Pin) -> Result<PullResistance> {
        self.inner.cache.pull_resistance(pin)
    }

    /// Only the internal pull-up is available; [`PullResistance::PullDown`] is rejected.
    pub fn set_pull_resistance(&self, pin: Pin, resistance: PullResistance) -> Result<()> {
        self.inner.supervisor.require_pin(pin)?;
        let enable = match resistance {
            PullResistance::Off => false,
            PullResistance::PullUp => true,
            PullResistance::PullDown => {
                return Err(Error::UnsupportedResistance { pin, resistance })
            }
        };

        let mut codec = self.inner.codec.lock();
        codec.set_pull_up(pin, enable)?;
        self.inner.cache.set_pull_resistance(pin, resistance)
    }

    pub fn attributes(&self, pin: Pin) -> Result<PinAttributes> {
        self.inner.cache.snapshot(pin)
    }

    /// Register contents last written to `port`, `None` if the chip has no such port.
    pub fn shadow_registers(&self, port: Port) -> Option<ShadowRegisters> {
        R::PORTS
            .contains(&port)
            .then(|| self.inner.codec.lock().shadow(port))
    }

    /// Run one monitor tick on the calling thread.
    pub fn scan(&self) -> Result<()> {
        self.inner.scan()
    }

    /// Stop the monitor for good and forget all listeners.
    pub fn shutdown(&self) {
        self.inner.supervisor.shutdown();
    }
}

impl<T: RegisterTransport, R: RegisterMap> Inner<T, R> {
    /// Compare every pin of each flagged port with the cache.
    ///
    /// The codec stays locked until the cache holds the levels read, so a concurrent
    /// [`set_state`](GpioExpander::set_state) lands either before the read or after the update.
    /// Listeners are called once the lock is released.
    fn scan(&self) -> Result<()> {
        for &port in R::PORTS {
            let mut events = Vec::new();
            {
                let mut codec = self.codec.lock();
                if !codec.has_inputs(port) {
                    continue;
                }
                if codec.read_interrupt_flags(port)? == 0 {
                    continue;
                }
                let bits = codec.read_port_state(port)?;

                for pin in port_pins(port) {
                    let state = PinState::from_bits(bits, pin.mask());
                    if self.cache.update_state(pin, state)? {
                        events.push(PinEvent::Digital { pin, state });
                    }
                }
            }

            for event in events {
                self.supervisor.notify(event);
            }
        }
        Ok(())
    }
}

impl<T, R> Provider for GpioExpander<T, R> {
    fn supervisor(&self) -> &Supervisor {
        &self.inner.supervisor
    }
}

impl<T, R> Drop for GpioExpander<T, R> {
    fn drop(&mut self) {
        self.inner.supervisor.shutdown();
    }
}
