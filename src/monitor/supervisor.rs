use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::{Cadence, Executor, Monitor, MonitorConfig, MonitorState, Tick};
use crate::listener::{ListenerId, Listeners, PinEvent, PinListener};
use crate::{Error, Pin, Result};

struct Control {
    monitor: Monitor,
    listeners: Listeners,
}

/// Pins, listeners and monitor of one provider.
///
/// Registering or removing a listener and the resulting monitor transition form a single step,
/// so the monitor runs exactly while listeners are present.
pub struct Supervisor {
    pins: Vec<Pin>,
    control: Mutex<Control>,
}

impl Supervisor {
    pub(crate) fn new(pins: Vec<Pin>, tick: Tick) -> Self {
        Self {
            pins,
            control: Mutex::new(Control {
                monitor: Monitor::new(tick),
                listeners: Listeners::default(),
            }),
        }
    }

    pub fn pins(&self) -> &[Pin] {
        &self.pins
    }

    pub fn has_pin(&self, pin: Pin) -> bool {
        self.pins.contains(&pin)
    }

    pub(crate) fn require_pin(&self, pin: Pin) -> Result<()> {
        if self.has_pin(pin) {
            Ok(())
        } else {
            Err(Error::InvalidPin(pin))
        }
    }

    pub fn add_listener(&self, pin: Pin, listener: Arc<dyn PinListener>) -> Result<ListenerId> {
        self.require_pin(pin)?;
        let mut control = self.control.lock();
        let id = control.listeners.add(pin, listener);
        let count = control.listeners.len();
        control.monitor.listeners_changed(count);
        Ok(id)
    }

    /// Returns whether the listener was still registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut control = self.control.lock();
        let removed = control.listeners.remove(id);
        let count = control.listeners.len();
        control.monitor.listeners_changed(count);
        removed
    }

    pub fn remove_all_listeners(&self) {
        let mut control = self.control.lock();
        control.listeners.clear();
        control.monitor.listeners_changed(0);
    }

    pub fn listener_count(&self) -> usize {
        self.control.lock().listeners.len()
    }

    pub fn enable_monitor(&self, executor: Option<Arc<dyn Executor>>, config: MonitorConfig) {
        let mut control = self.control.lock();
        let count = control.listeners.len();
        control.monitor.enable(executor, config, count);
    }

    pub fn resume_monitor(&self) {
        let mut control = self.control.lock();
        let count = control.listeners.len();
        control.monitor.resume(count);
    }

    pub fn disable_monitor(&self) {
        self.control.lock().monitor.disable();
    }

    pub fn monitor_state(&self) -> MonitorState {
        self.control.lock().monitor.state()
    }

    pub fn monitor_enabled(&self) -> bool {
        self.control.lock().monitor.is_enabled()
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        self.control.lock().monitor.config()
    }

    pub fn set_monitor_interval(&self, interval: Duration) -> Duration {
        self.control.lock().monitor.set_interval(interval)
    }

    pub fn set_monitor_cadence(&self, cadence: Cadence) -> Cadence {
        self.control.lock().monitor.set_cadence(cadence)
    }

    /// Deliver `event` to the listeners of its pin, outside the lock.
    pub(crate) fn notify(&self, event: PinEvent) {
        let listeners = self.control.lock().listeners.for_pin(event.pin());
        for listener in listeners {
            listener.on_event(event);
        }
    }

    /// Stop the monitor for good and forget all listeners.
    pub(crate) fn shutdown(&self) {
        let mut control = self.control.lock();
        control.monitor.disable();
        control.listeners.clear();
    }
}
