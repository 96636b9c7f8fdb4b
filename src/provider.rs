//! Operations shared by all providers.
use std::sync::Arc;
use std::time::Duration;

use crate::monitor::{Cadence, Executor, MonitorConfig, MonitorState, Supervisor};
use crate::{ListenerId, Pin, PinListener, Result};

/// A chip whose pins can be observed through listeners and a background monitor.
///
/// Every provided method delegates to the provider's [`Supervisor`].
pub trait Provider {
    fn supervisor(&self) -> &Supervisor;

    /// All pins of this provider, ordered by port and bit.
    fn pins(&self) -> &[Pin] {
        self.supervisor().pins()
    }

    fn has_pin(&self, pin: Pin) -> bool {
        self.supervisor().has_pin(pin)
    }

    /// Register `listener` for changes of `pin`.
    ///
    /// The first listener starts the monitor, unless it was disabled.
    fn add_listener<L>(&self, pin: Pin, listener: L) -> Result<ListenerId>
    where
        L: PinListener + 'static,
    {
        self.supervisor().add_listener(pin, Arc::new(listener))
    }

    /// Remove a listener.  Removing the last one stops the monitor.
    fn remove_listener(&self, id: ListenerId) -> bool {
        self.supervisor().remove_listener(id)
    }

    fn remove_all_listeners(&self) {
        self.supervisor().remove_all_listeners()
    }

    /// Configure and enable the monitor.  Without an executor the process-wide
    /// [`ThreadExecutor`](crate::monitor::ThreadExecutor) is used.
    fn enable_monitor(&self, executor: Option<Arc<dyn Executor>>, config: MonitorConfig) {
        self.supervisor().enable_monitor(executor, config)
    }

    /// Re-enable a disabled monitor with the executor and configuration it already has.
    ///
    /// An enabled monitor keeps running or waiting for listeners unchanged.
    fn enable_default_monitor(&self) {
        self.supervisor().resume_monitor()
    }

    /// Stop the monitor and keep it from starting when listeners are added.
    ///
    /// Values are then read from the device on every access.
    fn disable_monitor(&self) {
        self.supervisor().disable_monitor()
    }

    fn monitor_state(&self) -> MonitorState {
        self.supervisor().monitor_state()
    }

    fn is_monitor_running(&self) -> bool {
        self.monitor_state() == MonitorState::Running
    }

    fn monitor_enabled(&self) -> bool {
        self.supervisor().monitor_enabled()
    }

    fn monitor_interval(&self) -> Duration {
        self.supervisor().monitor_config().interval
    }

    /// Returns the previous interval.  Intervals below [`MonitorConfig::MIN_INTERVAL`] select
    /// the default.
    fn set_monitor_interval(&self, interval: Duration) -> Duration {
        self.supervisor().set_monitor_interval(interval)
    }

    fn monitor_cadence(&self) -> Cadence {
        self.supervisor().monitor_config().cadence
    }

    /// Returns the previous cadence.
    fn set_monitor_cadence(&self, cadence: Cadence) -> Cadence {
        self.supervisor().set_monitor_cadence(cadence)
    }
}
