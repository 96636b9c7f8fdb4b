//! Background monitoring of a provider's pins.
//!
//! A [`Monitor`] owns at most one scheduled tick.  It only runs while it is enabled and at least
//! one listener is registered on its provider; the [`Supervisor`] couples the two by performing
//! every listener mutation and every monitor transition under the same lock.
//!
//! What a tick does is decided by the provider: digital expanders scan their interrupt flags,
//! analog expanders poll each input in turn.
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod executor;
mod supervisor;

pub use executor::{CancelToken, Executor, ScheduledTask, ThreadExecutor, Tick};
pub use supervisor::Supervisor;

/// Scheduling discipline of a monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Cadence {
    /// Fixed idle gap between the end of one tick and the start of the next.
    #[default]
    Delay,
    /// Fixed period between the starts of consecutive ticks.
    Rate,
}

/// Interval and cadence of a monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MonitorConfig {
    pub interval: Duration,
    pub cadence: Cadence,
}

impl MonitorConfig {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(50);
    /// Intervals below this floor are replaced by [`MonitorConfig::DEFAULT_INTERVAL`].
    pub const MIN_INTERVAL: Duration = Duration::from_millis(10);

    pub fn new(interval: Duration, cadence: Cadence) -> Self {
        Self { interval, cadence }.normalized()
    }

    /// The same configuration with the interval floor applied.
    pub fn normalized(self) -> Self {
        Self {
            interval: normalize_interval(self.interval),
            ..self
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            cadence: Cadence::Delay,
        }
    }
}

fn normalize_interval(interval: Duration) -> Duration {
    if interval < MonitorConfig::MIN_INTERVAL {
        MonitorConfig::DEFAULT_INTERVAL
    } else {
        interval
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Stopped,
    Running,
}

/// Lifecycle of the scheduled tick of one provider.
///
/// Transitions happen only through the methods below.  None of them block on a tick in flight.
pub(crate) struct Monitor {
    tick: Tick,
    executor: Option<Arc<dyn Executor>>,
    config: MonitorConfig,
    enabled: bool,
    task: Option<ScheduledTask>,
}

impl Monitor {
    /// An enabled, stopped monitor with the default configuration.
    pub fn new(tick: Tick) -> Self {
        Self {
            tick,
            executor: None,
            config: MonitorConfig::default(),
            enabled: true,
            task: None,
        }
    }

    pub fn state(&self) -> MonitorState {
        match &self.task {
            Some(task) if !task.is_cancelled() => MonitorState::Running,
            _ => MonitorState::Stopped,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == MonitorState::Running
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn config(&self) -> MonitorConfig {
        self.config
    }

    /// Replace executor and configuration and enable the monitor.
    ///
    /// A running monitor is rescheduled with the new parameters; a stopped one starts if
    /// `listeners` is non-zero.
    pub fn enable(
        &mut self,
        executor: Option<Arc<dyn Executor>>,
        config: MonitorConfig,
        listeners: usize,
    ) {
        self.executor = executor;
        self.config = config.normalized();
        self.enabled = true;
        if self.is_running() || listeners > 0 {
            self.start();
        }
    }

    /// Enable with the executor and configuration already set.  An enabled monitor is left
    /// alone.
    pub fn resume(&mut self, listeners: usize) {
        if self.enabled {
            return;
        }
        self.enabled = true;
        if listeners > 0 {
            self.start();
        }
    }

    /// Stop and suppress automatic starts until enabled again.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.stop();
    }

    /// Cancel any previous schedule, then schedule the tick.  Does nothing while disabled.
    pub fn start(&mut self) {
        self.stop();
        if !self.enabled {
            return;
        }

        let executor = match &self.executor {
            Some(executor) => executor.clone(),
            None => executor::shared(),
        };
        match executor.schedule(self.tick.clone(), self.config.interval, self.config.cadence) {
            Ok(task) => {
                debug!(
                    "monitor started: every {:?} ({:?})",
                    self.config.interval, self.config.cadence
                );
                self.task = Some(task);
            }
            Err(e) => error!("failed to schedule monitor: {}", e),
        }
    }

    /// Cancel the schedule without waiting for a tick in flight.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.cancel();
            debug!("monitor stopped");
        }
    }

    /// Returns the previous interval.
    pub fn set_interval(&mut self, interval: Duration) -> Duration {
        let previous = self.config.interval;
        let interval = normalize_interval(interval);
        if interval != previous {
            self.config.interval = interval;
            if self.is_running() {
                self.start();
            }
        }
        previous
    }

    /// Returns the previous cadence.
    pub fn set_cadence(&mut self, cadence: Cadence) -> Cadence {
        let previous = self.config.cadence;
        if cadence != previous {
            self.config.cadence = cadence;
            if self.is_running() {
                self.start();
            }
        }
        previous
    }

    /// Start on the first listener, stop after the last one is gone.
    pub fn listeners_changed(&mut self, listeners: usize) {
        if listeners == 0 {
            self.stop();
        } else if !self.is_running() {
            self.start();
        }
    }
}
