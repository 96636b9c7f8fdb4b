//! Periodic execution of monitor ticks.
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use parking_lot::{Condvar, Mutex};

use super::Cadence;

/// Body of one monitor invocation.
///
/// The token is the one of the schedule running the tick; long ticks use it to sleep without
/// delaying cancellation.
pub type Tick = Arc<dyn Fn(&CancelToken) + Send + Sync>;

/// Runs ticks periodically until the returned task is cancelled.
pub trait Executor: Send + Sync {
    /// Run `tick` every `interval`, first after one `interval` has elapsed.
    fn schedule(
        &self,
        tick: Tick,
        interval: Duration,
        cadence: Cadence,
    ) -> io::Result<ScheduledTask>;
}

struct CancelState {
    cancelled: Mutex<bool>,
    wakeup: Condvar,
}

/// Shared cancellation flag with cooperative sleeping.
#[derive(Clone)]
pub struct CancelToken(Arc<CancelState>);

impl Default for CancelToken {
    fn default() -> Self {
        Self(Arc::new(CancelState {
            cancelled: Mutex::new(false),
            wakeup: Condvar::new(),
        }))
    }
}

impl CancelToken {
    pub fn cancel(&self) {
        *self.0.cancelled.lock() = true;
        self.0.wakeup.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.0.cancelled.lock()
    }

    /// Sleep for `duration`.  Returns `false` if the token was cancelled before or meanwhile.
    pub fn sleep(&self, duration: Duration) -> bool {
        self.sleep_until(Instant::now() + duration)
    }

    /// Sleep until `deadline`.  Returns `false` if the token was cancelled before or meanwhile.
    pub fn sleep_until(&self, deadline: Instant) -> bool {
        let mut cancelled = self.0.cancelled.lock();
        while !*cancelled {
            if self.0.wakeup.wait_until(&mut cancelled, deadline).timed_out() {
                return !*cancelled;
            }
        }
        false
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CancelToken")
            .field(&self.is_cancelled())
            .finish()
    }
}

/// Handle of a scheduled tick.  Cancels the schedule when dropped.
///
/// Cancelling never waits for a tick in flight.
#[derive(Debug)]
pub struct ScheduledTask {
    token: CancelToken,
}

impl ScheduledTask {
    pub fn new(token: CancelToken) -> Self {
        Self { token }
    }

    pub fn cancel(&self) {
        self.token.cancel()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Executor running every schedule on its own named thread.
#[derive(Debug, Default)]
pub struct ThreadExecutor {
    _private: (),
}

impl Executor for ThreadExecutor {
    fn schedule(
        &self,
        tick: Tick,
        interval: Duration,
        cadence: Cadence,
    ) -> io::Result<ScheduledTask> {
        let token = CancelToken::default();
        let task_token = token.clone();
        thread::Builder::new()
            .name("expander-monitor".to_owned())
            .spawn(move || run(&*tick, interval, cadence, &task_token))?;
        Ok(ScheduledTask::new(token))
    }
}

fn run(
    tick: &(dyn Fn(&CancelToken) + Send + Sync),
    interval: Duration,
    cadence: Cadence,
    token: &CancelToken,
) {
    match cadence {
        Cadence::Delay => {
            while token.sleep(interval) {
                tick(token);
            }
        }
        Cadence::Rate => {
            let mut next = Instant::now() + interval;
            while token.sleep_until(next) {
                tick(token);
                next += interval;
                // a tick that overran its period starts the next one immediately, once
                let now = Instant::now();
                if next < now {
                    next = now;
                }
            }
        }
    }
}

static SHARED: Lazy<Arc<ThreadExecutor>> = Lazy::new(|| Arc::new(ThreadExecutor::default()));

/// The process-wide executor used by monitors that were not given one.
pub fn shared() -> Arc<dyn Executor> {
    SHARED.clone()
}
