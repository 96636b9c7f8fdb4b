//! Helpers shared by the unit tests.
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use flexi_logger::{LogSpecBuilder, Logger, LoggerHandle};
use log::LevelFilter;
use parking_lot::{const_mutex, Mutex};

use crate::monitor::{Cadence, CancelToken, Executor, ScheduledTask, Tick};
use crate::{AnalogChip, Pin, PinEvent, PinMode, Port, RegisterTransport, TransportError};

/// Only the first call to [`init_test_logging`] installs a logger.
static LOGGER_HANDLE: Mutex<Option<LoggerHandle>> = const_mutex(None);

/// Install `flexi_logger` once for all tests of this process.
pub fn init_test_logging() {
    let handle = &mut *LOGGER_HANDLE.lock();
    if handle.is_none() {
        let mut log_spec_builder = LogSpecBuilder::new();
        let _ = log_spec_builder
            .default(LevelFilter::Error)
            .module("port_expander_monitor", LevelFilter::Debug);
        let log_spec = log_spec_builder.finalize();
        *handle = Some(
            Logger::with(log_spec)
                .log_to_stderr()
                .start()
                .expect("failed to initialize logging"),
        );
    }
}

/// Collects every event delivered to its listeners.
#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<PinEvent>>>);

impl Recorder {
    pub fn listener(&self) -> impl Fn(PinEvent) + Send + Sync + 'static {
        let events = self.0.clone();
        move |event| events.lock().push(event)
    }

    pub fn events(&self) -> Vec<PinEvent> {
        self.0.lock().clone()
    }
}

struct Schedule {
    tick: Tick,
    interval: Duration,
    cadence: Cadence,
    token: CancelToken,
}

/// Executor that only records schedules.  Ticks run when the test says so.
#[derive(Default)]
pub struct ManualExecutor {
    schedules: Mutex<Vec<Schedule>>,
}

impl ManualExecutor {
    /// Number of schedules ever created.
    pub fn scheduled(&self) -> usize {
        self.schedules.lock().len()
    }

    /// Number of schedules not cancelled yet.
    pub fn active(&self) -> usize {
        self.schedules
            .lock()
            .iter()
            .filter(|s| !s.token.is_cancelled())
            .count()
    }

    pub fn last(&self) -> Option<(Duration, Cadence)> {
        self.schedules
            .lock()
            .last()
            .map(|s| (s.interval, s.cadence))
    }

    /// Run one tick of every active schedule.
    pub fn run_once(&self) {
        let active: Vec<(Tick, CancelToken)> = self
            .schedules
            .lock()
            .iter()
            .filter(|s| !s.token.is_cancelled())
            .map(|s| (s.tick.clone(), s.token.clone()))
            .collect();
        for (tick, token) in active {
            tick(&token);
        }
    }
}

impl Executor for ManualExecutor {
    fn schedule(
        &self,
        tick: Tick,
        interval: Duration,
        cadence: Cadence,
    ) -> std::io::Result<ScheduledTask> {
        let token = CancelToken::default();
        self.schedules.lock().push(Schedule {
            tick,
            interval,
            cadence,
            token: token.clone(),
        });
        Ok(ScheduledTask::new(token))
    }
}

/// Register file standing in for a chip.  Clones share the registers.
#[derive(Clone, Default)]
pub struct FakeRegisters(Arc<Mutex<HashMap<u8, u8>>>);

impl FakeRegisters {
    pub fn get(&self, reg: u8) -> u8 {
        self.0.lock().get(&reg).copied().unwrap_or(0)
    }

    pub fn set(&self, reg: u8, value: u8) {
        self.0.lock().insert(reg, value);
    }
}

impl RegisterTransport for FakeRegisters {
    fn read_reg(&mut self, reg: u8) -> Result<u8, TransportError> {
        Ok(self.get(reg))
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), TransportError> {
        self.set(reg, value);
        Ok(())
    }
}

pub const ADC_IN0: Pin = Pin::new(Port::A, 0);
pub const ADC_IN1: Pin = Pin::new(Port::A, 1);
pub const ADC_IN2: Pin = Pin::new(Port::A, 2);
pub const ADC_OUT: Pin = Pin::new(Port::A, 3);

type Reading = Result<Option<u16>, TransportError>;

#[derive(Default)]
struct FakeAdcState {
    readings: HashMap<Pin, VecDeque<Reading>>,
    conversions: Vec<Pin>,
    outputs: Vec<u16>,
}

/// Ten-bit ADC with three inputs and one output.
///
/// Inputs return the scripted readings in order and zero once a script has run out.
#[derive(Clone, Default)]
pub struct FakeAdc(Arc<Mutex<FakeAdcState>>);

impl FakeAdc {
    pub fn push(&self, pin: Pin, reading: Reading) {
        self.0
            .lock()
            .readings
            .entry(pin)
            .or_default()
            .push_back(reading);
    }

    /// Pins in the order they were converted.
    pub fn conversions(&self) -> Vec<Pin> {
        self.0.lock().conversions.clone()
    }

    pub fn outputs(&self) -> Vec<u16> {
        self.0.lock().outputs.clone()
    }
}

impl AnalogChip for FakeAdc {
    const PINS: &'static [(Pin, PinMode)] = &[
        (ADC_IN0, PinMode::AnalogInput),
        (ADC_IN1, PinMode::AnalogInput),
        (ADC_IN2, PinMode::AnalogInput),
        (ADC_OUT, PinMode::AnalogOutput),
    ];
    const MIN_VALUE: u16 = 0;
    const MAX_VALUE: u16 = 1023;
    const DEFAULT_THRESHOLD: Option<u16> = Some(5);

    fn read_conversion(&mut self, pin: Pin) -> Reading {
        let mut state = self.0.lock();
        state.conversions.push(pin);
        state
            .readings
            .get_mut(&pin)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Ok(Some(0)))
    }

    fn write_output(&mut self, _pin: Pin, value: u16) -> Result<(), TransportError> {
        self.0.lock().outputs.push(value);
        Ok(())
    }
}
