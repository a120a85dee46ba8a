#![deny(unsafe_code)]
//! Current Time Service dispatcher
//!
//! [`CtsService`] owns the calendar clock, the link state machine and the
//! periodic task set, and runs them from one cooperative loop:
//!
//! ```ignore
//! let mut service = CtsService::new(CtsConfig::default(), peripheral, led, now_ms());
//! service.start(now_ms()).ok();
//! loop {
//!     service.run_once(now_ms());
//!     sleep_until(service.next_due_ms());
//! }
//! ```
//!
//! Within one pass the link poll runs first, so a connect or disconnect seen
//! in this pass already governs the push and indicator decisions of the same
//! pass.

use hal_abstractions::{BlePeripheral, StatusIndicator};

use crate::clock::CalendarClock;
use crate::config::CtsConfig;
use crate::datetime::DateTime;
use crate::error::CtsError;
use crate::link::{LinkContext, LinkState, LinkStateMachine};
use crate::publish;
use crate::tasks::{DueTasks, TaskKind, TaskSet};

pub struct CtsService<P, I> {
    config: CtsConfig,
    clock: CalendarClock,
    link: LinkStateMachine,
    tasks: TaskSet,
    peripheral: P,
    indicator: I,
}

impl<P, I> CtsService<P, I>
where
    P: BlePeripheral,
    I: StatusIndicator,
{
    pub fn new(config: CtsConfig, peripheral: P, indicator: I, now_ms: u64) -> Self {
        Self {
            clock: CalendarClock::new(config.initial_time, now_ms),
            link: LinkStateMachine::new(),
            tasks: TaskSet::new(&config.periods, now_ms),
            config,
            peripheral,
            indicator,
        }
    }

    /// Publish initial characteristic values and start advertising
    ///
    /// A failed initial write is logged and left to the first connection
    /// snapshot; a failed advertising start is returned.
    pub fn start(&mut self, now_ms: u64) -> Result<(), CtsError> {
        info!("Starting Current Time Service: {}", self.config.device_name.as_str());
        self.indicator.set(false);
        self.clock.advance(now_ms);
        if let Err(e) = publish::snapshot(&mut self.peripheral, &self.clock.snapshot(), &self.config)
        {
            warn!("Initial characteristic values not set: {}", e);
        }

        match self.peripheral.start_advertising() {
            Ok(()) => {
                info!("Advertising started");
                Ok(())
            }
            Err(e) => {
                error!("Advertising failed to start: {:?}", e);
                Err(CtsError::DiscoverabilityRestartFailed)
            }
        }
    }

    /// Run every task due at `now_ms`
    ///
    /// Returns the tasks that ran, in order. Errors are logged, never
    /// propagated: nothing in a pass is fatal.
    pub fn run_once(&mut self, now_ms: u64) -> DueTasks {
        let due = self.tasks.due(now_ms);
        for kind in due.iter() {
            match kind {
                TaskKind::LinkPoll => self.poll_link(now_ms),
                TaskKind::Tick => {
                    self.clock.advance(now_ms);
                }
                TaskKind::Push => self.push(now_ms),
                TaskKind::Indicator => {
                    // Also gated here: a connect earlier in this pass wins
                    if !self.link.is_connected() {
                        self.indicator.toggle();
                    }
                }
                TaskKind::Report => {
                    self.clock.advance(now_ms);
                    info!("System Time: {}", self.clock.snapshot());
                }
            }
        }
        due
    }

    fn poll_link(&mut self, now_ms: u64) {
        for _ in 0..self.config.max_events_per_poll {
            let Some(event) = self.peripheral.poll_event() else {
                break;
            };
            let mut ctx = LinkContext {
                clock: &mut self.clock,
                peripheral: &mut self.peripheral,
                indicator: &mut self.indicator,
                tasks: &mut self.tasks,
                config: &self.config,
                now_ms,
            };
            match self.link.handle(event, &mut ctx) {
                Ok(transition) => debug!("Link event handled: {:?}", transition),
                Err(CtsError::DiscoverabilityRestartFailed) => {
                    error!("Device is no longer discoverable until advertising is restarted")
                }
                Err(e) => warn!("Link event rejected: {}", e),
            }
        }
    }

    fn push(&mut self, now_ms: u64) {
        if !self.link.is_connected() {
            return;
        }
        self.clock.advance(now_ms);
        if let Err(e) = publish::current_time(&mut self.peripheral, &self.clock.snapshot(), &self.config)
        {
            warn!("Current Time push failed, retrying next period: {}", e);
        }
    }

    /// Restart advertising after a reported restart failure
    pub fn restart_advertising(&mut self) -> Result<(), CtsError> {
        if self.link.is_connected() {
            return Ok(());
        }
        if let Err(e) = self.peripheral.stop_advertising() {
            warn!("Stop advertising failed: {:?}", e);
        }
        self.peripheral.start_advertising().map_err(|e| {
            error!("Failed to restart advertising: {:?}", e);
            CtsError::DiscoverabilityRestartFailed
        })
    }

    pub fn snapshot(&self) -> DateTime {
        self.clock.snapshot()
    }

    pub fn link_state(&self) -> LinkState {
        self.link.state()
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.tasks.next_due_ms()
    }

    pub fn config(&self) -> &CtsConfig {
        &self.config
    }

    pub fn peripheral(&self) -> &P {
        &self.peripheral
    }

    pub fn peripheral_mut(&mut self) -> &mut P {
        &mut self.peripheral
    }

    pub fn indicator(&self) -> &I {
        &self.indicator
    }
}
