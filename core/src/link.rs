#![deny(unsafe_code)]
//! Link state machine
//!
//! Tracks the single BLE link and applies the side effects of each
//! transition. Events come from the board's BLE stack as [`LinkEvent`]s.
//!
//! ## Transitions
//! - `Disconnected --Connected(peer)--> Connected`: light solid, stop
//!   blinking, start periodic push, record the peer, publish a full snapshot
//! - `Connected --Disconnected(peer)--> Disconnected`: light off, resume
//!   blinking, stop periodic push, stop then restart advertising
//! - Connect while connected, or disconnect while disconnected: ignored
//!
//! A Current Time write while connected is decoded and applied to the clock
//! as an authoritative value. Malformed or out-of-range writes are dropped
//! and the clock is left untouched.

use hal_abstractions::{BlePeripheral, LinkEvent, PeerAddress, StatusIndicator};

use crate::clock::CalendarClock;
use crate::codec::{self, uuid};
use crate::config::CtsConfig;
use crate::error::CtsError;
use crate::publish;
use crate::tasks::{TaskKind, TaskSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    #[default]
    Disconnected,
    Connected,
}

/// Effect of one handled event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transition {
    Connected,
    Disconnected,
    /// An authoritative Current Time write was applied
    ClockSet,
    /// Duplicate, late or irrelevant event; nothing changed
    Ignored,
}

/// Everything a transition may touch besides the link state itself
pub struct LinkContext<'a, P, I> {
    pub clock: &'a mut CalendarClock,
    pub peripheral: &'a mut P,
    pub indicator: &'a mut I,
    pub tasks: &'a mut TaskSet,
    pub config: &'a CtsConfig,
    pub now_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct LinkStateMachine {
    state: LinkState,
    peer: Option<PeerAddress>,
}

impl LinkStateMachine {
    pub const fn new() -> Self {
        Self {
            state: LinkState::Disconnected,
            peer: None,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }

    /// Peer of the active link
    pub fn peer(&self) -> Option<PeerAddress> {
        self.peer
    }

    /// Apply one BLE notification
    ///
    /// An error after a state change (snapshot write, advertising restart)
    /// does not undo the change.
    pub fn handle<P, I>(
        &mut self,
        event: LinkEvent,
        ctx: &mut LinkContext<'_, P, I>,
    ) -> Result<Transition, CtsError>
    where
        P: BlePeripheral,
        I: StatusIndicator,
    {
        match event {
            LinkEvent::Connected(peer) => self.on_connect(peer, ctx),
            LinkEvent::Disconnected(peer) => self.on_disconnect(peer, ctx),
            LinkEvent::Written { uuid, payload } => self.on_write(uuid, &payload, ctx),
        }
    }

    fn on_connect<P, I>(
        &mut self,
        peer: PeerAddress,
        ctx: &mut LinkContext<'_, P, I>,
    ) -> Result<Transition, CtsError>
    where
        P: BlePeripheral,
        I: StatusIndicator,
    {
        info!("Connected event for: {}", peer);
        if self.is_connected() {
            info!("Already connected, ignoring duplicate connect event");
            return Ok(Transition::Ignored);
        }

        ctx.tasks.set_enabled(TaskKind::Indicator, false, ctx.now_ms);
        ctx.indicator.set(true);

        self.state = LinkState::Connected;
        self.peer = Some(peer);
        ctx.tasks.set_enabled(TaskKind::Push, true, ctx.now_ms);
        info!("Connection established");

        ctx.clock.advance(ctx.now_ms);
        publish::snapshot(ctx.peripheral, &ctx.clock.snapshot(), ctx.config)?;
        info!("Initial characteristics sent");
        Ok(Transition::Connected)
    }

    fn on_disconnect<P, I>(
        &mut self,
        peer: PeerAddress,
        ctx: &mut LinkContext<'_, P, I>,
    ) -> Result<Transition, CtsError>
    where
        P: BlePeripheral,
        I: StatusIndicator,
    {
        info!("Disconnected event for: {}", peer);
        if !self.is_connected() {
            info!("Ignoring disconnect event, was not connected");
            return Ok(Transition::Ignored);
        }
        if self.peer != Some(peer) {
            warn!("Disconnect names a different peer than the active link");
        }

        self.state = LinkState::Disconnected;
        self.peer = None;
        ctx.tasks.set_enabled(TaskKind::Push, false, ctx.now_ms);
        ctx.indicator.set(false);
        ctx.tasks.set_enabled(TaskKind::Indicator, true, ctx.now_ms);
        info!("Connection terminated");

        // Advertising must be stopped before it is restarted
        if let Err(e) = ctx.peripheral.stop_advertising() {
            warn!("Stop advertising failed: {:?}", e);
        }
        match ctx.peripheral.start_advertising() {
            Ok(()) => {
                info!("Restarted advertising");
                Ok(Transition::Disconnected)
            }
            Err(e) => {
                error!("Failed to restart advertising: {:?}", e);
                Err(CtsError::DiscoverabilityRestartFailed)
            }
        }
    }

    fn on_write<P, I>(
        &mut self,
        id: u16,
        payload: &[u8],
        ctx: &mut LinkContext<'_, P, I>,
    ) -> Result<Transition, CtsError>
    where
        P: BlePeripheral,
        I: StatusIndicator,
    {
        if !self.is_connected() {
            warn!("Ignoring write to {:#x} without an active link", id);
            return Ok(Transition::Ignored);
        }
        if id != uuid::CURRENT_TIME {
            warn!("Ignoring write to read-only characteristic {:#x}", id);
            return Ok(Transition::Ignored);
        }

        debug!("Current Time written: {:?}", payload);
        let applied = codec::decode_current_time(payload)
            .and_then(|current| ctx.clock.set_authoritative(current.date_time, ctx.now_ms));
        if let Err(e) = applied {
            // The stack already stored the rejected bytes; republish the clock
            ctx.clock.advance(ctx.now_ms);
            if let Err(restore) =
                publish::current_time(ctx.peripheral, &ctx.clock.snapshot(), ctx.config)
            {
                warn!("Current Time not restored after rejected write: {}", restore);
            }
            return Err(e);
        }
        info!("Internal time updated by client: {}", ctx.clock.snapshot());
        Ok(Transition::ClockSet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode_current_time, AdjustReason};
    use crate::datetime::DateTime;
    use crate::error::Field;
    use crate::testing::{MockIndicator, MockPeripheral, PEER_A, PEER_B};
    use hal_abstractions::WritePayload;

    struct Harness {
        link: LinkStateMachine,
        clock: CalendarClock,
        peripheral: MockPeripheral,
        indicator: MockIndicator,
        tasks: TaskSet,
        config: CtsConfig,
    }

    impl Harness {
        fn new() -> Self {
            let config = CtsConfig::default();
            Self {
                link: LinkStateMachine::new(),
                clock: CalendarClock::new(config.initial_time, 0),
                peripheral: MockPeripheral::default(),
                indicator: MockIndicator::default(),
                tasks: TaskSet::new(&config.periods, 0),
                config,
            }
        }

        fn handle(&mut self, event: LinkEvent, now_ms: u64) -> Result<Transition, CtsError> {
            let mut ctx = LinkContext {
                clock: &mut self.clock,
                peripheral: &mut self.peripheral,
                indicator: &mut self.indicator,
                tasks: &mut self.tasks,
                config: &self.config,
                now_ms,
            };
            self.link.handle(event, &mut ctx)
        }
    }

    fn current_time_write(bytes: &[u8]) -> LinkEvent {
        LinkEvent::Written {
            uuid: uuid::CURRENT_TIME,
            payload: WritePayload::from_slice(bytes).unwrap(),
        }
    }

    #[test]
    fn test_connect_pushes_one_snapshot() {
        let mut h = Harness::new();
        assert_eq!(h.handle(LinkEvent::Connected(PEER_A), 2500), Ok(Transition::Connected));
        assert_eq!(h.link.state(), LinkState::Connected);
        assert_eq!(h.link.peer(), Some(PEER_A));
        assert_eq!(h.peripheral.writes_to(uuid::CURRENT_TIME), 1);
        assert_eq!(h.peripheral.writes_to(uuid::LOCAL_TIME_INFO), 1);
        assert_eq!(h.peripheral.writes_to(uuid::REFERENCE_TIME_INFO), 1);

        // Clock advanced to the connect instant before encoding
        let expected = DateTime::new(2024, 1, 1, 0, 0, 2, 1);
        assert_eq!(
            h.peripheral.last_value(uuid::CURRENT_TIME).as_deref(),
            Some(&encode_current_time(&expected, AdjustReason::MANUAL_TIME_UPDATE)[..])
        );
        assert_eq!(
            h.peripheral.last_value(uuid::LOCAL_TIME_INFO).as_deref(),
            Some(&[32u8, 0][..])
        );
    }

    #[test]
    fn test_connect_stops_blinking_and_starts_push() {
        let mut h = Harness::new();
        h.handle(LinkEvent::Connected(PEER_A), 0).unwrap();
        assert!(h.indicator.on);
        assert!(!h.tasks.is_enabled(TaskKind::Indicator));
        assert!(h.tasks.is_enabled(TaskKind::Push));
    }

    #[test]
    fn test_duplicate_connect_is_ignored() {
        let mut h = Harness::new();
        h.handle(LinkEvent::Connected(PEER_A), 0).unwrap();
        assert_eq!(h.handle(LinkEvent::Connected(PEER_B), 10), Ok(Transition::Ignored));
        assert_eq!(h.link.peer(), Some(PEER_A));
        assert_eq!(h.peripheral.writes_to(uuid::CURRENT_TIME), 1);
    }

    #[test]
    fn test_disconnect_while_disconnected_is_ignored() {
        let mut h = Harness::new();
        assert_eq!(h.handle(LinkEvent::Disconnected(PEER_A), 0), Ok(Transition::Ignored));
        assert_eq!(h.link.state(), LinkState::Disconnected);
        assert!(h.peripheral.advertising_calls.is_empty());
    }

    #[test]
    fn test_disconnect_restarts_advertising() {
        let mut h = Harness::new();
        h.peripheral.advertising = true;
        h.handle(LinkEvent::Connected(PEER_A), 0).unwrap();
        h.peripheral.advertising = false;

        assert_eq!(h.handle(LinkEvent::Disconnected(PEER_A), 100), Ok(Transition::Disconnected));
        assert_eq!(h.link.state(), LinkState::Disconnected);
        assert_eq!(h.link.peer(), None);
        assert_eq!(h.peripheral.advertising_calls, ["stop", "start"]);
        assert!(h.peripheral.advertising);
        assert!(!h.indicator.on);
        assert!(h.tasks.is_enabled(TaskKind::Indicator));
        assert!(!h.tasks.is_enabled(TaskKind::Push));
    }

    #[test]
    fn test_disconnect_reports_restart_failure() {
        let mut h = Harness::new();
        h.handle(LinkEvent::Connected(PEER_A), 0).unwrap();
        h.peripheral.fail_start_advertising = true;
        assert_eq!(
            h.handle(LinkEvent::Disconnected(PEER_A), 100),
            Err(CtsError::DiscoverabilityRestartFailed)
        );
        // The link is still considered down; no automatic retry
        assert_eq!(h.link.state(), LinkState::Disconnected);
        assert_eq!(h.peripheral.advertising_calls, ["stop", "start"]);
    }

    #[test]
    fn test_reconnect_after_disconnect_pushes_again() {
        let mut h = Harness::new();
        h.handle(LinkEvent::Connected(PEER_A), 0).unwrap();
        h.handle(LinkEvent::Disconnected(PEER_A), 10).unwrap();
        assert_eq!(h.handle(LinkEvent::Connected(PEER_B), 20), Ok(Transition::Connected));
        assert_eq!(h.link.peer(), Some(PEER_B));
        assert_eq!(h.peripheral.writes_to(uuid::CURRENT_TIME), 2);
    }

    #[test]
    fn test_snapshot_write_failure_keeps_connection() {
        let mut h = Harness::new();
        h.peripheral.fail_writes = true;
        assert_eq!(
            h.handle(LinkEvent::Connected(PEER_A), 0),
            Err(CtsError::WriteRejected)
        );
        assert!(h.link.is_connected());
    }

    #[test]
    fn test_write_sets_clock() {
        let mut h = Harness::new();
        h.handle(LinkEvent::Connected(PEER_A), 0).unwrap();
        let target = DateTime::new(2025, 3, 14, 15, 9, 26, 5);
        let bytes = encode_current_time(&target, AdjustReason::MANUAL_TIME_UPDATE);
        assert_eq!(h.handle(current_time_write(&bytes), 4321), Ok(Transition::ClockSet));
        assert_eq!(h.clock.snapshot(), target);
        assert_eq!(h.clock.last_reference_ms(), 4321);
    }

    #[test]
    fn test_malformed_write_leaves_clock() {
        let mut h = Harness::new();
        h.handle(LinkEvent::Connected(PEER_A), 0).unwrap();
        let before = h.clock.snapshot();
        let bytes = encode_current_time(&DateTime::new(2030, 1, 1, 0, 0, 0, 2), AdjustReason::NONE);

        assert_eq!(
            h.handle(current_time_write(&bytes[..7]), 50),
            Err(CtsError::MalformedPayload {
                expected: 10,
                actual: 7
            })
        );
        assert_eq!(h.clock.snapshot(), before);
        assert_eq!(h.clock.last_reference_ms(), 0);
    }

    #[test]
    fn test_out_of_range_write_leaves_clock() {
        let mut h = Harness::new();
        h.handle(LinkEvent::Connected(PEER_A), 0).unwrap();
        let before = h.clock.snapshot();

        let month_13 = [0xE8, 0x07, 13, 1, 0, 0, 0, 1, 0, 1];
        assert_eq!(
            h.handle(current_time_write(&month_13), 50),
            Err(CtsError::OutOfRangeField(Field::Month))
        );
        let hour_24 = [0xE8, 0x07, 1, 1, 24, 0, 0, 1, 0, 1];
        assert_eq!(
            h.handle(current_time_write(&hour_24), 50),
            Err(CtsError::OutOfRangeField(Field::Hour))
        );
        assert_eq!(h.clock.snapshot(), before);
    }

    #[test]
    fn test_rejected_write_republishes_clock() {
        let mut h = Harness::new();
        h.handle(LinkEvent::Connected(PEER_A), 0).unwrap();
        let before = h.clock.snapshot();
        let expected = encode_current_time(&before, AdjustReason::MANUAL_TIME_UPDATE);

        let day_0 = [0xE8, 0x07, 3, 0, 0, 0, 0, 1, 0, 1];
        assert_eq!(
            h.handle(current_time_write(&day_0), 300),
            Err(CtsError::OutOfRangeField(Field::Day))
        );
        assert_eq!(h.peripheral.writes_to(uuid::CURRENT_TIME), 2);
        assert_eq!(
            h.peripheral.last_value(uuid::CURRENT_TIME).as_deref(),
            Some(&expected[..])
        );

        assert!(h.handle(current_time_write(&[1, 2, 3]), 600).is_err());
        assert_eq!(h.peripheral.writes_to(uuid::CURRENT_TIME), 3);
        assert_eq!(
            h.peripheral.last_value(uuid::CURRENT_TIME).as_deref(),
            Some(&expected[..])
        );
        assert_eq!(h.clock.snapshot(), before);
    }

    #[test]
    fn test_rejected_write_restore_failure_keeps_decode_error() {
        let mut h = Harness::new();
        h.handle(LinkEvent::Connected(PEER_A), 0).unwrap();
        h.peripheral.fail_writes = true;
        assert_eq!(
            h.handle(current_time_write(&[0; 4]), 100),
            Err(CtsError::MalformedPayload {
                expected: 10,
                actual: 4
            })
        );
    }

    #[test]
    fn test_write_without_link_is_ignored() {
        let mut h = Harness::new();
        let bytes = encode_current_time(&DateTime::new(2030, 1, 1, 0, 0, 0, 2), AdjustReason::NONE);
        assert_eq!(h.handle(current_time_write(&bytes), 0), Ok(Transition::Ignored));
        assert_eq!(h.clock.snapshot(), DateTime::EPOCH);
    }

    #[test]
    fn test_write_to_read_only_characteristic_is_ignored() {
        let mut h = Harness::new();
        h.handle(LinkEvent::Connected(PEER_A), 0).unwrap();
        let event = LinkEvent::Written {
            uuid: uuid::LOCAL_TIME_INFO,
            payload: WritePayload::from_slice(&[0, 0]).unwrap(),
        };
        assert_eq!(h.handle(event, 10), Ok(Transition::Ignored));
    }
}
