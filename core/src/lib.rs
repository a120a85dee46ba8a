//! Platform-agnostic Current Time Service logic
//!
//! This crate contains the wall-clock service shared by every board. It has
//! NO hardware dependencies; boards supply a BLE stack and a status light
//! through the `hal-abstractions` traits.
//!
//! - **`calendar`**: leap years, month lengths, weekday arithmetic
//! - **`clock`**: calendar clock advanced from a millisecond counter
//! - **`codec`**: Current Time / Local Time Info / Reference Time Info records
//! - **`link`**: single-peer connection state machine
//! - **`tasks`**: cooperative periodic task set
//! - **`service`**: ties the above into one dispatch loop

#![no_std]
#![deny(unsafe_code)]
#![deny(warnings)]

#[macro_use]
mod fmt;

pub mod calendar;
pub mod clock;
pub mod codec;
pub mod config;
pub mod datetime;
pub mod error;
pub mod link;
pub mod publish;
pub mod service;
pub mod tasks;

#[cfg(test)]
mod testing;

pub use clock::CalendarClock;
pub use codec::{AdjustReason, CurrentTime, DstOffset, LocalTimeInfo, ReferenceTimeInfo, TimeSource};
pub use config::{AdvertisingConfig, CtsConfig, TaskPeriods};
pub use datetime::DateTime;
pub use error::{CtsError, Field};
pub use link::{LinkState, LinkStateMachine, Transition};
pub use service::CtsService;
pub use tasks::{TaskKind, TaskSet};
