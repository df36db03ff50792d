//! Busy-polling DHT11/DHT22 reader for non-realtime hosts
//!
//! This crate reads DHT11 and DHT22 (AM2302) temperature and humidity sensors
//! from a general purpose digital pin without interrupts or hardware timers.
//! The sensor encodes each of its 40 data bits in the spacing of falling
//! edges; the driver busy-polls the line, timestamps those edges and decodes
//! them afterwards.
//!
//! On an operating system with a periodic scheduler interrupt, a poll loop
//! that gets preempted mid-frame misreads bits. Before releasing the line to
//! the sensor the driver therefore profiles the scheduler, infers the phase
//! of its ~10 ms tick and releases just after a tick, so the 8 ms capture
//! window fits between two interrupts. This is best effort: when no tick
//! pattern is found the read proceeds unsynchronized.
//!
//! # Features
//! - `no_std` by default, platform access through small traits
//! - [`OpenDrain`] adapter for any `embedded-hal` input/output pin
//! - Optional scheduling priority elevation for the duration of a read
//! - [`Monitor`] for retrying reads with plausibility checks
//!
//! # Optional Features
//! - `defmt`: Implements `defmt::Format` for logging support and logs degraded reads
//! - `std`: [`StdTimeSource`](clock::StdTimeSource), `std::error::Error` impls and
//!   [`Reading::apparent_temperature`]
//!
//! # Dependencies
//! This driver depends on the following `embedded-hal` traits:
//! - [`InputPin`] and [`OutputPin`] for GPIO access through [`OpenDrain`]
//! - [`DelayNs`] for the pause between retries in [`Monitor`]
//!
//! [`InputPin`]: embedded_hal::digital::InputPin
//! [`OutputPin`]: embedded_hal::digital::OutputPin
//! [`DelayNs`]: embedded_hal::delay::DelayNs

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod clock;
pub mod config;
pub mod dht;
pub mod edge_log;
pub mod error;
pub mod frame;
pub mod line;
pub mod monitor;
pub mod priority;
pub mod reading;
mod sampler;
pub mod window;

#[cfg(test)]
mod testing;

pub use clock::{ElapsedClock, TimeSource, Timestamp};
pub use config::{Config, PollStrategy};
pub use dht::{Dht, Sensor};
pub use edge_log::EdgeLog;
pub use error::DhtError;
pub use frame::{BitFrame, ByteFrame, FrameError};
pub use line::{DataLine, Direction, OpenDrain};
pub use monitor::{Monitor, RetryPolicy};
pub use priority::{NoElevation, PriorityElevator};
pub use reading::{DeviceClass, Reading};
