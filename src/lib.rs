//! DHT11 Sensor Polling Pipeline for Embedded Rust
//!
//! This crate reads temperature and humidity from a DHT11 sensor over a single
//! GPIO pin and keeps the outcome of the latest poll for a host application,
//! built on top of the [`embedded-hal`] traits.
//!
//! The pipeline has three layers:
//! - [`Dht11`]: the bit-banged one-wire driver producing a raw [`Measurement`].
//! - [`Dht11Reader`]: a [`SensorReader`] that retries transient failures,
//!   rejects implausible values and timestamps each [`Reading`].
//! - [`ReadingStore`]: converts units and derives the [`DisplayState`] the host
//!   shows. A failed poll clears the state instead of keeping a stale value.
//!
//! [`Dht11Sensor`] ties a reader and a store together into the entity a host
//! framework polls on its own schedule.
//!
//! # Features
//! - Blocking synchronous API using `embedded-hal` traits
//! - Designed for `no_std` environments
//! - Optional logging support via `defmt` or `log`
//!
//! # Example
//!
//! ```ignore
//! let reader = Dht11Reader::new(pin, delay, || now_ms());
//! // Applies config.retry to the reader, then probes the pin.
//! let mut sensor = Dht11Sensor::setup(reader, config)?;
//!
//! // Called by the host on every poll cycle.
//! let state = sensor.update()?;
//! if state.available {
//!     // show state.value / state.humidity
//! }
//! ```
//!
//! # Optional Features
//! - `defmt`: Implements `defmt::Format` and logs through `defmt`
//! - `log`: Logs through the `log` facade
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal

#![cfg_attr(not(test), no_std)]

#[cfg(all(feature = "defmt", feature = "log"))]
compile_error!("Features \"defmt\" and \"log\" are mutually exclusive and cannot be enabled together");

#[macro_use]
mod fmt;

pub mod config;
pub mod dht11;
pub mod error;
pub mod reader;
pub mod sensor;
pub mod store;

pub use config::{Config, PinId, RetryPolicy, TemperatureUnit, UnknownUnit};
pub use dht11::{Dht11, Measurement};
pub use error::{DhtError, SensorError};
pub use reader::{Clock, Dht11Reader, Reading, SensorReader};
pub use sensor::{Dht11Sensor, PollObserver};
pub use store::{Attributes, DisplayState, ReadingStore, StoreState};
