//! Host-facing sensor entity.

use crate::{
    config::{Config, TemperatureUnit},
    error::SensorError,
    reader::{Reading, SensorReader},
    store::{Attributes, DisplayState, ReadingStore},
};

/// Receives the outcome of every poll.
///
/// Both methods default to doing nothing.
pub trait PollObserver {
    /// Called after a poll that produced `reading`.
    fn on_reading(&mut self, _reading: &Reading, _state: &DisplayState) {}

    /// Called after a poll that failed with `error`.
    fn on_failure(&mut self, _error: SensorError) {}
}

impl PollObserver for () {}

impl<O: PollObserver + ?Sized> PollObserver for &mut O {
    fn on_reading(&mut self, reading: &Reading, state: &DisplayState) {
        (**self).on_reading(reading, state)
    }

    fn on_failure(&mut self, error: SensorError) {
        (**self).on_failure(error)
    }
}

/// A DHT11 as the host sees it: a named temperature entity with a humidity attribute.
///
/// The host calls [`update`](Dht11Sensor::update) on its own schedule, then reads
/// the accessors. Nothing runs in the background.
pub struct Dht11Sensor<R, O = ()> {
    reader: R,
    store: ReadingStore,
    observer: O,
}

impl<R: SensorReader> Dht11Sensor<R> {
    /// Builds the entity after probing the reader.
    ///
    /// The reader's retry policy is replaced with `config.retry`.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::DriverUnavailable` when the sensor cannot be driven;
    /// the host should not activate the entity.
    pub fn setup(mut reader: R, config: Config) -> Result<Self, SensorError> {
        reader.set_retry_policy(config.retry);
        if let Err(e) = reader.probe() {
            error!("{} on {}: sensor setup failed: {}", config.name, config.pin, e);
            return Err(e);
        }
        Ok(Self {
            reader,
            store: ReadingStore::new(config),
            observer: (),
        })
    }
}

impl<R: SensorReader, O: PollObserver> Dht11Sensor<R, O> {
    /// Replaces the observer notified after each poll.
    pub fn with_observer<O2: PollObserver>(self, observer: O2) -> Dht11Sensor<R, O2> {
        Dht11Sensor {
            reader: self.reader,
            store: self.store,
            observer,
        }
    }

    /// Runs one poll cycle. See [`ReadingStore::poll`].
    pub fn update(&mut self) -> Result<DisplayState, SensorError> {
        let outcome = self.reader.read();
        let result = self.store.record(outcome);
        match outcome {
            Ok(reading) => self.observer.on_reading(&reading, &self.store.display_state()),
            Err(e) => self.observer.on_failure(e),
        }
        result
    }

    /// Display name from the configuration.
    pub fn name(&self) -> &'static str {
        self.store.config().name
    }

    /// Temperature in the configured unit, `None` while unavailable.
    pub fn state(&self) -> Option<f32> {
        self.store.display_state().value
    }

    /// Unit of [`state`](Dht11Sensor::state).
    pub fn unit_of_measurement(&self) -> TemperatureUnit {
        self.store.config().unit
    }

    /// Humidity and Celsius temperature of the latest reading.
    pub fn attributes(&self) -> Attributes {
        self.store.attributes()
    }

    /// Whether the last update produced a reading.
    pub fn available(&self) -> bool {
        self.store.is_available()
    }

    /// Full view of the latest poll.
    pub fn display_state(&self) -> DisplayState {
        self.store.display_state()
    }

    /// The underlying store.
    pub fn store(&self) -> &ReadingStore {
        &self.store
    }

    /// Consumes the entity and returns its reader.
    pub fn release(self) -> R {
        self.reader
    }
}
