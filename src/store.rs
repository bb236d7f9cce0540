//! Latest-poll state and its unit-converted view.

use crate::{
    config::{Config, TemperatureUnit},
    error::SensorError,
    reader::{Reading, SensorReader},
};

/// Outcome of the most recent poll.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum StoreState {
    /// The last poll produced this reading.
    HasReading(Reading),
    /// The last poll failed, or nothing has been polled yet.
    #[default]
    NoReading,
}

/// What the host displays after a poll.
///
/// When `available` is false both `value` and `humidity` are `None`.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayState {
    /// Temperature in `unit`.
    pub value: Option<f32>,
    /// Configured display unit.
    pub unit: TemperatureUnit,
    /// Relative humidity in percent.
    pub humidity: Option<f32>,
    /// Whether the last poll produced a reading.
    pub available: bool,
}

impl DisplayState {
    /// State with no reading, in the given unit.
    pub const fn unavailable(unit: TemperatureUnit) -> Self {
        Self {
            value: None,
            unit,
            humidity: None,
            available: false,
        }
    }

    fn from_reading(reading: &Reading, unit: TemperatureUnit) -> Self {
        Self {
            value: Some(unit.convert(reading.temperature_celsius())),
            unit,
            humidity: Some(reading.humidity_percent()),
            available: true,
        }
    }
}

/// Extra state attributes: humidity and the unconverted Celsius temperature.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Attributes {
    /// Relative humidity in percent.
    pub humidity: Option<f32>,
    /// Temperature in degrees Celsius, whatever the display unit.
    pub temperature: Option<f32>,
}

impl Attributes {
    /// `(key, value)` pairs, keyed `"humidity"` and `"temperature"`.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Option<f32>)> {
        [("humidity", self.humidity), ("temperature", self.temperature)].into_iter()
    }
}

/// Holds the outcome of the latest poll.
///
/// Every [`poll`](ReadingStore::poll) replaces the state. A failed poll
/// drops the previous reading, so a stale value is never shown as current.
#[derive(Debug)]
pub struct ReadingStore {
    config: Config,
    state: StoreState,
}

impl ReadingStore {
    /// Creates an empty store; nothing is available until the first successful poll.
    pub const fn new(config: Config) -> Self {
        Self {
            config,
            state: StoreState::NoReading,
        }
    }

    /// Reads the sensor once (with the reader's retries) and updates the state.
    ///
    /// The reader keeps its own retry policy; [`Dht11Sensor::setup`](crate::Dht11Sensor::setup)
    /// is what applies `Config::retry` to it.
    ///
    /// Transient failures are absorbed: they yield an unavailable state, not an error.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::DriverUnavailable` when the driver cannot be used.
    /// The state is cleared in that case too.
    pub fn poll<R: SensorReader>(&mut self, reader: &mut R) -> Result<DisplayState, SensorError> {
        self.record(reader.read())
    }

    /// Applies the outcome of a read that already happened.
    pub fn record(
        &mut self,
        outcome: Result<Reading, SensorError>,
    ) -> Result<DisplayState, SensorError> {
        match outcome {
            Ok(reading) => {
                self.state = StoreState::HasReading(reading);
                let display = self.display_state();
                debug!(
                    "{}: temperature {} {}, humidity {} %",
                    self.config.name,
                    reading.temperature_celsius(),
                    TemperatureUnit::Celsius.as_str(),
                    reading.humidity_percent()
                );
                Ok(display)
            }
            Err(e) => {
                self.state = StoreState::NoReading;
                error!("{}: error updating sensor data: {}", self.config.name, e);
                if e.is_transient() {
                    Ok(self.display_state())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Outcome of the most recent poll.
    pub fn state(&self) -> &StoreState {
        &self.state
    }

    /// The latest reading, if the last poll succeeded.
    pub fn latest(&self) -> Option<&Reading> {
        match &self.state {
            StoreState::HasReading(reading) => Some(reading),
            StoreState::NoReading => None,
        }
    }

    /// Latest reading converted to the configured unit.
    pub fn display_state(&self) -> DisplayState {
        match &self.state {
            StoreState::HasReading(reading) => DisplayState::from_reading(reading, self.config.unit),
            StoreState::NoReading => DisplayState::unavailable(self.config.unit),
        }
    }

    /// Humidity and Celsius temperature of the latest reading.
    pub fn attributes(&self) -> Attributes {
        Attributes {
            humidity: self.latest().map(Reading::humidity_percent),
            temperature: self.latest().map(Reading::temperature_celsius),
        }
    }

    /// Whether the last poll produced a reading.
    pub fn is_available(&self) -> bool {
        matches!(self.state, StoreState::HasReading(_))
    }

    /// Configuration the store was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }
}
