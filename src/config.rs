//! Configuration supplied once by the host when the sensor is set up.

use core::{fmt, str::FromStr};

/// Name used when the host does not configure one.
pub const DEFAULT_NAME: &str = "DHT11 Sensor";

/// Unit the temperature is displayed in.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TemperatureUnit {
    /// Degrees Celsius, as measured by the sensor.
    #[default]
    Celsius,
    /// Degrees Fahrenheit.
    Fahrenheit,
}

impl TemperatureUnit {
    /// Unit string shown next to the value.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }

    /// Converts a Celsius temperature into this unit.
    pub fn convert(self, celsius: f32) -> f32 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius * 1.8 + 32.0,
        }
    }

    /// Converts a temperature in this unit back to Celsius.
    pub fn to_celsius(self, value: f32) -> f32 {
        match self {
            Self::Celsius => value,
            Self::Fahrenheit => (value - 32.0) / 1.8,
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a unit string is neither Celsius nor Fahrenheit.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnknownUnit;

impl fmt::Display for UnknownUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown temperature unit, expected C or F")
    }
}

impl core::error::Error for UnknownUnit {}

impl FromStr for TemperatureUnit {
    type Err = UnknownUnit;

    /// Accepts `C`, `°C`, `F` and `°F`; the letter is case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let letter = s.strip_prefix('°').unwrap_or(s);
        if letter.eq_ignore_ascii_case("c") {
            Ok(Self::Celsius)
        } else if letter.eq_ignore_ascii_case("f") {
            Ok(Self::Fahrenheit)
        } else {
            Err(UnknownUnit)
        }
    }
}

/// Identifies the GPIO the sensor is wired to.
///
/// Only used for naming and diagnostics; the reader owns the typed pin.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinId {
    /// Numbered GPIO.
    Gpio(u8),
    /// Platform-specific pin token, e.g. `"D4"`.
    Named(&'static str),
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpio(n) => write!(f, "GPIO{n}"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Retry policy used when the host does not configure one.
pub const DEFAULT_RETRY: RetryPolicy = RetryPolicy::new(3, 1000);

/// Bounded retry of transient read failures.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u8,
    retry_delay_ms: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        DEFAULT_RETRY
    }
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` is clamped to at least one attempt.
    pub const fn new(max_attempts: u8, retry_delay_ms: u32) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
            retry_delay_ms,
        }
    }

    /// Single attempt, no retry.
    pub const fn no_retry() -> Self {
        Self::new(1, 0)
    }

    /// Total number of read attempts, including the first.
    pub const fn max_attempts(&self) -> u8 {
        self.max_attempts
    }

    /// Pause between two attempts, in milliseconds.
    ///
    /// The DHT11 needs about one second between conversions.
    pub const fn retry_delay_ms(&self) -> u32 {
        self.retry_delay_ms
    }
}

/// Sensor configuration. Immutable once built.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Display name of the entity.
    pub name: &'static str,
    /// Pin the sensor is wired to.
    pub pin: PinId,
    /// Unit the temperature is displayed in.
    pub unit: TemperatureUnit,
    /// Retry policy applied to the reader at setup.
    pub retry: RetryPolicy,
}

impl Config {
    /// Creates a configuration with the default name, Celsius and the default retry policy.
    pub const fn new(pin: PinId) -> Self {
        Self {
            name: DEFAULT_NAME,
            pin,
            unit: TemperatureUnit::Celsius,
            retry: DEFAULT_RETRY,
        }
    }

    /// Sets the display name.
    pub const fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Sets the display unit.
    pub const fn with_unit(mut self, unit: TemperatureUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Sets the retry policy [`Dht11Sensor::setup`](crate::Dht11Sensor::setup) hands to the reader.
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
