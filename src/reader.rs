//! The [`SensorReader`] capability and its DHT11 implementation.

use core::ops::RangeInclusive;

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

use crate::{
    config::RetryPolicy,
    dht11::{Dht11, Measurement},
    error::SensorError,
};

/// Temperatures a DHT11 can measure, in degrees Celsius.
pub const TEMPERATURE_RANGE: RangeInclusive<f32> = 0.0..=50.0;

/// Relative humidity a DHT11 can measure, in percent.
pub const HUMIDITY_RANGE: RangeInclusive<f32> = 20.0..=90.0;

/// A validated, timestamped sensor reading.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    temperature_celsius: f32,
    humidity_percent: f32,
    timestamp_ms: u64,
}

impl Reading {
    /// Creates a reading from already validated values.
    pub const fn new(temperature_celsius: f32, humidity_percent: f32, timestamp_ms: u64) -> Self {
        Self {
            temperature_celsius,
            humidity_percent,
            timestamp_ms,
        }
    }

    /// Temperature in degrees Celsius.
    pub const fn temperature_celsius(&self) -> f32 {
        self.temperature_celsius
    }

    /// Relative humidity in percent.
    pub const fn humidity_percent(&self) -> f32 {
        self.humidity_percent
    }

    /// When the reading was taken, on the [`Clock`]'s timeline.
    pub const fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }
}

/// Source of reading timestamps, in milliseconds.
///
/// Any `FnMut() -> u64` is a clock, so a monotonic timer can be passed as a closure.
pub trait Clock {
    /// Current time in milliseconds.
    fn now_ms(&mut self) -> u64;
}

impl<F: FnMut() -> u64> Clock for F {
    fn now_ms(&mut self) -> u64 {
        self()
    }
}

/// Produces readings from a temperature and humidity sensor.
///
/// Implementations own their pin, so at most one read per pin is in flight.
/// A call blocks for the whole read, including retries.
pub trait SensorReader {
    /// Reads the sensor, retrying transient failures.
    ///
    /// # Errors
    ///
    /// * `SensorError::DriverUnavailable` if the hardware cannot be driven at all.
    /// * `SensorError::Timeout`, `SensorError::NullReading` or
    ///   `SensorError::OutOfRange` once retries are exhausted.
    fn read(&mut self) -> Result<Reading, SensorError>;

    /// Checks at setup time that the sensor can be driven.
    fn probe(&mut self) -> Result<(), SensorError> {
        Ok(())
    }

    /// Replaces the retry policy. Readers that do not retry ignore it.
    fn set_retry_policy(&mut self, _policy: RetryPolicy) {}
}

impl<R: SensorReader + ?Sized> SensorReader for &mut R {
    fn read(&mut self) -> Result<Reading, SensorError> {
        (**self).read()
    }

    fn probe(&mut self) -> Result<(), SensorError> {
        (**self).probe()
    }

    fn set_retry_policy(&mut self, policy: RetryPolicy) {
        (**self).set_retry_policy(policy)
    }
}

/// Rejects measurements a DHT11 cannot produce, typically garbage from a
/// frame whose corruption slipped past the checksum.
pub fn check_plausible(measurement: &Measurement) -> Result<(), SensorError> {
    if TEMPERATURE_RANGE.contains(&measurement.temperature)
        && HUMIDITY_RANGE.contains(&measurement.relative_humidity)
    {
        Ok(())
    } else {
        Err(SensorError::OutOfRange)
    }
}

/// [`SensorReader`] for a DHT11 wired to a single GPIO pin.
pub struct Dht11Reader<PIN, D, C> {
    dht: Dht11<PIN, D>,
    clock: C,
    policy: RetryPolicy,
}

impl<PIN, DELAY, C, E> Dht11Reader<PIN, DELAY, C>
where
    PIN: InputPin<Error = E> + OutputPin<Error = E>,
    DELAY: DelayNs,
    C: Clock,
{
    /// Creates a reader with the default [`RetryPolicy`].
    ///
    /// # Arguments
    ///
    /// * `pin` - The GPIO pin connected to the DHT11 data line.
    /// * `delay` - Delay provider for protocol timing and retry pauses.
    /// * `clock` - Timestamp source for readings.
    pub fn new(pin: PIN, delay: DELAY, clock: C) -> Self {
        Self {
            dht: Dht11::new(pin, delay),
            clock,
            policy: RetryPolicy::default(),
        }
    }

    /// Sets the retry policy. [`Dht11Sensor::setup`](crate::Dht11Sensor::setup)
    /// overrides it with the one from its [`Config`](crate::Config).
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The retry policy in effect.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Consumes the reader and returns the pin and delay provider.
    pub fn release(self) -> (PIN, DELAY) {
        self.dht.release()
    }

    fn read_once(&mut self) -> Result<Reading, SensorError> {
        let measurement = self.dht.read()?;
        check_plausible(&measurement)?;
        Ok(Reading::new(
            measurement.temperature,
            measurement.relative_humidity,
            self.clock.now_ms(),
        ))
    }
}

impl<PIN, DELAY, C, E> SensorReader for Dht11Reader<PIN, DELAY, C>
where
    PIN: InputPin<Error = E> + OutputPin<Error = E>,
    DELAY: DelayNs,
    C: Clock,
{
    fn read(&mut self) -> Result<Reading, SensorError> {
        let attempts = self.policy.max_attempts();
        let mut last_error = SensorError::NullReading;

        for attempt in 1..=attempts {
            match self.read_once() {
                Ok(reading) => return Ok(reading),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    warn!("dht11: attempt {}/{} failed: {}", attempt, attempts, e);
                    last_error = e;
                    if attempt < attempts {
                        self.dht.pause_ms(self.policy.retry_delay_ms());
                    }
                }
            }
        }

        Err(last_error)
    }

    /// Drives the data line to idle high. A pin error means the GPIO is unusable.
    fn probe(&mut self) -> Result<(), SensorError> {
        self.dht.idle().map_err(SensorError::from)
    }

    fn set_retry_policy(&mut self, policy: RetryPolicy) {
        self.policy = policy;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dht11::tests::{frame, frame_delays, no_response, no_response_delays};
    use embedded_hal_mock::eh1::delay::CheckedDelay;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::delay::Transaction as DelayTx;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTx,
    };
    use embedded_hal_mock::eh1::MockError;

    // 40% RH, 24.6C
    const GOOD: ([u8; 4], u8) = ([0x28, 0x00, 0x18, 0x06], 0x46);
    // Same payload, corrupted checksum
    const BAD: ([u8; 4], u8) = ([0x28, 0x00, 0x18, 0x06], 0x41);

    #[test]
    fn test_read_valid() {
        let mut pin = PinMock::new(&frame(GOOD.0, GOOD.1));
        let mut delay = CheckedDelay::new(&frame_delays());

        let mut reader = Dht11Reader::new(pin.clone(), &mut delay, || 1_234u64);
        let reading = reader.read().unwrap();

        assert_eq!(reading, Reading::new(24.6, 40.0, 1_234));

        pin.done();
        delay.done();
    }

    #[test]
    fn test_retry_after_checksum_mismatch() {
        let mut pin_states = frame(BAD.0, BAD.1);
        pin_states.extend(frame(GOOD.0, GOOD.1));
        let mut pin = PinMock::new(&pin_states);

        let mut delays = frame_delays();
        delays.push(DelayTx::delay_ms(1000));
        delays.extend(frame_delays());
        let mut delay = CheckedDelay::new(&delays);

        let mut reader = Dht11Reader::new(pin.clone(), &mut delay, || 7u64);
        let reading = reader.read().unwrap();

        assert_eq!(reading.temperature_celsius(), 24.6);
        assert_eq!(reading.humidity_percent(), 40.0);

        pin.done();
        delay.done();
    }

    #[test]
    fn test_retries_exhausted() {
        let mut pin_states = frame(BAD.0, BAD.1);
        pin_states.extend(frame(BAD.0, BAD.1));
        let mut pin = PinMock::new(&pin_states);

        // No pause after the final attempt
        let mut delays = frame_delays();
        delays.push(DelayTx::delay_ms(5));
        delays.extend(frame_delays());
        let mut delay = CheckedDelay::new(&delays);

        let mut reader = Dht11Reader::new(pin.clone(), &mut delay, || 0u64)
            .with_retry_policy(RetryPolicy::new(2, 5));
        assert_eq!(reader.read().unwrap_err(), SensorError::NullReading);

        pin.done();
        delay.done();
    }

    #[test]
    fn test_retries_all_time_out() {
        let mut pin_states = no_response();
        pin_states.extend(no_response());
        let mut pin = PinMock::new(&pin_states);

        let mut delays = no_response_delays();
        delays.push(DelayTx::delay_ms(5));
        delays.extend(no_response_delays());
        let mut delay = CheckedDelay::new(&delays);

        let mut reader = Dht11Reader::new(pin.clone(), &mut delay, || 0u64)
            .with_retry_policy(RetryPolicy::new(2, 5));
        assert_eq!(reader.read().unwrap_err(), SensorError::Timeout);

        pin.done();
        delay.done();
    }

    #[test]
    fn test_pin_error_not_retried() {
        // set_low fails on the first attempt; nothing else may touch the pin
        let mut pin = PinMock::new(&[PinTx::set(PinState::Low)
            .with_error(MockError::Io(std::io::ErrorKind::Other))]);
        // No start delay and no retry pause
        let mut delay = CheckedDelay::new(&[]);

        let mut reader = Dht11Reader::new(pin.clone(), &mut delay, || 0u64)
            .with_retry_policy(RetryPolicy::new(3, 1000));
        assert_eq!(reader.read().unwrap_err(), SensorError::DriverUnavailable);

        pin.done();
        delay.done();
    }

    #[test]
    fn test_set_retry_policy() {
        let mut pin = PinMock::new(&[]);

        let mut reader = Dht11Reader::new(pin.clone(), NoopDelay, || 0u64);
        assert_eq!(reader.retry_policy(), RetryPolicy::default());
        SensorReader::set_retry_policy(&mut reader, RetryPolicy::no_retry());
        assert_eq!(reader.retry_policy(), RetryPolicy::no_retry());

        pin.done();
    }

    #[test]
    fn test_out_of_range_rejected() {
        // 40% RH, 60.0C: valid checksum but beyond what a DHT11 measures
        let mut pin = PinMock::new(&frame([0x28, 0x00, 0x3C, 0x00], 0x64));
        let mut delay = CheckedDelay::new(&frame_delays());

        let mut reader = Dht11Reader::new(pin.clone(), &mut delay, || 0u64)
            .with_retry_policy(RetryPolicy::no_retry());
        assert_eq!(reader.read().unwrap_err(), SensorError::OutOfRange);

        pin.done();
        delay.done();
    }

    #[test]
    fn test_check_plausible() {
        let ok = Measurement {
            temperature: 22.0,
            relative_humidity: 55.0,
        };
        assert_eq!(check_plausible(&ok), Ok(()));

        for (temperature, relative_humidity) in [
            (150.0, 55.0),
            (-1.0, 55.0),
            (22.0, 95.0),
            (22.0, 10.0),
            (f32::NAN, 55.0),
        ] {
            let m = Measurement {
                temperature,
                relative_humidity,
            };
            assert_eq!(check_plausible(&m), Err(SensorError::OutOfRange));
        }
    }

    #[test]
    fn test_probe_drives_line_high() {
        let mut pin = PinMock::new(&[PinTx::set(PinState::High)]);

        let mut reader = Dht11Reader::new(pin.clone(), NoopDelay, || 0u64);
        assert_eq!(reader.probe(), Ok(()));

        pin.done();
    }

    #[test]
    fn test_read_through_mut_ref() {
        let mut pin = PinMock::new(&frame(GOOD.0, GOOD.1));

        let mut reader = Dht11Reader::new(pin.clone(), NoopDelay, || 42u64)
            .with_retry_policy(RetryPolicy::no_retry());
        let mut borrowed = &mut reader;
        assert_eq!(
            SensorReader::read(&mut borrowed).unwrap().timestamp_ms(),
            42
        );
        assert_eq!(reader.retry_policy(), RetryPolicy::no_retry());

        pin.done();
    }
}
