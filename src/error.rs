use core::fmt;

/// Possible errors from the DHT11 wire protocol.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq)]
pub enum DhtError<E> {
    /// Timed out waiting for a pin state change.
    Timeout,
    /// Checksum did not match the received data.
    ChecksumMismatch,
    /// Error from the GPIO pin (input/output).
    PinError(E),
}

impl<E> From<E> for DhtError<E> {
    fn from(value: E) -> Self {
        Self::PinError(value)
    }
}

/// Errors reported by a [`SensorReader`](crate::SensorReader).
///
/// Only [`SensorError::DriverUnavailable`] is fatal. The other variants are
/// expected at runtime on a one-wire line and are absorbed by the
/// [`ReadingStore`](crate::ReadingStore) as an unavailable state.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SensorError {
    /// The GPIO pin or driver cannot be used. The sensor cannot produce readings.
    DriverUnavailable,
    /// The sensor did not answer within the protocol timing.
    Timeout,
    /// The driver returned no usable data (e.g. corrupted frame).
    NullReading,
    /// The decoded values are outside what a DHT11 can measure.
    OutOfRange,
}

impl SensorError {
    /// Returns `true` for failures worth retrying and absorbing at poll time.
    pub const fn is_transient(&self) -> bool {
        !matches!(self, Self::DriverUnavailable)
    }
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::DriverUnavailable => "sensor driver unavailable",
            Self::Timeout => "timed out waiting for sensor",
            Self::NullReading => "sensor returned no data",
            Self::OutOfRange => "sensor reading out of range",
        };
        f.write_str(msg)
    }
}

impl core::error::Error for SensorError {}

impl<E> From<DhtError<E>> for SensorError {
    fn from(value: DhtError<E>) -> Self {
        match value {
            DhtError::Timeout => Self::Timeout,
            DhtError::ChecksumMismatch => Self::NullReading,
            DhtError::PinError(_) => Self::DriverUnavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_errors_map_to_sensor_errors() {
        assert_eq!(SensorError::from(DhtError::<()>::Timeout), SensorError::Timeout);
        assert_eq!(
            SensorError::from(DhtError::<()>::ChecksumMismatch),
            SensorError::NullReading
        );
        assert_eq!(
            SensorError::from(DhtError::PinError(())),
            SensorError::DriverUnavailable
        );
    }

    #[test]
    fn test_only_driver_unavailable_is_fatal() {
        assert!(!SensorError::DriverUnavailable.is_transient());
        assert!(SensorError::Timeout.is_transient());
        assert!(SensorError::NullReading.is_transient());
        assert!(SensorError::OutOfRange.is_transient());
    }
}
