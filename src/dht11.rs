use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

use crate::error::DhtError;

/// Maximum time to wait (in microseconds) for the pin to change state.
///
/// Used to detect timeouts when waiting for the DHT11 to respond.
const TIMEOUT_US: u8 = 100;

/// How long the MCU holds the line low to wake the sensor (datasheet: at least 18 ms).
const START_LOW_MS: u32 = 20;

/// Driver for the DHT11 temperature and humidity sensor.
pub struct Dht11<PIN, D> {
    pin: PIN,
    delay: D,
}

/// Raw measurement decoded from one DHT11 frame.
///
/// Values are not range checked; see [`Dht11Reader`](crate::Dht11Reader).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measurement {
    /// Temperature in degrees Celsius.
    pub temperature: f32,
    /// Relative humidity in percent.
    pub relative_humidity: f32,
}

impl<PIN, DELAY, E> Dht11<PIN, DELAY>
where
    PIN: InputPin<Error = E> + OutputPin<Error = E>,
    DELAY: DelayNs,
{
    /// Creates a new instance of the DHT11 driver.
    ///
    /// # Arguments
    ///
    /// * `pin` - The GPIO pin connected to the DHT11 data line. Must support both input and output.
    /// * `delay` - A delay provider implementing the `DelayNs` trait.
    pub fn new(pin: PIN, delay: DELAY) -> Self {
        Dht11 { pin, delay }
    }

    /// Consumes the driver and returns the pin and delay provider.
    pub fn release(self) -> (PIN, DELAY) {
        (self.pin, self.delay)
    }

    /// Drives the data line to its idle (high) level.
    pub fn idle(&mut self) -> Result<(), DhtError<E>> {
        self.pin.set_high()?;
        Ok(())
    }

    /// Blocks for `ms` milliseconds using the driver's delay provider.
    pub fn pause_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    /// Reads a temperature and humidity measurement from the DHT11 sensor.
    ///
    /// This method performs the complete DHT11 communication sequence:
    /// sending a start signal, waiting for the sensor's response,
    /// reading 5 bytes, validating the checksum, and decoding the result.
    ///
    /// # Returns
    ///
    /// * `Ok(Measurement)` if the read is successful and the checksum is valid.
    /// * `Err(DhtError)` if a communication or checksum error occurs.
    pub fn read(&mut self) -> Result<Measurement, DhtError<E>> {
        self.start()?;

        let mut data = [0; 4];

        for b in data.iter_mut() {
            *b = self.read_byte()?;
        }

        let checksum = self.read_byte()?;
        if data.iter().fold(0u8, |sum, v| sum.wrapping_add(*v)) != checksum {
            Err(DhtError::ChecksumMismatch)
        } else {
            Ok(Self::parse_data(data))
        }
    }

    /// Converts the 4-byte data into a `Measurement`.
    ///
    /// The DHT11 sends integral and decimal parts in separate bytes. Bit 7 of
    /// the temperature decimal byte flags a negative temperature.
    fn parse_data(data: [u8; 4]) -> Measurement {
        let [hum_int, hum_dec, temp_int, temp_dec] = data;

        let tenths = |int: u8, dec: u8| (int as u16 * 10 + dec as u16) as f32 / 10.0;

        let relative_humidity = tenths(hum_int, hum_dec);

        let is_temp_negative = (temp_dec >> 7) != 0;
        let mut temperature = tenths(temp_int, temp_dec & 0b0111_1111);
        if is_temp_negative {
            temperature = -temperature;
        }

        Measurement {
            temperature,
            relative_humidity,
        }
    }

    /// Sends the start signal to the DHT11 and waits for its response.
    ///
    /// This includes pulling the line low for at least 18 ms,
    /// then high, followed by waiting for the sensor's 80us low
    /// and 80us high response.
    fn start(&mut self) -> Result<(), DhtError<E>> {
        // MCU sends start request
        self.pin.set_low()?;
        self.delay.delay_ms(START_LOW_MS);
        self.pin.set_high()?;
        self.delay.delay_us(40);

        // Waiting for DHT11 Response
        self.wait_for_low()?; // 80us
        self.wait_for_high()?; // 80us
        Ok(())
    }

    /// Reads one byte (8 bits) from the sensor, MSB first.
    fn read_byte(&mut self) -> Result<u8, DhtError<E>> {
        let mut byte: u8 = 0;

        for i in 0..8 {
            let bit_mask = 1 << (7 - i);
            if self.read_bit()? {
                byte |= bit_mask;
            }
        }

        Ok(byte)
    }

    /// Reads a single bit from the sensor.
    ///
    /// A `0` is a 26-28us high pulse and a `1` is a 70us high pulse,
    /// so sampling 35us into the high phase tells them apart.
    fn read_bit(&mut self) -> Result<bool, DhtError<E>> {
        // DHT pulls line low (~50us)
        self.wait_for_low()?;

        self.wait_for_high()?;

        self.delay.delay_us(35);

        // Still high means the bit is 1
        let bit_is_one = self.pin.is_high()?;
        self.wait_for_low()?;

        Ok(bit_is_one)
    }

    fn wait_for_high(&mut self) -> Result<(), DhtError<E>> {
        Self::wait_for_state(&mut self.delay, || self.pin.is_high())
    }

    fn wait_for_low(&mut self) -> Result<(), DhtError<E>> {
        Self::wait_for_state(&mut self.delay, || self.pin.is_low())
    }

    /// Polls `condition` once per microsecond until it holds.
    ///
    /// # Errors
    ///
    /// Returns `DhtError::Timeout` after `TIMEOUT_US` failed polls.
    fn wait_for_state<F>(delay: &mut DELAY, mut condition: F) -> Result<(), DhtError<E>>
    where
        F: FnMut() -> Result<bool, E>,
    {
        for _ in 0..TIMEOUT_US {
            if condition()? {
                return Ok(());
            }
            delay.delay_us(1);
        }
        Err(DhtError::Timeout)
    }
}
