//! Retrying reads with plausibility checks.
//!
//! Busy-polled reads on a general purpose OS fail regularly. [`Monitor`]
//! wraps any [`Sensor`], retries failed or implausible reads after a pause
//! and remembers the last checksum-valid reading to reject sudden jumps.

use core::fmt;

use embedded_hal::delay::DelayNs;

use crate::dht::Sensor;
use crate::reading::Reading;

/// Bounds a reading must satisfy to be accepted.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Limits {
    /// Highest accepted relative humidity in percent.
    pub max_humidity: f32,
    /// Highest accepted temperature in degrees Celsius.
    pub max_temperature: f32,
    /// Largest accepted temperature change from the previous reading.
    pub max_temperature_step: f32,
    /// Largest accepted humidity change from the previous reading.
    pub max_humidity_step: f32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_humidity: 100.0,
            max_temperature: 80.0,
            max_temperature_step: 1.0,
            max_humidity_step: 5.0,
        }
    }
}

/// Why a checksum-valid reading was rejected.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Implausible {
    /// Humidity above [`Limits::max_humidity`].
    Humidity(f32),
    /// Temperature above [`Limits::max_temperature`].
    Temperature(f32),
    /// Temperature moved more than [`Limits::max_temperature_step`].
    TemperatureStep(f32),
    /// Humidity moved more than [`Limits::max_humidity_step`].
    HumidityStep(f32),
}

impl fmt::Display for Implausible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Implausible::Humidity(h) => write!(f, "invalid humidity {h}%"),
            Implausible::Temperature(t) => write!(f, "invalid temperature {t}'C"),
            Implausible::TemperatureStep(dt) => write!(f, "too large dT {dt}"),
            Implausible::HumidityStep(dh) => write!(f, "too large dH {dh}"),
        }
    }
}

fn exceeds(delta: f32, max: f32) -> bool {
    delta > max || delta < -max
}

impl Limits {
    /// Checks `reading` on its own and against `previous`, if any.
    pub fn check(&self, reading: &Reading, previous: Option<&Reading>) -> Result<(), Implausible> {
        if reading.relative_humidity > self.max_humidity {
            return Err(Implausible::Humidity(reading.relative_humidity));
        }
        if reading.temperature > self.max_temperature {
            return Err(Implausible::Temperature(reading.temperature));
        }

        if let Some(previous) = previous {
            let dt = reading.temperature - previous.temperature;
            if exceeds(dt, self.max_temperature_step) {
                return Err(Implausible::TemperatureStep(dt));
            }
            let dh = reading.relative_humidity - previous.relative_humidity;
            if exceeds(dh, self.max_humidity_step) {
                return Err(Implausible::HumidityStep(dh));
            }
        }

        Ok(())
    }
}

/// How often and how patiently to retry.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Reads attempted before giving up. Zero is treated as one.
    pub attempts: u8,
    /// Pause between attempts in milliseconds.
    pub backoff_ms: u32,
    /// Plausibility bounds.
    pub limits: Limits,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            backoff_ms: 3_000,
            limits: Limits::default(),
        }
    }
}

/// Why a single attempt did not produce an accepted reading.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Debug, PartialEq)]
pub enum Rejection<E> {
    /// The sensor read failed.
    Sensor(E),
    /// The reading was valid but implausible.
    Implausible(Implausible),
}

/// Every attempt was rejected.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Debug, PartialEq)]
pub struct Exhausted<E> {
    /// Attempts made.
    pub attempts: u8,
    /// Why the last attempt was rejected.
    pub last: Rejection<E>,
}

impl<E: fmt::Display> fmt::Display for Exhausted<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no reading after {} attempts: ", self.attempts)?;
        match &self.last {
            Rejection::Sensor(err) => write!(f, "{err}"),
            Rejection::Implausible(why) => write!(f, "{why}"),
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug + fmt::Display> std::error::Error for Exhausted<E> {}

/// An accepted reading.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Report {
    /// The reading.
    pub reading: Reading,
    /// Attempts it took, the successful one included.
    pub attempts: u8,
}

/// Retrying front end for a [`Sensor`].
pub struct Monitor<S, D> {
    sensor: S,
    delay: D,
    policy: RetryPolicy,
    previous: Option<Reading>,
}

impl<S, D> Monitor<S, D>
where
    S: Sensor,
    D: DelayNs,
{
    /// Creates a monitor with the default policy.
    pub fn new(sensor: S, delay: D) -> Self {
        Self::with_policy(sensor, delay, RetryPolicy::default())
    }

    /// Creates a monitor with a custom policy.
    pub fn with_policy(sensor: S, delay: D, policy: RetryPolicy) -> Self {
        Monitor {
            sensor,
            delay,
            policy,
            previous: None,
        }
    }

    /// The last checksum-valid reading, accepted or not.
    pub fn previous(&self) -> Option<&Reading> {
        self.previous.as_ref()
    }

    /// Reads until a plausible reading arrives or the attempts run out.
    pub fn read(&mut self) -> Result<Report, Exhausted<S::Error>> {
        let attempts = self.policy.attempts.max(1);
        let mut attempt = 1;

        loop {
            let rejection = match self.attempt() {
                Ok(reading) => {
                    return Ok(Report {
                        reading,
                        attempts: attempt,
                    });
                }
                Err(rejection) => rejection,
            };

            if attempt >= attempts {
                return Err(Exhausted {
                    attempts: attempt,
                    last: rejection,
                });
            }

            self.delay.delay_ms(self.policy.backoff_ms);
            attempt += 1;
        }
    }

    fn attempt(&mut self) -> Result<Reading, Rejection<S::Error>> {
        let reading = self.sensor.read().map_err(Rejection::Sensor)?;

        // later attempts compare against this one even if it is rejected
        let previous = self.previous.replace(reading);
        self.policy
            .limits
            .check(&reading, previous.as_ref())
            .map_err(Rejection::Implausible)?;

        Ok(reading)
    }

    /// Returns the sensor and the delay provider.
    pub fn free(self) -> (S, D) {
        (self.sensor, self.delay)
    }
}
