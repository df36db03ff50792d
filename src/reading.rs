use core::fmt;

use crate::frame::ByteFrame;

/// Sensor family, which decides how frame bytes scale to physical values.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceClass {
    /// Whole-number humidity and temperature in bytes 0 and 2.
    Dht11,
    /// Tenths, big-endian, with a sign flag in bit 7 of byte 2.
    Dht22,
}

/// A class number other than 11 or 22.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnknownDeviceClass(pub u8);

impl fmt::Display for UnknownDeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid DHT class {}, should be 11 or 22", self.0)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for UnknownDeviceClass {}

impl TryFrom<u8> for DeviceClass {
    type Error = UnknownDeviceClass;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            11 => Ok(DeviceClass::Dht11),
            22 => Ok(DeviceClass::Dht22),
            other => Err(UnknownDeviceClass(other)),
        }
    }
}

/// Reading returned by the sensor.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    /// Temperature in degrees Celsius.
    pub temperature: f32,
    /// Relative humidity in percent.
    pub relative_humidity: f32,
}

impl Reading {
    /// Scales a checked frame according to `class`.
    pub fn from_frame(frame: ByteFrame, class: DeviceClass) -> Self {
        let [hum_hi, hum_lo, temp_hi, temp_lo, _] = *frame.bytes();

        match class {
            DeviceClass::Dht22 => {
                let joined_humidity = u16::from_be_bytes([hum_hi, hum_lo]);
                let relative_humidity = f32::from(joined_humidity) / 10.0;

                // the sign flag is not part of the magnitude
                let is_temp_negative = (temp_hi >> 7) != 0;
                let joined_temp = u16::from_be_bytes([temp_hi & 0b0111_1111, temp_lo]);
                let mut temperature = f32::from(joined_temp) / 10.0;
                if is_temp_negative {
                    temperature = -temperature;
                }

                Reading {
                    temperature,
                    relative_humidity,
                }
            }
            DeviceClass::Dht11 => Reading {
                temperature: f32::from(temp_hi),
                relative_humidity: f32::from(hum_hi),
            },
        }
    }

    /// Steadman's apparent temperature for still air, in degrees Celsius.
    #[cfg(feature = "std")]
    pub fn apparent_temperature(&self) -> f32 {
        let t = self.temperature;
        let vapour_pressure =
            self.relative_humidity / 100.0 * 6.105 * (17.27 * t / (237.7 + t)).exp();
        t + 0.33 * vapour_pressure - 4.0
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Temp = {:.1} 'C, hum = {:.1} %",
            self.temperature, self.relative_humidity
        )
    }
}
