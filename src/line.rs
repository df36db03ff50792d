//! Data line abstraction.
//!
//! The session only needs to switch the line between driving and listening,
//! drive a level, and sample the level. [`DataLine`] captures exactly that,
//! and [`OpenDrain`] provides it for any `embedded-hal` pin that is both
//! readable and writable.

use embedded_hal::digital::{ErrorType, InputPin, OutputPin, PinState};

/// Who owns the data line.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// The host drives the line.
    Output,
    /// The line is released to the pull-up and the sensor.
    Input,
}

/// Single-wire data line the session drives and samples.
pub trait DataLine: ErrorType {
    /// Switches line ownership.
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error>;

    /// Drives the line to `level`. Only meaningful in [`Direction::Output`].
    fn write_level(&mut self, level: PinState) -> Result<(), Self::Error>;

    /// Samples the current line level.
    fn read_level(&mut self) -> Result<PinState, Self::Error>;
}

impl<L: DataLine + ?Sized> DataLine for &mut L {
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error> {
        (**self).set_direction(direction)
    }

    fn write_level(&mut self, level: PinState) -> Result<(), Self::Error> {
        (**self).write_level(level)
    }

    fn read_level(&mut self) -> Result<PinState, Self::Error> {
        (**self).read_level()
    }
}

/// [`DataLine`] over an open-drain pin with an external pull-up.
///
/// Releasing the line means driving it high and letting the pull-up (or the
/// sensor) decide the level; there is no separate direction register.
pub struct OpenDrain<PIN> {
    pin: PIN,
}

impl<PIN> OpenDrain<PIN> {
    /// Wraps a pin configured as open-drain input/output.
    pub fn new(pin: PIN) -> Self {
        OpenDrain { pin }
    }

    /// Returns the wrapped pin.
    pub fn into_inner(self) -> PIN {
        self.pin
    }
}

impl<PIN: ErrorType> ErrorType for OpenDrain<PIN> {
    type Error = PIN::Error;
}

impl<PIN, E> DataLine for OpenDrain<PIN>
where
    PIN: InputPin<Error = E> + OutputPin<Error = E>,
    E: embedded_hal::digital::Error,
{
    fn set_direction(&mut self, direction: Direction) -> Result<(), E> {
        match direction {
            // the next write decides the level
            Direction::Output => Ok(()),
            Direction::Input => self.pin.set_high(),
        }
    }

    fn write_level(&mut self, level: PinState) -> Result<(), E> {
        self.pin.set_state(level)
    }

    fn read_level(&mut self) -> Result<PinState, E> {
        Ok(PinState::from(self.pin.is_high()?))
    }
}
