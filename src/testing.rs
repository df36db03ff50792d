//! Deterministic stand-ins for the clock and the data line.

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorKind, ErrorType, PinState};

use crate::clock::TimeSource;
use crate::line::{DataLine, Direction};

/// Simulated microsecond counter.
///
/// Every read advances time by `step`. With ticks enabled, crossing a
/// multiple of `period` stalls the reader for `stall` more microseconds,
/// like a scheduler interrupt would.
#[derive(Clone)]
pub(crate) struct SimTime {
    now: Rc<Cell<u64>>,
    step: u64,
    tick: Option<(u64, u64)>,
}

impl SimTime {
    pub(crate) fn new(start: u64, step: u64) -> Self {
        SimTime {
            now: Rc::new(Cell::new(start)),
            step,
            tick: None,
        }
    }

    pub(crate) fn with_ticks(mut self, period: u64, stall: u64) -> Self {
        self.tick = Some((period, stall));
        self
    }

    pub(crate) fn get(&self) -> u64 {
        self.now.get()
    }

    pub(crate) fn advance(&self, us: u64) {
        self.now.set(self.now.get() + us);
    }
}

impl TimeSource for SimTime {
    fn now_us(&mut self) -> u64 {
        let prev = self.now.get();
        let mut next = prev + self.step;
        if let Some((period, stall)) = self.tick {
            if next / period > prev / period {
                next += stall;
            }
        }
        self.now.set(next);
        next
    }
}

/// Low intervals `(start, end)`, relative to line release, of a sensor
/// answering with `bytes`.
///
/// The acknowledge pulse starts at `ack_at`; each bit is a 50us low
/// followed by a 26us (0) or 70us (1) high, and a final 50us low ends the
/// frame.
pub(crate) fn waveform(bytes: [u8; 5], ack_at: u64) -> Vec<(u64, u64)> {
    let mut lows = vec![(ack_at, ack_at + 80)];
    let mut t = ack_at + 160;
    for byte in bytes {
        for i in 0..8 {
            lows.push((t, t + 50));
            t += 50 + if (byte >> (7 - i)) & 1 == 1 { 70 } else { 26 };
        }
    }
    lows.push((t, t + 50));
    lows
}

/// Simulated data line with a pull-up and an optional sensor on it.
pub(crate) struct SimLine {
    time: SimTime,
    direction: Direction,
    driven: PinState,
    released_at: Option<u64>,
    lows: Vec<(u64, u64)>,
    pub(crate) history: Vec<(u64, Direction, PinState)>,
}

impl SimLine {
    /// A line with nothing attached.
    pub(crate) fn silent(time: &SimTime) -> Self {
        SimLine {
            time: time.clone(),
            direction: Direction::Input,
            driven: PinState::High,
            released_at: None,
            lows: Vec::new(),
            history: Vec::new(),
        }
    }

    /// A line with a sensor replaying `lows` after every release.
    pub(crate) fn responding(time: &SimTime, lows: Vec<(u64, u64)>) -> Self {
        SimLine {
            lows,
            ..Self::silent(time)
        }
    }

    fn log(&mut self) {
        self.history
            .push((self.time.get(), self.direction, self.driven));
    }
}

impl ErrorType for SimLine {
    type Error = Infallible;
}

impl DataLine for SimLine {
    fn set_direction(&mut self, direction: Direction) -> Result<(), Infallible> {
        self.direction = direction;
        if direction == Direction::Input {
            self.released_at = Some(self.time.get());
        }
        self.log();
        Ok(())
    }

    fn write_level(&mut self, level: PinState) -> Result<(), Infallible> {
        self.driven = level;
        self.log();
        Ok(())
    }

    fn read_level(&mut self) -> Result<PinState, Infallible> {
        if self.direction == Direction::Output {
            return Ok(self.driven);
        }
        let Some(released_at) = self.released_at else {
            return Ok(PinState::High);
        };
        let rel = self.time.get() - released_at;
        let low = self.lows.iter().any(|&(start, end)| start <= rel && rel < end);
        Ok(PinState::from(!low))
    }
}

/// Line whose reads fail once released.
pub(crate) struct FaultyLine {
    pub(crate) direction: Direction,
    pub(crate) driven: PinState,
}

impl FaultyLine {
    pub(crate) fn new() -> Self {
        FaultyLine {
            direction: Direction::Input,
            driven: PinState::High,
        }
    }
}

impl ErrorType for FaultyLine {
    type Error = ErrorKind;
}

impl DataLine for FaultyLine {
    fn set_direction(&mut self, direction: Direction) -> Result<(), ErrorKind> {
        self.direction = direction;
        Ok(())
    }

    fn write_level(&mut self, level: PinState) -> Result<(), ErrorKind> {
        self.driven = level;
        Ok(())
    }

    fn read_level(&mut self) -> Result<PinState, ErrorKind> {
        Err(ErrorKind::Other)
    }
}
