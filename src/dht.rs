use crate::clock::{ElapsedClock, TimeSource, Timestamp};
use crate::config::{Config, PollStrategy};
use crate::edge_log::{EDGE_CAPACITY, EdgeLog};
use crate::error::DhtError;
use crate::frame::ByteFrame;
use crate::line::DataLine;
use crate::priority::{Elevated, NoElevation, PriorityElevator};
use crate::reading::{DeviceClass, Reading};
use crate::{sampler, window};

/// Anything that produces temperature and humidity readings.
pub trait Sensor {
    /// Why a read failed.
    type Error;

    /// Takes one reading.
    fn read(&mut self) -> Result<Reading, Self::Error>;
}

/// Driver for DHT11/DHT22 sensors on a busy-polled data line.
///
/// `N` is the number of edge timestamps kept per session.
pub struct Dht<LINE, T, P = NoElevation, const N: usize = EDGE_CAPACITY> {
    line: LINE,
    clock: ElapsedClock<T>,
    priority: P,
    class: DeviceClass,
    config: Config,
    release_target: Option<Timestamp>,
}

impl<LINE, T> Dht<LINE, T>
where
    LINE: DataLine,
    T: TimeSource,
{
    /// Creates a driver for a platform without priority control.
    ///
    /// # Arguments
    ///
    /// * `line` - The data line the sensor is connected to.
    /// * `time` - Monotonic microsecond counter.
    /// * `class` - Which sensor family is attached.
    pub fn new(line: LINE, time: T, class: DeviceClass) -> Self {
        Self::with_priority(line, time, NoElevation, class).with_config(Config::without_priority())
    }
}

impl<LINE, T, P, const N: usize> Dht<LINE, T, P, N>
where
    LINE: DataLine,
    T: TimeSource,
    P: PriorityElevator,
{
    /// Creates a driver that elevates scheduling priority while reading.
    pub fn with_priority(line: LINE, time: T, priority: P, class: DeviceClass) -> Self {
        Dht {
            line,
            clock: ElapsedClock::new(time),
            priority,
            class,
            config: Config::DEFAULT,
            release_target: None,
        }
    }

    /// Replaces the timing configuration.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// The timing configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Release instant chosen by the last session, relative to that
    /// session's start. `None` if the line was released without
    /// synchronization or no session ran yet.
    pub fn release_target(&self) -> Option<Timestamp> {
        self.release_target
    }

    /// Reads a temperature and humidity measurement.
    ///
    /// One call is one complete session: the line is held high, the start
    /// signal is sent while the host scheduler is profiled, the line is
    /// released just after a scheduler tick when one could be located, the
    /// sensor's edges are captured for a fixed window, and the frame is
    /// decoded, checked and scaled. Nothing carries over between calls.
    ///
    /// The sensor needs about two seconds between reads.
    ///
    /// # Returns
    ///
    /// * `Ok(Reading)` if the frame was complete and its checksum valid.
    /// * `Err(DhtError)` on a wrong edge count, a checksum mismatch or a pin failure.
    pub fn read(&mut self) -> Result<Reading, DhtError<LINE::Error, N>> {
        let edges = self.acquire()?;

        let frame = ByteFrame::decode(&edges, self.config.bit_threshold).map_err(|err| {
            #[cfg(feature = "defmt")]
            defmt::warn!("DHT frame rejected: {}", err);
            DhtError::from_frame(err)
        })?;

        Ok(Reading::from_frame(frame, self.class))
    }

    /// Runs the timing-critical part of a session and returns the raw edges.
    fn acquire(&mut self) -> Result<EdgeLog<N>, LINE::Error> {
        self.clock.reset();
        self.release_target = None;

        let _elevated = match self.config.strategy {
            PollStrategy::Spin => None,
            PollStrategy::SpinWithPriority { level } => {
                let (guard, _granted) = Elevated::acquire(&mut self.priority, level);
                #[cfg(feature = "defmt")]
                if !_granted {
                    defmt::debug!("priority {} refused, timing may suffer", level);
                }
                Some(guard)
            }
        };

        self.release_target = window::synchronize(&mut self.line, &mut self.clock, &self.config)?;
        sampler::capture(&mut self.line, &mut self.clock, self.config.capture_window)
    }

    /// Releases the line, the time source and the priority elevator.
    pub fn free(self) -> (LINE, T, P) {
        (self.line, self.clock.into_inner(), self.priority)
    }
}

impl<LINE, T, P, const N: usize> Sensor for Dht<LINE, T, P, N>
where
    LINE: DataLine,
    T: TimeSource,
    P: PriorityElevator,
{
    type Error = DhtError<LINE::Error, N>;

    fn read(&mut self) -> Result<Reading, Self::Error> {
        Dht::read(self)
    }
}
