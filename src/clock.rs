use core::ops::{Add, Sub};
use core::time::Duration;

/// Seconds elapsed since the epoch of the [`ElapsedClock`] that produced it.
///
/// Only meaningful within one session: every [`ElapsedClock::reset`]
/// starts a new epoch.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Timestamp(f64);

impl Timestamp {
    /// The epoch itself.
    pub const ZERO: Self = Timestamp(0.0);

    /// Creates a timestamp from seconds since the epoch.
    pub const fn from_secs(secs: f64) -> Self {
        Timestamp(secs)
    }

    /// Creates a timestamp from microseconds since the epoch.
    pub fn from_micros(us: u64) -> Self {
        Timestamp(us as f64 * 1e-6)
    }

    /// Seconds since the epoch.
    pub const fn as_secs(self) -> f64 {
        self.0
    }
}

/// Difference in seconds.
impl Sub for Timestamp {
    type Output = f64;

    fn sub(self, rhs: Self) -> f64 {
        self.0 - rhs.0
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp(self.0 + rhs.as_secs_f64())
    }
}

/// Raw monotonic counter with microsecond resolution.
///
/// The counter's origin is arbitrary; [`ElapsedClock`] turns it into
/// session-relative [`Timestamp`]s.
pub trait TimeSource {
    /// Current counter value in microseconds.
    fn now_us(&mut self) -> u64;
}

impl<T: TimeSource + ?Sized> TimeSource for &mut T {
    fn now_us(&mut self) -> u64 {
        (**self).now_us()
    }
}

/// [`TimeSource`] backed by [`std::time::Instant`].
#[cfg(feature = "std")]
#[derive(Clone, Copy, Debug)]
pub struct StdTimeSource {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdTimeSource {
    /// Starts counting from now.
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for StdTimeSource {
    fn now_us(&mut self) -> u64 {
        u64::try_from(self.origin.elapsed().as_micros()).unwrap_or(u64::MAX)
    }
}

/// Monotonic clock reporting seconds since an explicitly reset epoch.
///
/// If [`now`](Self::now) is called before any [`reset`](Self::reset), the
/// first call captures the epoch.
pub struct ElapsedClock<T> {
    source: T,
    epoch: Option<u64>,
}

impl<T: TimeSource> ElapsedClock<T> {
    /// Wraps a time source. The epoch is captured lazily.
    pub fn new(source: T) -> Self {
        ElapsedClock {
            source,
            epoch: None,
        }
    }

    /// Starts a new epoch at the current instant.
    pub fn reset(&mut self) {
        self.epoch = Some(self.source.now_us());
    }

    /// Time elapsed since the epoch.
    pub fn now(&mut self) -> Timestamp {
        let now = self.source.now_us();
        let epoch = *self.epoch.get_or_insert(now);
        Timestamp::from_micros(now.saturating_sub(epoch))
    }

    /// Busy-waits until the clock reaches `target`.
    ///
    /// Returns immediately if `target` already passed. Never yields: the
    /// loop is meant to keep the CPU busy.
    pub fn spin_until(&mut self, target: Timestamp) -> Timestamp {
        loop {
            let now = self.now();
            if now >= target {
                return now;
            }
            core::hint::spin_loop();
        }
    }

    /// Busy-waits for at least `duration`, measured from the call.
    pub fn spin_for(&mut self, duration: Duration) -> Timestamp {
        let target = self.now() + duration;
        self.spin_until(target)
    }

    /// Returns the underlying time source.
    pub fn into_inner(self) -> T {
        self.source
    }
}
