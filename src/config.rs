use core::time::Duration;

/// How the session keeps the CPU while it waits.
///
/// Every wait is a spin loop. The priority variant additionally asks the
/// platform's [`PriorityElevator`](crate::PriorityElevator) for `level` for
/// the whole session.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollStrategy {
    /// Spin only. Timing accuracy depends on the scheduler leaving us alone.
    Spin,
    /// Spin and request elevated scheduling priority.
    SpinWithPriority {
        /// Requested priority level.
        level: u8,
    },
}

/// Timing parameters of one read session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Time the line is held high before the start signal.
    pub settle: Duration,
    /// Time the line is held low while the scheduler is profiled.
    pub profile_window: Duration,
    /// Gap between polling iterations counted as a scheduler stall.
    pub stall_threshold: Duration,
    /// Shortest stall spacing accepted as one scheduler tick period.
    pub tick_period_min: Duration,
    /// Longest stall spacing accepted as one scheduler tick period.
    pub tick_period_max: Duration,
    /// Delay from the last detected tick to line release.
    pub release_delay: Duration,
    /// Time the line is sampled after release.
    pub capture_window: Duration,
    /// Edge spacing at or above which a bit reads as 1.
    pub bit_threshold: Duration,
    /// Polling strategy.
    pub strategy: PollStrategy,
}

impl Config {
    /// Default timing with elevated priority.
    pub const DEFAULT: Self = Self {
        settle: Duration::from_millis(20),
        profile_window: Duration::from_millis(20),
        stall_threshold: Duration::from_micros(20),
        tick_period_min: Duration::from_millis(9),
        tick_period_max: Duration::from_millis(11),
        release_delay: Duration::from_millis(11),
        capture_window: Duration::from_millis(8),
        bit_threshold: Duration::from_micros(100),
        strategy: PollStrategy::SpinWithPriority { level: 99 },
    };

    /// Default timing for platforms without priority control.
    pub const fn without_priority() -> Self {
        Self {
            strategy: PollStrategy::Spin,
            ..Self::DEFAULT
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}
