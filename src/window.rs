//! Release timing.
//!
//! A non-realtime host preempts the polling loop whenever its periodic
//! scheduler interrupt fires. While the start signal holds the line low,
//! the loop timestamps every iteration gap longer than
//! [`Config::stall_threshold`]; two stalls one tick period apart reveal the
//! tick phase, and the line is released just after the following tick so
//! the capture window runs between interrupts.
//!
//! This is a best-effort heuristic. When no tick pattern shows up the line
//! is released immediately and the read proceeds with whatever jitter the
//! scheduler adds.

use embedded_hal::digital::PinState;

use crate::clock::{ElapsedClock, TimeSource, Timestamp};
use crate::config::Config;
use crate::edge_log::EdgeLog;
use crate::line::{DataLine, Direction};

/// Stalls recorded while profiling.
pub const STALL_CAPACITY: usize = 20;

/// Stall timestamps of one profiling window.
pub type StallLog = EdgeLog<STALL_CAPACITY>;

/// Finds the first pair of stalls one tick period apart.
///
/// Pairs are scanned with the earlier stall in the outer loop, so the
/// earliest qualifying pair wins. Returns `(earlier, later)`.
pub fn find_tick_pair(stalls: &[Timestamp], config: &Config) -> Option<(Timestamp, Timestamp)> {
    let min = config.tick_period_min.as_secs_f64();
    let max = config.tick_period_max.as_secs_f64();

    stalls.iter().enumerate().find_map(|(j, &earlier)| {
        stalls[j + 1..]
            .iter()
            .find(|&&later| (min..=max).contains(&(later - earlier)))
            .map(|&later| (earlier, later))
    })
}

/// Instant to release the line at, or [`Timestamp::ZERO`] to release
/// immediately when no tick pattern was found.
pub fn release_target(stalls: &[Timestamp], config: &Config) -> Timestamp {
    find_tick_pair(stalls, config)
        .map(|(_, later)| later + config.release_delay)
        .unwrap_or(Timestamp::ZERO)
}

/// Holds the line high for [`Config::settle`], then pulls it low and
/// records scheduler stalls for [`Config::profile_window`].
///
/// The line is left driven low.
pub(crate) fn profile<L, T>(
    line: &mut L,
    clock: &mut ElapsedClock<T>,
    config: &Config,
) -> Result<StallLog, L::Error>
where
    L: DataLine,
    T: TimeSource,
{
    line.set_direction(Direction::Output)?;
    line.write_level(PinState::High)?;
    // keep the CPU busy so the scheduler sees a compute-bound task
    let _ = clock.spin_for(config.settle);

    // start signal
    line.write_level(PinState::Low)?;

    let window = config.profile_window.as_secs_f64();
    let threshold = config.stall_threshold.as_secs_f64();
    let mut stalls = StallLog::new();

    let start = clock.now();
    let mut last = start;
    loop {
        let now = clock.now();
        if now - start >= window {
            break;
        }
        if now - last > threshold {
            stalls.record(now);
        }
        last = now;
    }

    Ok(stalls)
}

/// Profiles the scheduler and busy-waits until the chosen release instant.
///
/// Returns the instant waited for, or `None` when the line should be
/// released right away.
pub(crate) fn synchronize<L, T>(
    line: &mut L,
    clock: &mut ElapsedClock<T>,
    config: &Config,
) -> Result<Option<Timestamp>, L::Error>
where
    L: DataLine,
    T: TimeSource,
{
    let stalls = profile(line, clock, config)?;

    let target = find_tick_pair(stalls.timestamps(), config)
        .map(|(_, later)| later + config.release_delay);

    match target {
        Some(target) => {
            let _ = clock.spin_until(target);
        }
        None => {
            #[cfg(feature = "defmt")]
            defmt::debug!(
                "no scheduler tick pattern in {} stalls, releasing now",
                stalls.count()
            );
        }
    }

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{SimLine, SimTime};

    fn ms(values: &[f64]) -> Vec<Timestamp> {
        values
            .iter()
            .map(|v| Timestamp::from_secs(v / 1000.0))
            .collect()
    }

    fn close(a: Timestamp, b: f64) -> bool {
        (a.as_secs() - b).abs() < 1e-9
    }

    #[test]
    fn test_tick_pair_among_unrelated_stalls() {
        let stalls = ms(&[0.7, 3.2, 14.9, 24.9, 27.0]);

        let target = release_target(&stalls, &Config::default());
        assert!(close(target, 0.0359));
    }

    #[test]
    fn test_no_tick_pair_releases_immediately() {
        let stalls = ms(&[1.0, 3.0, 5.0, 20.0, 32.0]);

        assert_eq!(find_tick_pair(&stalls, &Config::default()), None);
        assert_eq!(release_target(&stalls, &Config::default()), Timestamp::ZERO);
        assert_eq!(release_target(&[], &Config::default()), Timestamp::ZERO);
    }

    #[test]
    fn test_first_pair_in_scan_order_wins() {
        let stalls = ms(&[2.0, 5.0, 12.5, 15.5, 22.5]);

        let (earlier, later) = find_tick_pair(&stalls, &Config::default()).unwrap();
        assert!(close(earlier, 0.002));
        assert!(close(later, 0.0125));
    }

    #[test]
    fn test_period_band_edges() {
        let config = Config::default();

        assert!(find_tick_pair(&ms(&[1.0, 10.5]), &config).is_some());
        assert!(find_tick_pair(&ms(&[1.0, 9.9]), &config).is_none());
        assert!(find_tick_pair(&ms(&[1.0, 12.5]), &config).is_none());
    }

    #[test]
    fn test_profile_records_ticks_while_low() {
        let time = SimTime::new(3_000, 1).with_ticks(10_000, 50);
        let mut line = SimLine::silent(&time);
        let mut clock = ElapsedClock::new(time.clone());
        clock.reset();

        let stalls = profile(&mut line, &mut clock, &Config::default()).unwrap();

        // ticks at 30ms and 40ms land inside the low window
        assert_eq!(stalls.count(), 2);
        let [first, second] = [stalls.timestamps()[0], stalls.timestamps()[1]];
        assert!((second - first - 0.010).abs() < 1e-9);
        assert!(first.as_secs() > 0.020);

        let levels: Vec<_> = line.history.iter().map(|&(_, _, level)| level).collect();
        assert_eq!(levels.last(), Some(&PinState::Low));
        assert!(line.history.iter().all(|&(_, d, _)| d == Direction::Output));
    }

    #[test]
    fn test_synchronize_waits_for_release_target() {
        let time = SimTime::new(3_000, 1).with_ticks(10_000, 50);
        let mut line = SimLine::silent(&time);
        let mut clock = ElapsedClock::new(time.clone());
        clock.reset();

        let target = synchronize(&mut line, &mut clock, &Config::default())
            .unwrap()
            .unwrap();

        // second stall lands at 40_050us absolute, epoch is 3_001us
        assert!(close(target, 0.037_049 + 0.011));
        assert!(clock.now() >= target);
    }

    #[test]
    fn test_synchronize_without_ticks() {
        let time = SimTime::new(0, 1);
        let mut line = SimLine::silent(&time);
        let mut clock = ElapsedClock::new(time.clone());
        clock.reset();

        let target = synchronize(&mut line, &mut clock, &Config::default()).unwrap();

        assert_eq!(target, None);
        // settle and profile only
        assert!(clock.now().as_secs() < 0.041);
    }
}
