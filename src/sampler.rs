use core::time::Duration;

use embedded_hal::digital::PinState;

use crate::clock::{ElapsedClock, TimeSource};
use crate::edge_log::EdgeLog;
use crate::line::{DataLine, Direction};

/// Releases the line and timestamps every falling edge for `window`.
///
/// Edges past the log's capacity are counted but not stored. The line is
/// driven high again afterwards, even if sampling failed; the first error
/// is the one returned.
pub(crate) fn capture<L, T, const N: usize>(
    line: &mut L,
    clock: &mut ElapsedClock<T>,
    window: Duration,
) -> Result<EdgeLog<N>, L::Error>
where
    L: DataLine,
    T: TimeSource,
{
    let mut edges = EdgeLog::new();
    let sampled = match line.set_direction(Direction::Input) {
        Ok(()) => poll(line, clock, window, &mut edges),
        Err(err) => Err(err),
    };

    let restored = line
        .set_direction(Direction::Output)
        .and_then(|()| line.write_level(PinState::High));

    sampled?;
    restored?;
    Ok(edges)
}

fn poll<L, T, const N: usize>(
    line: &mut L,
    clock: &mut ElapsedClock<T>,
    window: Duration,
    edges: &mut EdgeLog<N>,
) -> Result<(), L::Error>
where
    L: DataLine,
    T: TimeSource,
{
    let window = window.as_secs_f64();
    // a line already low at release is not an edge
    let mut previous = PinState::Low;

    let start = clock.now();
    loop {
        let now = clock.now();
        if now - start >= window {
            return Ok(());
        }
        let level = line.read_level()?;
        if previous == PinState::High && level == PinState::Low {
            edges.record(now);
        }
        previous = level;
    }
}
