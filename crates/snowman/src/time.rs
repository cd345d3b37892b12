use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Snowman epoch: Sunday, April 9, 2017 00:00:00 UTC
pub const SNOWMAN_EPOCH: Duration = Duration::from_millis(1_491_696_000_000);

/// A source of millisecond timestamps relative to some epoch.
///
/// The generator reads the clock once per attempt. Production code uses
/// [`WallClock`]; tests plug in fixed or scripted clocks.
///
/// ```
/// use snowman::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// assert_eq!(FixedTime.current_millis(), 1234);
/// ```
pub trait TimeSource {
    /// Milliseconds elapsed since the source's epoch.
    fn current_millis(&self) -> u64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

/// Wall-clock time source offset by a fixed epoch.
///
/// Every call reads [`SystemTime::now`]. A system clock set before the epoch
/// (or before 1970) is not an error: the subtraction wraps, and the
/// generator keeps only the low 42 bits of whatever comes out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WallClock {
    epoch_millis: u64,
}

impl Default for WallClock {
    fn default() -> Self {
        Self::with_epoch(SNOWMAN_EPOCH)
    }
}

impl WallClock {
    /// Creates a clock whose zero point is `epoch`, given as a duration since
    /// 1970-01-01 UTC.
    #[must_use]
    pub const fn with_epoch(epoch: Duration) -> Self {
        Self {
            epoch_millis: epoch.as_millis() as u64,
        }
    }

    #[must_use]
    pub const fn epoch(&self) -> Duration {
        Duration::from_millis(self.epoch_millis)
    }
}

impl TimeSource for WallClock {
    fn current_millis(&self) -> u64 {
        let unix_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64);
        unix_millis.wrapping_sub(self.epoch_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_clock_is_relative_to_epoch() {
        let clock = WallClock::default();
        let unix_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        let since_epoch = clock.current_millis();

        let expected = unix_millis - 1_491_696_000_000;
        assert!(since_epoch >= expected);
        assert!(since_epoch - expected < 1_000);
    }

    #[test]
    fn wall_clock_with_unix_epoch_matches_system_time() {
        let clock = WallClock::with_epoch(Duration::ZERO);
        let before = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        let now = clock.current_millis();
        assert!(now >= before);
    }

    #[test]
    fn epoch_in_the_future_wraps() {
        let clock = WallClock::with_epoch(Duration::from_millis(u64::MAX / 2));
        // Wrapped, not saturated at zero.
        assert!(clock.current_millis() > u64::MAX / 2);
    }
}
