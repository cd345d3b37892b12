use portable_atomic::{AtomicU64, Ordering};

use crate::{
    Error, Result,
    id::{MACHINE_ID_SHIFT, SEQUENCE_MASK, SnowflakeId, TIMESTAMP_MASK, TIMESTAMP_SHIFT},
    time::TimeSource,
};


/// Default number of compare-and-exchange attempts before
/// [`AtomicSnowflakeGenerator::next_id`] falls back to a plain increment.
///
/// One attempt costs on the order of 30ns, so the spin is bounded to a few
/// microseconds.
pub const MAX_CAS_ATTEMPTS: usize = 100;

/// A lock-free Snowflake ID generator.
///
/// The live timestamp and sequence share a single [`AtomicU64`] state word,
/// laid out exactly like a [`SnowflakeId`] with a zeroed machine field. The
/// machine id is fixed at construction and merged into every returned id.
///
/// Each call to [`Self::next_id`] reads the clock, loads the state and picks
/// the next state:
///
/// - the clock moved past the stored timestamp: take the new timestamp with
///   sequence 0
/// - the sequence is exhausted: step the stored timestamp forward one
///   millisecond with sequence 0, even if the wall clock has not caught up
/// - otherwise: increment the sequence
///
/// and publishes it with a compare-and-exchange. A lost race retries from the
/// top, up to the CAS budget ([`MAX_CAS_ATTEMPTS`] by default).
///
/// ## Contention fallback
///
/// When every attempt loses its race the generator gives up on the case
/// analysis and does an unconditional `fetch_add(1)` on the state word, which
/// bounds the time spent in the call. If the sequence is already at its
/// maximum, that increment carries into the machine id bits of the result.
/// This is a known trade-off of bounding tail latency: it only happens under
/// sustained pathological contention, and the next successful CAS restores a
/// well-formed state.
///
/// ## Recommended When
/// - Many threads or tasks share one generator
/// - A call must never block or fail
pub struct AtomicSnowflakeGenerator<T>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<AtomicU64>,
    #[cfg(not(feature = "cache-padded"))]
    state: AtomicU64,
    machine: u64,
    cas_attempts: usize,
    time: T,
}

impl<T> AtomicSnowflakeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a generator for `machine_id` with a zeroed state word.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMachineId`] if `machine_id` is outside
    /// `0..=1023`. This is the only failure: once built, the generator never
    /// fails.
    ///
    /// # Example
    /// ```
    /// use snowman::{AtomicSnowflakeGenerator, WallClock};
    ///
    /// assert!(AtomicSnowflakeGenerator::new(1023, WallClock::default()).is_ok());
    /// assert!(AtomicSnowflakeGenerator::new(1024, WallClock::default()).is_err());
    /// ```
    pub fn new(machine_id: i64, time: T) -> Result<Self> {
        Self::from_components(0, machine_id, 0, time)
    }

    /// Creates a generator whose state word starts at the given timestamp and
    /// sequence instead of zero.
    ///
    /// Useful for resuming from a known point or for pinning the generator
    /// ahead of the clock in tests. Both components are masked to their field
    /// widths.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMachineId`] if `machine_id` is outside
    /// `0..=1023`.
    pub fn from_components(
        timestamp: u64,
        machine_id: i64,
        sequence: u64,
        time: T,
    ) -> Result<Self> {
        let max = SnowflakeId::max_machine_id();
        let machine = u64::try_from(machine_id)
            .ok()
            .filter(|m| *m <= max)
            .ok_or(Error::InvalidMachineId { machine_id, max })?;

        let initial = SnowflakeId::from_components(timestamp, 0, sequence).to_raw();

        Ok(Self {
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(AtomicU64::new(initial)),
            #[cfg(not(feature = "cache-padded"))]
            state: AtomicU64::new(initial),
            machine: machine << MACHINE_ID_SHIFT,
            cas_attempts: MAX_CAS_ATTEMPTS,
            time,
        })
    }

    /// Overrides the compare-and-exchange budget.
    ///
    /// A budget of `0` sends every call straight to the contention fallback.
    #[must_use]
    pub fn with_cas_attempts(mut self, attempts: usize) -> Self {
        self.cas_attempts = attempts;
        self
    }

    /// The machine id merged into every identifier.
    pub const fn machine_id(&self) -> u64 {
        self.machine >> MACHINE_ID_SHIFT
    }

    /// Returns the next identifier.
    ///
    /// Never blocks beyond the bounded CAS spin and never fails. Identifiers
    /// from one generator are unique and, while no call hits the contention
    /// fallback, strictly increasing in issuance order.
    ///
    /// # Example
    /// ```
    /// use snowman::{AtomicSnowflakeGenerator, WallClock};
    ///
    /// let generator = AtomicSnowflakeGenerator::new(7, WallClock::default())?;
    /// let a = generator.next_id();
    /// let b = generator.next_id();
    /// assert!(a < b);
    /// assert_eq!(b.machine_id(), 7);
    /// # Ok::<(), snowman::Error>(())
    /// ```
    pub fn next_id(&self) -> SnowflakeId {
        let state = self.advance().unwrap_or_else(|| self.cold_increment());
        SnowflakeId::from_raw(state | self.machine)
    }

    /// Runs the CAS loop; `None` means every attempt lost its race.
    #[inline]
    fn advance(&self) -> Option<u64> {
        for _ in 0..self.cas_attempts {
            let now = self.time.current_millis() & TIMESTAMP_MASK;

            let current = self.state.load(Ordering::Acquire);
            let current_ts = (current >> TIMESTAMP_SHIFT) & TIMESTAMP_MASK;
            let current_seq = current & SEQUENCE_MASK;

            let next = if now > current_ts {
                now << TIMESTAMP_SHIFT
            } else if current_seq == SEQUENCE_MASK {
                (current_ts + 1) << TIMESTAMP_SHIFT
            } else {
                current + 1
            };

            if self
                .state
                .compare_exchange(current, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Some(next);
            }
        }
        None
    }

    #[cold]
    #[inline(never)]
    fn cold_increment(&self) -> u64 {
        self.state.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
    }
}
