// Copyright 2026 the Paperstack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic host time used to drive tweens, staggers, and image timeouts.
//!
//! [`HostTime`] is a point in time expressed in monotonic ticks. The viewer
//! never reads a clock itself: hosts pass `now` into
//! [`PaperViewer::tick`](crate::viewer::PaperViewer::tick) once per animation
//! frame. Ticks are nanoseconds unless the host says otherwise through a
//! [`Timebase`], which diagnostics use to convert ticks to wall units.
//!
//! [`Duration`] uses the same tick units. All tick/nanosecond conversion goes
//! through `u128` intermediates to avoid overflow.

use core::fmt;
use core::ops::Add;

/// A point in time expressed as monotonic ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// Raw ticks.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Creates a host time from milliseconds on a nanosecond timebase.
    #[inline]
    #[must_use]
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms.saturating_mul(1_000_000))
    }

    /// Time elapsed since `earlier`; zero when `earlier` has not happened yet.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for HostTime {
    type Output = Self;

    /// Saturates at the far future rather than wrapping.
    fn add(self, rhs: Duration) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTime({})", self.0)
    }
}

/// Ticks-to-nanoseconds ratio for hosts whose clock is not in nanoseconds.
///
/// Only diagnostics convert; the viewer itself compares raw ticks.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timebase {
    /// Nanoseconds per `denom` ticks.
    pub numer: u32,
    /// Tick count the ratio is expressed over. Never zero.
    pub denom: u32,
}

impl Timebase {
    /// Ticks are nanoseconds.
    pub const NANOS: Self = Self { numer: 1, denom: 1 };

    /// `numer / denom` nanoseconds per tick.
    ///
    /// # Panics
    ///
    /// Panics if `denom` is zero.
    #[inline]
    #[must_use]
    pub const fn new(numer: u32, denom: u32) -> Self {
        assert!(denom != 0, "timebase denominator must not be zero");
        Self { numer, denom }
    }

    /// Converts a tick count to nanoseconds, saturating at `u64::MAX`.
    #[must_use]
    #[expect(clippy::cast_possible_truncation, reason = "range checked first")]
    pub const fn ticks_to_nanos(self, ticks: u64) -> u64 {
        let wide = ticks as u128 * self.numer as u128 / self.denom as u128;
        if wide > u64::MAX as u128 {
            u64::MAX
        } else {
            wide as u64
        }
    }
}

impl fmt::Debug for Timebase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timebase({}/{})", self.numer, self.denom)
    }
}

/// A duration in host-time ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// No time at all.
    pub const ZERO: Self = Self(0);

    /// Creates a duration from milliseconds on a nanosecond timebase.
    #[inline]
    #[must_use]
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms.saturating_mul(1_000_000))
    }

    /// Returns the raw tick value.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Multiplies the duration by an integer, saturating on overflow.
    #[inline]
    #[must_use]
    pub const fn saturating_mul(self, n: u64) -> Self {
        Self(self.0.saturating_mul(n))
    }

    /// Returns `elapsed / self` clamped to `0.0..=1.0`.
    ///
    /// A zero-length duration is always complete.
    #[inline]
    #[must_use]
    pub fn progress(self, elapsed: Self) -> f64 {
        if self.0 == 0 {
            return 1.0;
        }
        (elapsed.0 as f64 / self.0 as f64).clamp(0.0, 1.0)
    }
}

impl Add for Duration {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_are_nanosecond_ticks() {
        assert_eq!(Duration::from_millis(650).ticks(), 650_000_000);
        assert_eq!(HostTime::from_millis(2).ticks(), 2_000_000);
    }

    #[test]
    fn progress_is_clamped() {
        let d = Duration::from_millis(100);
        assert_eq!(d.progress(Duration::ZERO), 0.0);
        assert_eq!(d.progress(Duration::from_millis(50)), 0.5);
        assert_eq!(d.progress(Duration::from_millis(500)), 1.0);
        assert_eq!(Duration::ZERO.progress(Duration::ZERO), 1.0);
    }

    #[test]
    fn host_time_duration_ops() {
        let t = HostTime(1000);
        let d = Duration(200);
        assert_eq!((t + d).ticks(), 1200);
        assert_eq!(t.saturating_duration_since(HostTime(400)), Duration(600));
        assert_eq!(t.saturating_duration_since(HostTime(1500)), Duration::ZERO);
        assert_eq!(HostTime(u64::MAX) + d, HostTime(u64::MAX), "saturates");
    }

    #[test]
    fn timebase_conversion() {
        let micros = Timebase::new(1000, 1);
        assert_eq!(micros.ticks_to_nanos(16_000), 16_000_000, "16 ms of microsecond ticks");
        assert_eq!(Timebase::NANOS.ticks_to_nanos(42), 42);
        assert_eq!(micros.ticks_to_nanos(u64::MAX), u64::MAX, "saturates");
    }
}
