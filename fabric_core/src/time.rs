// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic timestamps for transaction telemetry.
//!
//! [`HostTime`] is a point on a monotonic clock expressed in nanoseconds since
//! the clock's origin. [`Duration`] is a span in the same unit. Timestamps
//! come from a [`Clock`]: [`MonotonicClock`] reads `std::time::Instant`, and
//! [`ManualClock`] is advanced explicitly by tests and simulations.

use core::fmt;
use core::ops::{Add, Sub};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// A point in time, in nanoseconds since the owning clock's origin.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// Returns the raw nanosecond value.
    #[inline]
    #[must_use]
    pub const fn nanos(self) -> u64 {
        self.0
    }

    /// Returns the value in (fractional) microseconds.
    #[inline]
    #[must_use]
    pub fn micros_f64(self) -> f64 {
        self.0 as f64 / 1_000.0
    }

    /// Returns the duration between `self` and an earlier time, or zero if
    /// `earlier` is after `self`.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for HostTime {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for HostTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Self) -> Duration {
        Duration(self.0 - rhs.0)
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTime({}ns)", self.0)
    }
}

/// A span of time in nanoseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// The zero-length duration.
    pub const ZERO: Self = Self(0);

    /// Creates a duration from whole microseconds.
    #[inline]
    #[must_use]
    pub const fn from_micros(us: u64) -> Self {
        Self(us * 1_000)
    }

    /// Returns the raw nanosecond value.
    #[inline]
    #[must_use]
    pub const fn nanos(self) -> u64 {
        self.0
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
        write!(f, "Duration({}ns)", self.0)
    }
}

/// Source of [`HostTime`] stamps.
///
/// Shared between the command thread and mounting threads, so it must be
/// `Send + Sync`.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current time.
    fn now(&self) -> HostTime;
}

/// A [`Clock`] backed by [`std::time::Instant`].
#[derive(Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Creates a clock whose origin is the moment of construction.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> HostTime {
        let elapsed = self.origin.elapsed().as_nanos();
        HostTime(u64::try_from(elapsed).unwrap_or(u64::MAX))
    }
}

/// A [`Clock`] that only moves when told to.
///
/// Every call to [`now`](Clock::now) also advances the clock by the
/// configured step, so successive phase stamps are distinct.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
    step: u64,
}

impl ManualClock {
    /// Creates a clock at `start` that advances by `step` on every read.
    #[must_use]
    pub const fn new(start: HostTime, step: Duration) -> Self {
        Self {
            now: AtomicU64::new(start.0),
            step: step.0,
        }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.0, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> HostTime {
        HostTime(self.now.fetch_add(self.step, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturating_duration_is_zero_when_reversed() {
        let early = HostTime(100);
        let late = HostTime(250);
        assert_eq!(late.saturating_duration_since(early), Duration(150));
        assert_eq!(early.saturating_duration_since(late), Duration::ZERO);
    }

    #[test]
    fn manual_clock_steps_on_each_read() {
        let clock = ManualClock::new(HostTime(1_000), Duration(10));
        assert_eq!(clock.now(), HostTime(1_000));
        assert_eq!(clock.now(), HostTime(1_010));
        clock.advance(Duration::from_micros(1));
        assert_eq!(clock.now(), HostTime(2_020));
    }

    #[test]
    fn monotonic_clock_never_goes_backwards() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a, "monotonic clock went backwards");
    }
}
