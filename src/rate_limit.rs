//! Client-side sliding-window rate limiter.
//!
//! [`RateLimiter`] remembers when recent calls were admitted and answers two questions for the
//! pipeline: may a call start now, and if not, how long until the oldest entry leaves the
//! window. It never blocks; the caller owns the wait. Every operation takes `now` explicitly so
//! the limiter stays a plain state machine driven by the pipeline's clock.

// std
use std::collections::VecDeque;
// self
use crate::{_prelude::*, config::RateLimitConfig, error::ConfigError};

/// Bounded ring of admission timestamps.
///
/// Entries are kept in insertion (and therefore chronological) order and never exceed
/// `capacity`. Expired entries (`now - t >= window`) are swept lazily, at most once per
/// housekeeping interval, unless the window is full and its oldest entry has already expired;
/// then the sweep runs immediately so a free slot is never reported as taken.
#[derive(Clone, Debug)]
pub struct RateLimiter {
	capacity: usize,
	window: Duration,
	housekeeping: Duration,
	entries: VecDeque<OffsetDateTime>,
	last_sweep: Option<OffsetDateTime>,
}
impl RateLimiter {
	/// Creates a limiter allowing `capacity` admissions per `window`.
	pub fn new(
		capacity: usize,
		window: Duration,
		housekeeping: Duration,
	) -> Result<Self, ConfigError> {
		if capacity == 0 {
			return Err(ConfigError::ZeroRateLimitCapacity);
		}
		if !window.is_positive() {
			return Err(ConfigError::ZeroRateLimitWindow);
		}
		if housekeeping > window {
			return Err(ConfigError::HousekeepingExceedsWindow {
				housekeeping_ms: whole_ms(housekeeping),
				window_ms: whole_ms(window),
			});
		}

		Ok(Self {
			capacity,
			window,
			housekeeping: housekeeping.max(Duration::ZERO),
			entries: VecDeque::with_capacity(capacity),
			last_sweep: None,
		})
	}

	/// Creates a limiter from configuration.
	pub fn from_config(config: &RateLimitConfig) -> Result<Self, ConfigError> {
		Self::new(config.capacity, config.window(), config.housekeeping_interval())
	}

	/// Maximum admissions per window.
	pub fn capacity(&self) -> usize {
		self.capacity
	}

	/// Window length.
	pub fn window(&self) -> Duration {
		self.window
	}

	/// Number of admissions currently tracked (including any not yet swept).
	pub fn tracked(&self) -> usize {
		self.entries.len()
	}

	/// Returns `true` when a call may start at `now` without exceeding the budget.
	pub fn admit(&mut self, now: OffsetDateTime) -> bool {
		self.make_room(now);

		self.entries.len() < self.capacity
	}

	/// Time until the oldest tracked admission leaves the window.
	///
	/// Zero exactly when [`admit`](Self::admit) would succeed; otherwise positive and never longer
	/// than the window.
	pub fn time_until_next_slot(&mut self, now: OffsetDateTime) -> Duration {
		if self.admit(now) {
			return Duration::ZERO;
		}

		let Some(oldest) = self.entries.front() else {
			return Duration::ZERO;
		};
		let elapsed = (now - *oldest).max(Duration::ZERO);

		if elapsed >= self.window { Duration::ZERO } else { self.window - elapsed }
	}

	/// Records an admission at `now`; silently ignored when the window is already full.
	pub fn record_admission(&mut self, now: OffsetDateTime) {
		self.make_room(now);

		if self.entries.len() < self.capacity {
			self.entries.push_back(now);
		}
	}

	fn make_room(&mut self, now: OffsetDateTime) {
		let due = self.last_sweep.is_none_or(|last| now - last >= self.housekeeping);
		let full_but_stale = self.entries.len() >= self.capacity
			&& self.entries.front().is_some_and(|oldest| now - *oldest >= self.window);

		if due || full_but_stale {
			self.sweep(now);
		}
	}

	fn sweep(&mut self, now: OffsetDateTime) {
		self.last_sweep = Some(now);

		let before = self.entries.len();

		while let Some(oldest) = self.entries.front() {
			if now - *oldest >= self.window {
				self.entries.pop_front();
			} else {
				break;
			}
		}

		#[cfg(feature = "tracing")]
		if before != self.entries.len() {
			tracing::trace!(
				swept = before - self.entries.len(),
				remaining = self.entries.len(),
				"Swept expired rate-limit entries."
			);
		}
		#[cfg(not(feature = "tracing"))]
		let _ = before;
	}
}

fn whole_ms(duration: Duration) -> u64 {
	u64::try_from(duration.whole_milliseconds()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::*;

	const T0: OffsetDateTime = datetime!(2025-03-01 12:00 UTC);

	fn limiter(capacity: usize) -> RateLimiter {
		RateLimiter::new(capacity, Duration::seconds(60), Duration::seconds(1))
			.expect("Limiter fixture should be valid.")
	}

	#[test]
	fn rejects_degenerate_parameters() {
		assert!(matches!(
			RateLimiter::new(0, Duration::seconds(60), Duration::seconds(1)),
			Err(ConfigError::ZeroRateLimitCapacity)
		));
		assert!(matches!(
			RateLimiter::new(5, Duration::ZERO, Duration::seconds(1)),
			Err(ConfigError::ZeroRateLimitWindow)
		));
	}

	#[test]
	fn blocks_after_capacity_until_oldest_ages_out() {
		let mut limiter = limiter(3);

		for offset in 0..3 {
			let now = T0 + Duration::seconds(offset);

			assert!(limiter.admit(now));

			limiter.record_admission(now);
		}

		assert!(!limiter.admit(T0 + Duration::seconds(3)));
		assert!(!limiter.admit(T0 + Duration::seconds(59)));
		assert!(
			limiter.admit(T0 + Duration::seconds(60)),
			"Oldest entry leaves at exactly one window."
		);
		assert_eq!(limiter.tracked(), 2);
	}

	#[test]
	fn wait_time_counts_down_from_oldest_entry() {
		let mut limiter = limiter(2);

		limiter.record_admission(T0 + Duration::seconds(10));
		limiter.record_admission(T0 + Duration::seconds(20));

		assert_eq!(limiter.time_until_next_slot(T0 + Duration::seconds(50)), Duration::seconds(20));
		assert_eq!(limiter.time_until_next_slot(T0 + Duration::seconds(70)), Duration::ZERO);
	}

	#[test]
	fn wait_time_is_zero_when_admitting_and_bounded_by_window() {
		let mut limiter = limiter(1);

		assert_eq!(limiter.time_until_next_slot(T0), Duration::ZERO);

		limiter.record_admission(T0);

		for offset in 0..60 {
			let wait = limiter.time_until_next_slot(T0 + Duration::seconds(offset));

			assert!(wait <= limiter.window());
			assert!(wait.is_positive());
		}
	}

	#[test]
	fn full_window_ignores_extra_admissions() {
		let mut limiter = limiter(2);

		for _ in 0..5 {
			limiter.record_admission(T0);
		}

		assert_eq!(limiter.tracked(), 2);
	}

	#[test]
	fn rejects_housekeeping_longer_than_window() {
		assert!(matches!(
			RateLimiter::new(5, Duration::seconds(10), Duration::seconds(11)),
			Err(ConfigError::HousekeepingExceedsWindow {
				housekeeping_ms: 11_000,
				window_ms: 10_000,
			})
		));
	}

	#[test]
	fn sweeps_at_most_once_per_housekeeping_interval() {
		let mut limiter = limiter(3);

		limiter.record_admission(T0);
		limiter.record_admission(T0 + Duration::milliseconds(59_500));

		// The first entry expired at +60s, but the last sweep happened 600 ms ago.
		assert!(limiter.admit(T0 + Duration::milliseconds(60_100)));
		assert_eq!(limiter.tracked(), 2);
		assert!(limiter.admit(T0 + Duration::milliseconds(60_600)));
		assert_eq!(limiter.tracked(), 1);
	}

	#[test]
	fn full_window_sweeps_as_soon_as_the_oldest_entry_expires() {
		let mut limiter = limiter(1);

		limiter.record_admission(T0);

		assert!(!limiter.admit(T0 + Duration::milliseconds(59_500)));
		assert_eq!(
			limiter.time_until_next_slot(T0 + Duration::milliseconds(59_500)),
			Duration::milliseconds(500)
		);

		let freed = T0 + Duration::milliseconds(60_100);

		assert!(limiter.admit(freed), "An expired entry must not hold the only slot.");

		limiter.record_admission(freed);

		assert_eq!(limiter.tracked(), 1);

		let next = T0 + Duration::milliseconds(60_500);

		assert!(!limiter.admit(next));
		assert_eq!(limiter.time_until_next_slot(next), Duration::milliseconds(59_600));
	}
}
