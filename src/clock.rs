//! Time source and sleeper behind every suspension point of the pipeline.
//!
//! [`SystemClock`] reads the UTC wall clock and sleeps on tokio timers. [`ManualClock`] never
//! blocks: each sleep is recorded and advances the clock by the requested amount, which keeps
//! rate-limit and backoff behavior deterministic in simulations and tests.

// self
use crate::_prelude::*;

/// Boxed future returned by [`Clock::sleep`].
pub type SleepFuture<'a> = Pin<Box<dyn Future<Output = ()> + 'a + Send>>;

/// Source of "now" plus the ability to wait.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Returns the current instant.
	fn now(&self) -> OffsetDateTime;

	/// Suspends the caller for `duration`; non-positive durations resolve immediately.
	fn sleep(&self, duration: Duration) -> SleepFuture<'_>;
}

/// Wall clock backed by [`OffsetDateTime::now_utc`] and [`tokio::time::sleep`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}

	fn sleep(&self, duration: Duration) -> SleepFuture<'_> {
		Box::pin(async move {
			if duration.is_positive() {
				tokio::time::sleep(duration.unsigned_abs()).await;
			}
		})
	}
}

/// Clock that only moves when told to or when something sleeps on it.
#[derive(Debug)]
pub struct ManualClock {
	now: Mutex<OffsetDateTime>,
	sleeps: Mutex<Vec<Duration>>,
}
impl ManualClock {
	/// Creates a clock frozen at `start`.
	pub fn new(start: OffsetDateTime) -> Self {
		Self { now: Mutex::new(start), sleeps: Mutex::default() }
	}

	/// Moves the clock forward.
	pub fn advance(&self, by: Duration) {
		*self.now.lock() += by;
	}

	/// Returns every sleep requested so far, in order.
	pub fn sleeps(&self) -> Vec<Duration> {
		self.sleeps.lock().clone()
	}

	/// Sum of all requested sleeps.
	pub fn slept(&self) -> Duration {
		self.sleeps.lock().iter().fold(Duration::ZERO, |acc, d| acc + *d)
	}
}
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		*self.now.lock()
	}

	fn sleep(&self, duration: Duration) -> SleepFuture<'_> {
		self.sleeps.lock().push(duration);

		if duration.is_positive() {
			self.advance(duration);
		}

		Box::pin(async {})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::*;

	#[tokio::test]
	async fn manual_clock_advances_on_sleep() {
		let clock = ManualClock::new(datetime!(2025-01-01 00:00 UTC));

		clock.sleep(Duration::seconds(5)).await;
		clock.sleep(Duration::milliseconds(250)).await;

		assert_eq!(clock.now(), datetime!(2025-01-01 00:00:05.25 UTC));
		assert_eq!(clock.sleeps(), vec![Duration::seconds(5), Duration::milliseconds(250)]);
		assert_eq!(clock.slept(), Duration::milliseconds(5_250));
	}

	#[tokio::test]
	async fn system_clock_ignores_negative_sleep() {
		SystemClock.sleep(Duration::seconds(-3)).await;
		SystemClock.sleep(Duration::ZERO).await;
	}
}
