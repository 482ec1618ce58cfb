//! Bounded retry loop with exponential backoff.

// self
use crate::{
	_prelude::*,
	clock::Clock,
	config::RequestConfig,
	error::TransportError,
	http::HttpResponse,
	obs::{self, FlowKind, FlowOutcome, WaitReason},
	pipeline::ResponseOutcome,
};

/// Retry budget and backoff curve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
	max_retries: u32,
	base_delay: Duration,
	max_delay: Duration,
}
impl RetryPolicy {
	/// Creates a policy; negative delays are treated as zero and the cap never drops below the
	/// base.
	pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
		let base_delay = base_delay.max(Duration::ZERO);

		Self { max_retries, base_delay, max_delay: max_delay.max(base_delay) }
	}

	/// Creates a policy from configuration.
	pub fn from_config(config: &RequestConfig) -> Self {
		Self::new(config.max_retries, config.retry_base_delay(), config.retry_max_delay())
	}

	/// Extra attempts after the first one.
	pub fn max_retries(&self) -> u32 {
		self.max_retries
	}

	/// Total attempts including the first one.
	pub fn max_attempts(&self) -> u32 {
		self.max_retries.saturating_add(1)
	}

	/// Backoff before attempt `attempt`: `min(cap, base * 2^attempt)`, saturating at the cap.
	pub fn backoff(&self, attempt: u32) -> Duration {
		let cap = self.max_delay.whole_milliseconds();
		let scaled = 1_i128
			.checked_shl(attempt)
			.filter(|factor| *factor > 0)
			.and_then(|factor| self.base_delay.whole_milliseconds().checked_mul(factor))
			.unwrap_or(cap);

		Duration::milliseconds(i64::try_from(scaled.min(cap)).unwrap_or(i64::MAX))
	}

	/// Drives `attempt` until it succeeds, hits a non-retryable failure, or runs out of budget.
	///
	/// Attempt 0 runs immediately; attempt `k > 0` first sleeps [`backoff(k)`](Self::backoff). A
	/// 429 with a `Retry-After` hint additionally sleeps the hint before the next attempt. When
	/// the budget is exhausted the last outcome is returned unchanged.
	pub async fn run<F, Fut>(&self, clock: &dyn Clock, mut attempt: F) -> RetryReport
	where
		F: FnMut(u32) -> Fut,
		Fut: Future<Output = Result<HttpResponse, TransportError>>,
	{
		let mut outcome = ResponseOutcome::not_attempted();

		for k in 0..=self.max_retries {
			if k > 0 {
				let delay = self.backoff(k);

				obs::record_flow_outcome(FlowKind::Request, FlowOutcome::Retry);
				obs::note_wait(WaitReason::Backoff, delay);
				clock.sleep(delay).await;
			}

			outcome = ResponseOutcome::from_exchange(attempt(k).await, clock.now());

			obs::record_response(outcome.status());

			if !outcome.should_retry() {
				return RetryReport { outcome, attempts: k + 1 };
			}
			if k < self.max_retries
				&& let Some(hint) = outcome.retry_after()
			{
				obs::note_wait(WaitReason::RetryAfter, hint);
				clock.sleep(hint).await;
			}
		}

		RetryReport { outcome, attempts: self.max_attempts() }
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self::from_config(&RequestConfig::default())
	}
}

/// Final outcome of a retry loop plus the number of attempts it took.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryReport {
	/// Last observed outcome.
	pub outcome: ResponseOutcome,
	/// Attempts made, at least one.
	pub attempts: u32,
}
