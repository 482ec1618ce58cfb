//! Optional observability helpers for request, authentication, and revocation flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `reddit_relay.flow` with the `flow` and
//!   `stage` (call site) fields, API calls additionally carrying `method` and `path`, plus a
//!   debug event for every suspension ([`WaitReason`]).
//! - Enable `metrics` to record:
//!   - `reddit_relay_flow_total{flow, outcome}` for every attempt/retry/success/failure,
//!   - `reddit_relay_response_total{class}` per exchange (`2xx`..`5xx`, or `transport`),
//!   - `reddit_relay_wait_seconds{reason}` for rate-limit, backoff, and `Retry-After` sleeps.

mod metrics;
mod tracing;

pub use self::metrics::*;
pub use self::tracing::*;

// self
use crate::_prelude::*;

/// Flow kinds observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// API call through the request pipeline.
	Request,
	/// Initial or explicit token grant.
	Authenticate,
	/// Token refresh triggered by the gatekeeper.
	Refresh,
	/// Token revocation.
	Revoke,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Request => "request",
			FlowKind::Authenticate => "authenticate",
			FlowKind::Refresh => "refresh",
			FlowKind::Revoke => "revoke",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a flow.
	Attempt,
	/// Another attempt after a retryable failure.
	Retry,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Retry => "retry",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Why a call was suspended before its next exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WaitReason {
	/// The sliding window was full.
	RateLimit,
	/// Exponential backoff between attempts.
	Backoff,
	/// Reddit answered 429 with a `Retry-After` hint.
	RetryAfter,
}
impl WaitReason {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			WaitReason::RateLimit => "rate_limit",
			WaitReason::Backoff => "backoff",
			WaitReason::RetryAfter => "retry_after",
		}
	}
}
impl Display for WaitReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Logs and records a suspension of `duration` before the next exchange.
pub fn note_wait(reason: WaitReason, duration: Duration) {
	#[cfg(feature = "tracing")]
	::tracing::debug!(
		reason = reason.as_str(),
		wait_ms = duration.whole_milliseconds().max(0) as u64,
		"Delaying Reddit request."
	);

	record_wait(reason, duration);
}
