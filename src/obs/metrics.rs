// self
use crate::{
	_prelude::*,
	obs::{FlowKind, FlowOutcome, WaitReason},
};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		"reddit_relay_flow_total",
		"flow" => kind.as_str(),
		"outcome" => outcome.as_str()
	)
	.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome);
}

/// Counts one exchange by status class; `0` stands for a transport failure.
pub fn record_response(status: u16) {
	#[cfg(feature = "metrics")]
	metrics::counter!("reddit_relay_response_total", "class" => status_class(status)).increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = status_class(status);
}

/// Records how long a call slept before its next exchange.
pub fn record_wait(reason: WaitReason, duration: Duration) {
	#[cfg(feature = "metrics")]
	metrics::histogram!("reddit_relay_wait_seconds", "reason" => reason.as_str())
		.record(duration.as_seconds_f64().max(0.));
	#[cfg(not(feature = "metrics"))]
	let _ = (reason, duration);
}

fn status_class(status: u16) -> &'static str {
	match status {
		100..=199 => "1xx",
		200..=299 => "2xx",
		300..=399 => "3xx",
		400..=499 => "4xx",
		500..=599 => "5xx",
		_ => "transport",
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn status_classes() {
		assert_eq!(status_class(0), "transport");
		assert_eq!(status_class(204), "2xx");
		assert_eq!(status_class(429), "4xx");
		assert_eq!(status_class(503), "5xx");
	}

	#[test]
	fn recorders_accept_any_input_without_a_recorder() {
		record_flow_outcome(FlowKind::Request, FlowOutcome::Retry);
		record_response(0);
		record_wait(WaitReason::Backoff, Duration::milliseconds(-5));
	}
}
