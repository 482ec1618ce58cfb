// self
use crate::{_prelude::*, http::HttpMethod, obs::FlowKind};

/// Instrumented future when tracing is enabled, the bare future otherwise.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Instrumented future when tracing is enabled, the bare future otherwise.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// Span wrapper shared by API calls and token flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a span for a token flow at `stage`.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			Self { span: tracing::info_span!("reddit_relay.flow", flow = kind.as_str(), stage) }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Creates a span for one API call; the query string never reaches the span.
	pub fn request(method: HttpMethod, target: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			Self {
				span: tracing::info_span!(
					"reddit_relay.flow",
					flow = FlowKind::Request.as_str(),
					stage = "execute",
					method = method.as_str(),
					path = target,
				),
			}
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (method, target);

			Self {}
		}
	}

	/// Runs `fut` inside the span without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn request_span_passes_output_through() {
		let span = FlowSpan::request(HttpMethod::Get, "/r/rust/hot");
		let value = span.instrument(async { "listing" }).await;

		assert_eq!(value, "listing");
	}

	#[tokio::test]
	async fn flow_span_passes_errors_through() {
		let span = FlowSpan::new(FlowKind::Refresh, "gatekeeper");
		let value: Result<(), &str> = span.instrument(async { Err("refresh failed") }).await;

		assert_eq!(value, Err("refresh failed"));
	}
}
