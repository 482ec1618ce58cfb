//! Token gatekeeper sitting in front of the request pipeline.
//!
//! Before each call the gatekeeper mirrors the provider's token into the pipeline. An expired
//! token is refreshed first, and the triggering call waits for it. Callers that race on the same
//! expired token share one refresh because the token is re-checked under the refresh guard.

// self
use crate::{
	_prelude::*,
	auth::{CredentialProvider, Token},
	clock::Clock,
	error::RequestFailure,
	http::Transport,
	pipeline::{RequestDescriptor, RequestPipeline, ResponseOutcome},
};

/// Refreshes expired tokens before delegating to a [`RequestPipeline`].
pub struct TokenGatekeeper<T, P>
where
	T: ?Sized + Transport,
	P: ?Sized + CredentialProvider,
{
	pipeline: Arc<RequestPipeline<T>>,
	provider: Arc<P>,
	clock: Arc<dyn Clock>,
	refresh_guard: AsyncMutex<()>,
}
impl<T, P> TokenGatekeeper<T, P>
where
	T: ?Sized + Transport,
	P: ?Sized + CredentialProvider,
{
	/// Wires a pipeline to the credential provider that feeds it.
	pub fn new(pipeline: Arc<RequestPipeline<T>>, provider: Arc<P>, clock: Arc<dyn Clock>) -> Self {
		Self { pipeline, provider, clock, refresh_guard: AsyncMutex::new(()) }
	}

	/// Underlying pipeline.
	pub fn pipeline(&self) -> &Arc<RequestPipeline<T>> {
		&self.pipeline
	}

	/// Credential provider consulted before every call.
	pub fn provider(&self) -> &Arc<P> {
		&self.provider
	}

	/// Propagates `token` to the pipeline's authorization header.
	pub fn install(&self, token: &Token) {
		self.pipeline.install_token(token);
	}

	/// Executes `request`, refreshing the token first when it has expired.
	///
	/// A failed refresh yields a [`RequestFailure::RefreshFailed`] outcome with status `0` and
	/// the transport is never touched. A token that was never established is not refreshed; the
	/// call goes out without an `Authorization` header.
	pub async fn execute(&self, request: &RequestDescriptor) -> ResponseOutcome {
		if let Err(failure) = self.ensure_token().await {
			return ResponseOutcome::failed(0, "", failure);
		}

		self.pipeline.execute(request).await
	}

	async fn ensure_token(&self) -> Result<(), RequestFailure> {
		let token = self.provider.current_token();

		if !token.valid || !token.is_expired_at(self.clock.now()) {
			self.install(&token);

			return Ok(());
		}

		let _guard = self.refresh_guard.lock().await;
		let token = self.provider.current_token();

		if token.is_usable_at(self.clock.now()) {
			self.install(&token);

			return Ok(());
		}

		#[cfg(feature = "tracing")]
		tracing::debug!("Access token expired; refreshing before the request.");

		match self.provider.refresh().await {
			Ok(token) => {
				self.install(&token);

				Ok(())
			},
			Err(e) => {
				self.pipeline.set_access_token(None);

				#[cfg(feature = "tracing")]
				tracing::warn!(error = %e, "Token refresh failed; request was not sent.");

				Err(RequestFailure::RefreshFailed { reason: e.to_string() })
			},
		}
	}
}
impl<T, P> Debug for TokenGatekeeper<T, P>
where
	T: ?Sized + Transport,
	P: ?Sized + CredentialProvider,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenGatekeeper").field("pipeline", &self.pipeline).finish_non_exhaustive()
	}
}
