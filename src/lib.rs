//! Rate-limited, retrying Reddit API client: OAuth2 script and app-only credentials, token
//! gatekeeping, and typed listings in one crate built for small devices.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod gatekeeper;
pub mod http;
pub mod models;
pub mod obs;
pub mod pipeline;
pub mod rate_limit;
pub mod reddit;
pub mod retry;
#[cfg(test)]
pub(crate) mod _preludet {
	//! Scripted collaborators shared by unit tests.

	pub use time::macros::datetime;

	pub use crate::_prelude::*;

	// std
	use std::collections::VecDeque;
	// self
	use crate::{
		auth::{CredentialFuture, CredentialProvider, Token},
		clock::ManualClock,
		error::{AuthError, TransportError},
		http::{HttpResponse, Transport, TransportFuture, TransportRequest},
	};

	pub(crate) fn test_clock() -> Arc<ManualClock> {
		Arc::new(ManualClock::new(datetime!(2025-03-01 12:00 UTC)))
	}

	pub(crate) fn status(code: u16) -> Result<HttpResponse, TransportError> {
		Ok(HttpResponse::new(code, ""))
	}

	pub(crate) fn json(code: u16, body: &str) -> Result<HttpResponse, TransportError> {
		Ok(HttpResponse::new(code, body).with_header("content-type", "application/json"))
	}

	pub(crate) fn connection_refused() -> Result<HttpResponse, TransportError> {
		Err(TransportError::Io(std::io::Error::new(
			std::io::ErrorKind::ConnectionRefused,
			"connection refused",
		)))
	}

	/// Replays queued responses in order and records every request it receives.
	#[derive(Default)]
	pub(crate) struct ScriptedTransport {
		responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
		requests: Mutex<Vec<TransportRequest>>,
	}
	impl ScriptedTransport {
		pub(crate) fn new(
			responses: impl IntoIterator<Item = Result<HttpResponse, TransportError>>,
		) -> Self {
			Self {
				responses: Mutex::new(responses.into_iter().collect()),
				requests: Mutex::default(),
			}
		}

		pub(crate) fn requests(&self) -> Vec<TransportRequest> {
			self.requests.lock().clone()
		}

		pub(crate) fn calls(&self) -> usize {
			self.requests.lock().len()
		}
	}
	impl Transport for ScriptedTransport {
		fn exchange(&self, request: TransportRequest) -> TransportFuture<'_> {
			self.requests.lock().push(request);

			let next = self.responses.lock().pop_front().unwrap_or_else(|| status(500));

			Box::pin(async move { next })
		}
	}

	/// Credential provider whose refresh results are queued up front.
	pub(crate) struct QueuedCredentials {
		current: RwLock<Token>,
		refreshes: Mutex<VecDeque<Result<Token, AuthError>>>,
		refresh_calls: Mutex<usize>,
	}
	impl QueuedCredentials {
		pub(crate) fn new(
			current: Token,
			refreshes: impl IntoIterator<Item = Result<Token, AuthError>>,
		) -> Self {
			Self {
				current: RwLock::new(current),
				refreshes: Mutex::new(refreshes.into_iter().collect()),
				refresh_calls: Mutex::new(0),
			}
		}

		pub(crate) fn refresh_calls(&self) -> usize {
			*self.refresh_calls.lock()
		}
	}
	impl CredentialProvider for QueuedCredentials {
		fn current_token(&self) -> Token {
			self.current.read().clone()
		}

		fn refresh(&self) -> CredentialFuture<'_> {
			*self.refresh_calls.lock() += 1;

			let next = self
				.refreshes
				.lock()
				.pop_front()
				.unwrap_or(Err(AuthError::MissingCredentials {
					grant: "password",
					missing: "a queued token",
				}));

			match &next {
				Ok(token) => *self.current.write() = token.clone(),
				Err(_) => *self.current.write() = Token::invalid(),
			}

			Box::pin(async move { next })
		}
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;

pub use crate::{
	config::RedditConfig,
	pipeline::{RequestDescriptor, ResponseOutcome},
	reddit::Reddit,
};
#[cfg(feature = "reqwest")] pub use crate::reddit::ReqwestReddit;
#[cfg(test)] use {color_eyre as _, httpmock as _};
