//! Error types shared by the request pipeline, the authenticator, and the domain layer.

// self
use crate::{
	_prelude::*,
	auth::TokenBuilderError,
	models::{IdentifierError, Kind},
};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) type BoxError = Box<dyn StdError + Send + Sync>;

/// Canonical error exposed by the domain-level APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Credential acquisition or revocation failed.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// A name or identifier failed validation.
	#[error(transparent)]
	Identifier(#[from] IdentifierError),
	/// The request pipeline returned a failed outcome.
	#[error("Reddit request failed with status {status}.")]
	Request {
		/// HTTP status of the final attempt, or 0 when no exchange happened.
		status: u16,
		/// Raw body of the final response, usually Reddit's JSON error envelope.
		body: String,
		/// Classified failure.
		#[source]
		failure: RequestFailure,
	},
	/// A response body could not be mapped onto the expected shape.
	#[error("Response body could not be parsed at `{}`.", .source.path())]
	Parse {
		/// Structured parsing failure including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// The response carried an object of a different kind than requested.
	#[error("Expected a `{expected}` object but received `{actual}`.")]
	UnexpectedKind {
		/// Kind the caller asked for.
		expected: Kind,
		/// Kind tag found in the payload.
		actual: String,
	},
	/// Reddit returned no object for the requested fullname.
	#[error("No object exists for `{fullname}`.")]
	NotFound {
		/// Fullname that was looked up.
		fullname: String,
	},
	/// The operation needs an authenticated user context.
	#[error("Client is not authenticated.")]
	NotAuthenticated,
	/// The operation needs a user context but the client runs in read-only mode.
	#[error("Operation is unavailable in read-only mode.")]
	ReadOnly,
	/// Caller-supplied input was rejected before any request was made.
	#[error("Invalid input: {reason}.")]
	InvalidInput {
		/// Human-readable reason.
		reason: String,
	},
}
impl From<serde_path_to_error::Error<serde_json::Error>> for Error {
	fn from(source: serde_path_to_error::Error<serde_json::Error>) -> Self {
		Self::Parse { source }
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Rate limiter capacity must be positive.
	#[error("Rate limit capacity must be greater than zero.")]
	ZeroRateLimitCapacity,
	/// Rate limiter window must be positive.
	#[error("Rate limit window must be greater than zero.")]
	ZeroRateLimitWindow,
	/// Housekeeping sweeps are spaced further apart than the window they maintain.
	#[error(
		"Housekeeping interval ({housekeeping_ms} ms) exceeds the rate limit window ({window_ms} ms)."
	)]
	HousekeepingExceedsWindow {
		/// Configured housekeeping interval in milliseconds.
		housekeeping_ms: u64,
		/// Configured window in milliseconds.
		window_ms: u64,
	},
	/// Backoff cap is smaller than the base delay.
	#[error("Retry cap ({cap_ms} ms) must not be smaller than the base delay ({base_ms} ms).")]
	RetryCapBelowBase {
		/// Configured base delay in milliseconds.
		base_ms: u64,
		/// Configured cap in milliseconds.
		cap_ms: u64,
	},
	/// User-Agent header value is blank.
	#[error("User agent must not be empty.")]
	EmptyUserAgent,
	/// Required environment variable is unset.
	#[error("Environment variable `{name}` is not set.")]
	MissingEnv {
		/// Variable name.
		name: &'static str,
	},
	/// Environment variable holds an unusable value.
	#[error("Environment variable `{name}` has an invalid value: `{value}`.")]
	InvalidEnv {
		/// Variable name.
		name: &'static str,
		/// Raw value found in the environment.
		value: String,
	},
	/// Endpoint URL cannot be parsed.
	#[error("The {field} endpoint is not a valid URL.")]
	InvalidUrl {
		/// Configuration field holding the URL.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Token acquisition, refresh, and revocation failures.
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// Configuration lacks a credential the grant needs.
	#[error("The {grant} grant requires {missing}.")]
	MissingCredentials {
		/// Grant label.
		grant: &'static str,
		/// Missing credential description.
		missing: &'static str,
	},
	/// Reddit rejected the grant (wrong password, suspended account).
	#[error("Reddit rejected the grant: {reason}.")]
	InvalidGrant {
		/// Reddit-supplied reason string.
		reason: String,
	},
	/// Client authentication failed or the app credentials are malformed.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Reddit-supplied reason string.
		reason: String,
	},
	/// Token endpoint returned an unexpected response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with JSON that does not describe a token.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Transport failure while talking to the token or revocation endpoint.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Token builder validation failed.
	#[error("Unable to build token.")]
	Token(#[from] TokenBuilderError),
	/// Token endpoint response omitted `expires_in`.
	#[error("Token endpoint response is missing expires_in.")]
	MissingExpiresIn,
	/// Token endpoint returned an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Token endpoint returned a non-positive duration.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
	/// Token endpoint URL was rejected by the OAuth client.
	#[error("Token endpoint URL is invalid.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Revocation endpoint answered with an unexpected status.
	#[error("Token revocation failed with status {status}.")]
	RevocationFailed {
		/// HTTP status code returned by the endpoint.
		status: u16,
	},
	/// There is no valid token to revoke.
	#[error("No access token is available to revoke.")]
	NoToken,
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling Reddit.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling Reddit.")]
	Io(#[from] std::io::Error),
	/// Request or response could not be translated between HTTP representations.
	#[error("HTTP exchange could not be translated: {message}.")]
	Protocol {
		/// Description of the translation failure.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Creates a translation failure.
	pub fn protocol(message: impl Into<String>) -> Self {
		Self::Protocol { message: message.into() }
	}

	/// Renders the error and its immediate source on one line.
	pub fn describe(&self) -> String {
		match self.source() {
			Some(source) => format!("{self} {source}"),
			None => self.to_string(),
		}
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Classified failure carried by a failed [`ResponseOutcome`](crate::pipeline::ResponseOutcome).
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RequestFailure {
	/// The exchange never produced an HTTP response.
	#[error("Transport failure: {message}")]
	Transport {
		/// Rendered transport error.
		message: String,
	},
	/// Reddit answered 401; the token may be expired or revoked.
	#[error("Unauthorized - token may be expired.")]
	Unauthorized,
	/// Reddit answered 429 on the final attempt.
	#[error("Rate limited by Reddit.")]
	RateLimited {
		/// Wait hint from the last response, if any.
		retry_after: Option<Duration>,
	},
	/// Any other non-2xx status.
	#[error("Reddit responded with HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
	},
	/// The token was expired and could not be refreshed; no call was made.
	#[error("Failed to refresh token: {reason}")]
	RefreshFailed {
		/// Rendered refresh error.
		reason: String,
	},
	/// The request target is not an absolute path; no call was made.
	#[error("Request target `{target}` must start with `/`.")]
	InvalidTarget {
		/// Offending target.
		target: String,
	},
}
impl RequestFailure {
	/// Returns `true` when another attempt could change the result.
	pub fn is_retryable(&self) -> bool {
		matches!(self, Self::Transport { .. } | Self::RateLimited { .. } | Self::Status { .. })
	}
}
