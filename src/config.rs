//! Client configuration: credentials, retry and timeout knobs, rate-limit window, and endpoints.
//!
//! Every section deserializes with serde and falls back to Reddit's documented defaults for
//! missing fields. [`RedditConfig::builder`] assembles and validates a configuration in code,
//! while [`AuthConfig::from_env`] reads credentials from `REDDIT_*` environment variables.

// self
use crate::{_prelude::*, auth::Secret, error::ConfigError};

/// User agent sent when the configuration leaves it unset.
pub const DEFAULT_USER_AGENT: &str =
	concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Complete client configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditConfig {
	/// OAuth credentials and identity.
	pub auth: AuthConfig,
	/// Retry and timeout behavior.
	pub request: RequestConfig,
	/// Client-side sliding window.
	pub rate_limit: RateLimitConfig,
	/// Reddit endpoints; override to target a proxy or a mock server.
	pub endpoints: Endpoints,
}
impl RedditConfig {
	/// Returns a builder seeded with `auth` and defaults for everything else.
	pub fn builder(auth: AuthConfig) -> RedditConfigBuilder {
		RedditConfigBuilder::new(auth)
	}

	/// Checks cross-field invariants.
	pub fn validate(&self) -> Result<(), ConfigError> {
		self.request.validate()?;
		self.rate_limit.validate()?;

		if self.auth.user_agent().trim().is_empty() {
			return Err(ConfigError::EmptyUserAgent);
		}

		Ok(())
	}
}

/// Builder for [`RedditConfig`].
#[derive(Clone, Debug)]
pub struct RedditConfigBuilder {
	config: RedditConfig,
}
impl RedditConfigBuilder {
	fn new(auth: AuthConfig) -> Self {
		Self { config: RedditConfig { auth, ..Default::default() } }
	}

	/// Replaces the retry and timeout section.
	pub fn request(mut self, request: RequestConfig) -> Self {
		self.config.request = request;

		self
	}

	/// Replaces the rate-limit section.
	pub fn rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
		self.config.rate_limit = rate_limit;

		self
	}

	/// Replaces all endpoints.
	pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
		self.config.endpoints = endpoints;

		self
	}

	/// Points the API base and both OAuth endpoints at one origin, keeping Reddit's paths.
	pub fn origin(mut self, origin: &str) -> Result<Self, ConfigError> {
		self.config.endpoints = Endpoints::at_origin(origin)?;

		Ok(self)
	}

	/// Validates and returns the configuration.
	pub fn build(self) -> Result<RedditConfig, ConfigError> {
		self.config.validate()?;

		Ok(self.config)
	}
}

/// OAuth credentials for a Reddit "script" application.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
	/// Application client id.
	pub client_id: String,
	/// Application client secret.
	pub client_secret: Option<Secret>,
	/// Reddit account name used by the password grant.
	pub username: Option<String>,
	/// Reddit account password used by the password grant.
	pub password: Option<Secret>,
	/// User-Agent header; Reddit throttles generic agents aggressively.
	pub user_agent: Option<String>,
	/// Use application-only credentials instead of the password grant.
	pub read_only: bool,
}
impl AuthConfig {
	/// Creates credentials for the password grant.
	pub fn script(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		username: impl Into<String>,
		password: impl Into<String>,
	) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: Some(Secret::new(client_secret)),
			username: Some(username.into()),
			password: Some(Secret::new(password)),
			user_agent: None,
			read_only: false,
		}
	}

	/// Creates application-only credentials.
	pub fn read_only(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: Some(Secret::new(client_secret)),
			read_only: true,
			..Default::default()
		}
	}

	/// Overrides the User-Agent header.
	pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());

		self
	}

	/// Returns the configured User-Agent or [`DEFAULT_USER_AGENT`].
	pub fn user_agent(&self) -> &str {
		self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
	}

	/// Loads credentials from `REDDIT_CLIENT_ID`, `REDDIT_CLIENT_SECRET`, `REDDIT_USERNAME`,
	/// `REDDIT_PASSWORD`, `REDDIT_USER_AGENT`, and `REDDIT_READ_ONLY`.
	///
	/// Only the client id is mandatory here; grant-specific requirements are checked when
	/// authenticating.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> Result<Self, ConfigError> {
		let non_empty = |name| lookup(name).filter(|value: &String| !value.trim().is_empty());
		let client_id = non_empty("REDDIT_CLIENT_ID")
			.ok_or(ConfigError::MissingEnv { name: "REDDIT_CLIENT_ID" })?;
		let read_only = match non_empty("REDDIT_READ_ONLY") {
			None => false,
			Some(value) => parse_flag(&value)
				.ok_or(ConfigError::InvalidEnv { name: "REDDIT_READ_ONLY", value })?,
		};

		Ok(Self {
			client_id,
			client_secret: non_empty("REDDIT_CLIENT_SECRET").map(Secret::new),
			username: non_empty("REDDIT_USERNAME"),
			password: non_empty("REDDIT_PASSWORD").map(Secret::new),
			user_agent: non_empty("REDDIT_USER_AGENT"),
			read_only,
		})
	}
}

/// Retry and timeout behavior of the request pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
	/// Extra attempts after the first one.
	pub max_retries: u32,
	/// Delay unit for exponential backoff.
	pub retry_base_delay_ms: u64,
	/// Upper bound for a single backoff sleep.
	pub retry_max_delay_ms: u64,
	/// TCP/TLS connect timeout.
	pub connect_timeout_ms: u64,
	/// Whole-exchange timeout.
	pub request_timeout_ms: u64,
}
impl RequestConfig {
	/// Returns the base backoff delay.
	pub fn retry_base_delay(&self) -> Duration {
		millis(self.retry_base_delay_ms)
	}

	/// Returns the backoff cap.
	pub fn retry_max_delay(&self) -> Duration {
		millis(self.retry_max_delay_ms)
	}

	/// Returns the connect timeout.
	pub fn connect_timeout(&self) -> Duration {
		millis(self.connect_timeout_ms)
	}

	/// Returns the request timeout.
	pub fn request_timeout(&self) -> Duration {
		millis(self.request_timeout_ms)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.retry_max_delay_ms < self.retry_base_delay_ms {
			return Err(ConfigError::RetryCapBelowBase {
				base_ms: self.retry_base_delay_ms,
				cap_ms: self.retry_max_delay_ms,
			});
		}

		Ok(())
	}
}
impl Default for RequestConfig {
	fn default() -> Self {
		Self {
			max_retries: 3,
			retry_base_delay_ms: 1_000,
			retry_max_delay_ms: 30_000,
			connect_timeout_ms: 10_000,
			request_timeout_ms: 30_000,
		}
	}
}

/// Client-side sliding window applied before every call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
	/// Requests allowed per window.
	pub capacity: usize,
	/// Window length.
	pub window_ms: u64,
	/// Minimum spacing between expired-entry sweeps.
	pub housekeeping_interval_ms: u64,
}
impl RateLimitConfig {
	/// Returns the window length.
	pub fn window(&self) -> Duration {
		millis(self.window_ms)
	}

	/// Returns the sweep interval.
	pub fn housekeeping_interval(&self) -> Duration {
		millis(self.housekeeping_interval_ms)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.capacity == 0 {
			return Err(ConfigError::ZeroRateLimitCapacity);
		}
		if self.window_ms == 0 {
			return Err(ConfigError::ZeroRateLimitWindow);
		}
		if self.housekeeping_interval_ms > self.window_ms {
			return Err(ConfigError::HousekeepingExceedsWindow {
				housekeeping_ms: self.housekeeping_interval_ms,
				window_ms: self.window_ms,
			});
		}

		Ok(())
	}
}
impl Default for RateLimitConfig {
	fn default() -> Self {
		Self { capacity: 60, window_ms: 60_000, housekeeping_interval_ms: 1_000 }
	}
}

/// Reddit endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
	/// OAuth API base; request targets are appended to it.
	pub api_base: Url,
	/// Token endpoint.
	pub token: Url,
	/// Token revocation endpoint.
	pub revoke: Url,
}
impl Endpoints {
	/// Builds endpoints that share one origin, e.g. a local mock server.
	pub fn at_origin(origin: &str) -> Result<Self, ConfigError> {
		let base = Url::parse(origin)
			.map_err(|source| ConfigError::InvalidUrl { field: "api_base", source })?;
		let token = base
			.join("/api/v1/access_token")
			.map_err(|source| ConfigError::InvalidUrl { field: "token", source })?;
		let revoke = base
			.join("/api/v1/revoke_token")
			.map_err(|source| ConfigError::InvalidUrl { field: "revoke", source })?;

		Ok(Self { api_base: base, token, revoke })
	}

	/// Joins the API base with an absolute request target.
	pub(crate) fn api_url(&self, target: &str) -> String {
		format!("{}{target}", self.api_base.as_str().trim_end_matches('/'))
	}
}
impl Default for Endpoints {
	fn default() -> Self {
		Self {
			api_base: reddit_url("https://oauth.reddit.com"),
			token: reddit_url("https://www.reddit.com/api/v1/access_token"),
			revoke: reddit_url("https://www.reddit.com/api/v1/revoke_token"),
		}
	}
}

fn reddit_url(raw: &'static str) -> Url {
	// Literal URLs above are well formed; parsing cannot fail.
	Url::parse(raw).unwrap_or_else(|_| unreachable!("static Reddit URL `{raw}` must parse"))
}

fn millis(ms: u64) -> Duration {
	Duration::milliseconds(i64::try_from(ms).unwrap_or(i64::MAX))
}

fn parse_flag(value: &str) -> Option<bool> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Some(true),
		"0" | "false" | "no" | "off" => Some(false),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn env(pairs: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
		let owned: Vec<(&'static str, String)> =
			pairs.iter().map(|(key, value)| (*key, (*value).to_owned())).collect();

		move |name| owned.iter().find(|(key, _)| *key == name).map(|(_, value)| value.clone())
	}

	#[test]
	fn defaults_match_reddit_guidance() {
		let config = RedditConfig::default();

		assert_eq!(config.request.max_retries, 3);
		assert_eq!(config.request.retry_base_delay(), Duration::seconds(1));
		assert_eq!(config.request.retry_max_delay(), Duration::seconds(30));
		assert_eq!(config.request.connect_timeout(), Duration::seconds(10));
		assert_eq!(config.request.request_timeout(), Duration::seconds(30));
		assert_eq!(config.rate_limit.capacity, 60);
		assert_eq!(config.rate_limit.window(), Duration::minutes(1));
		assert_eq!(config.endpoints.api_base.as_str(), "https://oauth.reddit.com/");
		assert_eq!(config.auth.user_agent(), DEFAULT_USER_AGENT);
	}

	#[test]
	fn builder_rejects_zero_capacity_and_inverted_backoff() {
		let auth = AuthConfig::read_only("id", "secret");
		let zero = RedditConfig::builder(auth.clone())
			.rate_limit(RateLimitConfig { capacity: 0, ..Default::default() })
			.build();

		assert!(matches!(zero, Err(ConfigError::ZeroRateLimitCapacity)));

		let inverted = RedditConfig::builder(auth.clone())
			.request(RequestConfig {
				retry_base_delay_ms: 5_000,
				retry_max_delay_ms: 1_000,
				..Default::default()
			})
			.build();

		assert!(matches!(
			inverted,
			Err(ConfigError::RetryCapBelowBase { base_ms: 5_000, cap_ms: 1_000 })
		));

		let blank_agent = RedditConfig::builder(auth.with_user_agent("  ")).build();

		assert!(matches!(blank_agent, Err(ConfigError::EmptyUserAgent)));
	}

	#[test]
	fn builder_rejects_housekeeping_longer_than_window() {
		let stretched = RedditConfig::builder(AuthConfig::read_only("id", "secret"))
			.rate_limit(RateLimitConfig {
				window_ms: 10_000,
				housekeeping_interval_ms: 10_001,
				..Default::default()
			})
			.build();

		assert!(matches!(
			stretched,
			Err(ConfigError::HousekeepingExceedsWindow {
				housekeeping_ms: 10_001,
				window_ms: 10_000,
			})
		));

		let equal = RedditConfig::builder(AuthConfig::read_only("id", "secret"))
			.rate_limit(RateLimitConfig {
				window_ms: 10_000,
				housekeeping_interval_ms: 10_000,
				..Default::default()
			})
			.build();

		assert!(equal.is_ok(), "A sweep interval equal to the window is allowed.");
	}

	#[test]
	fn origin_keeps_reddit_paths() {
		let config = RedditConfig::builder(AuthConfig::read_only("id", "secret"))
			.origin("http://127.0.0.1:8080")
			.expect("Local origin should parse.")
			.build()
			.expect("Config with local origin should validate.");

		assert_eq!(config.endpoints.token.as_str(), "http://127.0.0.1:8080/api/v1/access_token");
		assert_eq!(config.endpoints.revoke.as_str(), "http://127.0.0.1:8080/api/v1/revoke_token");
		assert_eq!(config.endpoints.api_url("/r/rust/hot"), "http://127.0.0.1:8080/r/rust/hot");
	}

	#[test]
	fn deserializes_partial_documents_with_defaults() {
		let config: RedditConfig = serde_json::from_str(
			r#"{"auth":{"client_id":"abc","client_secret":"shh","read_only":true},"request":{"max_retries":0}}"#,
		)
		.expect("Partial configuration should deserialize.");

		assert_eq!(config.auth.client_id, "abc");
		assert!(config.auth.read_only);
		assert_eq!(config.request.max_retries, 0);
		assert_eq!(config.request.retry_base_delay_ms, 1_000);
		assert_eq!(config.rate_limit, RateLimitConfig::default());
		assert!(!format!("{:?}", config.auth).contains("shh"));
	}

	#[test]
	fn env_lookup_requires_client_id_and_parses_flags() {
		assert!(matches!(
			AuthConfig::from_lookup(env(&[])),
			Err(ConfigError::MissingEnv { name: "REDDIT_CLIENT_ID" })
		));
		assert!(matches!(
			AuthConfig::from_lookup(env(&[
				("REDDIT_CLIENT_ID", "abc"),
				("REDDIT_READ_ONLY", "maybe"),
			])),
			Err(ConfigError::InvalidEnv { name: "REDDIT_READ_ONLY", .. })
		));

		let auth = AuthConfig::from_lookup(env(&[
			("REDDIT_CLIENT_ID", "abc"),
			("REDDIT_CLIENT_SECRET", "shh"),
			("REDDIT_USERNAME", "relay_bot"),
			("REDDIT_PASSWORD", "hunter2"),
			("REDDIT_USER_AGENT", "relay-test/1.0"),
			("REDDIT_READ_ONLY", "no"),
		]))
		.expect("Complete environment should load.");

		assert_eq!(auth.username.as_deref(), Some("relay_bot"));
		assert_eq!(auth.password.as_ref().map(Secret::expose), Some("hunter2"));
		assert_eq!(auth.user_agent(), "relay-test/1.0");
		assert!(!auth.read_only);
	}
}
