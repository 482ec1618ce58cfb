//! Access token value, lifecycle helpers, and builder.

// self
use crate::{_prelude::*, auth::Secret};

/// Safety margin subtracted from the server-declared lifetime.
pub const EXPIRY_MARGIN: Duration = Duration::seconds(60);

/// Lifecycle status of a [`Token`] at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// No token was ever issued, or it was invalidated.
	Invalid,
	/// Token may be sent.
	Active,
	/// Token passed its expiry instant.
	Expired,
}

/// Errors produced by [`TokenBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TokenBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when no expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
}

/// Bearer token issued by Reddit's token endpoint.
///
/// Tokens are never patched in place: a refresh, failure, or revocation swaps in a new value,
/// [`Token::invalid`] when no usable token remains.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
	/// Access token secret; callers must avoid logging it.
	pub access_token: Secret,
	/// Token kind, `bearer` for Reddit.
	pub token_type: String,
	/// Space-delimited scopes granted, `*` for script apps.
	pub scope: String,
	/// Instant after which the token must not be sent, margin already applied.
	pub expires_at: OffsetDateTime,
	/// Whether the token was ever successfully established.
	pub valid: bool,
}
impl Token {
	/// Returns a builder.
	pub fn builder() -> TokenBuilder {
		TokenBuilder::default()
	}

	/// Returns the placeholder held before authentication or after a failure.
	pub fn invalid() -> Self {
		Self {
			access_token: Secret::new(""),
			token_type: String::new(),
			scope: String::new(),
			expires_at: OffsetDateTime::UNIX_EPOCH,
			valid: false,
		}
	}

	/// Computes the lifecycle status at `instant`.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		if !self.valid {
			return TokenStatus::Invalid;
		}
		if self.is_expired_at(instant) {
			return TokenStatus::Expired;
		}

		TokenStatus::Active
	}

	/// Expired means strictly past the expiry instant; `instant == expires_at` is still usable.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant > self.expires_at
	}

	/// Returns `true` when the token is valid and not expired at `instant`.
	pub fn is_usable_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), TokenStatus::Active)
	}

	/// Remaining lifetime at `instant`, clamped at zero.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		(self.expires_at - instant).max(Duration::ZERO)
	}
}
impl Default for Token {
	fn default() -> Self {
		Self::invalid()
	}
}
impl Debug for Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Token")
			.field("access_token", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("scope", &self.scope)
			.field("expires_at", &self.expires_at)
			.field("valid", &self.valid)
			.finish()
	}
}

/// Builder for [`Token`].
#[derive(Clone, Debug, Default)]
pub struct TokenBuilder {
	access_token: Option<Secret>,
	token_type: Option<String>,
	scope: Option<String>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl TokenBuilder {
	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(Secret::new(token));

		self
	}

	/// Sets the token kind.
	pub fn token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = Some(token_type.into());

		self
	}

	/// Sets the granted scope string.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());

		self
	}

	/// Sets the issued-at instant used with [`expires_in`](Self::expires_in).
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant; no margin is applied.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets the server-declared lifetime; [`EXPIRY_MARGIN`] is subtracted on build.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Consumes the builder and produces a valid [`Token`].
	pub fn build(self) -> Result<Token, TokenBuilderError> {
		let access_token = self
			.access_token
			.filter(|secret| !secret.is_blank())
			.ok_or(TokenBuilderError::MissingAccessToken)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(lifetime)) => issued_at + lifetime - EXPIRY_MARGIN,
			(None, None) => return Err(TokenBuilderError::MissingExpiry),
		};

		Ok(Token {
			access_token,
			token_type: self.token_type.unwrap_or_else(|| "bearer".into()),
			scope: self.scope.unwrap_or_default(),
			expires_at,
			valid: true,
		})
	}
}
