//! Credential provider contract consumed by the token gatekeeper.

// self
use crate::{
	_prelude::*,
	auth::Token,
	error::AuthError,
};

/// Boxed future returned by [`CredentialProvider::refresh`].
pub type CredentialFuture<'a> = Pin<Box<dyn Future<Output = Result<Token, AuthError>> + 'a + Send>>;

/// Source of access tokens.
///
/// Implementations must be `Send + Sync` so the gatekeeper can share them behind an `Arc`. A
/// failed refresh is expected to leave [`current_token`](Self::current_token) returning an
/// invalid token.
pub trait CredentialProvider
where
	Self: Send + Sync,
{
	/// Returns a snapshot of the token currently held.
	fn current_token(&self) -> Token;

	/// Obtains a new token, replacing the current one.
	fn refresh(&self) -> CredentialFuture<'_>;
}

/// Authentication state machine.
///
/// `Unauthenticated -> Authenticating -> Authenticated`, and back through `Authenticating` when
/// a token expires; a failed attempt lands in `Unauthenticated`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthState {
	/// No usable token.
	#[default]
	Unauthenticated,
	/// A token request is in flight.
	Authenticating,
	/// A token was issued.
	Authenticated,
}
impl AuthState {
	/// Returns a stable label suitable for span or log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthState::Unauthenticated => "unauthenticated",
			AuthState::Authenticating => "authenticating",
			AuthState::Authenticated => "authenticated",
		}
	}
}
impl Display for AuthState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
