//! Reddit OAuth authenticator covering the password grant ("script" apps) and the
//! application-only client-credentials grant used by read-only mode.
//!
//! Reddit issues no refresh tokens to script apps, so [`CredentialProvider::refresh`] re-runs
//! the configured grant. Token requests travel over the same [`Transport`] as API calls through
//! [`TransportHandle`], with `oauth2` building the form body and HTTP Basic client
//! authentication. Requests are serialized so concurrent refreshes never race each other.

// std
use std::sync::atomic::{AtomicBool, Ordering};
// crates.io
use oauth2::{
	ClientId, ClientSecret, RequestTokenError, ResourceOwnerPassword, ResourceOwnerUsername,
	TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::{AuthState, CredentialFuture, CredentialProvider, Secret, Token},
	clock::Clock,
	config::{AuthConfig, Endpoints},
	error::{AuthError, TransportError},
	http::{
		HttpMethod, ResponseMetadata, ResponseMetadataSlot, Transport, TransportHandle,
		TransportRequest,
	},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

type OAuthError = RequestTokenError<TransportError, BasicErrorResponse>;

/// Grant used to obtain access tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrantMode {
	/// Resource-owner password grant with the account's credentials.
	Script,
	/// Client-credentials grant without a user context.
	ReadOnly,
}
impl GrantMode {
	/// Returns the OAuth `grant_type` value.
	pub const fn as_str(self) -> &'static str {
		match self {
			GrantMode::Script => "password",
			GrantMode::ReadOnly => "client_credentials",
		}
	}
}
impl Display for GrantMode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Obtains, tracks, and revokes Reddit access tokens.
pub struct RedditAuthenticator<T>
where
	T: ?Sized + Transport,
{
	config: AuthConfig,
	token_url: Url,
	revoke_url: Url,
	transport: Arc<T>,
	clock: Arc<dyn Clock>,
	read_only: AtomicBool,
	token: RwLock<Token>,
	state: RwLock<AuthState>,
	exclusive: AsyncMutex<()>,
}
impl<T> RedditAuthenticator<T>
where
	T: ?Sized + Transport,
{
	/// Creates an unauthenticated authenticator.
	pub fn new(
		config: AuthConfig,
		endpoints: &Endpoints,
		transport: Arc<T>,
		clock: Arc<dyn Clock>,
	) -> Self {
		let read_only = AtomicBool::new(config.read_only);

		Self {
			config,
			token_url: endpoints.token.clone(),
			revoke_url: endpoints.revoke.clone(),
			transport,
			clock,
			read_only,
			token: RwLock::new(Token::invalid()),
			state: RwLock::new(AuthState::Unauthenticated),
			exclusive: AsyncMutex::new(()),
		}
	}

	/// Grant the next authentication will use.
	pub fn grant_mode(&self) -> GrantMode {
		if self.is_read_only() { GrantMode::ReadOnly } else { GrantMode::Script }
	}

	/// Returns `true` in application-only mode.
	pub fn is_read_only(&self) -> bool {
		self.read_only.load(Ordering::Acquire)
	}

	/// Switches the grant used by subsequent authentications; returns the previous setting.
	pub fn set_read_only(&self, read_only: bool) -> bool {
		self.read_only.swap(read_only, Ordering::AcqRel)
	}

	/// Current position in the authentication state machine.
	pub fn state(&self) -> AuthState {
		*self.state.read()
	}

	/// Returns `true` when a valid, unexpired token is held.
	pub fn is_authenticated(&self) -> bool {
		self.token.read().is_usable_at(self.clock.now())
	}

	/// User-Agent sent with token and revocation requests.
	pub fn user_agent(&self) -> &str {
		self.config.user_agent()
	}

	/// Runs the grant selected by [`grant_mode`](Self::grant_mode).
	pub async fn authenticate(&self) -> Result<Token, AuthError> {
		self.run_grant(self.grant_mode(), FlowKind::Authenticate).await
	}

	/// Runs the password grant regardless of the read-only flag.
	pub async fn authenticate_script(&self) -> Result<Token, AuthError> {
		self.run_grant(GrantMode::Script, FlowKind::Authenticate).await
	}

	/// Runs the client-credentials grant regardless of the read-only flag.
	pub async fn authenticate_read_only(&self) -> Result<Token, AuthError> {
		self.run_grant(GrantMode::ReadOnly, FlowKind::Authenticate).await
	}

	/// Revokes the held access token; the local token is invalidated on 200 or 204.
	pub async fn revoke(&self) -> Result<(), AuthError> {
		const KIND: FlowKind = FlowKind::Revoke;

		let span = FlowSpan::new(KIND, "revoke");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let _exclusive = self.exclusive.lock().await;
				let token = self.token.read().clone();

				if !token.valid {
					return Err(AuthError::NoToken);
				}

				let secret = self.client_secret("revocation")?;
				let body = url::form_urlencoded::Serializer::new(String::new())
					.append_pair("token", token.access_token.expose())
					.append_pair("token_type_hint", "access_token")
					.finish();
				let request = TransportRequest::new(HttpMethod::Post, self.revoke_url.as_str())
					.with_header("authorization", secret.basic_header(&self.config.client_id))
					.with_header("content-type", "application/x-www-form-urlencoded")
					.with_header("user-agent", self.config.user_agent())
					.with_body(body);
				let response = self.transport.exchange(request).await?;

				match response.status {
					200 | 204 => {
						*self.token.write() = Token::invalid();
						*self.state.write() = AuthState::Unauthenticated;

						Ok(())
					},
					status => Err(AuthError::RevocationFailed { status }),
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn run_grant(&self, mode: GrantMode, kind: FlowKind) -> Result<Token, AuthError> {
		let span = FlowSpan::new(kind, mode.as_str());

		obs::record_flow_outcome(kind, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let _exclusive = self.exclusive.lock().await;

				*self.state.write() = AuthState::Authenticating;

				let result = self.exchange(mode).await;

				match &result {
					Ok(token) => {
						*self.token.write() = token.clone();
						*self.state.write() = AuthState::Authenticated;

						#[cfg(feature = "tracing")]
						tracing::info!(
							grant = mode.as_str(),
							expires_at = %token.expires_at,
							"Obtained Reddit access token."
						);
					},
					Err(_err) => {
						*self.token.write() = Token::invalid();
						*self.state.write() = AuthState::Unauthenticated;

						#[cfg(feature = "tracing")]
						tracing::warn!(
							grant = mode.as_str(),
							error = %_err,
							"Reddit token request failed."
						);
					},
				}

				result
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(kind, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(kind, FlowOutcome::Failure),
		}

		result
	}

	async fn exchange(&self, mode: GrantMode) -> Result<Token, AuthError> {
		let secret = self.client_secret(mode.as_str())?;
		let token_url = TokenUrl::new(self.token_url.to_string())
			.map_err(|source| AuthError::InvalidEndpoint { source })?;
		let client = BasicClient::new(ClientId::new(self.config.client_id.clone()))
			.set_client_secret(ClientSecret::new(secret.expose().to_owned()))
			.set_token_uri(token_url);
		let slot = ResponseMetadataSlot::default();
		let handle = TransportHandle::new(
			self.transport.clone(),
			self.clock.clone(),
			self.config.user_agent(),
			slot.clone(),
		);
		let issued_at = self.clock.now();
		let response = match mode {
			GrantMode::Script => {
				let (username, password) = self.owner_credentials()?;

				client.exchange_password(&username, &password).request_async(&handle).await
			},
			GrantMode::ReadOnly =>
				client.exchange_client_credentials().request_async(&handle).await,
		}
		.map_err(|err| map_request_error(err, slot.take()))?;

		map_token_response(response, issued_at)
	}

	fn client_secret(&self, grant: &'static str) -> Result<&Secret, AuthError> {
		if self.config.client_id.trim().is_empty() {
			return Err(AuthError::MissingCredentials { grant, missing: "a client id" });
		}

		self.config
			.client_secret
			.as_ref()
			.filter(|secret| !secret.is_blank())
			.ok_or(AuthError::MissingCredentials { grant, missing: "a client secret" })
	}

	fn owner_credentials(
		&self,
	) -> Result<(ResourceOwnerUsername, ResourceOwnerPassword), AuthError> {
		const GRANT: &str = "password";

		let username = self
			.config
			.username
			.as_ref()
			.filter(|name| !name.trim().is_empty())
			.ok_or(AuthError::MissingCredentials { grant: GRANT, missing: "a username" })?;
		let password = self
			.config
			.password
			.as_ref()
			.filter(|password| !password.is_blank())
			.ok_or(AuthError::MissingCredentials { grant: GRANT, missing: "a password" })?;

		Ok((
			ResourceOwnerUsername::new(username.clone()),
			ResourceOwnerPassword::new(password.expose().to_owned()),
		))
	}
}
impl<T> CredentialProvider for RedditAuthenticator<T>
where
	T: ?Sized + Transport,
{
	fn current_token(&self) -> Token {
		self.token.read().clone()
	}

	fn refresh(&self) -> CredentialFuture<'_> {
		Box::pin(self.run_grant(self.grant_mode(), FlowKind::Refresh))
	}
}
impl<T> Debug for RedditAuthenticator<T>
where
	T: ?Sized + Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RedditAuthenticator")
			.field("client_id", &self.config.client_id)
			.field("grant", &self.grant_mode())
			.field("state", &self.state())
			.field("token", &*self.token.read())
			.finish()
	}
}

/// Reddit's non-standard error envelope, e.g. `{"error": "invalid_grant"}` served with 200.
#[derive(Deserialize)]
struct RedditErrorBody {
	error: serde_json::Value,
	#[serde(default)]
	message: Option<String>,
}

fn map_token_response(
	response: BasicTokenResponse,
	issued_at: OffsetDateTime,
) -> Result<Token, AuthError> {
	let expires_in = response.expires_in().ok_or(AuthError::MissingExpiresIn)?.as_secs();
	let expires_in = i64::try_from(expires_in).map_err(|_| AuthError::ExpiresInOutOfRange)?;

	if expires_in <= 0 {
		return Err(AuthError::NonPositiveExpiresIn);
	}

	let scope = response
		.scopes()
		.map(|scopes| scopes.iter().map(|scope| scope.as_str()).collect::<Vec<_>>().join(" "))
		.unwrap_or_default();

	Token::builder()
		.access_token(response.access_token().secret().to_owned())
		.token_type(response.token_type().as_ref())
		.scope(scope)
		.issued_at(issued_at)
		.expires_in(Duration::seconds(expires_in))
		.build()
		.map_err(AuthError::from)
}

fn map_request_error(err: OAuthError, meta: Option<ResponseMetadata>) -> AuthError {
	let status = meta.as_ref().and_then(|value| value.status);
	let retry_after = meta.as_ref().and_then(|value| value.retry_after);

	match err {
		RequestTokenError::ServerResponse(response) => classify_oauth_error(
			response.error().as_ref(),
			response.error_description().map(String::as_str),
			status,
			retry_after,
		),
		RequestTokenError::Request(error) => AuthError::Transport(error),
		RequestTokenError::Parse(source, body) => {
			if status == Some(401) {
				return AuthError::InvalidClient {
					reason: "client id or secret was rejected".into(),
				};
			}

			match serde_json::from_slice::<RedditErrorBody>(&body) {
				Ok(RedditErrorBody { error: serde_json::Value::String(code), message }) =>
					classify_oauth_error(&code, message.as_deref(), status, retry_after),
				_ => match status {
					Some(code) if code != 200 => AuthError::TokenEndpoint {
						message: format!("HTTP {code}"),
						status,
						retry_after,
					},
					_ => AuthError::TokenResponseParse { source, status },
				},
			}
		},
		RequestTokenError::Other(message) =>
			AuthError::TokenEndpoint { message, status, retry_after },
	}
}

fn classify_oauth_error(
	code: &str,
	description: Option<&str>,
	status: Option<u16>,
	retry_after: Option<Duration>,
) -> AuthError {
	let reason = match description {
		Some(description) => format!("{code} ({description})"),
		None => code.to_owned(),
	};

	match code {
		"invalid_grant" => AuthError::InvalidGrant { reason },
		"invalid_client" | "unauthorized_client" => AuthError::InvalidClient { reason },
		_ => AuthError::TokenEndpoint { message: reason, status, retry_after },
	}
}
