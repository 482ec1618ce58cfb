//! Transport primitives for Reddit HTTP exchanges.
//!
//! [`Transport`] is the crate's only dependency on an HTTP stack: one request in, one
//! status/headers/body triple out. The pipeline, the authenticator, and the revocation call all
//! go through it, and [`TransportHandle`] adapts it to `oauth2`'s [`AsyncHttpClient`] so token
//! grants share the same stack. Implementations must be `Send + Sync + 'static` and return
//! `Send` futures so callers can box them freely.

// crates.io
use oauth2::{
	AsyncHttpClient,
	http::{HeaderName, HeaderValue, StatusCode},
};
use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, clock::Clock, error::TransportError};

/// Boxed future returned by [`Transport::exchange`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Performs a single HTTP exchange.
pub trait Transport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves once the whole response body is read.
	fn exchange(&self, request: TransportRequest) -> TransportFuture<'_>;
}

/// HTTP methods the Reddit API uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
}
impl HttpMethod {
	/// Returns the wire name.
	pub const fn as_str(self) -> &'static str {
		match self {
			HttpMethod::Get => "GET",
			HttpMethod::Post => "POST",
			HttpMethod::Put => "PUT",
			HttpMethod::Patch => "PATCH",
			HttpMethod::Delete => "DELETE",
		}
	}
}
impl Display for HttpMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for HttpMethod {
	type Err = TransportError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_uppercase().as_str() {
			"GET" => Ok(Self::Get),
			"POST" => Ok(Self::Post),
			"PUT" => Ok(Self::Put),
			"PATCH" => Ok(Self::Patch),
			"DELETE" => Ok(Self::Delete),
			other => Err(TransportError::protocol(format!("unsupported HTTP method `{other}`"))),
		}
	}
}

/// Fully resolved request handed to a [`Transport`].
#[derive(Clone, PartialEq, Eq)]
pub struct TransportRequest {
	/// HTTP method.
	pub method: HttpMethod,
	/// Absolute URL including the query string.
	pub url: String,
	/// Header name/value pairs in insertion order.
	pub headers: Vec<(String, String)>,
	/// Request body, if any.
	pub body: Option<String>,
}
impl TransportRequest {
	/// Creates a request without headers or body.
	pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
		Self { method, url: url.into(), headers: Vec::new(), body: None }
	}

	/// Appends a header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Sets the body.
	pub fn with_body(mut self, body: impl Into<String>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Returns the first header value matching `name`, ignoring ASCII case.
	pub fn header(&self, name: &str) -> Option<&str> {
		find_header(&self.headers, name)
	}
}
impl Debug for TransportRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let headers = self
			.headers
			.iter()
			.map(|(name, value)| {
				if name.eq_ignore_ascii_case("authorization") {
					(name.as_str(), "<redacted>")
				} else {
					(name.as_str(), value.as_str())
				}
			})
			.collect::<Vec<_>>();

		f.debug_struct("TransportRequest")
			.field("method", &self.method)
			.field("url", &self.url)
			.field("headers", &headers)
			.field("body", &self.body.as_ref().map(|_| "<omitted>"))
			.finish()
	}
}

/// Response returned by a [`Transport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
	/// HTTP status code.
	pub status: u16,
	/// Header name/value pairs as received.
	pub headers: Vec<(String, String)>,
	/// Response body decoded as UTF-8.
	pub body: String,
}
impl HttpResponse {
	/// Creates a response without headers.
	pub fn new(status: u16, body: impl Into<String>) -> Self {
		Self { status, headers: Vec::new(), body: body.into() }
	}

	/// Appends a header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Returns the first header value matching `name`, ignoring ASCII case.
	pub fn header(&self, name: &str) -> Option<&str> {
		find_header(&self.headers, name)
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Parses `Retry-After` as delay seconds or an HTTP date relative to `now`.
	pub fn retry_after(&self, now: OffsetDateTime) -> Option<Duration> {
		parse_retry_after(self.header("retry-after")?, now)
	}
}

/// [`Transport`] backed by a shared [`ReqwestClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client honoring the configured connect and request timeouts.
	pub fn from_config(
		config: &crate::config::RequestConfig,
	) -> Result<Self, crate::error::ConfigError> {
		let client = ReqwestClient::builder()
			.connect_timeout(config.connect_timeout().unsigned_abs())
			.timeout(config.request_timeout().unsigned_abs())
			.build()?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl Transport for ReqwestTransport {
	fn exchange(&self, request: TransportRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let method = match request.method {
				HttpMethod::Get => reqwest::Method::GET,
				HttpMethod::Post => reqwest::Method::POST,
				HttpMethod::Put => reqwest::Method::PUT,
				HttpMethod::Patch => reqwest::Method::PATCH,
				HttpMethod::Delete => reqwest::Method::DELETE,
			};
			let mut builder = self.0.request(method, request.url.as_str());

			for (name, value) in &request.headers {
				builder = builder.header(name.as_str(), value.as_str());
			}
			if let Some(body) = request.body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let headers = response
				.headers()
				.iter()
				.filter_map(|(name, value)| {
					value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
				})
				.collect();
			let body = response.text().await?;

			Ok(HttpResponse { status, headers, body })
		})
	}
}

/// Status and retry hint of the latest response seen by a [`TransportHandle`].
#[derive(Clone, Debug, Default)]
pub(crate) struct ResponseMetadata {
	pub(crate) status: Option<u16>,
	pub(crate) retry_after: Option<Duration>,
}

/// Shares [`ResponseMetadata`] between a [`TransportHandle`] and the code mapping its errors.
#[derive(Clone, Debug, Default)]
pub(crate) struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	pub(crate) fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	pub(crate) fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Lets `oauth2` token requests run over any [`Transport`].
pub(crate) struct TransportHandle<T>
where
	T: ?Sized + Transport,
{
	transport: Arc<T>,
	clock: Arc<dyn Clock>,
	user_agent: String,
	slot: ResponseMetadataSlot,
}
impl<T> TransportHandle<T>
where
	T: ?Sized + Transport,
{
	pub(crate) fn new(
		transport: Arc<T>,
		clock: Arc<dyn Clock>,
		user_agent: impl Into<String>,
		slot: ResponseMetadataSlot,
	) -> Self {
		Self { transport, clock, user_agent: user_agent.into(), slot }
	}

	fn translate_request(
		&self,
		request: oauth2::HttpRequest,
	) -> Result<TransportRequest, TransportError> {
		let method = request.method().as_str().parse::<HttpMethod>()?;
		let mut translated = TransportRequest::new(method, request.uri().to_string());

		for (name, value) in request.headers() {
			let value = value.to_str().map_err(|_| {
				TransportError::protocol(format!("header `{name}` is not valid UTF-8"))
			})?;

			translated = translated.with_header(name.as_str(), value);
		}

		translated = translated.with_header("user-agent", self.user_agent.as_str());

		let body = request.into_body();

		if !body.is_empty() {
			let body = String::from_utf8(body)
				.map_err(|_| TransportError::protocol("token request body is not valid UTF-8"))?;

			translated = translated.with_body(body);
		}

		Ok(translated)
	}
}
impl<'c, T> AsyncHttpClient<'c> for TransportHandle<T>
where
	T: ?Sized + Transport,
{
	type Error = TransportError;
	type Future =
		Pin<Box<dyn Future<Output = Result<oauth2::HttpResponse, Self::Error>> + 'c + Send>>;

	fn call(&'c self, request: oauth2::HttpRequest) -> Self::Future {
		Box::pin(async move {
			self.slot.take();

			let request = self.translate_request(request)?;
			let response = self.transport.exchange(request).await?;

			self.slot.store(ResponseMetadata {
				status: Some(response.status),
				retry_after: response.retry_after(self.clock.now()),
			});

			translate_response(response)
		})
	}
}

fn translate_response(response: HttpResponse) -> Result<oauth2::HttpResponse, TransportError> {
	let HttpResponse { status, headers, body } = response;
	let status = StatusCode::from_u16(status)
		.map_err(|_| TransportError::protocol(format!("status {status} is out of range")))?;
	let mut translated = oauth2::HttpResponse::new(body.into_bytes());

	*translated.status_mut() = status;

	for (name, value) in headers {
		let (Ok(name), Ok(value)) =
			(HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(&value))
		else {
			continue;
		};

		translated.headers_mut().append(name, value);
	}

	Ok(translated)
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
	headers
		.iter()
		.find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
		.map(|(_, value)| value.as_str())
}

fn parse_retry_after(raw: &str, now: OffsetDateTime) -> Option<Duration> {
	let raw = raw.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).ok()?));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - now;

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::*;

	#[test]
	fn retry_after_accepts_seconds_and_dates() {
		let now = datetime!(2025-03-01 12:00 UTC);
		let seconds = HttpResponse::new(429, "").with_header("Retry-After", " 7 ");
		let date = HttpResponse::new(429, "")
			.with_header("retry-after", "Sat, 01 Mar 2025 12:00:30 +0000");
		let past = HttpResponse::new(429, "")
			.with_header("retry-after", "Sat, 01 Mar 2025 11:00:00 +0000");

		assert_eq!(seconds.retry_after(now), Some(Duration::seconds(7)));
		assert_eq!(date.retry_after(now), Some(Duration::seconds(30)));
		assert_eq!(past.retry_after(now), None);
		assert_eq!(HttpResponse::new(429, "").retry_after(now), None);
	}

	#[test]
	fn request_debug_redacts_authorization() {
		let request = TransportRequest::new(HttpMethod::Get, "https://oauth.reddit.com/api/v1/me")
			.with_header("Authorization", "Bearer very-secret");
		let rendered = format!("{request:?}");

		assert!(!rendered.contains("very-secret"));
		assert_eq!(request.header("authorization"), Some("Bearer very-secret"));
	}

	#[test]
	fn method_parsing_is_case_insensitive() {
		assert_eq!(
			"post".parse::<HttpMethod>().expect("Lowercase POST should parse."),
			HttpMethod::Post
		);
		assert!("TRACE".parse::<HttpMethod>().is_err());
	}

	#[tokio::test]
	async fn handle_translates_oauth_requests_and_records_metadata() {
		let transport = Arc::new(ScriptedTransport::new([json(200, "{\"ok\":true}")
			.map(|response| response.with_header("Retry-After", "3"))]));
		let slot = ResponseMetadataSlot::default();
		let handle =
			TransportHandle::new(transport.clone(), test_clock(), "relay-test/1.0", slot.clone());
		let request = oauth2::http::Request::builder()
			.method("POST")
			.uri("https://www.reddit.com/api/v1/access_token")
			.header("content-type", "application/x-www-form-urlencoded")
			.body(b"grant_type=client_credentials".to_vec())
			.expect("OAuth request fixture should build.");
		let response = handle.call(request).await.expect("Scripted exchange should succeed.");

		assert_eq!(response.status(), StatusCode::OK);
		assert_eq!(response.body().as_slice(), b"{\"ok\":true}");
		assert_eq!(
			response.headers().get("content-type").and_then(|value| value.to_str().ok()),
			Some("application/json")
		);

		let sent = transport.requests();

		assert_eq!(sent[0].method, HttpMethod::Post);
		assert_eq!(sent[0].body.as_deref(), Some("grant_type=client_credentials"));
		assert_eq!(sent[0].header("user-agent"), Some("relay-test/1.0"));

		let meta = slot.take().expect("Handle should record response metadata.");

		assert_eq!(meta.status, Some(200));
		assert_eq!(meta.retry_after, Some(Duration::seconds(3)));
	}

	#[tokio::test]
	async fn handle_measures_date_hints_against_its_clock() {
		let hint = "Sat, 01 Mar 2025 12:00:30 +0000";
		let transport = Arc::new(ScriptedTransport::new([
			status(429).map(|response| response.with_header("Retry-After", hint))
		]));
		let slot = ResponseMetadataSlot::default();
		let handle = TransportHandle::new(transport, test_clock(), "relay-test/1.0", slot.clone());
		let request = oauth2::http::Request::builder()
			.method("POST")
			.uri("https://www.reddit.com/api/v1/access_token")
			.body(b"grant_type=client_credentials".to_vec())
			.expect("OAuth request fixture should build.");

		handle.call(request).await.expect("Scripted exchange should succeed.");

		let meta = slot.take().expect("Handle should record response metadata.");

		assert_eq!(meta.status, Some(429));
		assert_eq!(meta.retry_after, Some(Duration::seconds(30)));
	}
}
