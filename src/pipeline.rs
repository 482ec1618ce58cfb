//! Request pipeline: rate-limit admission, retrying transport exchange, and outcome
//! classification for calls against the Reddit OAuth API.
//!
//! One [`RequestPipeline::execute`] call is one logical request. Calls are serialized, so
//! concurrent callers complete in issuance order and share a single rate-limit window. The
//! pipeline never panics for ordinary failures: every problem comes back as a failed
//! [`ResponseOutcome`].

// self
use crate::{
	_prelude::*,
	auth::{Secret, Token},
	clock::Clock,
	config::{Endpoints, RedditConfig},
	error::{ConfigError, RequestFailure, TransportError},
	http::{HttpMethod, HttpResponse, Transport, TransportRequest},
	obs::{self, FlowKind, FlowOutcome, FlowSpan, WaitReason},
	rate_limit::RateLimiter,
	retry::RetryPolicy,
};

/// Content type used for Reddit's form-encoded write endpoints.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Immutable description of one logical API call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestDescriptor {
	/// HTTP method.
	pub method: HttpMethod,
	/// Absolute path below the API base, e.g. `/r/rust/hot`.
	pub target: String,
	/// Encoded query string without the leading `?`.
	pub query: Option<String>,
	/// Request body.
	pub body: Option<String>,
	/// Content type of `body`; form encoding is assumed when unset.
	pub content_type: Option<String>,
}
impl RequestDescriptor {
	/// Creates a descriptor without query or body.
	pub fn new(method: HttpMethod, target: impl Into<String>) -> Self {
		Self { method, target: target.into(), query: None, body: None, content_type: None }
	}

	/// `GET target`.
	pub fn get(target: impl Into<String>) -> Self {
		Self::new(HttpMethod::Get, target)
	}

	/// `POST target` with a form-encoded body.
	pub fn post<I, K, V>(target: impl Into<String>, form: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		Self::new(HttpMethod::Post, target).with_form(form)
	}

	/// `PUT target` with a form-encoded body.
	pub fn put<I, K, V>(target: impl Into<String>, form: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		Self::new(HttpMethod::Put, target).with_form(form)
	}

	/// `PATCH target` with a raw body and content type.
	pub fn patch(
		target: impl Into<String>,
		body: impl Into<String>,
		content_type: impl Into<String>,
	) -> Self {
		Self::new(HttpMethod::Patch, target).with_body(body, content_type)
	}

	/// `DELETE target`.
	pub fn delete(target: impl Into<String>) -> Self {
		Self::new(HttpMethod::Delete, target)
	}

	/// Sets an already-encoded query string; an empty string clears it.
	pub fn with_query(mut self, query: impl Into<String>) -> Self {
		let query = query.into();

		self.query = if query.is_empty() { None } else { Some(query) };

		self
	}

	/// Encodes `pairs` as the query string.
	pub fn with_query_pairs<I, K, V>(self, pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		let query = encode_form(pairs);

		self.with_query(query)
	}

	/// Encodes `form` as an `application/x-www-form-urlencoded` body.
	pub fn with_form<I, K, V>(self, form: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		let body = encode_form(form);

		self.with_body(body, FORM_CONTENT_TYPE)
	}

	/// Sets a raw body with its content type.
	pub fn with_body(mut self, body: impl Into<String>, content_type: impl Into<String>) -> Self {
		self.body = Some(body.into());
		self.content_type = Some(content_type.into());

		self
	}

	/// Absolute URL: API base, target, then `?query` when present.
	pub fn url(&self, endpoints: &Endpoints) -> String {
		let mut url = endpoints.api_url(&self.target);

		if let Some(query) = &self.query {
			url.push('?');
			url.push_str(query);
		}

		url
	}

	fn validate(&self) -> Result<(), RequestFailure> {
		if self.target.starts_with('/') {
			Ok(())
		} else {
			Err(RequestFailure::InvalidTarget { target: self.target.clone() })
		}
	}
}

/// Final result of one logical call.
///
/// Exactly one of "success with body" or "failure with a [`RequestFailure`]" holds. `status` is
/// the HTTP status of the last exchange, or `0` when no response was received.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseOutcome {
	status: u16,
	body: String,
	failure: Option<RequestFailure>,
}
impl ResponseOutcome {
	/// Successful outcome.
	pub fn success(status: u16, body: impl Into<String>) -> Self {
		Self { status, body: body.into(), failure: None }
	}

	/// Failed outcome; `body` carries whatever the server returned, if anything.
	pub fn failed(status: u16, body: impl Into<String>, failure: RequestFailure) -> Self {
		Self { status, body: body.into(), failure: Some(failure) }
	}

	/// Classifies a single transport exchange.
	pub fn from_exchange(
		exchange: Result<HttpResponse, TransportError>,
		now: OffsetDateTime,
	) -> Self {
		let response = match exchange {
			Ok(response) => response,
			Err(e) => {
				return Self::failed(0, "", RequestFailure::Transport { message: e.describe() });
			},
		};

		if response.is_success() {
			return Self::success(response.status, response.body);
		}

		let failure = match response.status {
			401 => RequestFailure::Unauthorized,
			429 => RequestFailure::RateLimited { retry_after: response.retry_after(now) },
			status => RequestFailure::Status { status },
		};

		Self::failed(response.status, response.body, failure)
	}

	pub(crate) fn not_attempted() -> Self {
		Self::failed(0, "", RequestFailure::Transport { message: "no attempt was made".into() })
	}

	/// HTTP status, `0` when no response was received.
	pub fn status(&self) -> u16 {
		self.status
	}

	/// Raw response body.
	pub fn body(&self) -> &str {
		&self.body
	}

	/// Failure classification, `None` on success.
	pub fn failure(&self) -> Option<&RequestFailure> {
		self.failure.as_ref()
	}

	/// Returns `true` for a 2xx outcome.
	pub fn is_success(&self) -> bool {
		self.failure.is_none()
	}

	/// Converts into the body on success or [`Error::Request`] on failure.
	pub fn into_result(self) -> Result<String> {
		match self.failure {
			None => Ok(self.body),
			Some(failure) => Err(Error::Request { status: self.status, body: self.body, failure }),
		}
	}

	pub(crate) fn should_retry(&self) -> bool {
		self.failure.as_ref().is_some_and(RequestFailure::is_retryable)
	}

	pub(crate) fn retry_after(&self) -> Option<Duration> {
		match &self.failure {
			Some(RequestFailure::RateLimited { retry_after }) => *retry_after,
			_ => None,
		}
	}
}

/// Rate-limited, retrying executor for API calls.
pub struct RequestPipeline<T>
where
	T: ?Sized + Transport,
{
	transport: Arc<T>,
	clock: Arc<dyn Clock>,
	endpoints: Endpoints,
	user_agent: String,
	retry: RetryPolicy,
	limiter: Mutex<RateLimiter>,
	authorization: RwLock<Option<Secret>>,
	serial: AsyncMutex<()>,
}
impl<T> RequestPipeline<T>
where
	T: ?Sized + Transport,
{
	/// Assembles a pipeline from its parts.
	pub fn new(
		transport: Arc<T>,
		clock: Arc<dyn Clock>,
		endpoints: Endpoints,
		user_agent: impl Into<String>,
		retry: RetryPolicy,
		limiter: RateLimiter,
	) -> Self {
		Self {
			transport,
			clock,
			endpoints,
			user_agent: user_agent.into(),
			retry,
			limiter: Mutex::new(limiter),
			authorization: RwLock::new(None),
			serial: AsyncMutex::new(()),
		}
	}

	/// Builds a pipeline from validated configuration.
	pub fn from_config(
		config: &RedditConfig,
		transport: Arc<T>,
		clock: Arc<dyn Clock>,
	) -> Result<Self, ConfigError> {
		config.validate()?;

		Ok(Self::new(
			transport,
			clock,
			config.endpoints.clone(),
			config.auth.user_agent(),
			RetryPolicy::from_config(&config.request),
			RateLimiter::from_config(&config.rate_limit)?,
		))
	}

	/// Installs (or clears) the bearer token attached to subsequent attempts.
	pub fn set_access_token(&self, secret: Option<Secret>) {
		*self.authorization.write() = secret;
	}

	/// Installs `token` when it is valid and clears the header otherwise.
	pub fn install_token(&self, token: &Token) {
		self.set_access_token(token.valid.then(|| token.access_token.clone()));
	}

	/// Returns `true` when a bearer token is installed.
	pub fn has_access_token(&self) -> bool {
		self.authorization.read().is_some()
	}

	/// Admissions currently tracked by the rate limiter.
	pub fn tracked_requests(&self) -> usize {
		self.limiter.lock().tracked()
	}

	/// Retry policy applied to every call.
	pub fn retry_policy(&self) -> RetryPolicy {
		self.retry
	}

	/// Endpoint set the pipeline targets.
	pub fn endpoints(&self) -> &Endpoints {
		&self.endpoints
	}

	/// Runs one logical call: wait for a rate-limit slot, retry the exchange, classify the result.
	pub async fn execute(&self, request: &RequestDescriptor) -> ResponseOutcome {
		const KIND: FlowKind = FlowKind::Request;

		let span = FlowSpan::request(request.method, &request.target);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let outcome = span
			.instrument(async move {
				if let Err(failure) = request.validate() {
					return ResponseOutcome::failed(0, "", failure);
				}

				let _serial = self.serial.lock().await;

				self.wait_for_slot().await;

				let url = request.url(&self.endpoints);
				let report = self
					.retry
					.run(self.clock.as_ref(), |_| {
						self.transport.exchange(self.prepare(request, &url))
					})
					.await;

				if report.outcome.is_success() {
					self.limiter.lock().record_admission(self.clock.now());
				}

				#[cfg(feature = "tracing")]
				tracing::debug!(
					status = report.outcome.status(),
					attempts = report.attempts,
					"Reddit request finished."
				);

				report.outcome
			})
			.await;

		if outcome.is_success() {
			obs::record_flow_outcome(KIND, FlowOutcome::Success);
		} else {
			obs::record_flow_outcome(KIND, FlowOutcome::Failure);
		}

		outcome
	}

	async fn wait_for_slot(&self) {
		let wait = {
			let now = self.clock.now();
			let mut limiter = self.limiter.lock();

			if limiter.admit(now) { None } else { Some(limiter.time_until_next_slot(now)) }
		};

		if let Some(wait) = wait {
			obs::note_wait(WaitReason::RateLimit, wait);
			self.clock.sleep(wait).await;
		}
	}

	fn prepare(&self, request: &RequestDescriptor, url: &str) -> TransportRequest {
		let mut prepared = TransportRequest::new(request.method, url)
			.with_header("user-agent", self.user_agent.as_str())
			.with_header("accept", "application/json");

		if let Some(secret) = self.authorization.read().as_ref() {
			prepared = prepared.with_header("authorization", secret.bearer_header());
		}
		if let Some(body) = &request.body {
			prepared = prepared
				.with_header(
					"content-type",
					request.content_type.as_deref().unwrap_or(FORM_CONTENT_TYPE),
				)
				.with_body(body.as_str());
		}

		prepared
	}
}
impl<T> Debug for RequestPipeline<T>
where
	T: ?Sized + Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestPipeline")
			.field("api_base", &self.endpoints.api_base.as_str())
			.field("user_agent", &self.user_agent)
			.field("retry", &self.retry)
			.field("authorized", &self.has_access_token())
			.finish()
	}
}

fn encode_form<I, K, V>(pairs: I) -> String
where
	I: IntoIterator<Item = (K, V)>,
	K: AsRef<str>,
	V: AsRef<str>,
{
	let mut serializer = url::form_urlencoded::Serializer::new(String::new());

	for (key, value) in pairs {
		serializer.append_pair(key.as_ref(), value.as_ref());
	}

	serializer.finish()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::*, clock::ManualClock};

	fn pipeline(
		transport: &Arc<ScriptedTransport>,
		clock: &Arc<ManualClock>,
		max_retries: u32,
		capacity: usize,
	) -> RequestPipeline<ScriptedTransport> {
		RequestPipeline::new(
			transport.clone(),
			clock.clone(),
			Endpoints::default(),
			"relay-test/1.0",
			RetryPolicy::new(max_retries, Duration::seconds(1), Duration::seconds(30)),
			RateLimiter::new(capacity, Duration::seconds(60), Duration::seconds(1))
				.expect("Limiter fixture should be valid."),
		)
	}

	#[test]
	fn descriptors_encode_query_and_form() {
		let endpoints = Endpoints::default();
		let listing =
			RequestDescriptor::get("/r/rust/top").with_query_pairs([("limit", "5"), ("t", "week")]);
		let submit = RequestDescriptor::post("/api/submit", [("title", "a & b"), ("kind", "self")]);

		assert_eq!(listing.url(&endpoints), "https://oauth.reddit.com/r/rust/top?limit=5&t=week");
		assert_eq!(submit.body.as_deref(), Some("title=a+%26+b&kind=self"));
		assert_eq!(submit.content_type.as_deref(), Some(FORM_CONTENT_TYPE));
		assert_eq!(RequestDescriptor::get("/api/v1/me").with_query("").query, None);
	}

	#[test]
	fn outcome_classification_follows_status() {
		let now = datetime!(2025-03-01 12:00 UTC);
		let ok = ResponseOutcome::from_exchange(json(200, "{}"), now);
		let unauthorized = ResponseOutcome::from_exchange(status(401), now);
		let throttled = ResponseOutcome::from_exchange(
			status(429).map(|response| response.with_header("Retry-After", "9")),
			now,
		);
		let broken = ResponseOutcome::from_exchange(connection_refused(), now);

		assert!(ok.is_success());
		assert_eq!(unauthorized.failure(), Some(&RequestFailure::Unauthorized));
		assert!(!unauthorized.should_retry());
		assert_eq!(throttled.retry_after(), Some(Duration::seconds(9)));
		assert_eq!(broken.status(), 0);
		assert!(matches!(broken.failure(), Some(RequestFailure::Transport { .. })));
		assert!(matches!(
			ResponseOutcome::from_exchange(status(503), now).into_result(),
			Err(Error::Request { status: 503, failure: RequestFailure::Status { status: 503 }, .. })
		));
	}

	#[test]
	fn failed_outcome_keeps_the_raw_body() {
		let now = datetime!(2025-03-01 12:00 UTC);
		let err = ResponseOutcome::from_exchange(
			json(500, "{\"message\":\"Internal Server Error\",\"error\":500}"),
			now,
		)
		.into_result()
		.expect_err("A 500 outcome should convert into an error.");

		match err {
			Error::Request { status, body, failure } => {
				assert_eq!(status, 500);
				assert_eq!(body, "{\"message\":\"Internal Server Error\",\"error\":500}");
				assert_eq!(failure, RequestFailure::Status { status: 500 });
			},
			other => panic!("Expected a request error, got {other:?}."),
		}
	}

	#[tokio::test]
	async fn attaches_standard_headers_to_every_attempt() {
		let transport = Arc::new(ScriptedTransport::new([status(500), json(200, "{}")]));
		let clock = test_clock();
		let pipeline = pipeline(&transport, &clock, 3, 60);

		pipeline.set_access_token(Some(Secret::new("bearer-value")));

		let outcome = pipeline
			.execute(&RequestDescriptor::post("/api/vote", [("id", "t3_abc"), ("dir", "1")]))
			.await;

		assert!(outcome.is_success());

		let sent = transport.requests();

		assert_eq!(sent.len(), 2);

		for request in &sent {
			assert_eq!(request.url, "https://oauth.reddit.com/api/vote");
			assert_eq!(request.header("user-agent"), Some("relay-test/1.0"));
			assert_eq!(request.header("accept"), Some("application/json"));
			assert_eq!(request.header("authorization"), Some("Bearer bearer-value"));
			assert_eq!(request.header("content-type"), Some(FORM_CONTENT_TYPE));
			assert_eq!(request.body.as_deref(), Some("id=t3_abc&dir=1"));
		}
	}

	#[tokio::test]
	async fn omits_authorization_and_content_type_when_absent() {
		let transport = Arc::new(ScriptedTransport::new([json(200, "{}")]));
		let clock = test_clock();
		let pipeline = pipeline(&transport, &clock, 0, 60);

		pipeline.execute(&RequestDescriptor::get("/r/rust/about")).await;

		let sent = transport.requests();

		assert_eq!(sent[0].header("authorization"), None);
		assert_eq!(sent[0].header("content-type"), None);
		assert_eq!(sent[0].body, None);
	}

	#[tokio::test]
	async fn rejects_relative_targets_without_calling_transport() {
		let transport = Arc::new(ScriptedTransport::default());
		let clock = test_clock();
		let pipeline = pipeline(&transport, &clock, 3, 60);

		for target in ["", "api/v1/me"] {
			let outcome = pipeline.execute(&RequestDescriptor::get(target)).await;

			assert_eq!(outcome.status(), 0);
			assert_eq!(
				outcome.failure(),
				Some(&RequestFailure::InvalidTarget { target: target.to_owned() })
			);
		}

		assert_eq!(transport.calls(), 0);
		assert_eq!(pipeline.tracked_requests(), 0);
	}

	#[tokio::test]
	async fn records_admission_only_for_successful_calls() {
		let transport = Arc::new(ScriptedTransport::new([
			json(200, "{}"),
			status(500),
			status(401),
			json(204, ""),
		]));
		let clock = test_clock();
		let pipeline = pipeline(&transport, &clock, 0, 60);
		let request = RequestDescriptor::get("/api/v1/me");

		assert!(pipeline.execute(&request).await.is_success());
		assert_eq!(pipeline.tracked_requests(), 1);
		assert!(!pipeline.execute(&request).await.is_success());
		assert!(!pipeline.execute(&request).await.is_success());
		assert_eq!(pipeline.tracked_requests(), 1);
		assert!(pipeline.execute(&request).await.is_success());
		assert_eq!(pipeline.tracked_requests(), 2);
	}

	#[tokio::test]
	async fn retried_call_is_admitted_once() {
		let transport =
			Arc::new(ScriptedTransport::new([status(500), status(503), json(200, "{}")]));
		let clock = test_clock();
		let pipeline = pipeline(&transport, &clock, 3, 60);

		assert!(pipeline.execute(&RequestDescriptor::get("/r/rust/hot")).await.is_success());
		assert_eq!(transport.calls(), 3);
		assert_eq!(clock.sleeps(), vec![Duration::seconds(2), Duration::seconds(4)]);
		assert_eq!(pipeline.tracked_requests(), 1);
	}

	#[tokio::test]
	async fn expired_entry_frees_its_slot_before_the_next_sweep() {
		let transport = Arc::new(ScriptedTransport::new((0..4).map(|_| json(200, "{}"))));
		let clock = test_clock();
		let start = clock.now();
		let pipeline = pipeline(&transport, &clock, 0, 1);
		let request = RequestDescriptor::get("/r/rust/new");

		assert!(pipeline.execute(&request).await.is_success());

		clock.advance(Duration::milliseconds(59_500));

		for _ in 0..3 {
			assert!(pipeline.execute(&request).await.is_success());

			clock.advance(Duration::milliseconds(400));
		}

		// One call per 60 s window: sent at +0s, +60s, +120s, and +180s.
		assert_eq!(
			clock.sleeps(),
			vec![
				Duration::milliseconds(500),
				Duration::milliseconds(59_600),
				Duration::milliseconds(59_600),
			]
		);
		assert_eq!(clock.now() - start, Duration::milliseconds(180_400));
		assert_eq!(transport.calls(), 4);
		assert_eq!(pipeline.tracked_requests(), 1);
	}

	#[tokio::test]
	async fn full_window_delays_instead_of_dropping() {
		let transport = Arc::new(ScriptedTransport::new([json(200, "{}"), json(200, "{}")]));
		let clock = test_clock();
		let pipeline = pipeline(&transport, &clock, 0, 1);
		let request = RequestDescriptor::get("/r/rust/new");

		assert!(pipeline.execute(&request).await.is_success());

		clock.advance(Duration::seconds(15));

		assert!(pipeline.execute(&request).await.is_success());
		assert_eq!(clock.sleeps(), vec![Duration::seconds(45)]);
		assert_eq!(transport.calls(), 2);
		assert_eq!(pipeline.tracked_requests(), 1);
	}

	#[tokio::test]
	async fn unauthorized_is_returned_after_one_attempt() {
		let transport = Arc::new(ScriptedTransport::new([status(401)]));
		let clock = test_clock();
		let pipeline = pipeline(&transport, &clock, 3, 60);
		let outcome = pipeline.execute(&RequestDescriptor::get("/api/v1/me")).await;

		assert_eq!(outcome.status(), 401);
		assert_eq!(outcome.failure(), Some(&RequestFailure::Unauthorized));
		assert_eq!(transport.calls(), 1);
		assert!(clock.sleeps().is_empty());
	}
}
