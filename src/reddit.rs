//! High-level Reddit client.
//!
//! [`Reddit`] wires the authenticator, the token gatekeeper, and the request pipeline together
//! and exposes typed lookups plus lightweight handles for subreddits, accounts, and posts or
//! comments. Every call goes through the gatekeeper, so expired tokens are refreshed, the
//! rate-limit window is honored, and transient failures are retried before an error surfaces.

// self
use crate::{
	_prelude::*,
	auth::{CredentialProvider, RedditAuthenticator, Token},
	clock::Clock,
	config::RedditConfig,
	error::AuthError,
	gatekeeper::TokenGatekeeper,
	http::Transport,
	models::{
		Comment, Fullname, Kind, Listing, RawListing, Redditor, Submission, SubmissionThread,
		Subreddit, SubredditName, ThingId, TimeFilter, Username, parse_json, parse_thing,
		submission_id_from_url,
	},
	pipeline::{RequestDescriptor, RequestPipeline, ResponseOutcome},
};
#[cfg(feature = "reqwest")]
use crate::{clock::SystemClock, http::ReqwestTransport};

/// [`Reddit`] over the bundled reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestReddit = Reddit<ReqwestTransport>;

/// Reddit API client.
pub struct Reddit<T>
where
	T: ?Sized + Transport,
{
	authenticator: Arc<RedditAuthenticator<T>>,
	gatekeeper: TokenGatekeeper<T, RedditAuthenticator<T>>,
}
impl<T> Reddit<T>
where
	T: ?Sized + Transport,
{
	/// Builds an unauthenticated client over `transport`.
	pub fn with_transport(
		config: RedditConfig,
		transport: Arc<T>,
		clock: Arc<dyn Clock>,
	) -> Result<Self> {
		let pipeline =
			Arc::new(RequestPipeline::from_config(&config, transport.clone(), clock.clone())?);
		let authenticator = Arc::new(RedditAuthenticator::new(
			config.auth,
			&config.endpoints,
			transport,
			clock.clone(),
		));
		let gatekeeper = TokenGatekeeper::new(pipeline, authenticator.clone(), clock);

		Ok(Self { authenticator, gatekeeper })
	}

	/// OAuth authenticator backing this client.
	pub fn authenticator(&self) -> &Arc<RedditAuthenticator<T>> {
		&self.authenticator
	}

	/// Request pipeline backing this client.
	pub fn pipeline(&self) -> &Arc<RequestPipeline<T>> {
		self.gatekeeper.pipeline()
	}

	/// Obtains a token with the grant matching the current mode.
	pub async fn authenticate(&self) -> Result<()> {
		let token = self.authenticator.authenticate().await;

		self.install(token)
	}

	/// Returns `true` when a valid, unexpired token is held.
	pub fn is_authenticated(&self) -> bool {
		self.authenticator.is_authenticated()
	}

	/// Returns `true` in application-only mode.
	pub fn is_read_only(&self) -> bool {
		self.authenticator.is_read_only()
	}

	/// Switches between script and application-only mode.
	///
	/// Changing the mode re-authenticates immediately; on failure the new mode stays selected and
	/// the client is left unauthenticated.
	pub async fn set_read_only(&self, read_only: bool) -> Result<()> {
		if self.authenticator.set_read_only(read_only) == read_only {
			return Ok(());
		}

		self.authenticate().await
	}

	/// Revokes the current token and stops sending it.
	pub async fn revoke(&self) -> Result<()> {
		self.authenticator.revoke().await?;
		self.pipeline().set_access_token(None);

		Ok(())
	}

	/// Runs a raw request through the gatekeeper and pipeline.
	pub async fn execute(&self, request: &RequestDescriptor) -> ResponseOutcome {
		self.gatekeeper.execute(request).await
	}

	/// `GET path?query`, returning the body.
	pub async fn get<I, K, V>(&self, path: &str, query: I) -> Result<String>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		self.fetch(RequestDescriptor::get(path).with_query_pairs(query)).await
	}

	/// `POST path` with a form body, returning the response body.
	pub async fn post<I, K, V>(&self, path: &str, form: I) -> Result<String>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		self.fetch(RequestDescriptor::post(path, form)).await
	}

	/// `PUT path` with a form body, returning the response body.
	pub async fn put<I, K, V>(&self, path: &str, form: I) -> Result<String>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		self.fetch(RequestDescriptor::put(path, form)).await
	}

	/// `DELETE path`, returning the response body.
	pub async fn delete(&self, path: &str) -> Result<String> {
		self.fetch(RequestDescriptor::delete(path)).await
	}

	/// Fetches a post by id.
	pub async fn submission(&self, id: &str) -> Result<Submission> {
		let id = ThingId::new(id)?;
		let mut listings = self.thread_listings(&id, None).await?.into_iter();
		let post = listings.next().map(Listing::<Submission>::from_raw).transpose()?;

		post.and_then(Listing::into_first)
			.ok_or_else(|| Error::NotFound { fullname: Fullname::new(Kind::Link, id).to_string() })
	}

	/// Fetches a post and up to `limit` top-level comments with their loaded replies.
	pub async fn comments(&self, id: &str, limit: u32) -> Result<SubmissionThread> {
		let id = ThingId::new(id)?;
		let mut listings = self.thread_listings(&id, Some(limit)).await?.into_iter();
		let submission = listings
			.next()
			.map(Listing::<Submission>::from_raw)
			.transpose()?
			.and_then(Listing::into_first)
			.ok_or_else(|| Error::NotFound {
				fullname: Fullname::new(Kind::Link, id).to_string(),
			})?;
		let comments =
			listings.next().map(Listing::<Comment>::from_raw).transpose()?.unwrap_or_default();

		Ok(SubmissionThread { submission, comments })
	}

	/// Fetches the post a `.../comments/<id>/...` URL points at.
	pub async fn submission_by_url(&self, url: &str) -> Result<Submission> {
		let id = submission_id_from_url(url).ok_or_else(|| Error::InvalidInput {
			reason: format!("`{url}` does not contain a /comments/<id> segment"),
		})?;

		self.submission(id).await
	}

	/// Fetches a single comment by id.
	pub async fn comment(&self, id: &str) -> Result<Comment> {
		let fullname = Fullname::new(Kind::Comment, ThingId::new(id)?).to_string();
		let body = self.get("/api/info", [("id", fullname.as_str())]).await?;

		Listing::<Comment>::from_json(&body)?.into_first().ok_or(Error::NotFound { fullname })
	}

	/// Fetches the authenticated account.
	pub async fn me(&self) -> Result<Redditor> {
		if self.is_read_only() {
			return Err(Error::ReadOnly);
		}
		if !self.authenticator.current_token().valid {
			return Err(Error::NotAuthenticated);
		}

		let body = self.fetch(RequestDescriptor::get("/api/v1/me")).await?;

		parse_json(&body)
	}

	/// Handle for a subreddit.
	pub fn subreddit(&self, name: &str) -> Result<SubredditHandle<'_, T>> {
		Ok(SubredditHandle { reddit: self, name: SubredditName::new(name)? })
	}

	/// Handle for an account.
	pub fn redditor(&self, name: &str) -> Result<RedditorHandle<'_, T>> {
		Ok(RedditorHandle { reddit: self, name: Username::new(name)? })
	}

	/// Handle for a post (`t3_…`) or comment (`t1_…`) addressed by fullname.
	pub fn thing(&self, fullname: &str) -> Result<ThingHandle<'_, T>> {
		let fullname = fullname.parse::<Fullname>()?;

		if !matches!(fullname.kind(), Kind::Link | Kind::Comment) {
			return Err(Error::InvalidInput {
				reason: format!("`{fullname}` is neither a post nor a comment"),
			});
		}

		Ok(ThingHandle { reddit: self, fullname })
	}

	async fn fetch(&self, request: RequestDescriptor) -> Result<String> {
		self.execute(&request).await.into_result()
	}

	async fn write<I, K, V>(&self, path: &str, form: I) -> Result<()>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		if self.is_read_only() {
			return Err(Error::ReadOnly);
		}

		self.post(path, form).await.map(drop)
	}

	async fn thread_listings(&self, id: &ThingId, limit: Option<u32>) -> Result<Vec<RawListing>> {
		let mut request = RequestDescriptor::get(format!("/comments/{id}"));

		if let Some(limit) = limit {
			request = request.with_query_pairs([("limit", limit.to_string())]);
		}

		parse_json(&self.fetch(request).await?)
	}

	fn install(&self, token: Result<Token, AuthError>) -> Result<()> {
		match token {
			Ok(token) => {
				self.gatekeeper.install(&token);

				Ok(())
			},
			Err(e) => {
				self.pipeline().set_access_token(None);

				Err(e.into())
			},
		}
	}
}
#[cfg(feature = "reqwest")]
impl Reddit<ReqwestTransport> {
	/// Builds an unauthenticated client over reqwest and the system clock.
	pub fn new(config: RedditConfig) -> Result<Self> {
		let transport = Arc::new(ReqwestTransport::from_config(&config.request)?);

		Self::with_transport(config, transport, Arc::new(SystemClock))
	}

	/// Builds a client and authenticates it.
	pub async fn connect(config: RedditConfig) -> Result<Self> {
		let reddit = Self::new(config)?;

		reddit.authenticate().await?;

		Ok(reddit)
	}
}
impl<T> Debug for Reddit<T>
where
	T: ?Sized + Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Reddit")
			.field("authenticator", &self.authenticator)
			.field("pipeline", self.pipeline())
			.finish()
	}
}

/// Operations on one subreddit.
#[derive(Debug)]
pub struct SubredditHandle<'a, T>
where
	T: ?Sized + Transport,
{
	reddit: &'a Reddit<T>,
	name: SubredditName,
}
impl<T> SubredditHandle<'_, T>
where
	T: ?Sized + Transport,
{
	/// Display name.
	pub fn name(&self) -> &SubredditName {
		&self.name
	}

	/// Hot posts.
	pub async fn hot(&self, limit: u32) -> Result<Listing<Submission>> {
		self.listing("hot", limit, None).await
	}

	/// Newest posts.
	#[allow(clippy::new_ret_no_self)]
	pub async fn new(&self, limit: u32) -> Result<Listing<Submission>> {
		self.listing("new", limit, None).await
	}

	/// Top posts within `time_filter`.
	pub async fn top(&self, time_filter: TimeFilter, limit: u32) -> Result<Listing<Submission>> {
		self.listing("top", limit, Some(time_filter)).await
	}

	/// Rising posts.
	pub async fn rising(&self, limit: u32) -> Result<Listing<Submission>> {
		self.listing("rising", limit, None).await
	}

	/// Controversial posts within `time_filter`.
	pub async fn controversial(
		&self,
		time_filter: TimeFilter,
		limit: u32,
	) -> Result<Listing<Submission>> {
		self.listing("controversial", limit, Some(time_filter)).await
	}

	/// Fetches the about page.
	pub async fn fetch(&self) -> Result<Subreddit> {
		let body =
			self.reddit.fetch(RequestDescriptor::get(format!("/r/{}/about", self.name))).await?;

		parse_thing(&body)
	}

	/// Submits a self post.
	pub async fn submit_text(&self, title: &str, text: &str) -> Result<()> {
		require_text("title", title)?;

		self.reddit
			.write(
				"/api/submit",
				[("sr", self.name.as_str()), ("kind", "self"), ("title", title), ("text", text)],
			)
			.await
	}

	/// Submits a link post.
	pub async fn submit_link(&self, title: &str, url: &str) -> Result<()> {
		require_text("title", title)?;
		require_text("url", url)?;

		self.reddit
			.write(
				"/api/submit",
				[("sr", self.name.as_str()), ("kind", "link"), ("title", title), ("url", url)],
			)
			.await
	}

	/// Subscribes the authenticated account.
	pub async fn subscribe(&self) -> Result<()> {
		self.subscription("sub").await
	}

	/// Unsubscribes the authenticated account.
	pub async fn unsubscribe(&self) -> Result<()> {
		self.subscription("unsub").await
	}

	async fn subscription(&self, action: &str) -> Result<()> {
		self.reddit
			.write("/api/subscribe", [("action", action), ("sr_name", self.name.as_str())])
			.await
	}

	async fn listing(
		&self,
		sort: &str,
		limit: u32,
		time_filter: Option<TimeFilter>,
	) -> Result<Listing<Submission>> {
		let mut query = vec![("limit", limit.to_string())];

		if let Some(time_filter) = time_filter {
			query.push(("t", time_filter.to_string()));
		}

		let body = self.reddit.get(&format!("/r/{}/{sort}", self.name), query).await?;

		Listing::from_json(&body)
	}
}

/// Operations on one account.
#[derive(Debug)]
pub struct RedditorHandle<'a, T>
where
	T: ?Sized + Transport,
{
	reddit: &'a Reddit<T>,
	name: Username,
}
impl<T> RedditorHandle<'_, T>
where
	T: ?Sized + Transport,
{
	/// Username.
	pub fn name(&self) -> &Username {
		&self.name
	}

	/// Fetches the account's about page.
	pub async fn fetch(&self) -> Result<Redditor> {
		let body =
			self.reddit.fetch(RequestDescriptor::get(format!("/user/{}/about", self.name))).await?;

		parse_thing(&body)
	}

	/// Posts submitted by the account.
	pub async fn submissions(&self, limit: u32) -> Result<Listing<Submission>> {
		Listing::from_json(&self.content("submitted", limit).await?)
	}

	/// Comments written by the account.
	pub async fn comments(&self, limit: u32) -> Result<Listing<Comment>> {
		Listing::from_json(&self.content("comments", limit).await?)
	}

	async fn content(&self, kind: &str, limit: u32) -> Result<String> {
		self.reddit
			.get(&format!("/user/{}/{kind}", self.name), [("limit", limit.to_string())])
			.await
	}
}

/// Actions on a post or comment.
#[derive(Debug)]
pub struct ThingHandle<'a, T>
where
	T: ?Sized + Transport,
{
	reddit: &'a Reddit<T>,
	fullname: Fullname,
}
impl<T> ThingHandle<'_, T>
where
	T: ?Sized + Transport,
{
	/// Target fullname.
	pub fn fullname(&self) -> &Fullname {
		&self.fullname
	}

	/// Casts an upvote.
	pub async fn upvote(&self) -> Result<()> {
		self.vote(1).await
	}

	/// Casts a downvote.
	pub async fn downvote(&self) -> Result<()> {
		self.vote(-1).await
	}

	/// Withdraws any vote.
	pub async fn clear_vote(&self) -> Result<()> {
		self.vote(0).await
	}

	/// Saves to the account's saved list.
	pub async fn save(&self) -> Result<()> {
		self.reddit.write("/api/save", [("id", self.fullname.to_string())]).await
	}

	/// Removes from the account's saved list.
	pub async fn unsave(&self) -> Result<()> {
		self.reddit.write("/api/unsave", [("id", self.fullname.to_string())]).await
	}

	/// Posts a reply.
	pub async fn reply(&self, text: &str) -> Result<()> {
		require_text("reply text", text)?;

		self.reddit
			.write(
				"/api/comment",
				[("thing_id", self.fullname.to_string().as_str()), ("text", text)],
			)
			.await
	}

	/// Replaces the body of a self post or comment.
	pub async fn edit(&self, text: &str) -> Result<()> {
		require_text("edit text", text)?;

		self.reddit
			.write(
				"/api/editusertext",
				[("thing_id", self.fullname.to_string().as_str()), ("text", text)],
			)
			.await
	}

	/// Deletes the post or comment.
	pub async fn delete(&self) -> Result<()> {
		self.reddit.write("/api/del", [("id", self.fullname.to_string())]).await
	}

	async fn vote(&self, dir: i8) -> Result<()> {
		self.reddit
			.write("/api/vote", [("id", self.fullname.to_string()), ("dir", dir.to_string())])
			.await
	}
}

fn require_text(field: &str, value: &str) -> Result<()> {
	if value.trim().is_empty() {
		return Err(Error::InvalidInput { reason: format!("{field} must not be empty") });
	}

	Ok(())
}
