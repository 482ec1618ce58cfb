//! Fetches a subreddit's hot listing in read-only mode against a local mock of Reddit, so the
//! whole authenticate-then-list round trip runs offline.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use reddit_relay::{
	ReqwestReddit,
	config::{AuthConfig, RedditConfig},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/access_token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let listing_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/r/rust/hot").header("authorization", "Bearer demo-access");
			then.status(200).header("content-type", "application/json").body(
				"{\"kind\":\"Listing\",\"data\":{\"after\":\"t3_b2\",\"children\":[\
				{\"kind\":\"t3\",\"data\":{\"id\":\"a1\",\"title\":\"Announcing Rust 1.90\",\"score\":812}},\
				{\"kind\":\"t3\",\"data\":{\"id\":\"b2\",\"title\":\"What are you working on?\",\"score\":45}}]}}",
			);
		})
		.await;
	let auth = AuthConfig::read_only("demo-client", "demo-secret").with_user_agent("hot-posts/0.1");
	let config = RedditConfig::builder(auth).origin(&server.base_url())?.build()?;
	let reddit = ReqwestReddit::connect(config).await?;
	let posts = reddit.subreddit("rust")?.hot(2).await?;

	for post in &posts {
		println!("[{:>4}] {} ({})", post.score, post.title, post.id);
	}

	println!("Next page cursor: {:?}.", posts.after);

	token_mock.assert_async().await;
	listing_mock.assert_async().await;

	Ok(())
}
