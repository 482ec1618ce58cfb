//! Logs into Reddit with a script app's password grant and prints the account summary.
//!
//! Credentials come from `REDDIT_CLIENT_ID`, `REDDIT_CLIENT_SECRET`, `REDDIT_USERNAME`,
//! `REDDIT_PASSWORD`, and optionally `REDDIT_USER_AGENT`.

// crates.io
use color_eyre::Result;
// self
use reddit_relay::{
	ReqwestReddit,
	config::{AuthConfig, RedditConfig},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = RedditConfig::builder(AuthConfig::from_env()?).build()?;
	let reddit = ReqwestReddit::connect(config).await?;
	let me = reddit.me().await?;

	println!(
		"Logged in as u/{} ({} link / {} comment karma).",
		me.name, me.link_karma, me.comment_karma
	);

	for post in &reddit.redditor(&me.name)?.submissions(5).await? {
		println!("- {} in r/{}", post.title, post.subreddit);
	}

	reddit.revoke().await?;

	Ok(())
}
