//! Link and self posts.

// self
use crate::{
	_prelude::*,
	models::{Comment, Kind, Listing, Thing, null_default},
};

/// A post (`t3`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Submission {
	/// Identifier without prefix.
	#[serde(default, deserialize_with = "null_default")]
	pub id: String,
	/// Post title.
	#[serde(default, deserialize_with = "null_default")]
	pub title: String,
	/// Author's username, `[deleted]` for removed accounts.
	#[serde(default, deserialize_with = "null_default")]
	pub author: String,
	/// Subreddit display name.
	#[serde(default, deserialize_with = "null_default")]
	pub subreddit: String,
	/// Markdown body of a self post.
	#[serde(default, deserialize_with = "null_default")]
	pub selftext: String,
	/// Link target, or the post's own URL for self posts.
	#[serde(default, deserialize_with = "null_default")]
	pub url: String,
	/// Domain of `url`.
	#[serde(default, deserialize_with = "null_default")]
	pub domain: String,
	/// Site-relative permalink.
	#[serde(default, deserialize_with = "null_default")]
	pub permalink: String,
	/// Net score.
	#[serde(default, deserialize_with = "null_default")]
	pub score: i64,
	/// Share of upvotes in `[0, 1]`.
	#[serde(default, deserialize_with = "null_default")]
	pub upvote_ratio: f64,
	/// Comment count.
	#[serde(default, deserialize_with = "null_default")]
	pub num_comments: u64,
	/// NSFW flag.
	#[serde(default, deserialize_with = "null_default")]
	pub over_18: bool,
	/// Spoiler flag.
	#[serde(default, deserialize_with = "null_default")]
	pub spoiler: bool,
	/// Locked against new comments.
	#[serde(default, deserialize_with = "null_default")]
	pub locked: bool,
	/// Pinned by moderators.
	#[serde(default, deserialize_with = "null_default")]
	pub stickied: bool,
	/// Self (text) post rather than a link.
	#[serde(default, deserialize_with = "null_default")]
	pub is_self: bool,
	/// Creation time, Unix seconds.
	#[serde(default, deserialize_with = "null_default")]
	pub created_utc: f64,
}
impl Thing for Submission {
	const KIND: Kind = Kind::Link;

	fn id(&self) -> &str {
		&self.id
	}

	fn created_utc_secs(&self) -> f64 {
		self.created_utc
	}
}

/// A submission together with one page of its top-level comments.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubmissionThread {
	/// The post.
	pub submission: Submission,
	/// Top-level comments, each carrying its loaded replies.
	pub comments: Listing<Comment>,
}

/// Extracts the id that follows `/comments/` in a Reddit post URL.
pub fn submission_id_from_url(url: &str) -> Option<&str> {
	let (_, rest) = url.split_once("/comments/")?;
	let id = rest.split(['/', '?', '#']).next()?;

	(!id.is_empty()).then_some(id)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::*, models::parse_thing};

	#[test]
	fn submission_decodes_fields() {
		let body = r#"{"kind":"t3","data":{
			"id":"1abcde","title":"Hello","author":"spez","subreddit":"rust",
			"selftext":null,"url":"https://example.com","domain":"example.com",
			"permalink":"/r/rust/comments/1abcde/hello/","score":42,"upvote_ratio":0.97,
			"num_comments":7,"over_18":false,"is_self":false,"created_utc":1740830400.0
		}}"#;
		let post = parse_thing::<Submission>(body).expect("Submission fixture should parse.");

		assert_eq!(post.title, "Hello");
		assert_eq!(post.selftext, "");
		assert_eq!(post.score, 42);
		assert_eq!(post.num_comments, 7);
		assert_eq!(post.fullname().map(|name| name.to_string()).as_deref(), Some("t3_1abcde"));
		assert_eq!(post.created_utc(), Some(datetime!(2025-03-01 12:00 UTC)));
	}

	#[test]
	fn id_extraction_from_urls() {
		assert_eq!(
			submission_id_from_url("https://www.reddit.com/r/rust/comments/abc123/some_title/"),
			Some("abc123")
		);
		assert_eq!(
			submission_id_from_url("https://reddit.com/comments/xyz?context=3"),
			Some("xyz")
		);
		assert_eq!(submission_id_from_url("https://www.reddit.com/r/rust/"), None);
		assert_eq!(submission_id_from_url("https://www.reddit.com/comments/"), None);
	}
}
