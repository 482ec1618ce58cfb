//! Comments and their reply trees.

// self
use crate::{
	_prelude::*,
	models::{Kind, Listing, Thing, listing::nested_listing, null_default},
};

/// A comment (`t1`).
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Comment {
	/// Identifier without prefix.
	#[serde(default, deserialize_with = "null_default")]
	pub id: String,
	/// Markdown body.
	#[serde(default, deserialize_with = "null_default")]
	pub body: String,
	/// Author's username.
	#[serde(default, deserialize_with = "null_default")]
	pub author: String,
	/// Subreddit display name.
	#[serde(default, deserialize_with = "null_default")]
	pub subreddit: String,
	/// Fullname of the parent comment or post.
	#[serde(default, deserialize_with = "null_default")]
	pub parent_id: String,
	/// Fullname of the post this comment belongs to.
	#[serde(default, deserialize_with = "null_default")]
	pub link_id: String,
	/// Site-relative permalink.
	#[serde(default, deserialize_with = "null_default")]
	pub permalink: String,
	/// Net score.
	#[serde(default, deserialize_with = "null_default")]
	pub score: i64,
	/// Nesting depth, `0` for top-level comments.
	#[serde(default, deserialize_with = "null_default")]
	pub depth: u32,
	/// Written by the post's author.
	#[serde(default, deserialize_with = "null_default")]
	pub is_submitter: bool,
	/// Score is hidden by the subreddit.
	#[serde(default, deserialize_with = "null_default")]
	pub score_hidden: bool,
	/// Creation time, Unix seconds.
	#[serde(default, deserialize_with = "null_default")]
	pub created_utc: f64,
	/// Loaded replies; Reddit sends `""` when there are none.
	#[serde(default, deserialize_with = "nested_listing")]
	pub replies: Listing<Comment>,
}
impl Thing for Comment {
	const KIND: Kind = Kind::Comment;

	fn id(&self) -> &str {
		&self.id
	}

	fn created_utc_secs(&self) -> f64 {
		self.created_utc
	}
}
