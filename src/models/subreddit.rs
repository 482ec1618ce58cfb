//! Community metadata.

// self
use crate::{
	_prelude::*,
	models::{Kind, Thing, null_default},
};

/// A community (`t5`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Subreddit {
	/// Identifier without prefix.
	#[serde(default, deserialize_with = "null_default")]
	pub id: String,
	/// Name used in URLs.
	#[serde(default, deserialize_with = "null_default")]
	pub display_name: String,
	/// Title shown in the header.
	#[serde(default, deserialize_with = "null_default")]
	pub title: String,
	/// Sidebar markdown.
	#[serde(default, deserialize_with = "null_default")]
	pub description: String,
	/// Short public description.
	#[serde(default, deserialize_with = "null_default")]
	pub public_description: String,
	/// Subscriber count.
	#[serde(default, deserialize_with = "null_default")]
	pub subscribers: u64,
	/// Users active right now.
	#[serde(default, alias = "accounts_active", deserialize_with = "null_default")]
	pub active_user_count: u64,
	/// NSFW flag.
	#[serde(default, deserialize_with = "null_default")]
	pub over18: bool,
	/// Whether the authenticated user is subscribed.
	#[serde(default, deserialize_with = "null_default")]
	pub user_is_subscriber: bool,
	/// Creation time, Unix seconds.
	#[serde(default, deserialize_with = "null_default")]
	pub created_utc: f64,
}
impl Thing for Subreddit {
	const KIND: Kind = Kind::Subreddit;

	fn id(&self) -> &str {
		&self.id
	}

	fn created_utc_secs(&self) -> f64 {
		self.created_utc
	}
}
