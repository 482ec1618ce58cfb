//! Accounts.

// self
use crate::{
	_prelude::*,
	models::{Kind, Thing, null_default},
};

/// An account (`t2`).
///
/// `/user/{name}/about` wraps it in an envelope while `/api/v1/me` returns the bare object; both
/// decode into this type.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Redditor {
	/// Identifier without prefix.
	#[serde(default, deserialize_with = "null_default")]
	pub id: String,
	/// Username.
	#[serde(default, deserialize_with = "null_default")]
	pub name: String,
	/// Karma from posts.
	#[serde(default, deserialize_with = "null_default")]
	pub link_karma: i64,
	/// Karma from comments.
	#[serde(default, deserialize_with = "null_default")]
	pub comment_karma: i64,
	/// Email address is verified.
	#[serde(default, deserialize_with = "null_default")]
	pub has_verified_email: bool,
	/// Premium member.
	#[serde(default, deserialize_with = "null_default")]
	pub is_gold: bool,
	/// Moderates at least one subreddit.
	#[serde(default, deserialize_with = "null_default")]
	pub is_mod: bool,
	/// Reddit employee.
	#[serde(default, deserialize_with = "null_default")]
	pub is_employee: bool,
	/// Creation time, Unix seconds.
	#[serde(default, deserialize_with = "null_default")]
	pub created_utc: f64,
}
impl Thing for Redditor {
	const KIND: Kind = Kind::Account;

	fn id(&self) -> &str {
		&self.id
	}

	fn created_utc_secs(&self) -> f64 {
		self.created_utc
	}
}
