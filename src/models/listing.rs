//! Paginated listings and the raw envelopes they are decoded from.

// crates.io
use serde::{Deserializer, de::Error as _};
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	models::Thing,
};

/// Kind tag of the "load more comments" placeholder Reddit mixes into comment trees.
const MORE_KIND: &str = "more";

/// Undecoded `{"kind", "data"}` envelope.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RawThing {
	/// Kind tag, e.g. `t3` or `Listing`.
	pub kind: String,
	/// Payload, decoded once the kind is known.
	#[serde(default)]
	pub data: Value,
}
impl RawThing {
	/// Decodes the payload as `T` after checking the kind tag.
	pub fn into_thing<T>(self) -> Result<T>
	where
		T: Thing,
	{
		if self.kind != T::KIND.as_str() {
			return Err(Error::UnexpectedKind { expected: T::KIND, actual: self.kind });
		}

		Ok(serde_path_to_error::deserialize(self.data)?)
	}
}

/// Undecoded listing envelope.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RawListing {
	/// Listing payload.
	#[serde(default)]
	pub data: RawListingData,
}

/// Children and cursors of a [`RawListing`].
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RawListingData {
	/// Envelopes in listing order.
	#[serde(default, deserialize_with = "crate::models::null_default")]
	pub children: Vec<RawThing>,
	/// Cursor for the next page.
	#[serde(default)]
	pub after: Option<String>,
	/// Cursor for the previous page.
	#[serde(default)]
	pub before: Option<String>,
}

/// One page of records of a single kind.
#[derive(Clone, Debug, PartialEq)]
pub struct Listing<T> {
	/// Records in listing order.
	pub children: Vec<T>,
	/// Pass as `after` to fetch the next page.
	pub after: Option<String>,
	/// Pass as `before` to fetch the previous page.
	pub before: Option<String>,
}
impl<T> Listing<T>
where
	T: Thing,
{
	/// Decodes a listing response body.
	pub fn from_json(body: &str) -> Result<Self> {
		Self::from_raw(crate::models::parse_json(body)?)
	}

	/// Decodes every child of `raw`; "more" placeholders are skipped.
	pub fn from_raw(raw: RawListing) -> Result<Self> {
		let RawListingData { children, after, before } = raw.data;
		let children = children
			.into_iter()
			.filter(|child| child.kind != MORE_KIND)
			.map(RawThing::into_thing)
			.collect::<Result<Vec<T>>>()?;

		Ok(Self { children, after: non_empty(after), before: non_empty(before) })
	}
}
impl<T> Listing<T> {
	/// Number of records on this page.
	pub fn len(&self) -> usize {
		self.children.len()
	}

	/// Returns `true` when the page holds no records.
	pub fn is_empty(&self) -> bool {
		self.children.is_empty()
	}

	/// Iterates over the records.
	pub fn iter(&self) -> std::slice::Iter<'_, T> {
		self.children.iter()
	}

	/// Takes the first record.
	pub fn into_first(self) -> Option<T> {
		self.children.into_iter().next()
	}
}
impl<T> Default for Listing<T> {
	fn default() -> Self {
		Self { children: Vec::new(), after: None, before: None }
	}
}
impl<T> IntoIterator for Listing<T> {
	type IntoIter = std::vec::IntoIter<T>;
	type Item = T;

	fn into_iter(self) -> Self::IntoIter {
		self.children.into_iter()
	}
}
impl<'a, T> IntoIterator for &'a Listing<T> {
	type IntoIter = std::slice::Iter<'a, T>;
	type Item = &'a T;

	fn into_iter(self) -> Self::IntoIter {
		self.children.iter()
	}
}

/// Decodes a nested listing that Reddit sends as `""` when it is empty, e.g. comment replies.
pub(crate) fn nested_listing<'de, D, T>(deserializer: D) -> Result<Listing<T>, D::Error>
where
	D: Deserializer<'de>,
	T: Thing,
{
	match Value::deserialize(deserializer)? {
		value @ Value::Object(_) => {
			let raw = RawListing::deserialize(value).map_err(D::Error::custom)?;

			Listing::from_raw(raw).map_err(D::Error::custom)
		},
		_ => Ok(Listing::default()),
	}
}

fn non_empty(cursor: Option<String>) -> Option<String> {
	cursor.filter(|cursor| !cursor.is_empty())
}
