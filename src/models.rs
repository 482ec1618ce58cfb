//! Typed Reddit objects decoded from API responses.
//!
//! Every record is deserialized from the `data` half of a `{"kind": ..., "data": ...}` envelope
//! after the kind tag has been checked, so a listing of comments can never silently decode as
//! submissions. Missing or `null` fields fall back to the field type's default. Parsing goes
//! through `serde_path_to_error`, and failures report the JSON path that broke.

pub mod comment;
pub mod id;
pub mod listing;
pub mod redditor;
pub mod submission;
pub mod subreddit;
pub mod thing;

pub use comment::*;
pub use id::*;
pub use listing::*;
pub use redditor::*;
pub use submission::*;
pub use subreddit::*;
pub use thing::*;

// crates.io
use serde::{Deserializer, de::DeserializeOwned};
// self
use crate::_prelude::*;

/// Time window accepted by the `top` and `controversial` listings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeFilter {
	/// Past hour.
	Hour,
	/// Past day.
	#[default]
	Day,
	/// Past week.
	Week,
	/// Past month.
	Month,
	/// Past year.
	Year,
	/// All time.
	All,
}
impl TimeFilter {
	/// Returns the `t` query value.
	pub const fn as_str(self) -> &'static str {
		match self {
			TimeFilter::Hour => "hour",
			TimeFilter::Day => "day",
			TimeFilter::Week => "week",
			TimeFilter::Month => "month",
			TimeFilter::Year => "year",
			TimeFilter::All => "all",
		}
	}
}
impl Display for TimeFilter {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for TimeFilter {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"hour" => Ok(Self::Hour),
			"day" => Ok(Self::Day),
			"week" => Ok(Self::Week),
			"month" => Ok(Self::Month),
			"year" => Ok(Self::Year),
			"all" => Ok(Self::All),
			other => Err(Error::InvalidInput { reason: format!("unknown time filter `{other}`") }),
		}
	}
}

/// Decodes `body` into `T`, reporting the failing JSON path on error.
pub fn parse_json<T>(body: &str) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_str(body);

	Ok(serde_path_to_error::deserialize(&mut deserializer)?)
}

/// Decodes a single `{"kind", "data"}` envelope, checking the kind tag first.
pub fn parse_thing<T>(body: &str) -> Result<T>
where
	T: Thing,
{
	parse_json::<RawThing>(body)?.into_thing()
}

/// Treats an explicit JSON `null` like a missing field.
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + Deserialize<'de>,
{
	Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn time_filter_parses_and_defaults_to_day() {
		assert_eq!(TimeFilter::default(), TimeFilter::Day);
		assert_eq!(
			"WEEK".parse::<TimeFilter>().expect("Uppercase filter should parse."),
			TimeFilter::Week
		);
		assert!(matches!("decade".parse::<TimeFilter>(), Err(Error::InvalidInput { .. })));
	}

	#[test]
	fn parse_errors_carry_the_json_path() {
		let err = parse_thing::<Submission>(r#"{"kind":"t3","data":{"id":"abc","score":"high"}}"#)
			.expect_err("A string score must be rejected.");

		assert!(matches!(&err, Error::Parse { source } if source.path().to_string() == "score"));
	}

	#[test]
	fn envelope_kind_must_match() {
		let err = parse_thing::<Comment>(r#"{"kind":"t3","data":{"id":"abc"}}"#)
			.expect_err("A link envelope must not decode as a comment.");

		assert!(matches!(
			err,
			Error::UnexpectedKind { expected: Kind::Comment, ref actual } if actual == "t3"
		));
	}
}
