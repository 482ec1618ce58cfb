//! Kind prefixes, fullnames, and the capability shared by every Reddit object.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	models::{IdentifierError, ThingId},
};

/// Type prefix of a fullname.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
	/// `t1`
	#[serde(rename = "t1")]
	Comment,
	/// `t2`
	#[serde(rename = "t2")]
	Account,
	/// `t3`
	#[serde(rename = "t3")]
	Link,
	/// `t4`
	#[serde(rename = "t4")]
	Message,
	/// `t5`
	#[serde(rename = "t5")]
	Subreddit,
	/// `t6`
	#[serde(rename = "t6")]
	Award,
}
impl Kind {
	/// Returns the wire prefix.
	pub const fn as_str(self) -> &'static str {
		match self {
			Kind::Comment => "t1",
			Kind::Account => "t2",
			Kind::Link => "t3",
			Kind::Message => "t4",
			Kind::Subreddit => "t5",
			Kind::Award => "t6",
		}
	}
}
impl Display for Kind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Kind {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"t1" => Ok(Kind::Comment),
			"t2" => Ok(Kind::Account),
			"t3" => Ok(Kind::Link),
			"t4" => Ok(Kind::Message),
			"t5" => Ok(Kind::Subreddit),
			"t6" => Ok(Kind::Award),
			other => Err(IdentifierError::InvalidFullname { value: other.to_owned() }),
		}
	}
}

/// Kind-qualified identifier such as `t3_abc123`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fullname {
	kind: Kind,
	id: ThingId,
}
impl Fullname {
	/// Combines a kind and an id.
	pub fn new(kind: Kind, id: ThingId) -> Self {
		Self { kind, id }
	}

	/// Kind prefix.
	pub fn kind(&self) -> Kind {
		self.kind
	}

	/// Identifier without the prefix.
	pub fn id(&self) -> &ThingId {
		&self.id
	}
}
impl Debug for Fullname {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Fullname({self})")
	}
}
impl Display for Fullname {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}_{}", self.kind, self.id)
	}
}
impl FromStr for Fullname {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let invalid = || IdentifierError::InvalidFullname { value: s.to_owned() };
		let (prefix, id) = s.split_once('_').ok_or_else(invalid)?;
		let kind = prefix.parse::<Kind>().map_err(|_| invalid())?;
		let id = ThingId::new(id).map_err(|_| invalid())?;

		Ok(Self { kind, id })
	}
}
impl TryFrom<String> for Fullname {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}
impl From<Fullname> for String {
	fn from(value: Fullname) -> Self {
		value.to_string()
	}
}

/// Capability shared by every record carried in a `{"kind", "data"}` envelope.
pub trait Thing
where
	Self: Sized + DeserializeOwned,
{
	/// Kind tag this record is stored under.
	const KIND: Kind;

	/// Identifier without the kind prefix.
	fn id(&self) -> &str;

	/// Creation time in seconds since the Unix epoch, as Reddit reports it.
	fn created_utc_secs(&self) -> f64;

	/// Kind-qualified identifier, `None` when the record carried no usable id.
	fn fullname(&self) -> Option<Fullname> {
		ThingId::new(self.id()).ok().map(|id| Fullname::new(Self::KIND, id))
	}

	/// Creation instant, `None` when absent or out of range.
	fn created_utc(&self) -> Option<OffsetDateTime> {
		let secs = self.created_utc_secs();

		if !secs.is_finite() || secs <= 0. {
			return None;
		}

		OffsetDateTime::from_unix_timestamp(secs.trunc() as i64).ok()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn fullnames_parse_and_render() {
		let fullname = "t3_abc123".parse::<Fullname>().expect("Link fullname should parse.");

		assert_eq!(fullname.kind(), Kind::Link);
		assert_eq!(fullname.id().as_str(), "abc123");
		assert_eq!(fullname.to_string(), "t3_abc123");
		assert_eq!(
			"t1_".parse::<Fullname>(),
			Err(IdentifierError::InvalidFullname { value: "t1_".into() })
		);
		assert!("t9_abc".parse::<Fullname>().is_err());
		assert!("abc123".parse::<Fullname>().is_err());
	}

	#[test]
	fn kinds_serialize_as_prefixes() {
		assert_eq!(
			serde_json::to_string(&Kind::Subreddit).expect("Kind should serialize."),
			"\"t5\""
		);
		assert_eq!(Kind::Award.to_string(), "t6");
		assert_eq!("t2".parse::<Kind>(), Ok(Kind::Account));
	}
}
