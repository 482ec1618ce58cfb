//! Validated names that end up inside API paths.
//!
//! Each type enforces Reddit's own character set, so a value that passes validation can be
//! spliced into `/r/{name}`, `/user/{name}`, or `/comments/{id}` without escaping.

// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal, $rule:expr) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			const RULE: NameRule = $rule;

			/// Validates `value` against the type's character set and length limit.
			pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
				let value = value.into();

				Self::RULE.check($kind, &value)?;

				Ok(Self(value))
			}

			/// Returns the name as a string slice.
			pub fn as_str(&self) -> &str {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				Self::new(value)
			}
		}
		impl TryFrom<&str> for $name {
			type Error = IdentifierError;

			fn try_from(value: &str) -> Result<Self, Self::Error> {
				Self::new(value)
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (thing, subreddit, user).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (thing, subreddit, user).
		kind: &'static str,
	},
	/// The identifier contains a path separator, usually a pasted `r/` or `u/` prefix.
	#[error("{kind} identifier contains `/`.")]
	ContainsSlash {
		/// Kind of identifier (thing, subreddit, user).
		kind: &'static str,
	},
	/// The identifier contains a character Reddit never uses for this kind.
	#[error("{kind} identifier contains the disallowed character `{character}`.")]
	InvalidCharacter {
		/// Kind of identifier (thing, subreddit, user).
		kind: &'static str,
		/// First offending character.
		character: char,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (thing, subreddit, user).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
	/// The value is not a `<kind>_<id>` fullname with a known kind prefix.
	#[error("`{value}` is not a valid fullname.")]
	InvalidFullname {
		/// Rejected input.
		value: String,
	},
}

#[derive(Clone, Copy)]
struct NameRule {
	max: usize,
	allowed: fn(char) -> bool,
}
impl NameRule {
	fn check(self, kind: &'static str, value: &str) -> Result<(), IdentifierError> {
		if value.is_empty() {
			return Err(IdentifierError::Empty { kind });
		}
		if value.chars().any(char::is_whitespace) {
			return Err(IdentifierError::ContainsWhitespace { kind });
		}
		if value.contains('/') {
			return Err(IdentifierError::ContainsSlash { kind });
		}
		if let Some(character) = value.chars().find(|c| !(self.allowed)(*c)) {
			return Err(IdentifierError::InvalidCharacter { kind, character });
		}
		if value.len() > self.max {
			return Err(IdentifierError::TooLong { kind, max: self.max });
		}

		Ok(())
	}
}

const THING_RULE: NameRule = NameRule { max: 13, allowed: is_base36 };
const SUBREDDIT_RULE: NameRule = NameRule { max: 128, allowed: is_subreddit_char };
const USER_RULE: NameRule = NameRule { max: 20, allowed: is_user_char };

def_id! {
	ThingId,
	"Base-36 identifier of a Reddit object, without its kind prefix.",
	"Thing",
	THING_RULE
}
def_id! {
	SubredditName,
	"Subreddit display name without the `r/` prefix; `a+b` names a multireddit.",
	"Subreddit",
	SUBREDDIT_RULE
}
def_id! { Username, "Account name without the `u/` prefix.", "User", USER_RULE }

fn is_base36(c: char) -> bool {
	c.is_ascii_digit() || c.is_ascii_lowercase()
}

fn is_subreddit_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '_' || c == '+'
}

fn is_user_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn names_reject_whitespace_and_prefixes() {
		assert!(SubredditName::new(" rust").is_err(), "Leading whitespace must be rejected.");
		assert!(SubredditName::new("rust ").is_err(), "Trailing whitespace must be rejected.");
		assert_eq!(
			SubredditName::new("r/rust"),
			Err(IdentifierError::ContainsSlash { kind: "Subreddit" })
		);
		assert_eq!(Username::new(""), Err(IdentifierError::Empty { kind: "User" }));
		assert_eq!(
			Username::new("spez?"),
			Err(IdentifierError::InvalidCharacter { kind: "User", character: '?' })
		);
	}

	#[test]
	fn each_kind_has_its_own_character_set() {
		let id = ThingId::new("1abcde").expect("Thing id fixture should be considered valid.");

		assert_eq!(id.as_str(), "1abcde");
		assert_eq!(format!("{id:?}"), "Thing(1abcde)");
		assert_eq!(
			ThingId::new("1ABC"),
			Err(IdentifierError::InvalidCharacter { kind: "Thing", character: 'A' })
		);
		assert!(SubredditName::new("rust+programming").is_ok(), "Multireddits must be accepted.");
		assert!(Username::new("some-user_42").is_ok());
		assert!(SubredditName::new("some-sub").is_err());
	}

	#[test]
	fn serde_enforces_validation() {
		let name: Username =
			serde_json::from_str("\"spez\"").expect("Username should deserialize successfully.");

		assert_eq!(name.as_ref(), "spez");
		assert!(serde_json::from_str::<Username>("\"with space\"").is_err());
		assert!(serde_json::from_str::<Username>("\"a/b\"").is_err());
	}

	#[test]
	fn unicode_whitespace_and_length_limits() {
		assert_eq!(
			ThingId::new("abc\u{00A0}def"),
			Err(IdentifierError::ContainsWhitespace { kind: "Thing" })
		);
		assert!(ThingId::new("z".repeat(13)).is_ok());
		assert_eq!(
			ThingId::new("z".repeat(14)),
			Err(IdentifierError::TooLong { kind: "Thing", max: 13 })
		);
		assert_eq!(
			Username::new("u".repeat(21)),
			Err(IdentifierError::TooLong { kind: "User", max: 20 })
		);
	}
}
