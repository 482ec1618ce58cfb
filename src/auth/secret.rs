//! Redacting wrapper for access tokens, client secrets, and passwords.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
// self
use crate::_prelude::*;

/// Sensitive string that never shows up in `Debug` or `Display` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);
impl Secret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` when the secret is empty or whitespace.
	pub fn is_blank(&self) -> bool {
		self.0.trim().is_empty()
	}

	/// `Authorization` value presenting this secret as an access token.
	pub fn bearer_header(&self) -> String {
		format!("Bearer {}", self.0)
	}

	/// `Authorization` value for HTTP Basic client authentication with this secret as password.
	pub fn basic_header(&self, client_id: &str) -> String {
		format!("Basic {}", STANDARD.encode(format!("{client_id}:{}", self.0)))
	}
}
impl AsRef<str> for Secret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Secret").field(&"<redacted>").finish()
	}
}
impl Display for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = Secret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "Secret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
		assert_eq!(secret.expose(), "super-secret");
	}

	#[test]
	fn secret_serializes_as_plain_string() {
		let secret: Secret =
			serde_json::from_str("\"hunter2\"").expect("Secret should deserialize from a string.");

		assert_eq!(secret.expose(), "hunter2");
		assert!(Secret::new(" \t").is_blank());
	}

	#[test]
	fn authorization_headers() {
		assert_eq!(Secret::new("tok-1").bearer_header(), "Bearer tok-1");
		assert_eq!(Secret::new("csecret").basic_header("cid"), "Basic Y2lkOmNzZWNyZXQ=");
	}
}
