//! Tokens, credential providers, and the Reddit OAuth authenticator.

pub mod provider;
pub mod reddit;
pub mod secret;
pub mod token;

pub use provider::*;
pub use reddit::*;
pub use secret::*;
pub use token::*;
