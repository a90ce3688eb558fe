//! Platform authentication.
//!
//! [`IdentityResolver`] turns an `Authorization` header into a verified
//! [`IdentityClaim`]; [`ProfileLoader`] maps the claim's subject onto the
//! caller's [`UserProfile`]. Tokens are issued elsewhere; nothing here mints
//! or refreshes them.

mod error;
mod key_set;
mod profile;
mod resolver;
mod settings;

pub use error::AuthnError;
pub use key_set::{HttpKeySetSource, KeySetCache, KeySetSource, StaticKeySetSource};
pub use profile::{ProfileLoader, UserProfile};
pub use resolver::{IdentityClaim, IdentityResolver, SigningAlgorithm, bearer_token};
pub use settings::AuthnSettings;
