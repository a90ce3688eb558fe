use std::{fmt, time::Duration};

use crate::AuthnError;

const JWKS_PATH: &str = "/auth/v1/.well-known/jwks.json";
const DEFAULT_JWKS_TTL: Duration = Duration::from_secs(300);

/// Verification material for incoming bearer tokens.
#[derive(Clone)]
pub struct AuthnSettings {
    /// HS256 shared secret.
    pub jwt_secret: Option<String>,
    /// Published key set for RS256/ES256.
    pub jwks_url: Option<String>,
    /// Zero disables caching.
    pub jwks_cache_ttl: Duration,
}

impl Default for AuthnSettings {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            jwks_url: None,
            jwks_cache_ttl: DEFAULT_JWKS_TTL,
        }
    }
}

impl fmt::Debug for AuthnSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthnSettings")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("jwks_url", &self.jwks_url)
            .field("jwks_cache_ttl", &self.jwks_cache_ttl)
            .finish()
    }
}

impl AuthnSettings {
    /// Read `SUPABASE_JWT_SECRET`, `SUPABASE_PROJECT_URL`, `JWKS_URL` and
    /// `JWKS_CACHE_TTL_SECS` through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AuthnError> {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let jwt_secret = non_empty("SUPABASE_JWT_SECRET");
        let jwks_url = non_empty("JWKS_URL").or_else(|| {
            non_empty("SUPABASE_PROJECT_URL")
                .map(|project| format!("{}{}", project.trim().trim_end_matches('/'), JWKS_PATH))
        });
        let jwks_cache_ttl = match non_empty("JWKS_CACHE_TTL_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| {
                    AuthnError::Configuration(format!("invalid JWKS_CACHE_TTL_SECS: {raw}"))
                })?,
            None => DEFAULT_JWKS_TTL,
        };

        Ok(Self {
            jwt_secret,
            jwks_url,
            jwks_cache_ttl,
        })
    }

    /// Startup check: at least one verification path must be configured.
    pub fn ensure_usable(&self) -> Result<(), AuthnError> {
        if self.jwt_secret.is_none() && self.jwks_url.is_none() {
            return Err(AuthnError::Configuration(
                "no token verification configured: set SUPABASE_JWT_SECRET or SUPABASE_PROJECT_URL"
                    .into(),
            ));
        }
        Ok(())
    }
}
