use anyhow::{Context, Result, bail};
use axum::http::HeaderValue;
use platform_authn::AuthnSettings;
use platform_db::DatabaseSettings;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseSettings,
    pub authn: AuthnSettings,
    /// Empty means any origin.
    pub cors_allowed_origins: Vec<HeaderValue>,
    pub environment: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build and check the configuration; a deployment that could never
    /// serve a request is refused here rather than on the first call.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database =
            DatabaseSettings::from_lookup(&lookup).context("invalid database settings")?;
        database
            .database_url()
            .context("DATABASE_URL is required")?;

        let authn = AuthnSettings::from_lookup(&lookup).context("invalid token settings")?;
        authn.ensure_usable()?;

        let cors_allowed_origins =
            parse_origins(&lookup("CORS_ALLOWED_ORIGINS").unwrap_or_default())?;

        let environment = lookup("ENV")
            .map(|env| env.trim().to_string())
            .filter(|env| !env.is_empty())
            .unwrap_or_else(|| "prod".into());

        Ok(Self {
            database,
            authn,
            cors_allowed_origins,
            environment,
        })
    }
}

/// A `*` anywhere in the list allows any origin.
fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>> {
    let entries: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .collect();
    if entries.contains(&"*") {
        return Ok(Vec::new());
    }
    entries
        .into_iter()
        .map(|origin| {
            if !origin.starts_with("http://") && !origin.starts_with("https://") {
                bail!("invalid CORS_ALLOWED_ORIGINS entry: {origin}");
            }
            HeaderValue::from_str(origin)
                .with_context(|| format!("invalid CORS_ALLOWED_ORIGINS entry: {origin}"))
        })
        .collect()
}
