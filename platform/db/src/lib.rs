//! Connection settings and pool wiring for the relational store.

use std::time::Duration;

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, SqlErr, Statement,
};
use thiserror::Error;
use tracing::info;

/// Shared pool handle. Cloning is cheap; connections go back to the pool when
/// each statement completes.
pub type DbPool = DatabaseConnection;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("DATABASE_URL missing")]
    MissingUrl,
    #[error("invalid {key}: {value}")]
    InvalidSetting { key: &'static str, value: String },
    #[error("database connection failed: {0}")]
    Connect(#[from] DbErr),
}

pub type DbResult<T> = Result<T, DbError>;

#[derive(Clone, Debug)]
pub struct DatabaseSettings {
    url: Option<String>,
    /// `None` keeps the driver default (a single connection for SQLite).
    max_connections: Option<u32>,
    connect_timeout: Duration,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: None,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl DatabaseSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Read `DATABASE_URL` and `DATABASE_MAX_CONNECTIONS` through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DbResult<Self> {
        let url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        let mut settings = Self {
            url,
            ..Self::default()
        };
        if let Some(raw) = lookup("DATABASE_MAX_CONNECTIONS") {
            let parsed = raw.trim().parse::<u32>().ok().filter(|n| *n > 0);
            settings.max_connections = Some(parsed.ok_or(DbError::InvalidSetting {
                key: "DATABASE_MAX_CONNECTIONS",
                value: raw,
            })?);
        }
        Ok(settings)
    }

    pub fn database_url(&self) -> DbResult<&str> {
        self.url.as_deref().ok_or(DbError::MissingUrl)
    }

    pub fn max_connections(&self) -> Option<u32> {
        self.max_connections
    }
}

pub async fn connect(settings: &DatabaseSettings) -> DbResult<DbPool> {
    let url = settings.database_url()?;
    let mut options = ConnectOptions::new(url.to_string());
    options
        .connect_timeout(settings.connect_timeout)
        .sqlx_logging(false);
    if let Some(max) = settings.max_connections {
        options.max_connections(max);
    }
    let pool = Database::connect(options).await?;
    info!(
        backend = ?pool.get_database_backend(),
        max_connections = ?settings.max_connections,
        "database pool ready"
    );
    Ok(pool)
}

/// Round-trip a trivial statement.
pub async fn ping(pool: &DbPool) -> bool {
    let backend = pool.get_database_backend();
    pool.execute(Statement::from_string(backend, "SELECT 1".to_string()))
        .await
        .is_ok()
}

/// How a failed write should be reported.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WriteFailure {
    /// Uniqueness constraint rejected the row.
    Conflict,
    /// The store rejected the values (check, foreign key, enum domain, ...).
    Rejected,
    /// The store could not be reached; not the caller's fault.
    Unavailable,
}

pub fn classify_write_error(err: &DbErr) -> WriteFailure {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return WriteFailure::Conflict;
    }
    match err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => WriteFailure::Unavailable,
        _ => WriteFailure::Rejected,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_url_is_reported() {
        let settings = DatabaseSettings::from_lookup(lookup(&[])).unwrap();
        assert!(matches!(settings.database_url(), Err(DbError::MissingUrl)));
        let blank = DatabaseSettings::from_lookup(lookup(&[("DATABASE_URL", "  ")])).unwrap();
        assert!(matches!(blank.database_url(), Err(DbError::MissingUrl)));
    }

    #[test]
    fn pool_size_must_be_positive() {
        let err = DatabaseSettings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/planning"),
            ("DATABASE_MAX_CONNECTIONS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            DbError::InvalidSetting {
                key: "DATABASE_MAX_CONNECTIONS",
                ..
            }
        ));

        let settings = DatabaseSettings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/planning"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
        ]))
        .unwrap();
        assert_eq!(settings.max_connections(), Some(4));
        assert_eq!(settings.database_url().unwrap(), "postgres://localhost/planning");
    }

    #[tokio::test]
    async fn ping_and_unique_violation_classification() {
        let pool = connect(&DatabaseSettings::new("sqlite::memory:"))
            .await
            .unwrap();
        assert!(ping(&pool).await);

        let backend = pool.get_database_backend();
        pool.execute(Statement::from_string(
            backend,
            "CREATE TABLE slot (k TEXT NOT NULL UNIQUE, v INTEGER NOT NULL CHECK (v > 0))".to_string(),
        ))
        .await
        .unwrap();
        pool.execute(Statement::from_string(
            backend,
            "INSERT INTO slot (k, v) VALUES ('a', 1)".to_string(),
        ))
        .await
        .unwrap();

        let duplicate = pool
            .execute(Statement::from_string(
                backend,
                "INSERT INTO slot (k, v) VALUES ('a', 2)".to_string(),
            ))
            .await
            .unwrap_err();
        assert_eq!(classify_write_error(&duplicate), WriteFailure::Conflict);

        let rejected = pool
            .execute(Statement::from_string(
                backend,
                "INSERT INTO slot (k, v) VALUES ('b', 0)".to_string(),
            ))
            .await
            .unwrap_err();
        assert_eq!(classify_write_error(&rejected), WriteFailure::Rejected);
    }
}
