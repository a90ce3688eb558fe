use platform_api::ApiError;
use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthnError {
    #[error("missing or malformed credential")]
    MalformedCredential,
    #[error("invalid token header")]
    InvalidHeader,
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("invalid or expired credential")]
    InvalidToken,
    #[error("no key in the published key set matches kid {0:?}")]
    UnknownKey(Option<String>),
    #[error("key set fetch failed: {0}")]
    KeySetFetch(String),
    #[error("missing subject")]
    MissingSubject,
    #[error("no profile; provisioning required")]
    NoProfile,
    #[error("profile disabled")]
    ProfileDisabled,
    #[error("unknown role in profile: {0}")]
    UnknownRole(String),
    #[error("{0}")]
    Configuration(String),
    #[error("profile store error: {0}")]
    Store(#[from] DbErr),
}

impl From<AuthnError> for ApiError {
    fn from(err: AuthnError) -> Self {
        match err {
            AuthnError::MalformedCredential
            | AuthnError::InvalidHeader
            | AuthnError::UnsupportedAlgorithm(_)
            | AuthnError::InvalidToken
            | AuthnError::MissingSubject => ApiError::Unauthenticated(err.to_string()),
            AuthnError::UnknownKey(_) | AuthnError::KeySetFetch(_) => {
                ApiError::Unauthenticated(AuthnError::InvalidToken.to_string())
            }
            AuthnError::NoProfile | AuthnError::ProfileDisabled | AuthnError::UnknownRole(_) => {
                ApiError::Forbidden(err.to_string())
            }
            AuthnError::Configuration(msg) => ApiError::Configuration(msg),
            AuthnError::Store(db) => ApiError::internal(db.into()),
        }
    }
}
