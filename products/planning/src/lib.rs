//! Planning resources.
//!
//! Every operation takes the pool and the caller's [`UserProfile`], validates
//! its input, asks the access policy, then issues a single statement. Enum
//! columns (`activity_type`, `role_code`, `shift_code`, `request_status`, ...)
//! are read back as text and written with a cast to their store domain, so
//! the domain itself stays the store's business.
//!
//! [`UserProfile`]: platform_authn::UserProfile

pub mod alerts;
pub mod assignments;
pub mod employees;
pub mod unavailabilities;

mod support;

use serde::Serialize;
use uuid::Uuid;

/// Echo for a successful create.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Created {
    pub id: Uuid,
}

/// Echo for an update: `updated` is the number of rows touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Updated {
    pub ok: bool,
    pub updated: u64,
}

impl Updated {
    pub fn rows(updated: u64) -> Self {
        Self { ok: true, updated }
    }
}
