//! sea-orm entities for the planning store.
//!
//! Columns backed by Postgres enum domains (`activity_type`, `role_code`,
//! `shift_code`, `request_status`, ...) are modelled as `String`. Reads cast
//! them to text and writes tag them with their enum type, see
//! `products-planning`.

pub mod assignments;
pub mod coverage_alerts;
pub mod employees;
pub mod medical_alerts;
pub mod unavailabilities;
pub mod user_profiles;
