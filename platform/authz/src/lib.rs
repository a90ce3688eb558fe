//! Access policy for the planning API.
//!
//! Everything in this crate is pure: no IO, no clocks, no shared state. The
//! resource operations ask [`decide`] before touching storage and apply the
//! returned [`RowScope`] to their queries.

mod policy;
mod role;
mod status;

pub use policy::{Decision, Denial, Operation, RowScope, decide};
pub use role::{AppRole, UnknownRole};
pub use status::{RequestStatus, UnknownStatus};
