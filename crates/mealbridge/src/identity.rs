//! Base identity shared across roles.
//!
//! A user account is a single identity; donor, volunteer, and NGO are
//! role-specific extension records keyed by `UserId`. Role-specific
//! behavior dispatches through those typed records rather than a role
//! string.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to a user account. Account management itself
/// (credentials, sessions) lives outside this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
