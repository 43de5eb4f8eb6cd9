//! Authenticated Principal
//!
//! The core performs no authentication itself: the fronting auth service
//! verifies credentials and hands every request a [`Principal`]. The user id
//! is validated once, at the gateway trust boundary, and flows through the
//! core as a plain `i64` from then on.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Authenticated identity attached to a request, trusted by the core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: i64,
}

impl Principal {
    pub fn new(user_id: i64) -> Self {
        Self { user_id }
    }
}

/// Role lookup, consumed by the gateway's admin routes only.
///
/// The transfer engine never consults roles: ownership of the source account
/// is the only entitlement it honors.
#[async_trait]
pub trait RoleProvider: Send + Sync {
    async fn has_role(&self, user_id: i64, role: &str) -> bool;
}

/// Role provider backed by a static admin list from configuration
#[derive(Debug, Default)]
pub struct StaticRoleProvider {
    admins: HashSet<i64>,
}

impl StaticRoleProvider {
    pub fn new(admins: impl IntoIterator<Item = i64>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }
}

#[async_trait]
impl RoleProvider for StaticRoleProvider {
    async fn has_role(&self, user_id: i64, role: &str) -> bool {
        role == "admin" && self.admins.contains(&user_id)
    }
}
