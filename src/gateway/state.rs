//! Gateway application state (shared)

use std::sync::Arc;

use crate::account::AccountService;
use crate::principal::RoleProvider;
use crate::transfer::TransferEngine;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    /// Account open/list/deposit operations
    pub accounts: Arc<AccountService>,
    /// Transfer engine (internal + external)
    pub engine: Arc<TransferEngine>,
    /// Role lookup for admin-only routes
    pub roles: Arc<dyn RoleProvider>,
}

impl AppState {
    pub fn new(
        accounts: Arc<AccountService>,
        engine: Arc<TransferEngine>,
        roles: Arc<dyn RoleProvider>,
    ) -> Self {
        Self {
            accounts,
            engine,
            roles,
        }
    }
}
