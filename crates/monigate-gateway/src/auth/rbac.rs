//! Route access classes and the role check.

use monigate_core::error::{MonigateError, Result};
use monigate_core::{Identity, Role};

/// Access class declared for a group of routes at registration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAccess {
    /// No token required.
    Public,
    /// Any authenticated identity.
    Authenticated,
    /// Authenticated and holding one of these roles.
    Roles(Vec<Role>),
}

impl RouteAccess {
    pub fn admin_only() -> Self {
        RouteAccess::Roles(vec![Role::Admin])
    }

    pub fn requires_token(&self) -> bool {
        !matches!(self, RouteAccess::Public)
    }

    /// Label used by `/api/info`.
    pub fn describe(&self) -> String {
        match self {
            RouteAccess::Public => "public".into(),
            RouteAccess::Authenticated => "token".into(),
            RouteAccess::Roles(roles) => {
                let names: Vec<&str> = roles.iter().map(|r| r.as_str()).collect();
                format!("token:{}", names.join("|"))
            }
        }
    }
}

/// Plain set membership. An empty set admits any identity.
pub fn authorize(identity: &Identity, required: &[Role]) -> Result<()> {
    if required.is_empty() || required.contains(&identity.role) {
        Ok(())
    } else {
        Err(MonigateError::Forbidden)
    }
}
