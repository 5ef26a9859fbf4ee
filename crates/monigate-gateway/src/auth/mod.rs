//! Authentication and role-based authorization.
//!
//! Tokens are opaque shared secrets matched against a credential table; they
//! are not signed, so there is nothing to verify beyond the lookup.

pub mod rbac;
pub mod store;

use std::sync::Arc;

use monigate_core::error::{MonigateError, Result};
use monigate_core::Identity;

pub use rbac::{authorize, RouteAccess};
pub use store::{CredentialStore, StaticCredentialStore};

/// Request header carrying the API token.
pub const TOKEN_HEADER: &str = "x-api-token";

/// Resolves a presented token to an identity.
#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
}

impl Authenticator {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Missing, empty and unknown tokens all yield the same error so callers
    /// learn nothing about which tokens exist.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<Identity> {
        let token = token.map(str::trim).filter(|t| !t.is_empty());
        let Some(token) = token else {
            return Err(MonigateError::Unauthenticated);
        };
        self.store
            .resolve(token)
            .await
            .ok_or(MonigateError::Unauthenticated)
    }

    /// Best-effort lookup that never fails; used where a username is useful
    /// but the request has not been gated yet.
    pub async fn peek(&self, token: Option<&str>) -> Option<Identity> {
        self.authenticate(token).await.ok()
    }
}
