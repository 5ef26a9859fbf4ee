use std::collections::HashMap;

use async_trait::async_trait;

use monigate_core::error::{MonigateError, Result};
use monigate_core::Identity;

use crate::config::CredentialConfig;

/// Token -> identity lookup. Swap the implementation to back credentials with
/// a database or secret manager without touching the pipeline.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn resolve(&self, token: &str) -> Option<Identity>;
}

/// Immutable table loaded once at startup.
#[derive(Debug, Default)]
pub struct StaticCredentialStore {
    by_token: HashMap<String, Identity>,
}

impl StaticCredentialStore {
    pub fn new(entries: impl IntoIterator<Item = (String, Identity)>) -> Result<Self> {
        let mut by_token = HashMap::new();
        for (token, identity) in entries {
            if by_token.contains_key(&token) {
                return Err(MonigateError::Config(format!(
                    "duplicate credential token (user={})",
                    identity.username
                )));
            }
            by_token.insert(token, identity);
        }
        Ok(Self { by_token })
    }

    pub fn from_config(creds: &[CredentialConfig]) -> Result<Self> {
        Self::new(
            creds
                .iter()
                .map(|c| (c.token.clone(), Identity::new(c.username.clone(), c.role))),
        )
    }
}

#[async_trait]
impl CredentialStore for StaticCredentialStore {
    async fn resolve(&self, token: &str) -> Option<Identity> {
        self.by_token.get(token).cloned()
    }
}
