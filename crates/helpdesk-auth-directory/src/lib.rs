// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Directory identity provider.
//!
//! Implements `IdentityProvider` over the `[[principals]]` table of the
//! configuration. Sign-in resolves an e-mail address (case-insensitively) to
//! the principal's id and role; no credential secrets are held here.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use helpdesk_config::model::PrincipalConfig;
use helpdesk_core::{
    AdapterType, Credentials, HealthStatus, HelpdeskError, IdentityProvider, PluginAdapter,
    Principal, PrincipalId,
};
use tracing::{debug, info};

/// Identity provider backed by a fixed principal directory.
pub struct DirectoryIdentity {
    by_email: HashMap<String, Principal>,
    /// Open session count per principal.
    signed_in: Mutex<HashMap<PrincipalId, usize>>,
}

impl DirectoryIdentity {
    pub fn new(principals: &[PrincipalConfig]) -> Self {
        let by_email = principals
            .iter()
            .map(|p| {
                (
                    normalize(&p.email),
                    Principal {
                        id: PrincipalId(p.id.clone()),
                        email: p.email.trim().to_string(),
                        role: p.role,
                    },
                )
            })
            .collect();
        Self {
            by_email,
            signed_in: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.by_email.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_email.is_empty()
    }

    /// Whether `id` currently holds at least one session.
    pub fn is_signed_in(&self, id: &PrincipalId) -> bool {
        self.active_sessions(id) > 0
    }

    /// Number of sessions `id` has open.
    pub fn active_sessions(&self, id: &PrincipalId) -> usize {
        self.signed_in
            .lock()
            .map(|active| active.get(id).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    fn sessions(&self) -> Result<std::sync::MutexGuard<'_, HashMap<PrincipalId, usize>>, HelpdeskError> {
        self.signed_in
            .lock()
            .map_err(|_| HelpdeskError::Internal("session table poisoned".into()))
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl PluginAdapter for DirectoryIdentity {
    fn name(&self) -> &str {
        "directory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Identity
    }

    async fn health_check(&self) -> Result<HealthStatus, HelpdeskError> {
        if self.is_empty() {
            Ok(HealthStatus::Degraded(
                "no [[principals]] configured; nobody can sign in".into(),
            ))
        } else {
            Ok(HealthStatus::Healthy)
        }
    }

    async fn shutdown(&self) -> Result<(), HelpdeskError> {
        self.sessions()?.clear();
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for DirectoryIdentity {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Principal, HelpdeskError> {
        let principal = self
            .by_email
            .get(&normalize(&credentials.email))
            .cloned()
            .ok_or_else(|| {
                HelpdeskError::Unauthenticated(format!(
                    "no principal registered for {}",
                    credentials.email.trim()
                ))
            })?;
        *self.sessions()?.entry(principal.id.clone()).or_insert(0) += 1;
        info!(principal = %principal.id, role = %principal.role, "signed in");
        Ok(principal)
    }

    async fn sign_out(&self, principal: &Principal) -> Result<(), HelpdeskError> {
        let mut sessions = self.sessions()?;
        match sessions.get_mut(&principal.id) {
            Some(open) => {
                *open -= 1;
                let remaining = *open;
                if remaining == 0 {
                    sessions.remove(&principal.id);
                }
                info!(principal = %principal.id, remaining, "signed out");
            }
            None => debug!(principal = %principal.id, "sign-out without an active session"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_core::Role;

    fn directory() -> DirectoryIdentity {
        DirectoryIdentity::new(&[
            PrincipalConfig {
                id: "u-alice".into(),
                email: "Alice@Example.com".into(),
                role: Role::Customer,
            },
            PrincipalConfig {
                id: "u-sam".into(),
                email: "sam@example.com".into(),
                role: Role::Agent,
            },
        ])
    }

    #[tokio::test]
    async fn sign_in_matches_email_case_insensitively() {
        let identity = directory();
        let principal = identity
            .sign_in(&Credentials::email("  alice@EXAMPLE.com "))
            .await
            .unwrap();
        assert_eq!(principal.id, PrincipalId::from("u-alice"));
        assert_eq!(principal.role, Role::Customer);
        assert!(identity.is_signed_in(&principal.id));
    }

    #[tokio::test]
    async fn unknown_email_is_unauthenticated() {
        let err = directory()
            .sign_in(&Credentials::email("mallory@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, HelpdeskError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn sign_out_ends_session() {
        let identity = directory();
        let sam = identity
            .sign_in(&Credentials::email("sam@example.com"))
            .await
            .unwrap();
        identity.sign_out(&sam).await.unwrap();
        assert!(!identity.is_signed_in(&sam.id));
        // Signing out twice is harmless.
        identity.sign_out(&sam).await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_sessions_are_counted_separately() {
        let identity = directory();
        let credentials = Credentials::email("sam@example.com");
        let first = identity.sign_in(&credentials).await.unwrap();
        let second = identity.sign_in(&credentials).await.unwrap();
        assert_eq!(identity.active_sessions(&first.id), 2);

        identity.sign_out(&first).await.unwrap();
        assert!(identity.is_signed_in(&second.id));
        assert_eq!(identity.active_sessions(&second.id), 1);

        identity.sign_out(&second).await.unwrap();
        assert!(!identity.is_signed_in(&second.id));
    }

    #[tokio::test]
    async fn empty_directory_is_degraded() {
        let identity = DirectoryIdentity::new(&[]);
        assert!(matches!(
            identity.health_check().await.unwrap(),
            HealthStatus::Degraded(_)
        ));
    }
}
