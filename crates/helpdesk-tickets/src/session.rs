// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Explicit session lifecycle.
//!
//! A [`Session`] exists only between a successful sign-in and sign-out.
//! Signing out consumes it, so no repository call can run on a torn-down
//! session.

use chrono::{DateTime, Utc};
use helpdesk_core::{
    Clock, Credentials, HelpdeskError, IdentityProvider, Principal, PrincipalId, Role,
};
use tracing::debug;

/// An authenticated principal, passed to every repository operation.
#[derive(Debug, Clone)]
pub struct Session {
    principal: Principal,
    signed_in_at: DateTime<Utc>,
}

impl Session {
    /// Authenticate with `provider` and open a session.
    pub async fn sign_in(
        provider: &dyn IdentityProvider,
        credentials: &Credentials,
        clock: &dyn Clock,
    ) -> Result<Self, HelpdeskError> {
        let principal = provider.sign_in(credentials).await?;
        debug!(principal = %principal.id, role = %principal.role, "session opened");
        Ok(Self {
            principal,
            signed_in_at: clock.now(),
        })
    }

    /// End the session with `provider`.
    pub async fn sign_out(self, provider: &dyn IdentityProvider) -> Result<(), HelpdeskError> {
        provider.sign_out(&self.principal).await?;
        debug!(principal = %self.principal.id, "session closed");
        Ok(())
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn principal_id(&self) -> &PrincipalId {
        &self.principal.id
    }

    pub fn role(&self) -> Role {
        self.principal.role
    }

    pub fn signed_in_at(&self) -> DateTime<Utc> {
        self.signed_in_at
    }
}
