// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity provider adapter trait.

use async_trait::async_trait;

use crate::error::HelpdeskError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Credentials, Principal};

/// Adapter that resolves credentials to an authenticated principal.
///
/// Credential storage and verification live entirely behind this trait.
#[async_trait]
pub trait IdentityProvider: PluginAdapter {
    /// Authenticate and return the principal, or [`HelpdeskError::Unauthenticated`].
    async fn sign_in(&self, credentials: &Credentials) -> Result<Principal, HelpdeskError>;

    /// End the principal's session with the provider.
    async fn sign_out(&self, principal: &Principal) -> Result<(), HelpdeskError>;
}
