// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring of the concrete adapters behind the ticket repository.

use std::sync::Arc;

use helpdesk_attachments::LocalBlobStore;
use helpdesk_auth_directory::DirectoryIdentity;
use helpdesk_config::HelpdeskConfig;
use helpdesk_core::{Credentials, HelpdeskError, PluginAdapter, SystemClock};
use helpdesk_storage::SqliteTicketStore;
use helpdesk_tickets::{RepositoryPolicy, Session, TicketRepository};
use tracing::{debug, warn};

/// The opened adapters plus the repository built on them.
pub struct App {
    pub repository: TicketRepository,
    store: Arc<SqliteTicketStore>,
    identity: Arc<DirectoryIdentity>,
    clock: SystemClock,
}

impl App {
    /// Open the SQLite store and assemble the repository.
    pub async fn open(config: HelpdeskConfig) -> Result<Self, HelpdeskError> {
        let store = Arc::new(SqliteTicketStore::open(config.storage.clone()).await?);
        let blobs = Arc::new(LocalBlobStore::new(&config.attachments));
        let identity = Arc::new(DirectoryIdentity::new(&config.principals));
        let repository = TicketRepository::new(
            store.clone(),
            blobs,
            Arc::new(SystemClock),
            RepositoryPolicy::from_config(&config),
        );
        debug!(database = %config.storage.database_path, "helpdesk opened");

        Ok(Self {
            repository,
            store,
            identity,
            clock: SystemClock,
        })
    }

    /// Sign in as the principal registered under `email`.
    pub async fn sign_in(&self, email: Option<&str>) -> Result<Session, HelpdeskError> {
        let email = email.ok_or_else(|| {
            HelpdeskError::Unauthenticated("no principal given; pass --as <email>".into())
        })?;
        Session::sign_in(self.identity.as_ref(), &Credentials::email(email), &self.clock).await
    }

    /// End the session and release the store.
    pub async fn close(&self, session: Session) {
        if let Err(e) = session.sign_out(self.identity.as_ref()).await {
            warn!(error = %e, "sign-out failed");
        }
        if let Err(e) = self.store.shutdown().await {
            warn!(error = %e, "store shutdown failed");
        }
    }
}
