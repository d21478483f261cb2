// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end repository testing.
//!
//! `TestHarness` assembles a [`TicketRepository`] over an in-memory (or temp
//! SQLite) ticket store, a mock blob store, a fixed clock, and a directory
//! identity provider seeded with two customers and two agents.

use std::sync::Arc;

use helpdesk_auth_directory::DirectoryIdentity;
use helpdesk_config::HelpdeskConfig;
use helpdesk_config::model::{PrincipalConfig, StorageConfig};
use helpdesk_core::{
    Attachment, Category, Credentials, HelpdeskError, Priority, Role, StatusTransitionPolicy,
    TicketStore,
};
use helpdesk_storage::SqliteTicketStore;
use helpdesk_tickets::{RepositoryPolicy, Session, TicketDraft, TicketRepository};

use crate::clock::FixedClock;
use crate::memory_store::InMemoryTicketStore;
use crate::mock_blob_store::MockBlobStore;

/// Customer who files most tickets in tests.
pub const ALICE: &str = "alice@example.com";
/// A second customer, to check isolation.
pub const DANA: &str = "dana@example.com";
/// Agent.
pub const BOB: &str = "bob@example.com";
/// A second agent, to check assignment races.
pub const ERIN: &str = "erin@example.com";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: HelpdeskConfig,
    sqlite: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = HelpdeskConfig::default();
        config.principals = vec![
            principal("u-alice", ALICE, Role::Customer),
            principal("u-dana", DANA, Role::Customer),
            principal("u-bob", BOB, Role::Agent),
            principal("u-erin", ERIN, Role::Agent),
        ];
        Self {
            config,
            sqlite: false,
        }
    }

    /// Use a real SQLite store in a temp directory instead of the in-memory one.
    pub fn with_sqlite(mut self) -> Self {
        self.sqlite = true;
        self
    }

    pub fn with_status_transitions(mut self, policy: StatusTransitionPolicy) -> Self {
        self.config.policy.status_transitions = policy;
        self
    }

    pub fn with_single_assignment(mut self, enabled: bool) -> Self {
        self.config.policy.single_assignment = enabled;
        self
    }

    pub fn with_attachment_cleanup(mut self, enabled: bool) -> Self {
        self.config.attachments.delete_on_ticket_delete = enabled;
        self
    }

    pub fn with_max_attachment_bytes(mut self, max: u64) -> Self {
        self.config.attachments.max_size_bytes = max;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, HelpdeskError> {
        let temp_dir = tempfile::TempDir::new().map_err(HelpdeskError::storage)?;
        let mut config = self.config;

        let memory = Arc::new(InMemoryTicketStore::new());
        let store: Arc<dyn TicketStore> = if self.sqlite {
            config.storage = StorageConfig {
                database_path: temp_dir.path().join("test.db").to_string_lossy().into_owned(),
                wal_mode: true,
                poll_interval_ms: 50,
            };
            Arc::new(SqliteTicketStore::open(config.storage.clone()).await?)
        } else {
            memory.clone()
        };

        let blobs = Arc::new(MockBlobStore::new());
        let clock = Arc::new(FixedClock::default());
        let identity = Arc::new(DirectoryIdentity::new(&config.principals));
        let repository = TicketRepository::new(
            store.clone(),
            blobs.clone(),
            clock.clone(),
            RepositoryPolicy::from_config(&config),
        );

        Ok(TestHarness {
            repository,
            store,
            memory,
            blobs,
            clock,
            identity,
            config,
            _temp_dir: temp_dir,
        })
    }
}

fn principal(id: &str, email: &str, role: Role) -> PrincipalConfig {
    PrincipalConfig {
        id: id.to_string(),
        email: email.to_string(),
        role,
    }
}

/// A complete repository with deterministic collaborators.
pub struct TestHarness {
    pub repository: TicketRepository,
    /// The store the repository writes to.
    pub store: Arc<dyn TicketStore>,
    /// The in-memory store. Backs `store` unless built `with_sqlite`.
    pub memory: Arc<InMemoryTicketStore>,
    pub blobs: Arc<MockBlobStore>,
    pub clock: Arc<FixedClock>,
    pub identity: Arc<DirectoryIdentity>,
    pub config: HelpdeskConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Harness with default policy and the in-memory store.
    pub async fn new() -> Result<Self, HelpdeskError> {
        Self::builder().build().await
    }

    pub async fn sign_in(&self, email: &str) -> Result<Session, HelpdeskError> {
        Session::sign_in(
            self.identity.as_ref(),
            &Credentials::email(email),
            self.clock.as_ref(),
        )
        .await
    }

    /// A draft that passes validation.
    pub fn draft(title: &str) -> TicketDraft {
        TicketDraft {
            title: title.to_string(),
            description: format!("{title}: details"),
            priority: Some(Priority::Medium),
            category: Some(Category::Technical),
            contact_email: "a@x.com".to_string(),
            ..TicketDraft::default()
        }
    }

    /// A valid draft carrying a small text attachment.
    pub fn draft_with_attachment(title: &str, file_name: &str) -> TicketDraft {
        TicketDraft {
            attachment: Some(Attachment {
                file_name: file_name.to_string(),
                content_type: Some("text/plain".to_string()),
                bytes: b"attachment body".to_vec(),
            }),
            ..Self::draft(title)
        }
    }
}
