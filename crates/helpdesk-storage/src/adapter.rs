// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the TicketStore trait.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use helpdesk_bus::{ChangeBus, TicketChange, spawn_snapshot_watch};
use helpdesk_config::model::StorageConfig;
use helpdesk_core::{
    AdapterType, AssignMode, HealthStatus, HelpdeskError, NewTicket, PluginAdapter, PrincipalId,
    Ticket, TicketFilter, TicketId, TicketStatus, TicketStore, TicketSubscription,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// Undelivered snapshots buffered per subscription.
const SUBSCRIPTION_BUFFER: usize = 16;

/// SQLite-backed ticket store.
///
/// The database is opened on [`SqliteTicketStore::initialize`]. Writes made
/// through this store are announced on its change bus directly; commits from
/// other processes are picked up by polling `PRAGMA data_version`.
pub struct SqliteTicketStore {
    config: StorageConfig,
    db: OnceCell<Database>,
    bus: ChangeBus,
    shutdown: CancellationToken,
}

impl SqliteTicketStore {
    /// Create a store for the given configuration. Nothing is opened yet.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
            bus: ChangeBus::default(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Create and initialize in one step.
    pub async fn open(config: StorageConfig) -> Result<Self, HelpdeskError> {
        let store = Self::new(config);
        store.initialize().await?;
        Ok(store)
    }

    /// Open the database, run migrations, and start the external-change poller.
    pub async fn initialize(&self) -> Result<(), HelpdeskError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        let poller_db = db.clone();
        self.db
            .set(db)
            .map_err(|_| HelpdeskError::storage("ticket store already initialized"))?;

        spawn_external_change_poller(
            poller_db,
            self.bus.clone(),
            Duration::from_millis(self.config.poll_interval_ms),
            self.shutdown.clone(),
        );
        debug!(path = %self.config.database_path, "SQLite ticket store initialized");
        Ok(())
    }

    /// The change feed this store publishes on.
    pub fn changes(&self) -> &ChangeBus {
        &self.bus
    }

    fn db(&self) -> Result<&Database, HelpdeskError> {
        self.db.get().ok_or_else(|| {
            HelpdeskError::storage("ticket store not initialized -- call initialize() first")
        })
    }
}

/// Publish [`TicketChange::External`] whenever another connection commits.
fn spawn_external_change_poller(
    db: Database,
    bus: ChangeBus,
    interval: Duration,
    shutdown: CancellationToken,
) {
    tokio::spawn(async move {
        let mut last = match db.data_version().await {
            Ok(version) => version,
            Err(e) => {
                warn!(error = %e, "cannot read data_version, external changes will not be seen");
                return;
            }
        };
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }
            if bus.receiver_count() == 0 {
                continue;
            }
            match db.data_version().await {
                Ok(version) if version != last => {
                    debug!(version, "external commit detected");
                    last = version;
                    bus.publish(TicketChange::External);
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "data_version poll failed"),
            }
        }
        debug!("external change poller stopped");
    });
}

#[async_trait]
impl PluginAdapter for SqliteTicketStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::TicketStore
    }

    async fn health_check(&self) -> Result<HealthStatus, HelpdeskError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| conn.execute_batch("SELECT 1;"))
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HelpdeskError> {
        self.shutdown.cancel();
        if let Some(db) = self.db.get()
            && self.config.wal_mode
        {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl TicketStore for SqliteTicketStore {
    async fn insert(&self, ticket: NewTicket) -> Result<Ticket, HelpdeskError> {
        let ticket = queries::tickets::insert_ticket(self.db()?, ticket).await?;
        self.bus.publish(TicketChange::Inserted(ticket.id.clone()));
        Ok(ticket)
    }

    async fn get(&self, id: &TicketId) -> Result<Option<Ticket>, HelpdeskError> {
        queries::tickets::get_ticket(self.db()?, id).await
    }

    async fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, HelpdeskError> {
        queries::tickets::list_tickets(self.db()?, filter).await
    }

    async fn subscribe(&self, filter: TicketFilter) -> Result<TicketSubscription, HelpdeskError> {
        let db = self.db()?.clone();
        let (publisher, subscription) = TicketSubscription::channel(SUBSCRIPTION_BUFFER);
        debug!(?filter, "starting live ticket query");
        spawn_snapshot_watch(&self.bus, publisher, move || {
            let db = db.clone();
            let filter = filter.clone();
            async move { queries::tickets::list_tickets(&db, &filter).await }
        });
        Ok(subscription)
    }

    async fn update_status(
        &self,
        id: &TicketId,
        status: TicketStatus,
        expected: Option<TicketStatus>,
    ) -> Result<(), HelpdeskError> {
        queries::tickets::update_status(self.db()?, id, status, expected).await?;
        self.bus.publish(TicketChange::Updated(id.clone()));
        Ok(())
    }

    async fn assign(
        &self,
        id: &TicketId,
        agent: &PrincipalId,
        mode: AssignMode,
    ) -> Result<(), HelpdeskError> {
        queries::tickets::assign(self.db()?, id, agent, mode).await?;
        self.bus.publish(TicketChange::Updated(id.clone()));
        Ok(())
    }

    async fn delete(&self, id: &TicketId) -> Result<(), HelpdeskError> {
        queries::tickets::delete_ticket(self.db()?, id).await?;
        self.bus.publish(TicketChange::Deleted(id.clone()));
        Ok(())
    }
}

impl Drop for SqliteTicketStore {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
            poll_interval_ms: 50,
        }
    }

    #[tokio::test]
    async fn implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let store = SqliteTicketStore::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(store.name(), "sqlite");
        assert_eq!(store.version(), semver::Version::new(0, 1, 0));
        assert_eq!(store.adapter_type(), AdapterType::TicketStore);
    }

    #[tokio::test]
    async fn operations_before_initialize_fail() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let store = SqliteTicketStore::new(make_config(db_path.to_str().unwrap()));
        assert!(matches!(
            store.list(&TicketFilter::All).await,
            Err(HelpdeskError::Storage { .. })
        ));
        assert!(store.health_check().await.is_err());
    }

    #[tokio::test]
    async fn double_initialize_is_rejected() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let store = SqliteTicketStore::open(make_config(db_path.to_str().unwrap()))
            .await
            .unwrap();
        assert!(store.initialize().await.is_err());
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
        store.shutdown().await.unwrap();
    }
}
