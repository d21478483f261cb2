// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory ticket store for deterministic testing.
//!
//! Keeps documents in insertion order, applies the same conditional-write
//! rules as the SQLite store, and drives live queries through the same
//! change bus, so repository tests observe identical semantics.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use helpdesk_bus::{ChangeBus, TicketChange, spawn_snapshot_watch};
use helpdesk_core::{
    AdapterType, AssignMode, HealthStatus, HelpdeskError, NewTicket, PluginAdapter, PrincipalId,
    Ticket, TicketDocument, TicketFilter, TicketId, TicketStatus, TicketStore,
    TicketSubscription, WriteOperation,
};
use tokio::sync::Mutex;

type Rows = Arc<Mutex<Vec<(TicketId, TicketDocument)>>>;

/// A ticket store held entirely in memory.
pub struct InMemoryTicketStore {
    rows: Rows,
    bus: ChangeBus,
    fail_writes: AtomicBool,
    fail_reads: Arc<AtomicBool>,
}

impl InMemoryTicketStore {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(Mutex::new(Vec::new())),
            bus: ChangeBus::default(),
            fail_writes: AtomicBool::new(false),
            fail_reads: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every subsequent write fail with `HelpdeskError::Write`.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent read fail with `HelpdeskError::Storage`.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// The stored document for `id`, exactly as a real store would hold it.
    pub async fn document(&self, id: &TicketId) -> Option<TicketDocument> {
        self.rows
            .lock()
            .await
            .iter()
            .find(|(row_id, _)| row_id == id)
            .map(|(_, doc)| doc.clone())
    }

    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.lock().await.is_empty()
    }

    pub fn changes(&self) -> &ChangeBus {
        &self.bus
    }

    fn check_write(&self, operation: WriteOperation) -> Result<(), HelpdeskError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(HelpdeskError::write(operation, "injected write failure"))
        } else {
            Ok(())
        }
    }
}

impl Default for InMemoryTicketStore {
    fn default() -> Self {
        Self::new()
    }
}

async fn select(
    rows: &Rows,
    fail_reads: &AtomicBool,
    filter: &TicketFilter,
) -> Result<Vec<Ticket>, HelpdeskError> {
    if fail_reads.load(Ordering::SeqCst) {
        return Err(HelpdeskError::storage("injected read failure"));
    }
    Ok(rows
        .lock()
        .await
        .iter()
        .map(|(id, doc)| doc.clone().into_ticket(id.clone()))
        .filter(|ticket| filter.matches(ticket))
        .collect())
}

#[async_trait]
impl PluginAdapter for InMemoryTicketStore {
    fn name(&self) -> &str {
        "in-memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::TicketStore
    }

    async fn health_check(&self) -> Result<HealthStatus, HelpdeskError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HelpdeskError> {
        Ok(())
    }
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn insert(&self, ticket: NewTicket) -> Result<Ticket, HelpdeskError> {
        self.check_write(WriteOperation::Create)?;
        let id = TicketId(uuid::Uuid::new_v4().to_string());
        let document = TicketDocument::from_new(ticket);
        self.rows.lock().await.push((id.clone(), document.clone()));
        self.bus.publish(TicketChange::Inserted(id.clone()));
        Ok(document.into_ticket(id))
    }

    async fn get(&self, id: &TicketId) -> Result<Option<Ticket>, HelpdeskError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(HelpdeskError::storage("injected read failure"));
        }
        Ok(self
            .document(id)
            .await
            .map(|doc| doc.into_ticket(id.clone())))
    }

    async fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, HelpdeskError> {
        select(&self.rows, &self.fail_reads, filter).await
    }

    async fn subscribe(&self, filter: TicketFilter) -> Result<TicketSubscription, HelpdeskError> {
        let rows = self.rows.clone();
        let fail_reads = self.fail_reads.clone();
        let (publisher, subscription) = TicketSubscription::channel(16);
        spawn_snapshot_watch(&self.bus, publisher, move || {
            let rows = rows.clone();
            let fail_reads = fail_reads.clone();
            let filter = filter.clone();
            async move { select(&rows, &fail_reads, &filter).await }
        });
        Ok(subscription)
    }

    async fn update_status(
        &self,
        id: &TicketId,
        status: TicketStatus,
        expected: Option<TicketStatus>,
    ) -> Result<(), HelpdeskError> {
        self.check_write(WriteOperation::UpdateStatus)?;
        {
            let mut rows = self.rows.lock().await;
            let (_, doc) = rows
                .iter_mut()
                .find(|(row_id, _)| row_id == id)
                .ok_or_else(|| HelpdeskError::NotFound { id: id.clone() })?;
            if let Some(expected) = expected
                && doc.status != expected
            {
                return Err(HelpdeskError::conflict(format!(
                    "ticket {id} changed concurrently; status is now {}",
                    doc.status
                )));
            }
            doc.status = status;
        }
        self.bus.publish(TicketChange::Updated(id.clone()));
        Ok(())
    }

    async fn assign(
        &self,
        id: &TicketId,
        agent: &PrincipalId,
        mode: AssignMode,
    ) -> Result<(), HelpdeskError> {
        self.check_write(WriteOperation::Assign)?;
        {
            let mut rows = self.rows.lock().await;
            let (_, doc) = rows
                .iter_mut()
                .find(|(row_id, _)| row_id == id)
                .ok_or_else(|| HelpdeskError::NotFound { id: id.clone() })?;
            if mode == AssignMode::IfUnassigned
                && let Some(current) = &doc.assigned_to
                && current != agent
            {
                return Err(HelpdeskError::conflict(format!(
                    "ticket {id} is already assigned to {current}"
                )));
            }
            doc.assigned_to = Some(agent.clone());
        }
        self.bus.publish(TicketChange::Updated(id.clone()));
        Ok(())
    }

    async fn delete(&self, id: &TicketId) -> Result<(), HelpdeskError> {
        self.check_write(WriteOperation::Delete)?;
        {
            let mut rows = self.rows.lock().await;
            let before = rows.len();
            rows.retain(|(row_id, _)| row_id != id);
            if rows.len() == before {
                return Err(HelpdeskError::NotFound { id: id.clone() });
            }
        }
        self.bus.publish(TicketChange::Deleted(id.clone()));
        Ok(())
    }
}
