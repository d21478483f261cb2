// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket store adapter trait for document persistence backends.

use async_trait::async_trait;

use crate::error::HelpdeskError;
use crate::subscription::TicketSubscription;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    AssignMode, NewTicket, PrincipalId, Ticket, TicketFilter, TicketId, TicketStatus,
};

/// Adapter over a collection of ticket documents keyed by store-generated ids.
///
/// Writes to a missing id return [`HelpdeskError::NotFound`]. Conditional
/// writes that lose a race return [`HelpdeskError::Conflict`].
#[async_trait]
pub trait TicketStore: PluginAdapter {
    /// Persist a new ticket and return it with its generated id.
    async fn insert(&self, ticket: NewTicket) -> Result<Ticket, HelpdeskError>;

    /// Fetch one ticket by id.
    async fn get(&self, id: &TicketId) -> Result<Option<Ticket>, HelpdeskError>;

    /// One-shot read of every ticket matching `filter`.
    async fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, HelpdeskError>;

    /// Live read of every ticket matching `filter`.
    ///
    /// The first snapshot is the current set; later snapshots follow each
    /// change to that set until the subscription is dropped.
    async fn subscribe(&self, filter: TicketFilter) -> Result<TicketSubscription, HelpdeskError>;

    /// Set `status`. When `expected` is given the write only applies if the
    /// stored status still equals it.
    async fn update_status(
        &self,
        id: &TicketId,
        status: TicketStatus,
        expected: Option<TicketStatus>,
    ) -> Result<(), HelpdeskError>;

    /// Set `assignedTo` to `agent` according to `mode`.
    async fn assign(
        &self,
        id: &TicketId,
        agent: &PrincipalId,
        mode: AssignMode,
    ) -> Result<(), HelpdeskError>;

    /// Remove a ticket permanently.
    async fn delete(&self, id: &TicketId) -> Result<(), HelpdeskError>;
}
