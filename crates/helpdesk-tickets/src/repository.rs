// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The ticket repository.
//!
//! Composes the ticket store, blob store, and clock behind role-scoped reads
//! and authorized lifecycle writes. Every operation takes the caller's
//! [`Session`]; authorization is decided here rather than by the caller.

use std::sync::Arc;

use helpdesk_core::{
    BlobStore, Clock, HelpdeskError, NewTicket, Role, StatusTransitionPolicy, Ticket,
    TicketFilter, TicketId, TicketStatus, TicketStore, TicketSubscription,
};
use tracing::{debug, error, info, warn};

use crate::policy::{RepositoryPolicy, require_role};
use crate::session::Session;
use crate::validation::{TicketDraft, ValidTicket, attachment_path, validate_draft};

/// Explicit answer to "really delete this ticket?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    NotConfirmed,
}

impl From<bool> for Confirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            Self::Confirmed
        } else {
            Self::NotConfirmed
        }
    }
}

/// Role-aware access to the ticket collection.
#[derive(Clone)]
pub struct TicketRepository {
    store: Arc<dyn TicketStore>,
    blobs: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
    policy: RepositoryPolicy,
}

impl TicketRepository {
    pub fn new(
        store: Arc<dyn TicketStore>,
        blobs: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
        policy: RepositoryPolicy,
    ) -> Self {
        Self {
            store,
            blobs,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &RepositoryPolicy {
        &self.policy
    }

    /// Live view of every ticket the session may see.
    ///
    /// Customers see the tickets they created; agents see all tickets. Drop
    /// or [`unsubscribe`](TicketSubscription::unsubscribe) the result when
    /// the view closes.
    pub async fn watch(&self, session: &Session) -> Result<TicketSubscription, HelpdeskError> {
        let filter = TicketFilter::for_principal(session.principal());
        debug!(principal = %session.principal_id(), ?filter, "opening ticket watch");
        self.store
            .subscribe(filter)
            .await
            .inspect_err(|e| error!(error = %e, "failed to open ticket watch"))
    }

    /// One-shot read of every ticket the session may see.
    pub async fn list(&self, session: &Session) -> Result<Vec<Ticket>, HelpdeskError> {
        let filter = TicketFilter::for_principal(session.principal());
        self.store
            .list(&filter)
            .await
            .inspect_err(|e| error!(error = %e, "failed to list tickets"))
    }

    /// A single ticket, if the session may see it.
    ///
    /// Another customer's ticket reads as `NotFound`, the same as a missing one.
    pub async fn get(&self, session: &Session, id: &TicketId) -> Result<Ticket, HelpdeskError> {
        match self.store.get(id).await? {
            Some(ticket) if ticket.is_visible_to(session.principal()) => Ok(ticket),
            _ => Err(HelpdeskError::NotFound { id: id.clone() }),
        }
    }

    /// File a new ticket for the signed-in customer.
    ///
    /// Validation runs before any I/O. An attachment is uploaded first and the
    /// ticket document is written only after the upload has completed; if the
    /// upload fails no ticket is created.
    pub async fn create(
        &self,
        session: &Session,
        draft: TicketDraft,
    ) -> Result<Ticket, HelpdeskError> {
        require_role(session, Role::Customer, "create tickets")?;
        let valid = validate_draft(draft, self.policy.max_attachment_bytes)?;
        let now = self.clock.now();

        let attachment_url = match &valid.attachment {
            Some(attachment) => {
                let path =
                    attachment_path(&self.policy.attachment_prefix, now, &attachment.file_name);
                let blob = self
                    .blobs
                    .upload(&path, attachment)
                    .await
                    .map_err(into_upload_error)
                    .inspect_err(|e| {
                        error!(path = %path, error = %e, "attachment upload failed");
                    })?;
                debug!(path = %path, url = %blob.url, "attachment uploaded");
                Some(blob.url)
            }
            None => None,
        };

        let new_ticket = new_ticket(valid, attachment_url.clone(), session, now);
        match self.store.insert(new_ticket).await {
            Ok(ticket) => {
                info!(
                    ticket_id = %ticket.id,
                    created_by = %ticket.created_by,
                    priority = %ticket.priority,
                    has_attachment = ticket.attachment_url.is_some(),
                    "ticket created"
                );
                Ok(ticket)
            }
            Err(e) => {
                error!(error = %e, "ticket write failed");
                if let Some(url) = attachment_url {
                    self.discard_blob(&url).await;
                }
                Err(e)
            }
        }
    }

    /// Move a ticket to `status`. Agents only.
    ///
    /// Under the forward-only policy backward moves are a `Conflict`, and the
    /// write only applies if nobody changed the status since it was read.
    /// Writing the current status again succeeds without touching the store.
    pub async fn update_status(
        &self,
        session: &Session,
        id: &TicketId,
        status: TicketStatus,
    ) -> Result<(), HelpdeskError> {
        require_role(session, Role::Agent, "change ticket status")?;

        let expected = match self.policy.status_transitions {
            StatusTransitionPolicy::Any => None,
            StatusTransitionPolicy::ForwardOnly => {
                let current = self.get(session, id).await?.status;
                if current == status {
                    debug!(ticket_id = %id, %status, "status unchanged");
                    return Ok(());
                }
                if !current.can_transition_to(status, self.policy.status_transitions) {
                    return Err(HelpdeskError::conflict(format!(
                        "ticket {id} cannot move from {current} back to {status}"
                    )));
                }
                Some(current)
            }
        };

        self.store
            .update_status(id, status, expected)
            .await
            .inspect_err(|e| error!(ticket_id = %id, error = %e, "status update failed"))?;
        info!(ticket_id = %id, %status, agent = %session.principal_id(), "ticket status changed");
        Ok(())
    }

    /// Assign a ticket to the acting agent.
    ///
    /// With single assignment enabled a ticket held by another agent yields
    /// `Conflict`; claiming a ticket already held by the caller succeeds.
    pub async fn assign(&self, session: &Session, id: &TicketId) -> Result<(), HelpdeskError> {
        require_role(session, Role::Agent, "assign tickets")?;
        let agent = session.principal_id();
        self.store
            .assign(id, agent, self.policy.assign_mode())
            .await
            .inspect_err(|e| error!(ticket_id = %id, error = %e, "assignment failed"))?;
        info!(ticket_id = %id, %agent, "ticket assigned");
        Ok(())
    }

    /// Permanently delete a ticket. Only its creator may, and only with
    /// explicit confirmation.
    pub async fn delete(
        &self,
        session: &Session,
        id: &TicketId,
        confirmation: Confirmation,
    ) -> Result<(), HelpdeskError> {
        require_role(session, Role::Customer, "delete tickets")?;
        if confirmation != Confirmation::Confirmed {
            return Err(HelpdeskError::ConfirmationRequired);
        }

        let ticket = self.get(session, id).await?;
        if &ticket.created_by != session.principal_id() {
            return Err(HelpdeskError::unauthorized(
                "delete tickets",
                "only the ticket's creator may delete it",
            ));
        }

        self.store
            .delete(id)
            .await
            .inspect_err(|e| error!(ticket_id = %id, error = %e, "delete failed"))?;
        info!(ticket_id = %id, "ticket deleted");

        if let Some(url) = ticket.attachment_url {
            if self.policy.delete_attachments {
                self.discard_blob(&url).await;
            } else {
                debug!(ticket_id = %id, url = %url, "attachment left in blob store");
            }
        }
        Ok(())
    }

    /// Best-effort blob removal; failures are logged only.
    async fn discard_blob(&self, url: &str) {
        if let Err(e) = self.blobs.delete(url).await {
            warn!(url, error = %e, "failed to remove attachment blob");
        }
    }
}

fn new_ticket(
    valid: ValidTicket,
    attachment_url: Option<String>,
    session: &Session,
    now: chrono::DateTime<chrono::Utc>,
) -> NewTicket {
    NewTicket {
        title: valid.title,
        description: valid.description,
        priority: valid.priority,
        category: valid.category,
        contact_email: valid.contact_email,
        contact_phone: valid.contact_phone,
        additional_notes: valid.additional_notes,
        attachment_url,
        created_by: session.principal_id().clone(),
        created_at: now,
    }
}

/// Any blob store failure during creation is reported as an upload failure.
fn into_upload_error(e: HelpdeskError) -> HelpdeskError {
    match e {
        upload @ HelpdeskError::Upload { .. } => upload,
        other => HelpdeskError::Upload {
            message: other.to_string(),
            source: Some(Box::new(other)),
        },
    }
}
