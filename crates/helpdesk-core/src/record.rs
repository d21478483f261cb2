// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stored ticket document format.
//!
//! Field names and enum values are shared with any existing ticket collection,
//! so this struct is the only place the on-store shape is defined. The document
//! id is the store key and is not part of the body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::HelpdeskError;
use crate::types::{
    Category, NewTicket, PrincipalId, Priority, Ticket, TicketId, TicketStatus,
};

/// A ticket record as written to the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDocument {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub category: Category,
    pub contact_email: String,
    #[serde(default)]
    pub contact_phone: String,
    #[serde(default)]
    pub additional_notes: String,
    /// Empty string when no attachment was uploaded.
    #[serde(default)]
    pub attachment_url: String,
    pub status: TicketStatus,
    pub created_by: PrincipalId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<PrincipalId>,
    pub created_at: DateTime<Utc>,
}

impl TicketDocument {
    /// The initial document for a new ticket: `open`, unassigned.
    pub fn from_new(ticket: NewTicket) -> Self {
        Self {
            title: ticket.title,
            description: ticket.description,
            priority: ticket.priority,
            category: ticket.category,
            contact_email: ticket.contact_email,
            contact_phone: ticket.contact_phone,
            additional_notes: ticket.additional_notes,
            attachment_url: ticket.attachment_url.unwrap_or_default(),
            status: TicketStatus::Open,
            created_by: ticket.created_by,
            assigned_to: None,
            created_at: ticket.created_at,
        }
    }

    /// Attach the store key and map to the domain entity.
    pub fn into_ticket(self, id: TicketId) -> Ticket {
        Ticket {
            id,
            title: self.title,
            description: self.description,
            priority: self.priority,
            category: self.category,
            contact_email: self.contact_email,
            contact_phone: self.contact_phone,
            additional_notes: self.additional_notes,
            attachment_url: Some(self.attachment_url).filter(|url| !url.is_empty()),
            status: self.status,
            created_by: self.created_by,
            assigned_to: self.assigned_to.filter(|id| !id.as_str().is_empty()),
            created_at: self.created_at,
        }
    }

    /// Back to document form, e.g. for in-memory stores.
    pub fn from_ticket(ticket: &Ticket) -> Self {
        Self {
            title: ticket.title.clone(),
            description: ticket.description.clone(),
            priority: ticket.priority,
            category: ticket.category,
            contact_email: ticket.contact_email.clone(),
            contact_phone: ticket.contact_phone.clone(),
            additional_notes: ticket.additional_notes.clone(),
            attachment_url: ticket.attachment_url.clone().unwrap_or_default(),
            status: ticket.status,
            created_by: ticket.created_by.clone(),
            assigned_to: ticket.assigned_to.clone(),
            created_at: ticket.created_at,
        }
    }

    pub fn to_json(&self) -> Result<String, HelpdeskError> {
        serde_json::to_string(self).map_err(HelpdeskError::storage)
    }

    pub fn from_json(json: &str) -> Result<Self, HelpdeskError> {
        serde_json::from_str(json).map_err(HelpdeskError::storage)
    }
}
