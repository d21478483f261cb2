// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the ticket repository.
//!
//! Enum string forms are the wire contract with the document store and must
//! not change: `in-progress` stays hyphenated, roles and priorities stay lowercase.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Opaque identifier assigned by the store when a ticket is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub String);

impl TicketId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first eight characters, as shown in list views.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for TicketId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Identifier of an authenticated principal, as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(pub String);

impl PrincipalId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for PrincipalId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Role of a principal. Fixed for the lifetime of a session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Files tickets and sees only their own.
    Customer,
    /// Triages and resolves every ticket.
    Agent,
}

/// An authenticated actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    pub email: String,
    pub role: Role,
}

impl Principal {
    pub fn is_agent(&self) -> bool {
        self.role == Role::Agent
    }

    pub fn is_customer(&self) -> bool {
        self.role == Role::Customer
    }
}

/// Credentials presented to an identity provider at sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
}

impl Credentials {
    pub fn email(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Technical,
    Billing,
    Feature,
    Other,
}

/// Lifecycle state of a ticket.
///
/// `Open` is the only initial state. `Resolved` is terminal under the
/// forward-only policy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
}

impl TicketStatus {
    /// All states in lifecycle order.
    pub const ALL: [TicketStatus; 3] = [Self::Open, Self::InProgress, Self::Resolved];

    fn rank(self) -> u8 {
        match self {
            Self::Open => 0,
            Self::InProgress => 1,
            Self::Resolved => 2,
        }
    }

    /// Whether moving from `self` to `next` is allowed under `policy`.
    ///
    /// Writing the current state again is always allowed.
    pub fn can_transition_to(self, next: TicketStatus, policy: StatusTransitionPolicy) -> bool {
        match policy {
            StatusTransitionPolicy::Any => true,
            StatusTransitionPolicy::ForwardOnly => next.rank() >= self.rank(),
        }
    }
}

/// Which status transitions the repository accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum StatusTransitionPolicy {
    /// Any target status is written unconditionally.
    Any,
    /// Only `open -> in-progress -> resolved` (skipping allowed) and same-state writes.
    #[default]
    ForwardOnly,
}

/// How the store applies an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignMode {
    /// Write only if the ticket is unassigned or already held by the same agent.
    IfUnassigned,
    /// Last write wins.
    Overwrite,
}

/// A support ticket as seen by the rest of the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: TicketId,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub category: Category,
    pub contact_email: String,
    pub contact_phone: String,
    pub additional_notes: String,
    pub attachment_url: Option<String>,
    pub status: TicketStatus,
    pub created_by: PrincipalId,
    pub assigned_to: Option<PrincipalId>,
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    pub fn is_assigned(&self) -> bool {
        self.assigned_to.is_some()
    }

    /// Creators always see their tickets; agents see every ticket.
    pub fn is_visible_to(&self, principal: &Principal) -> bool {
        principal.is_agent() || self.created_by == principal.id
    }
}

/// A validated ticket ready to be persisted.
///
/// Carries no status or assignee: every new ticket starts `open` and unassigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub category: Category,
    pub contact_email: String,
    pub contact_phone: String,
    pub additional_notes: String,
    pub attachment_url: Option<String>,
    pub created_by: PrincipalId,
    pub created_at: DateTime<Utc>,
}

/// The set of tickets a query targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketFilter {
    /// Every ticket in the collection.
    All,
    /// Tickets whose `createdBy` equals the given principal.
    CreatedBy(PrincipalId),
}

impl TicketFilter {
    /// The role-scoped filter for `principal`.
    pub fn for_principal(principal: &Principal) -> Self {
        match principal.role {
            Role::Agent => Self::All,
            Role::Customer => Self::CreatedBy(principal.id.clone()),
        }
    }

    pub fn matches(&self, ticket: &Ticket) -> bool {
        match self {
            Self::All => true,
            Self::CreatedBy(id) => &ticket.created_by == id,
        }
    }
}

/// A binary attachment supplied at ticket creation.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Result of a completed blob upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    /// Store-relative path the blob was written under.
    pub path: String,
    /// Publicly retrievable URL.
    pub url: String,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded(String),
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    TicketStore,
    BlobStore,
    Identity,
}
