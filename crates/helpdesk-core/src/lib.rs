// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Helpdesk ticket tracker.
//!
//! This crate provides the domain types, the stored document format, the
//! error taxonomy, live-query subscriptions, and the adapter traits that the
//! storage, attachment, and identity backends implement.

pub mod error;
pub mod record;
pub mod subscription;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{FieldError, HelpdeskError, TicketField, ValidationErrors, WriteOperation};
pub use record::TicketDocument;
pub use subscription::{SnapshotPublisher, SnapshotResult, TicketSubscription};
pub use types::{
    AdapterType, AssignMode, Attachment, Category, Credentials, HealthStatus, NewTicket,
    Principal, PrincipalId, Priority, Role, StatusTransitionPolicy, StoredBlob, Ticket,
    TicketFilter, TicketId, TicketStatus,
};

pub use traits::{BlobStore, Clock, IdentityProvider, PluginAdapter, SystemClock, TicketStore};
