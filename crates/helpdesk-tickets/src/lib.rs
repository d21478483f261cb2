// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket repository for the Helpdesk ticket tracker.
//!
//! The [`TicketRepository`] is the only way the presentation layer touches
//! tickets. It scopes reads by role, validates new tickets, sequences the
//! attachment upload before the document write, and enforces who may change
//! status, assign, and delete.

pub mod policy;
pub mod repository;
pub mod session;
pub mod validation;

pub use policy::RepositoryPolicy;
pub use repository::{Confirmation, TicketRepository};
pub use session::Session;
pub use validation::{TicketDraft, ValidTicket, attachment_path, validate_draft};
