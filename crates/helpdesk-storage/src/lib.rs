// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite ticket document store for the Helpdesk ticket tracker.
//!
//! Tickets are stored as JSON documents using the shared wire field names,
//! one row per ticket, behind a single-writer `tokio-rusqlite` connection with
//! embedded migrations. Live queries are driven by the in-process change bus
//! plus a `data_version` poller for commits made by other processes.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteTicketStore;
pub use database::Database;
