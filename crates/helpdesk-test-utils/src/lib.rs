// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Helpdesk integration tests.
//!
//! Provides deterministic stand-ins for the external collaborators and a
//! harness that assembles a full repository around them.
//!
//! # Components
//!
//! - [`InMemoryTicketStore`] - ticket store with the same change-feed semantics as SQLite
//! - [`MockBlobStore`] - captures uploads, injectable failures
//! - [`FixedClock`] - settable time source
//! - [`TestHarness`] - repository plus two customers and two agents

pub mod clock;
pub mod harness;
pub mod memory_store;
pub mod mock_blob_store;

pub use clock::FixedClock;
pub use harness::{TestHarness, TestHarnessBuilder};
pub use memory_store::InMemoryTicketStore;
pub use mock_blob_store::MockBlobStore;
