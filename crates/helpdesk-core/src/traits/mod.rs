// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod blob_store;
pub mod clock;
pub mod identity;
pub mod ticket_store;

pub use adapter::PluginAdapter;
pub use blob_store::BlobStore;
pub use clock::{Clock, SystemClock};
pub use identity::IdentityProvider;
pub use ticket_store::TicketStore;
