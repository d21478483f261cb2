// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blob store adapter trait for ticket attachments.

use async_trait::async_trait;

use crate::error::HelpdeskError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Attachment, StoredBlob};

/// Adapter for binary attachment storage.
#[async_trait]
pub trait BlobStore: PluginAdapter {
    /// Upload `attachment` under `path`. Resolves only after the transfer has
    /// completed, with a URL the blob can be retrieved from.
    async fn upload(&self, path: &str, attachment: &Attachment) -> Result<StoredBlob, HelpdeskError>;

    /// Remove the blob previously returned at `url`.
    async fn delete(&self, url: &str) -> Result<(), HelpdeskError>;
}
