// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock blob store adapter for deterministic testing.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use helpdesk_core::{
    AdapterType, Attachment, BlobStore, HealthStatus, HelpdeskError, PluginAdapter, StoredBlob,
};
use tokio::sync::Mutex;

/// URL prefix of every blob this mock hands out.
pub const MOCK_BLOB_BASE: &str = "https://blobs.test";

/// A blob store that records uploads instead of storing them.
pub struct MockBlobStore {
    uploads: Arc<Mutex<Vec<(String, Attachment)>>>,
    deleted: Arc<Mutex<Vec<String>>>,
    fail_uploads: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self {
            uploads: Arc::new(Mutex::new(Vec::new())),
            deleted: Arc::new(Mutex::new(Vec::new())),
            fail_uploads: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        }
    }

    /// Make every subsequent upload fail with `HelpdeskError::Upload`.
    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Paths and attachments received by `upload`, in order.
    pub async fn uploads(&self) -> Vec<(String, Attachment)> {
        self.uploads.lock().await.clone()
    }

    /// URLs received by `delete`, in order.
    pub async fn deleted(&self) -> Vec<String> {
        self.deleted.lock().await.clone()
    }
}

impl Default for MockBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockBlobStore {
    fn name(&self) -> &str {
        "mock-blobs"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::BlobStore
    }

    async fn health_check(&self) -> Result<HealthStatus, HelpdeskError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HelpdeskError> {
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    async fn upload(&self, path: &str, attachment: &Attachment) -> Result<StoredBlob, HelpdeskError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(HelpdeskError::Upload {
                message: format!("injected failure uploading {path}"),
                source: None,
            });
        }
        self.uploads
            .lock()
            .await
            .push((path.to_string(), attachment.clone()));
        Ok(StoredBlob {
            path: path.to_string(),
            url: format!("{MOCK_BLOB_BASE}/{path}"),
        })
    }

    async fn delete(&self, url: &str) -> Result<(), HelpdeskError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(HelpdeskError::storage(format!("injected failure deleting {url}")));
        }
        self.deleted.lock().await.push(url.to_string());
        Ok(())
    }
}
