// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem implementation of the BlobStore trait.
//!
//! Blobs are written under `attachments.root_dir` at the store-relative path
//! the caller derived. Each write lands in a temporary file first and is
//! renamed into place, so an upload is either complete or absent.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use helpdesk_config::model::AttachmentsConfig;
use helpdesk_core::{
    AdapterType, Attachment, BlobStore, HealthStatus, HelpdeskError, PluginAdapter, StoredBlob,
};
use tracing::{debug, info};

/// Blob store rooted at a local directory.
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: String,
    max_size_bytes: u64,
}

impl LocalBlobStore {
    pub fn new(config: &AttachmentsConfig) -> Self {
        Self {
            root: PathBuf::from(&config.root_dir),
            public_base_url: config.public_base_url.trim().trim_end_matches('/').to_string(),
            max_size_bytes: config.max_size_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Link `partial` into place under `path`, or under a numbered variant
    /// of it when that name is taken. Existing blobs are never replaced.
    async fn publish_partial(&self, partial: &Path, path: &str) -> Result<String, HelpdeskError> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let candidate = numbered_path(path, attempt);
            let target = self.resolve(&candidate)?;
            match tokio::fs::hard_link(partial, &target).await {
                Ok(()) => return Ok(candidate),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    debug!(path = %candidate, "blob name taken, trying next");
                }
                Err(e) => {
                    return Err(upload_err(format!("cannot finalize {}", target.display()), e));
                }
            }
        }
        Err(HelpdeskError::Upload {
            message: format!("no free blob name for {path} after {MAX_NAME_ATTEMPTS} attempts"),
            source: None,
        })
    }

    /// Public URL for a store-relative path.
    pub fn url_for(&self, path: &str) -> String {
        if self.public_base_url.is_empty() {
            let absolute = std::path::absolute(self.root.join(path))
                .unwrap_or_else(|_| self.root.join(path));
            format!("file://{}", absolute.display())
        } else {
            format!("{}/{path}", self.public_base_url)
        }
    }

    /// Inverse of [`url_for`](Self::url_for).
    fn path_for_url(&self, url: &str) -> Option<String> {
        if self.public_base_url.is_empty() {
            let local = url.strip_prefix("file://")?;
            let absolute = std::path::absolute(&self.root).unwrap_or_else(|_| self.root.clone());
            Path::new(local)
                .strip_prefix(&absolute)
                .ok()
                .map(|rel| rel.to_string_lossy().into_owned())
        } else {
            url.strip_prefix(&self.public_base_url)
                .and_then(|rest| rest.strip_prefix('/'))
                .map(str::to_string)
        }
    }

    /// Resolve a store-relative path under the root, rejecting anything that
    /// could escape it.
    fn resolve(&self, path: &str) -> Result<PathBuf, HelpdeskError> {
        let relative = Path::new(path);
        let confined = !path.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !confined {
            return Err(HelpdeskError::Upload {
                message: format!("invalid blob path `{path}`"),
                source: None,
            });
        }
        Ok(self.root.join(relative))
    }
}

fn upload_err(message: impl Into<String>, source: std::io::Error) -> HelpdeskError {
    HelpdeskError::Upload {
        message: message.into(),
        source: Some(Box::new(source)),
    }
}

#[async_trait]
impl PluginAdapter for LocalBlobStore {
    fn name(&self) -> &str {
        "local-fs"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::BlobStore
    }

    async fn health_check(&self) -> Result<HealthStatus, HelpdeskError> {
        if let Err(e) = tokio::fs::create_dir_all(&self.root).await {
            return Ok(HealthStatus::Unhealthy(format!(
                "cannot create {}: {e}",
                self.root.display()
            )));
        }
        match tokio::fs::metadata(&self.root).await {
            Ok(meta) if meta.permissions().readonly() => Ok(HealthStatus::Degraded(format!(
                "{} is read-only",
                self.root.display()
            ))),
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), HelpdeskError> {
        Ok(())
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(
        &self,
        path: &str,
        attachment: &Attachment,
    ) -> Result<StoredBlob, HelpdeskError> {
        let size = attachment.bytes.len() as u64;
        if size > self.max_size_bytes {
            return Err(HelpdeskError::Upload {
                message: format!(
                    "{} is {size} bytes, limit is {}",
                    attachment.file_name, self.max_size_bytes
                ),
                source: None,
            });
        }

        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| upload_err(format!("cannot create {}", parent.display()), e))?;
        }

        let partial = target.with_extension(format!("{}.part", uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&partial, &attachment.bytes)
            .await
            .map_err(|e| upload_err(format!("cannot write {}", partial.display()), e))?;
        let stored = self.publish_partial(&partial, path).await;
        let _ = tokio::fs::remove_file(&partial).await;
        let path = stored?;

        let url = self.url_for(&path);
        info!(path = %path, size, "attachment stored");
        Ok(StoredBlob { path, url })
    }

    async fn delete(&self, url: &str) -> Result<(), HelpdeskError> {
        let path = self.path_for_url(url).ok_or_else(|| {
            HelpdeskError::storage(format!("{url} does not belong to this blob store"))
        })?;
        let target = self.resolve(&path)?;
        tokio::fs::remove_file(&target)
            .await
            .map_err(HelpdeskError::storage)?;
        debug!(path = %path, "attachment removed");
        Ok(())
    }
}

/// Upper bound on numbered variants tried for one upload.
const MAX_NAME_ATTEMPTS: u32 = 32;

/// `dir/name.ext` for attempt 0, `dir/name-1.ext` for attempt 1, and so on.
fn numbered_path(path: &str, attempt: u32) -> String {
    if attempt == 0 {
        return path.to_string();
    }
    let (dir, file) = match path.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, path),
    };
    let file = match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{attempt}.{ext}"),
        _ => format!("{file}-{attempt}"),
    };
    match dir {
        Some(dir) => format!("{dir}/{file}"),
        None => file,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(root: &Path, base: &str) -> AttachmentsConfig {
        AttachmentsConfig {
            root_dir: root.to_string_lossy().into_owned(),
            public_base_url: base.to_string(),
            max_size_bytes: 16,
            ..AttachmentsConfig::default()
        }
    }

    fn attachment(bytes: &[u8]) -> Attachment {
        Attachment {
            file_name: "log.txt".into(),
            content_type: Some("text/plain".into()),
            bytes: bytes.to_vec(),
        }
    }

    #[tokio::test]
    async fn upload_writes_file_and_returns_public_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(&config(dir.path(), "https://files.example.com/"));
        let blob = store
            .upload("attachments/1700000000000_log.txt", &attachment(b"hello"))
            .await
            .unwrap();

        assert_eq!(
            blob.url,
            "https://files.example.com/attachments/1700000000000_log.txt"
        );
        let written = std::fs::read(dir.path().join("attachments/1700000000000_log.txt")).unwrap();
        assert_eq!(written, b"hello");

        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("attachments"))
            .unwrap()
            .collect();
        assert_eq!(leftovers.len(), 1, "no partial files remain");
    }

    #[tokio::test]
    async fn file_urls_when_no_base_configured() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(&config(dir.path(), ""));
        let blob = store
            .upload("attachments/1_a.txt", &attachment(b"x"))
            .await
            .unwrap();
        assert!(blob.url.starts_with("file://"));
        assert!(blob.url.ends_with("attachments/1_a.txt"));

        store.delete(&blob.url).await.unwrap();
        assert!(!dir.path().join("attachments/1_a.txt").exists());
    }

    #[tokio::test]
    async fn oversized_upload_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(&config(dir.path(), ""));
        let err = store
            .upload("attachments/big.bin", &attachment(&[0u8; 17]))
            .await
            .unwrap_err();
        assert!(matches!(err, HelpdeskError::Upload { .. }));
    }

    #[tokio::test]
    async fn traversal_paths_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(&config(dir.path(), ""));
        for path in ["../escape.txt", "/etc/passwd", ""] {
            assert!(
                store.upload(path, &attachment(b"x")).await.is_err(),
                "{path} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn delete_of_foreign_url_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(&config(dir.path(), "https://files.example.com"));
        assert!(store.delete("https://elsewhere.com/a.txt").await.is_err());
    }

    #[test]
    fn numbered_paths_keep_directory_and_extension() {
        assert_eq!(numbered_path("attachments/1_log.txt", 0), "attachments/1_log.txt");
        assert_eq!(numbered_path("attachments/1_log.txt", 2), "attachments/1_log-2.txt");
        assert_eq!(numbered_path("attachments/1_README", 1), "attachments/1_README-1");
        assert_eq!(numbered_path(".env", 1), ".env-1");
    }

    #[tokio::test]
    async fn colliding_upload_does_not_replace_existing_blob() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(&config(dir.path(), ""));
        let first = store
            .upload("attachments/5_log.txt", &attachment(b"first"))
            .await
            .unwrap();
        let second = store
            .upload("attachments/5_log.txt", &attachment(b"second"))
            .await
            .unwrap();

        assert_ne!(first.url, second.url);
        assert_eq!(second.path, "attachments/5_log-1.txt");
        let root = dir.path().join("attachments");
        assert_eq!(std::fs::read(root.join("5_log.txt")).unwrap(), b"first");
        assert_eq!(std::fs::read(root.join("5_log-1.txt")).unwrap(), b"second");
        assert_eq!(std::fs::read_dir(&root).unwrap().count(), 2, "no partial files remain");
    }

    #[tokio::test]
    async fn health_check_creates_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("blobs");
        let store = LocalBlobStore::new(&config(&root, ""));
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
        assert!(root.exists());
    }
}
