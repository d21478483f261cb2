// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Helpdesk ticket tracker.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use helpdesk_core::types::{Role, StatusTransitionPolicy};
use serde::{Deserialize, Serialize};

/// Top-level Helpdesk configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HelpdeskConfig {
    /// Process-wide settings.
    #[serde(default)]
    pub app: AppConfig,

    /// Ticket document store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Attachment blob store settings.
    #[serde(default)]
    pub attachments: AttachmentsConfig,

    /// Ticket lifecycle and assignment rules.
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Principals known to the directory identity provider.
    #[serde(default)]
    pub principals: Vec<PrincipalConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// How often live queries check for commits made by other processes.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn data_path(file: &str) -> String {
    dirs::data_dir()
        .map(|p| p.join("helpdesk").join(file))
        .unwrap_or_else(|| std::path::PathBuf::from(file))
        .to_string_lossy()
        .into_owned()
}

fn default_database_path() -> String {
    data_path("helpdesk.db")
}

fn default_wal_mode() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    500
}

/// Attachment blob store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AttachmentsConfig {
    /// Directory blobs are written under.
    #[serde(default = "default_root_dir")]
    pub root_dir: String,

    /// Base URL blobs are served from. Empty means `file://` URLs under `root_dir`.
    #[serde(default)]
    pub public_base_url: String,

    /// Path prefix for uploaded attachments, relative to `root_dir`.
    #[serde(default = "default_path_prefix")]
    pub path_prefix: String,

    /// Largest accepted attachment.
    #[serde(default = "default_max_size_bytes")]
    pub max_size_bytes: u64,

    /// Remove the blob when its ticket is deleted. Off by default, which
    /// leaves orphaned blobs behind.
    #[serde(default)]
    pub delete_on_ticket_delete: bool,
}

impl Default for AttachmentsConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            public_base_url: String::new(),
            path_prefix: default_path_prefix(),
            max_size_bytes: default_max_size_bytes(),
            delete_on_ticket_delete: false,
        }
    }
}

fn default_root_dir() -> String {
    data_path("blobs")
}

fn default_path_prefix() -> String {
    "attachments".to_string()
}

fn default_max_size_bytes() -> u64 {
    10 * 1024 * 1024
}

/// Ticket lifecycle and assignment rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    /// `forward-only` or `any`.
    #[serde(default)]
    pub status_transitions: StatusTransitionPolicy,

    /// Reject assignment of a ticket already held by another agent.
    #[serde(default = "default_single_assignment")]
    pub single_assignment: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            status_transitions: StatusTransitionPolicy::default(),
            single_assignment: default_single_assignment(),
        }
    }
}

fn default_single_assignment() -> bool {
    true
}

/// One `[[principals]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrincipalConfig {
    pub id: String,
    pub email: String,
    pub role: Role,
}
