// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::HelpdeskConfig;

/// Smallest accepted change-detection cadence.
pub const MIN_POLL_INTERVAL_MS: u64 = 50;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure rather than stopping at the first.
pub fn validate_config(config: &HelpdeskConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    if config.storage.poll_interval_ms < MIN_POLL_INTERVAL_MS {
        errors.push(ConfigError::validation(format!(
            "storage.poll_interval_ms must be at least {MIN_POLL_INTERVAL_MS}, got {}",
            config.storage.poll_interval_ms
        )));
    }

    let attachments = &config.attachments;
    if attachments.root_dir.trim().is_empty() {
        errors.push(ConfigError::validation(
            "attachments.root_dir must not be empty",
        ));
    }
    if attachments.path_prefix.trim().trim_matches('/').is_empty() {
        errors.push(ConfigError::validation(
            "attachments.path_prefix must not be empty",
        ));
    }
    if attachments.max_size_bytes == 0 {
        errors.push(ConfigError::validation(
            "attachments.max_size_bytes must be greater than 0",
        ));
    }
    let base = attachments.public_base_url.trim();
    if !base.is_empty()
        && !["http://", "https://", "file://"]
            .iter()
            .any(|scheme| base.starts_with(scheme))
    {
        errors.push(ConfigError::validation(format!(
            "attachments.public_base_url `{base}` must start with http://, https:// or file://"
        )));
    }

    let mut seen_ids = HashSet::new();
    let mut seen_emails = HashSet::new();
    for (i, principal) in config.principals.iter().enumerate() {
        if principal.id.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "principals[{i}].id must not be empty"
            )));
        } else if !seen_ids.insert(principal.id.as_str()) {
            errors.push(ConfigError::validation(format!(
                "duplicate principal id `{}` in [[principals]] array",
                principal.id
            )));
        }

        let email = principal.email.trim();
        if email.is_empty() {
            errors.push(ConfigError::validation(format!(
                "principals[{i}].email must not be empty"
            )));
        } else if !seen_emails.insert(email.to_lowercase()) {
            errors.push(ConfigError::validation(format!(
                "duplicate principal email `{email}` in [[principals]] array"
            )));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
