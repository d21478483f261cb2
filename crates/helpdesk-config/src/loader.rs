// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./helpdesk.toml` > `~/.config/helpdesk/helpdesk.toml` >
//! `/etc/helpdesk/helpdesk.toml` with environment variable overrides via `HELPDESK_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::HelpdeskConfig;

pub(crate) const SYSTEM_CONFIG: &str = "/etc/helpdesk/helpdesk.toml";
pub(crate) const LOCAL_CONFIG: &str = "helpdesk.toml";

pub(crate) fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("helpdesk/helpdesk.toml"))
        .unwrap_or_default()
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/helpdesk/helpdesk.toml`
/// 3. `~/.config/helpdesk/helpdesk.toml`
/// 4. `./helpdesk.toml`
/// 5. `HELPDESK_*` environment variables
pub fn load_config() -> Result<HelpdeskConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only. No files, no env.
pub fn load_config_from_str(toml_content: &str) -> Result<HelpdeskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HelpdeskConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<HelpdeskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HelpdeskConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment used by [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(HelpdeskConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Map `HELPDESK_SECTION_KEY` to `section.key`.
///
/// Only the first underscore after the section name becomes a dot, so
/// `HELPDESK_STORAGE_POLL_INTERVAL_MS` maps to `storage.poll_interval_ms`.
fn env_provider() -> Env {
    Env::prefixed("HELPDESK_").map(|key| map_env_key(key.as_str()).into())
}

pub(crate) fn map_env_key(key: &str) -> String {
    const SECTIONS: [&str; 4] = ["app", "storage", "attachments", "policy"];
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("app_log_level"), "app.log_level");
        assert_eq!(
            map_env_key("storage_poll_interval_ms"),
            "storage.poll_interval_ms"
        );
        assert_eq!(
            map_env_key("attachments_public_base_url"),
            "attachments.public_base_url"
        );
        assert_eq!(
            map_env_key("policy_single_assignment"),
            "policy.single_assignment"
        );
        assert_eq!(map_env_key("unrelated"), "unrelated");
    }

    #[test]
    fn env_overrides_apply_through_provider() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("HELPDESK_STORAGE_POLL_INTERVAL_MS", "250");
            jail.set_env("HELPDESK_POLICY_STATUS_TRANSITIONS", "any");
            let config: HelpdeskConfig = Figment::new()
                .merge(Serialized::defaults(HelpdeskConfig::default()))
                .merge(env_provider())
                .extract()?;
            assert_eq!(config.storage.poll_interval_ms, 250);
            assert_eq!(
                config.policy.status_transitions,
                helpdesk_core::types::StatusTransitionPolicy::Any
            );
            Ok(())
        });
    }
}
