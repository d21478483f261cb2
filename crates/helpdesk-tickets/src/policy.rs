// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifecycle and authorization rules applied by the repository.

use helpdesk_config::HelpdeskConfig;
use helpdesk_core::{AssignMode, HelpdeskError, Role, StatusTransitionPolicy};

use crate::session::Session;

/// Repository behaviour derived from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryPolicy {
    pub status_transitions: StatusTransitionPolicy,
    /// Reject assigning a ticket already held by another agent.
    pub single_assignment: bool,
    /// Blob path prefix for uploaded attachments.
    pub attachment_prefix: String,
    pub max_attachment_bytes: u64,
    /// Remove a ticket's attachment blob when the ticket is deleted.
    pub delete_attachments: bool,
}

impl RepositoryPolicy {
    pub fn from_config(config: &HelpdeskConfig) -> Self {
        Self {
            status_transitions: config.policy.status_transitions,
            single_assignment: config.policy.single_assignment,
            attachment_prefix: config.attachments.path_prefix.clone(),
            max_attachment_bytes: config.attachments.max_size_bytes,
            delete_attachments: config.attachments.delete_on_ticket_delete,
        }
    }

    pub fn assign_mode(&self) -> AssignMode {
        if self.single_assignment {
            AssignMode::IfUnassigned
        } else {
            AssignMode::Overwrite
        }
    }
}

impl Default for RepositoryPolicy {
    fn default() -> Self {
        Self::from_config(&HelpdeskConfig::default())
    }
}

/// Fail with `Unauthorized` unless the session holds `role`.
pub(crate) fn require_role(session: &Session, role: Role, action: &str) -> Result<(), HelpdeskError> {
    if session.role() == role {
        Ok(())
    } else {
        Err(HelpdeskError::unauthorized(
            action,
            format!("requires role {role}, signed in as {}", session.role()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_strict() {
        let policy = RepositoryPolicy::default();
        assert_eq!(policy.status_transitions, StatusTransitionPolicy::ForwardOnly);
        assert_eq!(policy.assign_mode(), AssignMode::IfUnassigned);
        assert!(!policy.delete_attachments);
        assert_eq!(policy.attachment_prefix, "attachments");
    }

    #[test]
    fn legacy_assignment_overwrites() {
        let policy = RepositoryPolicy {
            single_assignment: false,
            ..RepositoryPolicy::default()
        };
        assert_eq!(policy.assign_mode(), AssignMode::Overwrite);
    }
}
