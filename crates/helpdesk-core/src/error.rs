// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Helpdesk ticket tracker.

use std::fmt;

use strum::Display;
use thiserror::Error;

use crate::types::TicketId;

/// The primary error type used across all Helpdesk adapter traits and core operations.
#[derive(Debug, Error)]
pub enum HelpdeskError {
    /// Configuration errors (invalid values detected after loading).
    #[error("configuration error: {0}")]
    Config(String),

    /// One or more ticket fields failed validation. Raised before any I/O.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// Attachment transfer to the blob store failed. Ticket creation is aborted.
    #[error("attachment upload failed: {message}")]
    Upload {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Store read failures (connection, query, document decoding).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A create/update/delete was rejected by the store.
    #[error("{operation} rejected by store: {source}")]
    Write {
        operation: WriteOperation,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The principal's role or ownership does not permit the operation.
    #[error("not authorized to {action}: {reason}")]
    Unauthorized { action: String, reason: String },

    /// Sign-in was refused by the identity provider.
    #[error("sign-in failed: {0}")]
    Unauthenticated(String),

    /// The ticket id does not reference an existing (visible) ticket.
    #[error("ticket not found: {id}")]
    NotFound { id: TicketId },

    /// The lifecycle policy or a concurrent write rejected the change.
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// A destructive operation was issued without explicit confirmation.
    #[error("deleting a ticket requires explicit confirmation")]
    ConfirmationRequired,

    /// Adapter health check failed.
    #[error("health check failed for {name}: {source}")]
    HealthCheckFailed {
        name: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HelpdeskError {
    /// Build a `Storage` error from any boxed-compatible source.
    pub fn storage(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Storage {
            source: source.into(),
        }
    }

    /// Build a `Write` error for the given operation.
    pub fn write(
        operation: WriteOperation,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Write {
            operation,
            source: source.into(),
        }
    }

    /// Build an `Unauthorized` error.
    pub fn unauthorized(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            action: action.into(),
            reason: reason.into(),
        }
    }

    /// Build a `Conflict` error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Returns the per-field errors if this is a validation failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

/// The kind of store write that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum WriteOperation {
    Create,
    UpdateStatus,
    Assign,
    Delete,
}

/// A ticket form field, named as it appears in the stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "camelCase")]
pub enum TicketField {
    Title,
    Description,
    Priority,
    Category,
    ContactEmail,
    ContactPhone,
    AdditionalNotes,
    Attachment,
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: TicketField,
    pub message: String,
}

/// All validation failures collected for one submission.
///
/// Collected without failing fast so every invalid field can be shown inline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for `field`.
    pub fn push(&mut self, field: TicketField, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// First message recorded for `field`, if any.
    pub fn for_field(&self, field: TicketField) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// `Ok(())` when empty, otherwise `Err(HelpdeskError::Validation)`.
    pub fn into_result(self) -> Result<(), HelpdeskError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(HelpdeskError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}
