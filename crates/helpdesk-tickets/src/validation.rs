// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket form validation.
//!
//! Runs before any store or blob I/O and reports every failing field at once.

use chrono::{DateTime, Utc};
use helpdesk_core::{Attachment, Category, HelpdeskError, Priority, TicketField, ValidationErrors};

/// Raw input for a new ticket, as entered in the creation form.
#[derive(Debug, Clone, Default)]
pub struct TicketDraft {
    pub title: String,
    pub description: String,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
    pub contact_email: String,
    pub contact_phone: String,
    pub additional_notes: String,
    pub attachment: Option<Attachment>,
}

/// A draft that passed validation. Text fields are trimmed.
#[derive(Debug, Clone)]
pub struct ValidTicket {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub category: Category,
    pub contact_email: String,
    pub contact_phone: String,
    pub additional_notes: String,
    pub attachment: Option<Attachment>,
}

/// Validate `draft`, collecting every field error.
pub fn validate_draft(
    draft: TicketDraft,
    max_attachment_bytes: u64,
) -> Result<ValidTicket, HelpdeskError> {
    let mut errors = ValidationErrors::new();

    let title = required(&mut errors, TicketField::Title, "Title", &draft.title);
    let description = required(
        &mut errors,
        TicketField::Description,
        "Description",
        &draft.description,
    );
    let contact_email = required(
        &mut errors,
        TicketField::ContactEmail,
        "Contact email",
        &draft.contact_email,
    );
    if !contact_email.is_empty() && !is_plausible_email(&contact_email) {
        errors.push(
            TicketField::ContactEmail,
            "Contact email must be a valid e-mail address",
        );
    }
    if draft.priority.is_none() {
        errors.push(TicketField::Priority, "Priority is required");
    }
    if draft.category.is_none() {
        errors.push(TicketField::Category, "Category is required");
    }

    if let Some(attachment) = &draft.attachment {
        if base_file_name(&attachment.file_name).is_empty() {
            errors.push(TicketField::Attachment, "Attachment must have a file name");
        }
        let size = attachment.bytes.len() as u64;
        if size > max_attachment_bytes {
            errors.push(
                TicketField::Attachment,
                format!("Attachment is {size} bytes; the limit is {max_attachment_bytes}"),
            );
        }
    }

    match (draft.priority, draft.category) {
        (Some(priority), Some(category)) if errors.is_empty() => Ok(ValidTicket {
            title,
            description,
            priority,
            category,
            contact_email,
            contact_phone: draft.contact_phone.trim().to_string(),
            additional_notes: draft.additional_notes.trim().to_string(),
            attachment: draft.attachment,
        }),
        _ => Err(HelpdeskError::Validation(errors)),
    }
}

fn required(errors: &mut ValidationErrors, field: TicketField, label: &str, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(field, format!("{label} is required"));
    }
    trimmed.to_string()
}

/// `local@domain.tld` with no whitespace.
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty())
}

/// Final path component of a user-supplied file name.
pub fn base_file_name(file_name: &str) -> &str {
    file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
}

/// Blob path for an attachment uploaded at `at`: `{prefix}/{unix_millis}_{name}`.
///
/// The timestamp keeps concurrent uploads of equally named files apart.
/// Characters outside `[A-Za-z0-9._-]` in the name become `_`.
pub fn attachment_path(prefix: &str, at: DateTime<Utc>, file_name: &str) -> String {
    let name: String = base_file_name(file_name)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "{}/{}_{name}",
        prefix.trim_matches('/'),
        at.timestamp_millis()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn valid_draft() -> TicketDraft {
        TicketDraft {
            title: "Printer jam".into(),
            description: "Paper stuck".into(),
            priority: Some(Priority::Medium),
            category: Some(Category::Technical),
            contact_email: "a@x.com".into(),
            ..TicketDraft::default()
        }
    }

    #[test]
    fn valid_draft_is_trimmed() {
        let draft = TicketDraft {
            title: "  Printer jam ".into(),
            contact_phone: " 555-0100 ".into(),
            ..valid_draft()
        };
        let ticket = validate_draft(draft, 1024).unwrap();
        assert_eq!(ticket.title, "Printer jam");
        assert_eq!(ticket.contact_phone, "555-0100");
    }

    #[test]
    fn every_missing_field_is_reported() {
        let err = validate_draft(TicketDraft::default(), 1024).unwrap_err();
        let errors = err.validation_errors().unwrap();
        for field in [
            TicketField::Title,
            TicketField::Description,
            TicketField::Priority,
            TicketField::Category,
            TicketField::ContactEmail,
        ] {
            assert!(errors.for_field(field).is_some(), "{field} not reported");
        }
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn malformed_email_rejected() {
        for email in ["nobody", "a@", "@x.com", "a@x", "a b@x.com", "a@@x.com", "a@x.com."] {
            let draft = TicketDraft {
                contact_email: email.into(),
                ..valid_draft()
            };
            let err = validate_draft(draft, 1024).unwrap_err();
            assert!(
                err.validation_errors()
                    .and_then(|e| e.for_field(TicketField::ContactEmail))
                    .is_some(),
                "{email} should be rejected"
            );
        }
    }

    #[test]
    fn oversized_attachment_rejected() {
        let draft = TicketDraft {
            attachment: Some(Attachment {
                file_name: "dump.bin".into(),
                content_type: None,
                bytes: vec![0; 11],
            }),
            ..valid_draft()
        };
        let err = validate_draft(draft, 10).unwrap_err();
        assert!(
            err.validation_errors()
                .and_then(|e| e.for_field(TicketField::Attachment))
                .is_some()
        );
    }

    #[test]
    fn attachment_path_uses_millis_and_base_name() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(
            attachment_path("attachments", at, "C:\\Users\\me\\screen shot.png"),
            "attachments/1700000000123_screen_shot.png"
        );
        assert_eq!(
            attachment_path("/uploads/", at, "../../etc/passwd"),
            "uploads/1700000000123_passwd"
        );
    }

    proptest! {
        #[test]
        fn whitespace_only_required_fields_always_rejected(
            ws in "[ \t\r\n]{0,8}",
            field in 0usize..3,
        ) {
            let mut draft = valid_draft();
            let target = match field {
                0 => { draft.title = ws; TicketField::Title }
                1 => { draft.description = ws; TicketField::Description }
                _ => { draft.contact_email = ws; TicketField::ContactEmail }
            };
            let err = validate_draft(draft, 1024).unwrap_err();
            prop_assert!(err.validation_errors().and_then(|e| e.for_field(target)).is_some());
        }

        #[test]
        fn attachment_paths_stay_under_prefix(name in "\\PC{0,40}") {
            let at = Utc.timestamp_millis_opt(42).unwrap();
            let path = attachment_path("attachments", at, &name);
            prop_assert!(path.starts_with("attachments/42_"));
            prop_assert!(!path["attachments/".len()..].contains('/'));
        }
    }
}
