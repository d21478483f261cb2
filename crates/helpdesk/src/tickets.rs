// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket subcommands.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use futures::StreamExt;
use helpdesk_core::{
    Attachment, Category, HelpdeskError, Priority, TicketId, TicketStatus,
};
use helpdesk_tickets::{Confirmation, Session, TicketDraft};
use tracing::debug;

use crate::app::App;
use crate::render;
use crate::shutdown::install_signal_handler;

/// Fields of the ticket creation form.
#[derive(Args, Debug)]
pub struct CreateArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub description: String,
    /// low, medium, or high.
    #[arg(long, value_parser = crate::parse_priority)]
    pub priority: Option<Priority>,
    /// technical, billing, feature, or other.
    #[arg(long, value_parser = crate::parse_category)]
    pub category: Option<Category>,
    /// Contact e-mail for follow-up.
    #[arg(long = "email")]
    pub contact_email: String,
    #[arg(long = "phone", default_value = "")]
    pub contact_phone: String,
    #[arg(long = "notes", default_value = "")]
    pub additional_notes: String,
    /// File to attach.
    #[arg(long, value_name = "FILE")]
    pub attach: Option<PathBuf>,
}

pub async fn list(
    app: &App,
    session: &Session,
    json: bool,
    color: bool,
) -> Result<(), HelpdeskError> {
    let tickets = app.repository.list(session).await?;
    if json {
        let rendered = serde_json::to_string_pretty(&tickets)
            .map_err(|e| HelpdeskError::Internal(e.to_string()))?;
        println!("{rendered}");
    } else {
        print!("{}", render::ticket_table(&tickets, color));
    }
    Ok(())
}

pub async fn show(
    app: &App,
    session: &Session,
    id: &str,
    color: bool,
) -> Result<(), HelpdeskError> {
    let ticket = app.repository.get(session, &TicketId::from(id)).await?;
    print!("{}", render::ticket_detail(&ticket, color));
    Ok(())
}

pub async fn create(app: &App, session: &Session, args: CreateArgs) -> Result<(), HelpdeskError> {
    let attachment = match &args.attach {
        Some(path) => Some(read_attachment(path).await?),
        None => None,
    };
    let draft = TicketDraft {
        title: args.title,
        description: args.description,
        priority: args.priority,
        category: args.category,
        contact_email: args.contact_email,
        contact_phone: args.contact_phone,
        additional_notes: args.additional_notes,
        attachment,
    };
    let ticket = app.repository.create(session, draft).await?;
    println!("Created ticket {}", ticket.id);
    if let Some(url) = ticket.attachment_url {
        println!("Attachment: {url}");
    }
    Ok(())
}

pub async fn set_status(
    app: &App,
    session: &Session,
    id: &str,
    status: TicketStatus,
) -> Result<(), HelpdeskError> {
    app.repository
        .update_status(session, &TicketId::from(id), status)
        .await?;
    println!("Ticket {id} is now {status}");
    Ok(())
}

pub async fn assign(app: &App, session: &Session, id: &str) -> Result<(), HelpdeskError> {
    app.repository.assign(session, &TicketId::from(id)).await?;
    println!("Ticket {id} assigned to {}", session.principal().email);
    Ok(())
}

pub async fn delete(
    app: &App,
    session: &Session,
    id: &str,
    yes: bool,
) -> Result<(), HelpdeskError> {
    let id = TicketId::from(id);
    let confirmation = if yes {
        Confirmation::Confirmed
    } else {
        let ticket = app.repository.get(session, &id).await?;
        confirm(&format!(
            "Delete ticket {} \"{}\"? This cannot be undone. [y/N] ",
            ticket.id.short(),
            ticket.title
        ))?
    };
    app.repository.delete(session, &id, confirmation).await?;
    println!("Deleted ticket {id}");
    Ok(())
}

/// Print every snapshot of the session's ticket view until interrupted.
pub async fn watch(app: &App, session: &Session, color: bool) -> Result<(), HelpdeskError> {
    let cancel = install_signal_handler();
    let mut subscription = app.repository.watch(session).await?;
    eprintln!("Watching tickets as {} (Ctrl-C to stop)", session.principal().email);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            next = subscription.next() => match next {
                Some(Ok(tickets)) => {
                    println!(
                        "\n  {} ticket(s) at {}",
                        tickets.len(),
                        chrono::Local::now().format("%H:%M:%S")
                    );
                    print!("{}", render::ticket_table(&tickets, color));
                }
                Some(Err(e)) => render::error(&e),
                None => break,
            },
        }
    }

    subscription.unsubscribe();
    debug!("ticket watch closed");
    Ok(())
}

/// Ask on stdin; anything but `y`/`yes` declines.
fn confirm(prompt: &str) -> Result<Confirmation, HelpdeskError> {
    let mut stdout = std::io::stdout();
    stdout
        .write_all(prompt.as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|e| HelpdeskError::Internal(format!("failed to write prompt: {e}")))?;

    let mut answer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .map_err(|e| HelpdeskError::Internal(format!("failed to read answer: {e}")))?;
    Ok(parse_answer(&answer))
}

fn parse_answer(answer: &str) -> Confirmation {
    let answer = answer.trim().to_ascii_lowercase();
    Confirmation::from(answer == "y" || answer == "yes")
}

async fn read_attachment(path: &Path) -> Result<Attachment, HelpdeskError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| HelpdeskError::Upload {
        message: format!("cannot read {}: {e}", path.display()),
        source: Some(Box::new(e)),
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Attachment {
        content_type: content_type_for(&file_name).map(str::to_string),
        file_name,
        bytes,
    })
}

fn content_type_for(file_name: &str) -> Option<&'static str> {
    let extension = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    Some(match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        "txt" | "log" => "text/plain",
        "json" => "application/json",
        "zip" => "application/zip",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_explicit_yes_confirms() {
        assert_eq!(parse_answer("y\n"), Confirmation::Confirmed);
        assert_eq!(parse_answer(" YES \n"), Confirmation::Confirmed);
        assert_eq!(parse_answer("\n"), Confirmation::NotConfirmed);
        assert_eq!(parse_answer("no\n"), Confirmation::NotConfirmed);
        assert_eq!(parse_answer("yep\n"), Confirmation::NotConfirmed);
    }

    #[test]
    fn content_type_from_extension() {
        assert_eq!(content_type_for("shot.PNG"), Some("image/png"));
        assert_eq!(content_type_for("crash.log"), Some("text/plain"));
        assert_eq!(content_type_for("README"), None);
        assert_eq!(content_type_for("archive.7z"), None);
    }

    #[tokio::test]
    async fn attachment_is_read_with_base_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.txt");
        std::fs::write(&path, b"stack").unwrap();

        let attachment = read_attachment(&path).await.unwrap();
        assert_eq!(attachment.file_name, "trace.txt");
        assert_eq!(attachment.content_type.as_deref(), Some("text/plain"));
        assert_eq!(attachment.bytes, b"stack");
    }

    #[tokio::test]
    async fn unreadable_attachment_is_an_upload_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_attachment(&dir.path().join("missing.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, HelpdeskError::Upload { .. }));
    }
}
