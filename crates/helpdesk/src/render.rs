// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal rendering of tickets and errors.

use std::fmt::Write as _;
use std::io::IsTerminal;

use colored::Colorize;
use helpdesk_core::{HelpdeskError, Priority, Ticket, TicketStatus};

/// Colors only when stdout is a terminal and `--plain` was not given.
pub fn use_color(plain: bool) -> bool {
    !plain && std::io::stdout().is_terminal()
}

fn status_label(status: TicketStatus, color: bool) -> String {
    let label = format!("{status:<11}");
    if !color {
        return label;
    }
    match status {
        TicketStatus::Open => label.yellow().to_string(),
        TicketStatus::InProgress => label.cyan().to_string(),
        TicketStatus::Resolved => label.green().to_string(),
    }
}

fn priority_label(priority: Priority, color: bool) -> String {
    let label = format!("{priority:<6}");
    if color && priority == Priority::High {
        label.red().bold().to_string()
    } else {
        label
    }
}

/// One row per ticket, in store order.
pub fn ticket_table(tickets: &[Ticket], color: bool) -> String {
    if tickets.is_empty() {
        return "  No tickets.\n".to_string();
    }
    let mut out = String::new();
    let header = format!(
        "  {:<8}  {:<11}  {:<6}  {:<9}  {:<10}  {:<10}  {}",
        "ID", "STATUS", "PRIO", "CATEGORY", "CREATED BY", "ASSIGNEE", "TITLE"
    );
    let _ = writeln!(out, "{}", if color { header.bold().to_string() } else { header });
    for ticket in tickets {
        let assignee = ticket
            .assigned_to
            .as_ref()
            .map(|id| id.as_str())
            .unwrap_or("-");
        let _ = writeln!(
            out,
            "  {:<8}  {}  {}  {:<9}  {:<10}  {:<10}  {}",
            ticket.id.short(),
            status_label(ticket.status, color),
            priority_label(ticket.priority, color),
            ticket.category,
            ticket.created_by,
            assignee,
            ticket.title
        );
    }
    out
}

/// Full detail view, including the attachment link.
pub fn ticket_detail(ticket: &Ticket, color: bool) -> String {
    let mut out = String::new();
    let title = if color {
        ticket.title.bold().to_string()
    } else {
        ticket.title.clone()
    };
    let _ = writeln!(out, "  {title}");
    let _ = writeln!(out, "  {}", "-".repeat(50));
    let _ = writeln!(out, "  {:<12} {}", "ID", ticket.id);
    let _ = writeln!(out, "  {:<12} {}", "Status", status_label(ticket.status, color).trim_end());
    let _ = writeln!(out, "  {:<12} {}", "Priority", ticket.priority);
    let _ = writeln!(out, "  {:<12} {}", "Category", ticket.category);
    let _ = writeln!(out, "  {:<12} {}", "Created by", ticket.created_by);
    let _ = writeln!(
        out,
        "  {:<12} {}",
        "Created at",
        ticket.created_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(
        out,
        "  {:<12} {}",
        "Assigned to",
        ticket.assigned_to.as_ref().map(|id| id.as_str()).unwrap_or("-")
    );
    let _ = writeln!(out, "  {:<12} {}", "Contact", ticket.contact_email);
    if !ticket.contact_phone.is_empty() {
        let _ = writeln!(out, "  {:<12} {}", "Phone", ticket.contact_phone);
    }
    if let Some(url) = &ticket.attachment_url {
        let _ = writeln!(out, "  {:<12} {url}", "Attachment");
    }
    let _ = writeln!(out);
    for line in ticket.description.lines() {
        let _ = writeln!(out, "  {line}");
    }
    if !ticket.additional_notes.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "  Notes:");
        for line in ticket.additional_notes.lines() {
            let _ = writeln!(out, "  {line}");
        }
    }
    out
}

/// Print an operation failure to stderr with a hint where one helps.
pub fn error(e: &HelpdeskError) {
    eprintln!("{} {e}", "error:".red().bold());
    match e {
        HelpdeskError::Validation(errors) => {
            for field_error in errors.iter() {
                eprintln!("  - {}: {}", field_error.field, field_error.message);
            }
        }
        HelpdeskError::ConfirmationRequired => {
            eprintln!("  hint: pass --yes or answer the prompt with 'y'");
        }
        HelpdeskError::Unauthenticated(_) => {
            eprintln!("  hint: principals are listed under [[principals]] in the config file");
        }
        _ => {}
    }
}
