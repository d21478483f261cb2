// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket document CRUD.
//!
//! Partial updates go through `json_set` so fields this crate does not know
//! about survive a write.

use helpdesk_core::{
    AssignMode, HelpdeskError, NewTicket, PrincipalId, Ticket, TicketDocument, TicketFilter,
    TicketId, TicketStatus, WriteOperation,
};
use rusqlite::{OptionalExtension, params};
use tracing::warn;

use crate::database::{Database, map_tr_err};

/// Result of a conditional single-row write.
enum WriteOutcome {
    Applied,
    Missing,
    /// The condition did not hold; carries the current value of the guarded field.
    Rejected(Option<String>),
}

/// Insert a new ticket under a fresh id.
pub async fn insert_ticket(db: &Database, ticket: NewTicket) -> Result<Ticket, HelpdeskError> {
    let document = TicketDocument::from_new(ticket);
    let json = document.to_json()?;
    let id = uuid::Uuid::new_v4().to_string();

    let row_id = id.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO tickets (id, document) VALUES (?1, ?2)",
                params![row_id, json],
            )
        })
        .await
        .map_err(|e| HelpdeskError::write(WriteOperation::Create, e))?;

    Ok(document.into_ticket(TicketId(id)))
}

/// Get a ticket by id.
pub async fn get_ticket(db: &Database, id: &TicketId) -> Result<Option<Ticket>, HelpdeskError> {
    let key = id.0.clone();
    let json: Option<String> = db
        .connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT document FROM tickets WHERE id = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;

    match json {
        Some(json) => Ok(Some(TicketDocument::from_json(&json)?.into_ticket(id.clone()))),
        None => Ok(None),
    }
}

/// Every ticket matching `filter`, in insertion order.
///
/// Documents that fail to decode are skipped with a warning so one bad
/// record does not hide the rest of the collection.
pub async fn list_tickets(
    db: &Database,
    filter: &TicketFilter,
) -> Result<Vec<Ticket>, HelpdeskError> {
    let creator = match filter {
        TicketFilter::All => None,
        TicketFilter::CreatedBy(id) => Some(id.0.clone()),
    };

    let rows: Vec<(String, String)> = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, document FROM tickets
                 WHERE ?1 IS NULL OR created_by = ?1
                 ORDER BY rowid",
            )?;
            let rows = stmt.query_map(params![creator], |row| Ok((row.get(0)?, row.get(1)?)))?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)?;

    Ok(rows
        .into_iter()
        .filter_map(|(id, json)| match TicketDocument::from_json(&json) {
            Ok(document) => Some(document.into_ticket(TicketId(id))),
            Err(e) => {
                warn!(ticket_id = %id, error = %e, "skipping undecodable ticket document");
                None
            }
        })
        .collect())
}

/// Set `status`, optionally only if the stored status equals `expected`.
pub async fn update_status(
    db: &Database,
    id: &TicketId,
    status: TicketStatus,
    expected: Option<TicketStatus>,
) -> Result<(), HelpdeskError> {
    let key = id.0.clone();
    let status = status.to_string();
    let expected = expected.map(|s| s.to_string());

    let outcome = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE tickets SET document = json_set(document, '$.status', ?2)
                 WHERE id = ?1 AND (?3 IS NULL OR json_extract(document, '$.status') = ?3)",
                params![key, status, expected],
            )?;
            let outcome = if changed > 0 {
                WriteOutcome::Applied
            } else {
                current_field(&tx, &key, "$.status")?
            };
            tx.commit()?;
            Ok::<_, rusqlite::Error>(outcome)
        })
        .await
        .map_err(|e| HelpdeskError::write(WriteOperation::UpdateStatus, e))?;

    match outcome {
        WriteOutcome::Applied => Ok(()),
        WriteOutcome::Missing => Err(HelpdeskError::NotFound { id: id.clone() }),
        WriteOutcome::Rejected(current) => Err(HelpdeskError::conflict(format!(
            "ticket {id} changed concurrently; status is now {}",
            current.as_deref().unwrap_or("unknown")
        ))),
    }
}

/// Set `assignedTo` to `agent`.
pub async fn assign(
    db: &Database,
    id: &TicketId,
    agent: &PrincipalId,
    mode: AssignMode,
) -> Result<(), HelpdeskError> {
    let key = id.0.clone();
    let agent_id = agent.0.clone();
    let guarded = mode == AssignMode::IfUnassigned;

    let outcome = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE tickets SET document = json_set(document, '$.assignedTo', ?2)
                 WHERE id = ?1 AND (
                     ?3 = 0
                     OR json_extract(document, '$.assignedTo') IS NULL
                     OR json_extract(document, '$.assignedTo') = ''
                     OR json_extract(document, '$.assignedTo') = ?2
                 )",
                params![key, agent_id, guarded],
            )?;
            let outcome = if changed > 0 {
                WriteOutcome::Applied
            } else {
                current_field(&tx, &key, "$.assignedTo")?
            };
            tx.commit()?;
            Ok::<_, rusqlite::Error>(outcome)
        })
        .await
        .map_err(|e| HelpdeskError::write(WriteOperation::Assign, e))?;

    match outcome {
        WriteOutcome::Applied => Ok(()),
        WriteOutcome::Missing => Err(HelpdeskError::NotFound { id: id.clone() }),
        WriteOutcome::Rejected(current) => Err(HelpdeskError::conflict(format!(
            "ticket {id} is already assigned to {}",
            current.as_deref().unwrap_or("another agent")
        ))),
    }
}

/// Delete a ticket.
pub async fn delete_ticket(db: &Database, id: &TicketId) -> Result<(), HelpdeskError> {
    let key = id.0.clone();
    let changed = db
        .connection()
        .call(move |conn| conn.execute("DELETE FROM tickets WHERE id = ?1", params![key]))
        .await
        .map_err(|e| HelpdeskError::write(WriteOperation::Delete, e))?;

    if changed == 0 {
        return Err(HelpdeskError::NotFound { id: id.clone() });
    }
    Ok(())
}

/// After a conditional write touched no rows: missing row, or the guarded value.
fn current_field(
    conn: &rusqlite::Connection,
    id: &str,
    path: &str,
) -> Result<WriteOutcome, rusqlite::Error> {
    let current: Option<Option<String>> = conn
        .query_row(
            "SELECT json_extract(document, ?2) FROM tickets WHERE id = ?1",
            params![id, path],
            |row| row.get(0),
        )
        .optional()?;
    Ok(match current {
        None => WriteOutcome::Missing,
        Some(value) => WriteOutcome::Rejected(value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use helpdesk_core::{Category, Priority};

    fn new_ticket(creator: &str, title: &str) -> NewTicket {
        NewTicket {
            title: title.into(),
            description: "details".into(),
            priority: Priority::Medium,
            category: Category::Technical,
            contact_email: "a@x.com".into(),
            contact_phone: String::new(),
            additional_notes: String::new(),
            attachment_url: None,
            created_by: PrincipalId::from(creator),
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap(),
        }
    }

    async fn raw_document(db: &Database, id: &TicketId) -> serde_json::Value {
        let key = id.0.clone();
        let json: String = db
            .connection()
            .call(move |conn| {
                conn.query_row(
                    "SELECT document FROM tickets WHERE id = ?1",
                    params![key],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap();
        serde_json::from_str(&json).unwrap()
    }

    #[tokio::test]
    async fn insert_writes_wire_document() {
        let db = Database::open_in_memory().await.unwrap();
        let ticket = insert_ticket(&db, new_ticket("cust-a", "Printer jam"))
            .await
            .unwrap();
        assert_eq!(ticket.status, TicketStatus::Open);

        let doc = raw_document(&db, &ticket.id).await;
        assert_eq!(doc["status"], "open");
        assert_eq!(doc["createdBy"], "cust-a");
        assert_eq!(doc["attachmentUrl"], "");
        assert!(doc.get("assignedTo").is_none());
    }

    #[tokio::test]
    async fn list_filters_by_creator_in_insertion_order() {
        let db = Database::open_in_memory().await.unwrap();
        let a1 = insert_ticket(&db, new_ticket("a", "first")).await.unwrap();
        insert_ticket(&db, new_ticket("d", "other")).await.unwrap();
        let a2 = insert_ticket(&db, new_ticket("a", "second")).await.unwrap();

        let mine = list_tickets(&db, &TicketFilter::CreatedBy(PrincipalId::from("a")))
            .await
            .unwrap();
        assert_eq!(
            mine.iter().map(|t| &t.id).collect::<Vec<_>>(),
            vec![&a1.id, &a2.id]
        );
        assert_eq!(list_tickets(&db, &TicketFilter::All).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn status_update_touches_only_status() {
        let db = Database::open_in_memory().await.unwrap();
        let ticket = insert_ticket(&db, new_ticket("a", "t")).await.unwrap();
        update_status(&db, &ticket.id, TicketStatus::Resolved, None)
            .await
            .unwrap();

        let stored = get_ticket(&db, &ticket.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TicketStatus::Resolved);
        assert_eq!(stored.created_by, ticket.created_by);
        assert_eq!(stored.created_at, ticket.created_at);
        assert_eq!(stored.title, ticket.title);
    }

    #[tokio::test]
    async fn status_compare_and_set_detects_concurrent_change() {
        let db = Database::open_in_memory().await.unwrap();
        let ticket = insert_ticket(&db, new_ticket("a", "t")).await.unwrap();
        update_status(&db, &ticket.id, TicketStatus::InProgress, None)
            .await
            .unwrap();

        let err = update_status(
            &db,
            &ticket.id,
            TicketStatus::Resolved,
            Some(TicketStatus::Open),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, HelpdeskError::Conflict { .. }), "{err}");
    }

    #[tokio::test]
    async fn writes_to_missing_ticket_are_not_found() {
        let db = Database::open_in_memory().await.unwrap();
        let missing = TicketId::from("nope");
        assert!(matches!(
            update_status(&db, &missing, TicketStatus::Open, None).await,
            Err(HelpdeskError::NotFound { .. })
        ));
        assert!(matches!(
            assign(&db, &missing, &PrincipalId::from("b"), AssignMode::Overwrite).await,
            Err(HelpdeskError::NotFound { .. })
        ));
        assert!(matches!(
            delete_ticket(&db, &missing).await,
            Err(HelpdeskError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn guarded_assign_rejects_other_agent() {
        let db = Database::open_in_memory().await.unwrap();
        let ticket = insert_ticket(&db, new_ticket("a", "t")).await.unwrap();
        let b = PrincipalId::from("agent-b");
        let e = PrincipalId::from("agent-e");

        assign(&db, &ticket.id, &b, AssignMode::IfUnassigned)
            .await
            .unwrap();
        // Same agent again is a no-op success.
        assign(&db, &ticket.id, &b, AssignMode::IfUnassigned)
            .await
            .unwrap();

        let err = assign(&db, &ticket.id, &e, AssignMode::IfUnassigned)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("agent-b"), "{err}");

        assign(&db, &ticket.id, &e, AssignMode::Overwrite)
            .await
            .unwrap();
        let stored = get_ticket(&db, &ticket.id).await.unwrap().unwrap();
        assert_eq!(stored.assigned_to, Some(e));
    }

    #[tokio::test]
    async fn undecodable_documents_are_skipped_in_lists() {
        let db = Database::open_in_memory().await.unwrap();
        insert_ticket(&db, new_ticket("a", "good")).await.unwrap();
        db.connection()
            .call(|conn| {
                conn.execute(
                    "INSERT INTO tickets (id, document) VALUES ('bad', '{\"createdBy\":\"a\"}')",
                    [],
                )
            })
            .await
            .unwrap();

        let all = list_tickets(&db, &TicketFilter::All).await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(get_ticket(&db, &TicketId::from("bad")).await.is_err());
    }
}
