// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live ticket views through the repository.

use std::time::Duration;

use futures::StreamExt;
use helpdesk_core::{
    HelpdeskError, Ticket, TicketFilter, TicketStatus, TicketStore, TicketSubscription,
};
use helpdesk_test_utils::TestHarness;
use helpdesk_test_utils::harness::{ALICE, BOB, DANA};
use helpdesk_tickets::Confirmation;

/// Wait for a snapshot satisfying `pred`, skipping intermediate ones.
async fn snapshot_where(
    subscription: &mut TicketSubscription,
    pred: impl Fn(&[Ticket]) -> bool,
) -> Vec<Ticket> {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let snapshot = subscription
                .next()
                .await
                .expect("subscription ended")
                .expect("snapshot error");
            if pred(&snapshot) {
                return snapshot;
            }
        }
    })
    .await
    .expect("timed out waiting for snapshot")
}

#[tokio::test]
async fn watch_delivers_initial_snapshot() {
    let harness = TestHarness::new().await.unwrap();
    let alice = harness.sign_in(ALICE).await.unwrap();
    harness
        .repository
        .create(&alice, TestHarness::draft("Before watch"))
        .await
        .unwrap();

    let mut view = harness.repository.watch(&alice).await.unwrap();
    let snapshot = snapshot_where(&mut view, |_| true).await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].title, "Before watch");
}

#[tokio::test]
async fn customer_view_follows_own_tickets_only() {
    let harness = TestHarness::new().await.unwrap();
    let alice = harness.sign_in(ALICE).await.unwrap();
    let dana = harness.sign_in(DANA).await.unwrap();

    let mut view = harness.repository.watch(&alice).await.unwrap();
    snapshot_where(&mut view, |s| s.is_empty()).await;

    harness
        .repository
        .create(&dana, TestHarness::draft("Not yours"))
        .await
        .unwrap();
    harness
        .repository
        .create(&alice, TestHarness::draft("Yours"))
        .await
        .unwrap();

    let snapshot = snapshot_where(&mut view, |s| !s.is_empty()).await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].title, "Yours");
}

#[tokio::test]
async fn agent_view_reflects_status_and_assignment() {
    let harness = TestHarness::new().await.unwrap();
    let alice = harness.sign_in(ALICE).await.unwrap();
    let bob = harness.sign_in(BOB).await.unwrap();
    let ticket = harness
        .repository
        .create(&alice, TestHarness::draft("Watch me"))
        .await
        .unwrap();

    let mut view = harness.repository.watch(&bob).await.unwrap();
    snapshot_where(&mut view, |s| s.len() == 1).await;

    harness.repository.assign(&bob, &ticket.id).await.unwrap();
    harness
        .repository
        .update_status(&bob, &ticket.id, TicketStatus::InProgress)
        .await
        .unwrap();

    let snapshot = snapshot_where(&mut view, |s| {
        s[0].status == TicketStatus::InProgress && s[0].is_assigned()
    })
    .await;
    assert_eq!(snapshot[0].assigned_to.as_ref(), Some(bob.principal_id()));
}

#[tokio::test]
async fn deleted_ticket_disappears_from_view() {
    let harness = TestHarness::new().await.unwrap();
    let alice = harness.sign_in(ALICE).await.unwrap();
    let ticket = harness
        .repository
        .create(&alice, TestHarness::draft("Short-lived"))
        .await
        .unwrap();

    let mut view = harness.repository.watch(&alice).await.unwrap();
    snapshot_where(&mut view, |s| s.len() == 1).await;

    harness
        .repository
        .delete(&alice, &ticket.id, Confirmation::Confirmed)
        .await
        .unwrap();
    snapshot_where(&mut view, |s| s.is_empty()).await;
}

#[tokio::test]
async fn read_failure_is_delivered_and_watch_recovers() {
    let harness = TestHarness::new().await.unwrap();
    let alice = harness.sign_in(ALICE).await.unwrap();

    let mut view = harness.repository.watch(&alice).await.unwrap();
    snapshot_where(&mut view, |s| s.is_empty()).await;

    harness.memory.fail_reads(true);
    harness
        .repository
        .create(&alice, TestHarness::draft("During outage"))
        .await
        .unwrap();
    let delivery = tokio::time::timeout(Duration::from_secs(5), view.next())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(delivery, Err(HelpdeskError::Storage { .. })));

    harness.memory.fail_reads(false);
    harness
        .repository
        .create(&alice, TestHarness::draft("After outage"))
        .await
        .unwrap();
    snapshot_where(&mut view, |s| s.len() == 2).await;
}

#[tokio::test]
async fn unsubscribing_releases_the_change_feed() {
    let harness = TestHarness::new().await.unwrap();
    let bob = harness.sign_in(BOB).await.unwrap();

    let mut view = harness.repository.watch(&bob).await.unwrap();
    snapshot_where(&mut view, |_| true).await;
    assert_eq!(harness.memory.changes().receiver_count(), 1);

    view.unsubscribe();
    tokio::time::timeout(Duration::from_secs(5), async {
        while harness.memory.changes().receiver_count() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("watch task did not stop");
}

#[tokio::test]
async fn sqlite_backed_watch_sees_every_lifecycle_step() {
    let harness = TestHarness::builder().with_sqlite().build().await.unwrap();
    let alice = harness.sign_in(ALICE).await.unwrap();
    let bob = harness.sign_in(BOB).await.unwrap();

    let mut customer_view = harness.repository.watch(&alice).await.unwrap();
    let mut agent_view = harness.repository.watch(&bob).await.unwrap();
    snapshot_where(&mut customer_view, |s| s.is_empty()).await;
    snapshot_where(&mut agent_view, |s| s.is_empty()).await;

    let ticket = harness
        .repository
        .create(&alice, TestHarness::draft("Persisted"))
        .await
        .unwrap();
    snapshot_where(&mut agent_view, |s| s.len() == 1).await;

    harness.repository.assign(&bob, &ticket.id).await.unwrap();
    harness
        .repository
        .update_status(&bob, &ticket.id, TicketStatus::Resolved)
        .await
        .unwrap();
    let snapshot = snapshot_where(&mut customer_view, |s| {
        s.len() == 1 && s[0].status == TicketStatus::Resolved
    })
    .await;
    assert_eq!(snapshot[0].assigned_to.as_ref(), Some(bob.principal_id()));

    harness
        .repository
        .delete(&alice, &ticket.id, Confirmation::Confirmed)
        .await
        .unwrap();
    snapshot_where(&mut agent_view, |s| s.is_empty()).await;
    assert!(harness.store.list(&TicketFilter::All).await.unwrap().is_empty());
}
