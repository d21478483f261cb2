// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket change feed shared by store backends.
//!
//! Writers publish a [`TicketChange`] on the [`ChangeBus`] after each commit.
//! [`spawn_snapshot_watch`] turns that feed into the snapshot stream behind a
//! [`TicketSubscription`](helpdesk_core::TicketSubscription): it re-runs the
//! query after every change and forwards the result when it differs from the
//! last one delivered.

use std::future::Future;

use helpdesk_core::{SnapshotPublisher, SnapshotResult, Ticket, TicketId};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Default number of buffered change notifications per receiver.
pub const DEFAULT_CAPACITY: usize = 256;

/// A committed change to the ticket collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketChange {
    Inserted(TicketId),
    Updated(TicketId),
    Deleted(TicketId),
    /// Another process committed; which rows changed is unknown.
    External,
}

/// Broadcast channel of [`TicketChange`]s.
#[derive(Debug, Clone)]
pub struct ChangeBus {
    tx: broadcast::Sender<TicketChange>,
}

impl ChangeBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish a change. Having no listeners is not an error.
    pub fn publish(&self, change: TicketChange) {
        trace!(?change, "publishing ticket change");
        let _ = self.tx.send(change);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TicketChange> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Drive a live query until the subscriber goes away or the bus closes.
///
/// The first delivery is the result of `fetch` at subscription time. After
/// that, every change notification (or a lagged receiver) triggers a new
/// `fetch`; successful results identical to the last delivered snapshot are
/// suppressed. Fetch errors are delivered and the watch keeps running.
pub fn spawn_snapshot_watch<F, Fut>(
    bus: &ChangeBus,
    publisher: SnapshotPublisher,
    fetch: F,
) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = SnapshotResult> + Send + 'static,
{
    // Subscribe before the initial fetch so no commit falls between the two.
    let mut changes = bus.subscribe();

    tokio::spawn(async move {
        let mut last: Option<Vec<Ticket>> = None;

        if !deliver(&publisher, fetch().await, &mut last).await {
            return;
        }

        loop {
            tokio::select! {
                biased;
                _ = publisher.cancelled() => {
                    debug!("subscription cancelled, stopping watch");
                    break;
                }
                received = changes.recv() => {
                    match received {
                        Ok(change) => trace!(?change, "re-running live query"),
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "change feed lagged, re-running live query");
                        }
                        Err(RecvError::Closed) => {
                            debug!("change bus closed, ending subscription");
                            break;
                        }
                    }
                    // One fetch covers every change already queued.
                    loop {
                        match changes.try_recv() {
                            Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                        }
                    }
                    if !deliver(&publisher, fetch().await, &mut last).await {
                        break;
                    }
                }
            }
        }
    })
}

/// Forward `result` unless it repeats the last snapshot delivered since the
/// most recent error. Returns `false`
/// once the subscriber is gone.
async fn deliver(
    publisher: &SnapshotPublisher,
    result: SnapshotResult,
    last: &mut Option<Vec<Ticket>>,
) -> bool {
    match result {
        Ok(snapshot) => {
            if last.as_ref() == Some(&snapshot) {
                return !publisher.is_cancelled();
            }
            *last = Some(snapshot.clone());
            publisher.publish(Ok(snapshot)).await
        }
        Err(err) => {
            warn!(error = %err, "live query failed");
            // The subscriber's latest view is now the error; the next good
            // result must be delivered even if it equals the earlier set.
            *last = None;
            publisher.publish(Err(err)).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;
    use helpdesk_core::{
        Category, HelpdeskError, PrincipalId, Priority, TicketStatus, TicketSubscription,
    };
    use tokio::sync::Mutex;

    fn ticket(id: &str) -> Ticket {
        Ticket {
            id: TicketId::from(id),
            title: "t".into(),
            description: "d".into(),
            priority: Priority::Low,
            category: Category::Other,
            contact_email: "c@x.com".into(),
            contact_phone: String::new(),
            additional_notes: String::new(),
            attachment_url: None,
            status: TicketStatus::Open,
            created_by: PrincipalId::from("c"),
            assigned_to: None,
            created_at: Utc::now(),
        }
    }

    fn shared_fetch(
        rows: Arc<Mutex<Vec<Ticket>>>,
    ) -> impl Fn() -> std::pin::Pin<Box<dyn Future<Output = SnapshotResult> + Send>> + Send + 'static
    {
        move || {
            let rows = rows.clone();
            Box::pin(async move { Ok(rows.lock().await.clone()) })
        }
    }

    async fn next(sub: &mut TicketSubscription) -> Vec<Ticket> {
        tokio::time::timeout(Duration::from_secs(2), sub.next_snapshot())
            .await
            .expect("snapshot in time")
            .expect("subscription open")
            .expect("snapshot ok")
    }

    #[tokio::test]
    async fn first_delivery_is_current_set() {
        let bus = ChangeBus::default();
        let rows = Arc::new(Mutex::new(vec![ticket("a")]));
        let (publisher, mut sub) = TicketSubscription::channel(8);
        spawn_snapshot_watch(&bus, publisher, shared_fetch(rows));
        assert_eq!(next(&mut sub).await.len(), 1);
    }

    #[tokio::test]
    async fn change_triggers_new_snapshot() {
        let bus = ChangeBus::default();
        let rows = Arc::new(Mutex::new(Vec::new()));
        let (publisher, mut sub) = TicketSubscription::channel(8);
        spawn_snapshot_watch(&bus, publisher, shared_fetch(rows.clone()));
        assert!(next(&mut sub).await.is_empty());

        rows.lock().await.push(ticket("a"));
        bus.publish(TicketChange::Inserted(TicketId::from("a")));
        assert_eq!(next(&mut sub).await[0].id.as_str(), "a");
    }

    #[tokio::test]
    async fn unchanged_result_is_not_redelivered() {
        let bus = ChangeBus::default();
        let rows = Arc::new(Mutex::new(vec![ticket("a")]));
        let (publisher, mut sub) = TicketSubscription::channel(8);
        spawn_snapshot_watch(&bus, publisher, shared_fetch(rows.clone()));
        next(&mut sub).await;

        // A change outside this query's result set.
        bus.publish(TicketChange::External);
        let pending = tokio::time::timeout(Duration::from_millis(200), sub.next_snapshot()).await;
        assert!(pending.is_err(), "duplicate snapshot was delivered");

        rows.lock().await.push(ticket("b"));
        bus.publish(TicketChange::Inserted(TicketId::from("b")));
        assert_eq!(next(&mut sub).await.len(), 2);
    }

    #[tokio::test]
    async fn fetch_errors_are_delivered_and_watch_continues() {
        let bus = ChangeBus::default();
        let fail = Arc::new(std::sync::atomic::AtomicBool::new(true));
        let flag = fail.clone();
        let (publisher, mut sub) = TicketSubscription::channel(8);
        spawn_snapshot_watch(&bus, publisher, move || {
            let flag = flag.clone();
            async move {
                if flag.load(std::sync::atomic::Ordering::SeqCst) {
                    Err(HelpdeskError::Internal("offline".into()))
                } else {
                    Ok(vec![ticket("a")])
                }
            }
        });

        let first = sub.next_snapshot().await.unwrap();
        assert!(first.is_err());
        fail.store(false, std::sync::atomic::Ordering::SeqCst);
        bus.publish(TicketChange::External);
        assert_eq!(next(&mut sub).await.len(), 1);
    }

    #[tokio::test]
    async fn recovery_to_the_same_set_is_delivered_after_an_error() {
        let bus = ChangeBus::default();
        let rows = Arc::new(Mutex::new(vec![ticket("a")]));
        let fail = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let (publisher, mut sub) = TicketSubscription::channel(8);
        let fetch_rows = rows.clone();
        let flag = fail.clone();
        spawn_snapshot_watch(&bus, publisher, move || {
            let rows = fetch_rows.clone();
            let flag = flag.clone();
            async move {
                if flag.load(std::sync::atomic::Ordering::SeqCst) {
                    Err(HelpdeskError::Internal("offline".into()))
                } else {
                    Ok(rows.lock().await.clone())
                }
            }
        });
        let before = next(&mut sub).await;

        fail.store(true, std::sync::atomic::Ordering::SeqCst);
        bus.publish(TicketChange::External);
        let failed = tokio::time::timeout(Duration::from_secs(2), sub.next_snapshot())
            .await
            .expect("error in time")
            .expect("subscription open");
        assert!(failed.is_err());

        fail.store(false, std::sync::atomic::Ordering::SeqCst);
        bus.publish(TicketChange::External);
        assert_eq!(next(&mut sub).await, before);
    }

    #[tokio::test]
    async fn dropping_subscription_stops_task() {
        let bus = ChangeBus::default();
        let rows = Arc::new(Mutex::new(Vec::new()));
        let (publisher, mut sub) = TicketSubscription::channel(8);
        let handle = spawn_snapshot_watch(&bus, publisher, shared_fetch(rows));
        next(&mut sub).await;
        drop(sub);
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("watch task exits")
            .unwrap();
        assert_eq!(bus.receiver_count(), 0);
    }
}
