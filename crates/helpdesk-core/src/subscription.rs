// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cancellable live ticket-set subscriptions.
//!
//! A [`TicketSubscription`] is the consumer half: a stream of snapshots of the
//! current matching set. A [`SnapshotPublisher`] is the producer half held by
//! the store's watch task. Dropping the subscription cancels the producer.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use crate::error::HelpdeskError;
use crate::types::Ticket;

/// One delivery on a subscription: the full matching set, or the error that
/// prevented computing it.
pub type SnapshotResult = Result<Vec<Ticket>, HelpdeskError>;

/// Consumer side of a live ticket query.
pub struct TicketSubscription {
    rx: mpsc::Receiver<SnapshotResult>,
    cancel: CancellationToken,
}

/// Producer side of a live ticket query.
pub struct SnapshotPublisher {
    tx: mpsc::Sender<SnapshotResult>,
    cancel: CancellationToken,
}

impl TicketSubscription {
    /// Create a linked publisher/subscription pair with room for `buffer`
    /// undelivered snapshots.
    pub fn channel(buffer: usize) -> (SnapshotPublisher, TicketSubscription) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let cancel = CancellationToken::new();
        (
            SnapshotPublisher {
                tx,
                cancel: cancel.clone(),
            },
            TicketSubscription { rx, cancel },
        )
    }

    /// Wait for the next snapshot. `None` once the subscription has ended.
    pub async fn next_snapshot(&mut self) -> Option<SnapshotResult> {
        self.rx.recv().await
    }

    /// Stop watching. Equivalent to dropping the subscription.
    pub fn unsubscribe(self) {
        drop(self);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for TicketSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Stream for TicketSubscription {
    type Item = SnapshotResult;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl SnapshotPublisher {
    /// Deliver a snapshot. Returns `false` when the subscriber is gone and the
    /// producer should stop.
    pub async fn publish(&self, snapshot: SnapshotResult) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = self.tx.send(snapshot) => sent.is_ok(),
        }
    }

    /// Resolves once the subscriber unsubscribes or is dropped.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled() || self.tx.is_closed()
    }
}
