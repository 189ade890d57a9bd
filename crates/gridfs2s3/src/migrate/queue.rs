//! Bounded work queue between the enumerator and the worker pool
//!
//! One producer, many consumers. Each item is delivered to exactly one
//! consumer. Closing the queue stops new pushes but consumers still receive
//! everything that was buffered before they see the end of the stream.

use async_channel::{Receiver, Sender};

use crate::types::WorkItem;

/// Create a queue holding at most `capacity` items (minimum 1).
pub fn work_queue(capacity: usize) -> (WorkSender, WorkReceiver) {
    let (tx, rx) = async_channel::bounded(capacity.max(1));
    (WorkSender { tx }, WorkReceiver { rx })
}

/// Producer side, owned by the coordinator
#[derive(Debug)]
pub struct WorkSender {
    tx: Sender<WorkItem>,
}

/// Consumer side; cloned once per worker
#[derive(Debug, Clone)]
pub struct WorkReceiver {
    rx: Receiver<WorkItem>,
}

impl WorkSender {
    /// Wait for a free slot, then enqueue `item`.
    ///
    /// Hands the item back if the queue was closed or every consumer is gone.
    pub async fn push(&self, item: WorkItem) -> Result<(), WorkItem> {
        self.tx.send(item).await.map_err(|e| e.into_inner())
    }

    /// No more items will be pushed. Idempotent.
    pub fn close(&self) {
        self.tx.close();
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Items buffered and not yet pulled
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    /// Number of live consumers
    pub fn receivers(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl WorkReceiver {
    /// Next item, or `None` once the queue is closed and drained.
    pub async fn pull(&self) -> Option<WorkItem> {
        self.rx.recv().await.ok()
    }
}

impl Drop for WorkSender {
    fn drop(&mut self) {
        self.tx.close();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::types::ObjectDescriptor;
    use std::time::Duration;

    fn item(name: &str, seq: usize) -> WorkItem {
        WorkItem::new(ObjectDescriptor::new(format!("id-{}", seq), name, 1), seq, 3)
    }

    #[tokio::test]
    async fn test_buffered_items_survive_close() {
        let (tx, rx) = work_queue(2);
        tx.push(item("a.txt", 1)).await.unwrap();
        tx.push(item("b.txt", 2)).await.unwrap();
        tx.close();

        assert_eq!(rx.pull().await.unwrap().name(), "a.txt");
        assert_eq!(rx.pull().await.unwrap().name(), "b.txt");
        assert!(rx.pull().await.is_none());
    }

    #[tokio::test]
    async fn test_push_after_close_returns_item() {
        let (tx, _rx) = work_queue(2);
        tx.close();
        let rejected = tx.push(item("a.txt", 1)).await.unwrap_err();
        assert_eq!(rejected.sequence_number, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_push_blocks_when_full() {
        let (tx, rx) = work_queue(1);
        tx.push(item("a.txt", 1)).await.unwrap();

        let blocked =
            tokio::time::timeout(Duration::from_millis(50), tx.push(item("b.txt", 2))).await;
        assert!(blocked.is_err(), "second push must wait for a free slot");

        assert_eq!(rx.pull().await.unwrap().name(), "a.txt");
        tx.push(item("b.txt", 2)).await.unwrap();
        assert_eq!(tx.len(), 1);
    }

    #[tokio::test]
    async fn test_each_item_delivered_once() {
        let (tx, rx) = work_queue(2);
        let consumers: Vec<_> = (0..4)
            .map(|_| {
                let rx = rx.clone();
                tokio::spawn(async move {
                    let mut seen = Vec::new();
                    while let Some(item) = rx.pull().await {
                        seen.push(item.sequence_number);
                    }
                    seen
                })
            })
            .collect();
        drop(rx);

        for seq in 1..=50 {
            tx.push(item("x", seq)).await.unwrap();
        }
        tx.close();

        let mut all = Vec::new();
        for consumer in consumers {
            all.extend(consumer.await.unwrap());
        }
        all.sort_unstable();
        assert_eq!(all, (1..=50).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_dropping_sender_ends_stream() {
        let (tx, rx) = work_queue(1);
        drop(tx);
        assert!(rx.pull().await.is_none());
    }
}
